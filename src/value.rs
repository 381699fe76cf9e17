//! Value parser dispatch: raw attribute text to typed domain values.
//!
//! The semantic type of an attribute is looked up statically from
//! `(element kind, attribute tag)` by [`value_type`]; [`parse_value`] then runs
//! the matching grammar. Grammars for numbers, lengths, colors, transforms,
//! view boxes, aspect ratios and path data come from `svgtypes`; references
//! use [`crate::reference`]. Every grammar must consume the entire value.

extern crate alloc;

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use svgtypes::{AspectRatio, Color, Length, ViewBox};

use crate::attribute::AttributeTag;
use crate::element::ElementKind;
use crate::geom::{PathCommand, PathNormalizer, Transform};
use crate::reference::{parse_func_iri, parse_iri, Reference, ReferenceForm};

const UNITS: &[&str] = &["userSpaceOnUse", "objectBoundingBox"];
const FILL_RULES: &[&str] = &["nonzero", "evenodd"];
const LINECAPS: &[&str] = &["butt", "round", "square"];
const LINEJOINS: &[&str] = &["miter", "round", "bevel"];
const SPREAD_METHODS: &[&str] = &["pad", "reflect", "repeat"];
const MARKER_UNITS: &[&str] = &["strokeWidth", "userSpaceOnUse"];
const VISIBILITY: &[&str] = &["visible", "hidden", "collapse"];
const DISPLAY: &[&str] = &[
    "inline",
    "block",
    "list-item",
    "run-in",
    "compact",
    "marker",
    "table",
    "inline-table",
    "table-row-group",
    "table-header-group",
    "table-footer-group",
    "table-row",
    "table-column-group",
    "table-column",
    "table-cell",
    "table-caption",
    "none",
];
const FONT_STYLES: &[&str] = &["normal", "italic", "oblique"];
const FONT_WEIGHTS: &[&str] = &[
    "normal", "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600", "700",
    "800", "900",
];
const TEXT_ANCHORS: &[&str] = &["start", "middle", "end"];

/// Declared semantic type of an attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    /// A single length.
    Length,
    /// Whitespace/comma separated lengths.
    LengthList,
    /// A single number.
    Number,
    /// Whitespace/comma separated numbers.
    NumberList,
    /// Number clamped to `0..=1`.
    Opacity,
    /// Transform list, collapsed to one matrix.
    Transform,
    /// Path data, normalized to absolute commands.
    PathData,
    /// Coordinate pairs.
    Points,
    /// Plain IRI reference.
    Iri,
    /// Functional `url(...)` reference.
    FuncIri,
    /// Functional reference or the keyword `none`.
    FuncIriOrNone,
    /// Fill/stroke paint.
    Paint,
    /// A color.
    Color,
    /// `viewBox` rectangle.
    ViewBox,
    /// `preserveAspectRatio` descriptor.
    PreserveAspectRatio,
    /// Dash array: lengths or `none`.
    DashArray,
    /// One keyword out of a fixed set.
    Keyword(&'static [&'static str]),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Length => "length",
            Self::LengthList => "length list",
            Self::Number => "number",
            Self::NumberList => "number list",
            Self::Opacity => "opacity",
            Self::Transform => "transform list",
            Self::PathData => "path data",
            Self::Points => "points",
            Self::Iri => "IRI",
            Self::FuncIri => "functional IRI",
            Self::FuncIriOrNone => "functional IRI or none",
            Self::Paint => "paint",
            Self::Color => "color",
            Self::ViewBox => "view box",
            Self::PreserveAspectRatio => "aspect ratio",
            Self::DashArray => "dash array",
            Self::Keyword(_) => "keyword",
        };
        f.write_str(name)
    }
}

/// Paint used when a paint server reference cannot be resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintFallback {
    /// `none`
    None,
    /// `currentColor`
    CurrentColor,
    /// A color.
    Color(Color),
}

/// Fill or stroke paint.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint<'a> {
    /// `none`
    None,
    /// `currentColor`
    CurrentColor,
    /// A color.
    Color(Color),
    /// `url(...)` paint server with an optional fallback.
    Server {
        /// IRI inside `url(...)`.
        iri: Cow<'a, str>,
        /// Fallback paint.
        fallback: Option<PaintFallback>,
    },
}

impl Paint<'_> {
    fn into_owned(self) -> Paint<'static> {
        match self {
            Self::None => Paint::None,
            Self::CurrentColor => Paint::CurrentColor,
            Self::Color(color) => Paint::Color(color),
            Self::Server { iri, fallback } => Paint::Server {
                iri: Cow::Owned(iri.into_owned()),
                fallback,
            },
        }
    }
}

/// A reference whose IRI text owns its storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedReference {
    /// IRI text.
    pub iri: Box<str>,
    /// Grammar that matched.
    pub form: ReferenceForm,
}

impl OwnedReference {
    /// Borrow as a [`Reference`].
    pub fn as_reference(&self) -> Reference<'_> {
        Reference {
            iri: &self.iri,
            form: self.form,
        }
    }
}

/// A parsed attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainValue<'a> {
    /// Single length.
    Length(Length),
    /// Length list.
    LengthList(Vec<Length>),
    /// Single number (also opacity).
    Number(f64),
    /// Number list.
    NumberList(Vec<f64>),
    /// Transform list collapsed into one matrix.
    Transform(Transform),
    /// Absolute path commands.
    Path(Vec<PathCommand>),
    /// Coordinate pairs.
    Points(Vec<(f64, f64)>),
    /// Reference to another element (borrowed sub-range of the raw value).
    Reference(Reference<'a>),
    /// Reference whose text has been detached from the raw value.
    OwnedReference(OwnedReference),
    /// Paint.
    Paint(Paint<'a>),
    /// Color.
    Color(Color),
    /// View box.
    ViewBox(ViewBox),
    /// Aspect ratio descriptor.
    AspectRatio(AspectRatio),
    /// Canonical spelling of a matched keyword.
    Keyword(&'static str),
    /// The keyword `none` where a reference or list was allowed.
    None,
    /// The keyword `inherit` on a presentation attribute.
    Inherit,
    /// Raw text of a passthrough attribute.
    Raw(Cow<'a, str>),
}

impl DomainValue<'_> {
    /// Detach the value from the raw text it was parsed from.
    pub fn into_owned(self) -> DomainValue<'static> {
        match self {
            Self::Length(v) => DomainValue::Length(v),
            Self::LengthList(v) => DomainValue::LengthList(v),
            Self::Number(v) => DomainValue::Number(v),
            Self::NumberList(v) => DomainValue::NumberList(v),
            Self::Transform(v) => DomainValue::Transform(v),
            Self::Path(v) => DomainValue::Path(v),
            Self::Points(v) => DomainValue::Points(v),
            Self::Reference(r) => DomainValue::OwnedReference(OwnedReference {
                iri: r.iri.into(),
                form: r.form,
            }),
            Self::OwnedReference(r) => DomainValue::OwnedReference(r),
            Self::Paint(p) => DomainValue::Paint(p.into_owned()),
            Self::Color(v) => DomainValue::Color(v),
            Self::ViewBox(v) => DomainValue::ViewBox(v),
            Self::AspectRatio(v) => DomainValue::AspectRatio(v),
            Self::Keyword(v) => DomainValue::Keyword(v),
            Self::None => DomainValue::None,
            Self::Inherit => DomainValue::Inherit,
            Self::Raw(text) => DomainValue::Raw(Cow::Owned(text.into_owned())),
        }
    }
}

/// Why a raw value did not parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseFailure {
    /// Type the value was parsed as.
    pub expected: ValueType,
    /// Grammar-specific detail.
    pub detail: Box<str>,
}

impl ParseFailure {
    fn new(expected: ValueType, detail: impl ToString) -> Self {
        Self {
            expected,
            detail: detail.to_string().into_boxed_str(),
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.expected, self.detail)
    }
}

/// Static semantic type of `tag` on `kind`, or `None` for attributes without a parser.
pub fn value_type(kind: ElementKind, tag: AttributeTag) -> Option<ValueType> {
    use AttributeTag as A;

    let ty = match tag {
        A::X | A::Y if matches!(kind, ElementKind::Text | ElementKind::Tspan) => {
            ValueType::LengthList
        }
        A::Dx | A::Dy => ValueType::LengthList,
        A::Rotate => ValueType::NumberList,
        A::X
        | A::Y
        | A::Width
        | A::Height
        | A::Rx
        | A::Ry
        | A::Cx
        | A::Cy
        | A::R
        | A::Fx
        | A::Fy
        | A::X1
        | A::Y1
        | A::X2
        | A::Y2
        | A::Offset
        | A::RefX
        | A::RefY
        | A::MarkerWidth
        | A::MarkerHeight
        | A::StrokeWidth
        | A::StrokeDashoffset
        | A::FontSize => ValueType::Length,
        A::Transform | A::GradientTransform | A::PatternTransform => ValueType::Transform,
        A::Points => ValueType::Points,
        A::D => ValueType::PathData,
        A::ViewBox => ValueType::ViewBox,
        A::PreserveAspectRatio => ValueType::PreserveAspectRatio,
        A::Href => ValueType::Iri,
        A::ClipPath | A::Mask | A::Filter | A::MarkerStart | A::MarkerMid | A::MarkerEnd => {
            ValueType::FuncIriOrNone
        }
        A::Fill | A::Stroke => ValueType::Paint,
        A::Color | A::StopColor => ValueType::Color,
        A::Opacity | A::FillOpacity | A::StrokeOpacity | A::StopOpacity => ValueType::Opacity,
        A::StrokeMiterlimit => ValueType::Number,
        A::StrokeDasharray => ValueType::DashArray,
        A::FillRule | A::ClipRule => ValueType::Keyword(FILL_RULES),
        A::StrokeLinecap => ValueType::Keyword(LINECAPS),
        A::StrokeLinejoin => ValueType::Keyword(LINEJOINS),
        A::SpreadMethod => ValueType::Keyword(SPREAD_METHODS),
        A::GradientUnits
        | A::PatternUnits
        | A::PatternContentUnits
        | A::ClipPathUnits
        | A::MaskUnits
        | A::MaskContentUnits => ValueType::Keyword(UNITS),
        A::MarkerUnits => ValueType::Keyword(MARKER_UNITS),
        A::Visibility => ValueType::Keyword(VISIBILITY),
        A::Display => ValueType::Keyword(DISPLAY),
        A::FontStyle => ValueType::Keyword(FONT_STYLES),
        A::FontWeight => ValueType::Keyword(FONT_WEIGHTS),
        A::TextAnchor => ValueType::Keyword(TEXT_ANCHORS),
        A::Id | A::Class | A::Style | A::Orient | A::FontFamily => return None,
    };
    Some(ty)
}

/// Parse `raw` as `tag`'s value on `kind`.
///
/// Presentation attributes accept `inherit` regardless of their type.
/// Attributes without a parser are returned as [`DomainValue::Raw`].
pub fn parse_value<'a>(
    kind: ElementKind,
    tag: AttributeTag,
    raw: &'a str,
) -> Result<DomainValue<'a>, ParseFailure> {
    match value_type(kind, tag) {
        Some(ty) => parse_tagged(tag, ty, raw),
        None => Ok(DomainValue::Raw(Cow::Borrowed(raw))),
    }
}

/// Parse `raw` as `ty` on behalf of `tag`, honouring `inherit` for presentation attributes.
pub(crate) fn parse_tagged(
    tag: AttributeTag,
    ty: ValueType,
    raw: &str,
) -> Result<DomainValue<'_>, ParseFailure> {
    if tag.is_presentation() && raw.trim() == "inherit" {
        return Ok(DomainValue::Inherit);
    }
    parse_typed(ty, raw)
}

/// Run the grammar for `ty` over the whole of `raw`.
pub fn parse_typed(ty: ValueType, raw: &str) -> Result<DomainValue<'_>, ParseFailure> {
    let fail = |detail: &dyn fmt::Display| ParseFailure::new(ty, detail);
    match ty {
        ValueType::Length => Length::from_str(raw.trim())
            .map(DomainValue::Length)
            .map_err(|e| fail(&e)),
        ValueType::LengthList => parse_length_list(raw)
            .map(DomainValue::LengthList)
            .map_err(|e| fail(&e)),
        ValueType::Number => parse_number(raw).map(DomainValue::Number).map_err(|e| fail(&e)),
        ValueType::NumberList => parse_number_list(raw)
            .map(DomainValue::NumberList)
            .map_err(|e| fail(&e)),
        ValueType::Opacity => parse_number(raw)
            .map(|n| DomainValue::Number(n.clamp(0.0, 1.0)))
            .map_err(|e| fail(&e)),
        ValueType::Transform => svgtypes::Transform::from_str(raw)
            .map(|ts| DomainValue::Transform(ts.into()))
            .map_err(|e| fail(&e)),
        ValueType::PathData => parse_path(raw).map(DomainValue::Path).map_err(|e| fail(&e)),
        ValueType::Points => parse_points(raw)
            .map(DomainValue::Points)
            .map_err(|e| fail(&e)),
        ValueType::Iri => parse_iri(raw)
            .map(DomainValue::Reference)
            .ok_or_else(|| fail(&"expected a complete IRI")),
        ValueType::FuncIri => parse_func_iri(raw)
            .map(DomainValue::Reference)
            .ok_or_else(|| fail(&"expected a complete url(...) reference")),
        ValueType::FuncIriOrNone => {
            if raw.trim() == "none" {
                return Ok(DomainValue::None);
            }
            parse_func_iri(raw.trim())
                .map(DomainValue::Reference)
                .ok_or_else(|| fail(&"expected url(...) or none"))
        }
        ValueType::Paint => parse_paint(raw.trim())
            .map(DomainValue::Paint)
            .ok_or_else(|| fail(&"expected none, currentColor, a color or url(...)")),
        ValueType::Color => Color::from_str(raw.trim())
            .map(DomainValue::Color)
            .map_err(|e| fail(&e)),
        ValueType::ViewBox => ViewBox::from_str(raw)
            .map(DomainValue::ViewBox)
            .map_err(|e| fail(&e)),
        ValueType::PreserveAspectRatio => AspectRatio::from_str(raw.trim())
            .map(DomainValue::AspectRatio)
            .map_err(|e| fail(&e)),
        ValueType::DashArray => {
            if raw.trim() == "none" {
                return Ok(DomainValue::None);
            }
            parse_length_list(raw)
                .map(DomainValue::LengthList)
                .map_err(|e| fail(&e))
        }
        ValueType::Keyword(set) => {
            let trimmed = raw.trim();
            set.iter()
                .copied()
                .find(|keyword| *keyword == trimmed)
                .map(DomainValue::Keyword)
                .ok_or_else(|| fail(&format!("'{}' is not one of {:?}", trimmed, set)))
        }
    }
}

fn list_items(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|item| !item.is_empty())
}

fn parse_number(raw: &str) -> Result<f64, svgtypes::Error> {
    svgtypes::Number::from_str(raw.trim()).map(|n| n.0)
}

fn parse_length_list(raw: &str) -> Result<Vec<Length>, svgtypes::Error> {
    list_items(raw).map(Length::from_str).collect()
}

fn parse_number_list(raw: &str) -> Result<Vec<f64>, svgtypes::Error> {
    list_items(raw).map(parse_number).collect()
}

fn parse_points(raw: &str) -> Result<Vec<(f64, f64)>, &'static str> {
    let numbers = parse_number_list(raw).map_err(|_| "expected numbers")?;
    if numbers.len() % 2 != 0 {
        return Err("odd number of coordinates");
    }
    Ok(numbers.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect())
}

fn parse_path(raw: &str) -> Result<Vec<PathCommand>, svgtypes::Error> {
    let mut normalizer = PathNormalizer::default();
    let mut out = Vec::new();
    for segment in svgtypes::PathParser::from(raw) {
        normalizer.push(segment?, &mut out);
    }
    Ok(out)
}

fn parse_paint(raw: &str) -> Option<Paint<'_>> {
    match raw {
        "none" => return Some(Paint::None),
        "currentColor" => return Some(Paint::CurrentColor),
        _ => {}
    }
    if raw.starts_with("url(") {
        let close = raw.find(')')?;
        let reference = parse_func_iri(&raw[..=close])?;
        let rest = raw[close + 1..].trim();
        let fallback = match rest {
            "" => None,
            "none" => Some(PaintFallback::None),
            "currentColor" => Some(PaintFallback::CurrentColor),
            color => Some(PaintFallback::Color(Color::from_str(color).ok()?)),
        };
        return Some(Paint::Server {
            iri: Cow::Borrowed(reference.iri),
            fallback,
        });
    }
    Color::from_str(raw).ok().map(Paint::Color)
}
