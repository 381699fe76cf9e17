//! Attribute tags and the attribute tag resolver.
//!
//! A raw attribute name only means something relative to an element kind and a
//! value source. [`resolve_attribute`] is the single place that turns the triple
//! `(element kind, value source, raw name)` into an [`AttributeTag`]:
//!
//! - markup attributes resolve when the tag applies to the element kind
//!   (`rx` on `<rect>` resolves, `rx` on `<circle>` does not);
//! - styling properties resolve only for presentation attributes, and property
//!   names are matched ASCII case-insensitively as in CSS.
//!
//! Resolution is a pure function of the static tables in this module.

use core::fmt;

use crate::element::ElementKind;

/// Where a raw value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// A markup attribute (`fill="red"`).
    Attribute,
    /// A styling property (`style="fill: red"` or a stylesheet declaration).
    Style,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute => f.write_str("attribute"),
            Self::Style => f.write_str("style"),
        }
    }
}

/// Axis a length is measured along, used to resolve percentages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthDirection {
    /// Relative to the viewport width.
    Horizontal,
    /// Relative to the viewport height.
    Vertical,
    /// Relative to the normalized viewport diagonal.
    Other,
}

macro_rules! attribute_tags {
    ($($variant:ident => $name:literal, $presentation:literal;)*) => {
        /// Identity of one attribute meaning.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum AttributeTag {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        impl AttributeTag {
            /// Every attribute tag, in declaration order.
            pub const ALL: &'static [AttributeTag] = &[$(Self::$variant,)*];

            /// Canonical markup name.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// True when the attribute may also be supplied as a styling property.
            pub fn is_presentation(self) -> bool {
                match self {
                    $(Self::$variant => $presentation,)*
                }
            }
        }
    };
}

attribute_tags! {
    Id => "id", false;
    Class => "class", false;
    Style => "style", false;
    Transform => "transform", false;
    X => "x", false;
    Y => "y", false;
    Width => "width", false;
    Height => "height", false;
    Rx => "rx", false;
    Ry => "ry", false;
    Cx => "cx", false;
    Cy => "cy", false;
    R => "r", false;
    Fx => "fx", false;
    Fy => "fy", false;
    X1 => "x1", false;
    Y1 => "y1", false;
    X2 => "x2", false;
    Y2 => "y2", false;
    Points => "points", false;
    D => "d", false;
    ViewBox => "viewBox", false;
    PreserveAspectRatio => "preserveAspectRatio", false;
    Href => "href", false;
    Dx => "dx", false;
    Dy => "dy", false;
    Rotate => "rotate", false;
    Offset => "offset", false;
    GradientUnits => "gradientUnits", false;
    GradientTransform => "gradientTransform", false;
    SpreadMethod => "spreadMethod", false;
    PatternUnits => "patternUnits", false;
    PatternContentUnits => "patternContentUnits", false;
    PatternTransform => "patternTransform", false;
    ClipPathUnits => "clipPathUnits", false;
    MaskUnits => "maskUnits", false;
    MaskContentUnits => "maskContentUnits", false;
    RefX => "refX", false;
    RefY => "refY", false;
    MarkerWidth => "markerWidth", false;
    MarkerHeight => "markerHeight", false;
    MarkerUnits => "markerUnits", false;
    Orient => "orient", false;
    Fill => "fill", true;
    FillOpacity => "fill-opacity", true;
    FillRule => "fill-rule", true;
    Stroke => "stroke", true;
    StrokeWidth => "stroke-width", true;
    StrokeOpacity => "stroke-opacity", true;
    StrokeLinecap => "stroke-linecap", true;
    StrokeLinejoin => "stroke-linejoin", true;
    StrokeMiterlimit => "stroke-miterlimit", true;
    StrokeDasharray => "stroke-dasharray", true;
    StrokeDashoffset => "stroke-dashoffset", true;
    Opacity => "opacity", true;
    Color => "color", true;
    Display => "display", true;
    Visibility => "visibility", true;
    ClipPath => "clip-path", true;
    ClipRule => "clip-rule", true;
    Mask => "mask", true;
    Filter => "filter", true;
    MarkerStart => "marker-start", true;
    MarkerMid => "marker-mid", true;
    MarkerEnd => "marker-end", true;
    StopColor => "stop-color", true;
    StopOpacity => "stop-opacity", true;
    FontFamily => "font-family", true;
    FontSize => "font-size", true;
    FontStyle => "font-style", true;
    FontWeight => "font-weight", true;
    TextAnchor => "text-anchor", true;
}

impl AttributeTag {
    /// Tag for a markup attribute name, ignoring element applicability.
    ///
    /// `xlink:href` and `href` share [`AttributeTag::Href`].
    pub fn from_markup_name(name: &str) -> Option<Self> {
        if name == "xlink:href" {
            return Some(Self::Href);
        }
        Self::ALL.iter().copied().find(|tag| tag.name() == name)
    }

    /// Tag for a styling property name. Only presentation attributes qualify.
    pub fn from_property_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.is_presentation() && tag.name().eq_ignore_ascii_case(name))
    }

    /// True when this attribute is meaningful on `kind`.
    pub fn applies_to(self, kind: ElementKind) -> bool {
        use ElementKind as E;

        if self.is_presentation() {
            return true;
        }
        match self {
            Self::Id | Self::Class | Self::Style => true,
            Self::Transform => matches!(
                kind,
                E::G | E::Defs
                    | E::Use
                    | E::Image
                    | E::Switch
                    | E::A
                    | E::Rect
                    | E::Circle
                    | E::Ellipse
                    | E::Line
                    | E::Polyline
                    | E::Polygon
                    | E::Path
                    | E::Text
                    | E::ClipPath
            ),
            Self::X | Self::Y => matches!(
                kind,
                E::Svg
                    | E::Symbol
                    | E::Use
                    | E::Image
                    | E::Pattern
                    | E::Rect
                    | E::Text
                    | E::Tspan
                    | E::Mask
            ),
            Self::Width | Self::Height => matches!(
                kind,
                E::Svg | E::Symbol | E::Use | E::Image | E::Pattern | E::Rect | E::Mask
            ),
            Self::Rx | Self::Ry => matches!(kind, E::Rect | E::Ellipse),
            Self::Cx | Self::Cy => matches!(kind, E::Circle | E::Ellipse | E::RadialGradient),
            Self::R => matches!(kind, E::Circle | E::RadialGradient),
            Self::Fx | Self::Fy => kind == E::RadialGradient,
            Self::X1 | Self::Y1 | Self::X2 | Self::Y2 => {
                matches!(kind, E::Line | E::LinearGradient)
            }
            Self::Points => matches!(kind, E::Polyline | E::Polygon),
            Self::D => kind == E::Path,
            Self::ViewBox => matches!(
                kind,
                E::Svg | E::Symbol | E::Marker | E::Pattern | E::View
            ),
            Self::PreserveAspectRatio => matches!(
                kind,
                E::Svg | E::Symbol | E::Image | E::Marker | E::Pattern | E::View
            ),
            Self::Href => matches!(
                kind,
                E::Use
                    | E::Image
                    | E::A
                    | E::Pattern
                    | E::LinearGradient
                    | E::RadialGradient
                    | E::TextPath
            ),
            Self::Dx | Self::Dy | Self::Rotate => matches!(kind, E::Text | E::Tspan),
            Self::Offset => kind == E::Stop,
            Self::GradientUnits | Self::GradientTransform | Self::SpreadMethod => {
                matches!(kind, E::LinearGradient | E::RadialGradient)
            }
            Self::PatternUnits | Self::PatternContentUnits | Self::PatternTransform => {
                kind == E::Pattern
            }
            Self::ClipPathUnits => kind == E::ClipPath,
            Self::MaskUnits | Self::MaskContentUnits => kind == E::Mask,
            Self::RefX
            | Self::RefY
            | Self::MarkerWidth
            | Self::MarkerHeight
            | Self::MarkerUnits
            | Self::Orient => kind == E::Marker,
            _ => false,
        }
    }

    /// Axis used to resolve percentage lengths of this attribute.
    pub fn length_direction(self) -> LengthDirection {
        match self {
            Self::X
            | Self::Width
            | Self::Rx
            | Self::Cx
            | Self::Fx
            | Self::X1
            | Self::X2
            | Self::Dx
            | Self::RefX
            | Self::MarkerWidth => LengthDirection::Horizontal,
            Self::Y
            | Self::Height
            | Self::Ry
            | Self::Cy
            | Self::Fy
            | Self::Y1
            | Self::Y2
            | Self::Dy
            | Self::RefY
            | Self::MarkerHeight => LengthDirection::Vertical,
            _ => LengthDirection::Other,
        }
    }
}

impl fmt::Display for AttributeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve a raw attribute identifier for `kind` and `source`.
///
/// Returns `None` for names with no meaning on this element kind; callers
/// decide whether that is an error.
pub fn resolve_attribute(
    kind: ElementKind,
    source: ValueSource,
    raw_name: &str,
) -> Option<AttributeTag> {
    let tag = match source {
        ValueSource::Attribute => AttributeTag::from_markup_name(raw_name)?,
        ValueSource::Style => AttributeTag::from_property_name(raw_name.trim())?,
    };
    tag.applies_to(kind).then_some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_names_round_trip_for_every_tag() {
        for &tag in AttributeTag::ALL {
            assert_eq!(AttributeTag::from_markup_name(tag.name()), Some(tag));
        }
    }

    #[test]
    fn resolution_is_total_and_deterministic() {
        for kind in ElementKind::ALL {
            for &tag in AttributeTag::ALL {
                for source in [ValueSource::Attribute, ValueSource::Style] {
                    let first = resolve_attribute(kind, source, tag.name());
                    let second = resolve_attribute(kind, source, tag.name());
                    assert_eq!(first, second);
                    if let Some(resolved) = first {
                        assert_eq!(resolved, tag);
                        assert!(resolved.applies_to(kind));
                    }
                }
            }
        }
    }

    #[test]
    fn geometry_resolves_only_where_it_applies() {
        assert_eq!(
            resolve_attribute(ElementKind::Rect, ValueSource::Attribute, "rx"),
            Some(AttributeTag::Rx)
        );
        assert_eq!(
            resolve_attribute(ElementKind::Circle, ValueSource::Attribute, "rx"),
            None
        );
        assert_eq!(
            resolve_attribute(ElementKind::Svg, ValueSource::Attribute, "viewBox"),
            Some(AttributeTag::ViewBox)
        );
        assert_eq!(
            resolve_attribute(ElementKind::Rect, ValueSource::Attribute, "viewBox"),
            None
        );
    }

    #[test]
    fn xlink_href_shares_href_tag() {
        assert_eq!(
            resolve_attribute(ElementKind::Use, ValueSource::Attribute, "xlink:href"),
            Some(AttributeTag::Href)
        );
        assert_eq!(
            resolve_attribute(ElementKind::Use, ValueSource::Attribute, "href"),
            Some(AttributeTag::Href)
        );
    }

    #[test]
    fn style_source_accepts_only_presentation_properties() {
        assert_eq!(
            resolve_attribute(ElementKind::Rect, ValueSource::Style, "FILL"),
            Some(AttributeTag::Fill)
        );
        assert_eq!(
            resolve_attribute(ElementKind::Rect, ValueSource::Style, " stroke-width "),
            Some(AttributeTag::StrokeWidth)
        );
        assert_eq!(
            resolve_attribute(ElementKind::Rect, ValueSource::Style, "width"),
            None
        );
        assert_eq!(
            resolve_attribute(ElementKind::Rect, ValueSource::Attribute, "FILL"),
            None
        );
    }

    #[test]
    fn length_directions_follow_axes() {
        assert_eq!(
            AttributeTag::Width.length_direction(),
            LengthDirection::Horizontal
        );
        assert_eq!(AttributeTag::Ry.length_direction(), LengthDirection::Vertical);
        assert_eq!(AttributeTag::R.length_direction(), LengthDirection::Other);
    }
}
