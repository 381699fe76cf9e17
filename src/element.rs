//! Element kinds and their dispatch strategies.

use core::fmt;

/// Identity of a markup element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    /// `<svg>`
    Svg,
    /// `<g>`
    G,
    /// `<defs>`
    Defs,
    /// `<symbol>`
    Symbol,
    /// `<use>`
    Use,
    /// `<image>`
    Image,
    /// `<switch>`
    Switch,
    /// `<a>`
    A,
    /// `<marker>`
    Marker,
    /// `<pattern>`
    Pattern,
    /// `<view>`
    View,
    /// `<rect>`
    Rect,
    /// `<circle>`
    Circle,
    /// `<ellipse>`
    Ellipse,
    /// `<line>`
    Line,
    /// `<polyline>`
    Polyline,
    /// `<polygon>`
    Polygon,
    /// `<path>`
    Path,
    /// `<text>`
    Text,
    /// `<tspan>`
    Tspan,
    /// `<textPath>`
    TextPath,
    /// `<linearGradient>`
    LinearGradient,
    /// `<radialGradient>`
    RadialGradient,
    /// `<stop>`
    Stop,
    /// `<clipPath>`
    ClipPath,
    /// `<mask>`
    Mask,
    /// `<title>`
    Title,
    /// `<desc>`
    Desc,
    /// `<style>`
    Style,
}

/// Dispatcher variant selected once per element kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// Attributes go straight to the value parsers or the consumer.
    Plain,
    /// Element establishes a viewport (svg, symbol).
    Viewport,
    /// Element is a basic shape that may be collected or converted to a path.
    BasicShape,
}

impl ElementKind {
    /// Every element kind, in declaration order.
    pub const ALL: [ElementKind; 29] = [
        Self::Svg,
        Self::G,
        Self::Defs,
        Self::Symbol,
        Self::Use,
        Self::Image,
        Self::Switch,
        Self::A,
        Self::Marker,
        Self::Pattern,
        Self::View,
        Self::Rect,
        Self::Circle,
        Self::Ellipse,
        Self::Line,
        Self::Polyline,
        Self::Polygon,
        Self::Path,
        Self::Text,
        Self::Tspan,
        Self::TextPath,
        Self::LinearGradient,
        Self::RadialGradient,
        Self::Stop,
        Self::ClipPath,
        Self::Mask,
        Self::Title,
        Self::Desc,
        Self::Style,
    ];

    /// Element kind for a local (unprefixed) element name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "svg" => Self::Svg,
            "g" => Self::G,
            "defs" => Self::Defs,
            "symbol" => Self::Symbol,
            "use" => Self::Use,
            "image" => Self::Image,
            "switch" => Self::Switch,
            "a" => Self::A,
            "marker" => Self::Marker,
            "pattern" => Self::Pattern,
            "view" => Self::View,
            "rect" => Self::Rect,
            "circle" => Self::Circle,
            "ellipse" => Self::Ellipse,
            "line" => Self::Line,
            "polyline" => Self::Polyline,
            "polygon" => Self::Polygon,
            "path" => Self::Path,
            "text" => Self::Text,
            "tspan" => Self::Tspan,
            "textPath" => Self::TextPath,
            "linearGradient" => Self::LinearGradient,
            "radialGradient" => Self::RadialGradient,
            "stop" => Self::Stop,
            "clipPath" => Self::ClipPath,
            "mask" => Self::Mask,
            "title" => Self::Title,
            "desc" => Self::Desc,
            "style" => Self::Style,
            _ => return None,
        };
        Some(kind)
    }

    /// Markup name of this element.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::G => "g",
            Self::Defs => "defs",
            Self::Symbol => "symbol",
            Self::Use => "use",
            Self::Image => "image",
            Self::Switch => "switch",
            Self::A => "a",
            Self::Marker => "marker",
            Self::Pattern => "pattern",
            Self::View => "view",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Line => "line",
            Self::Polyline => "polyline",
            Self::Polygon => "polygon",
            Self::Path => "path",
            Self::Text => "text",
            Self::Tspan => "tspan",
            Self::TextPath => "textPath",
            Self::LinearGradient => "linearGradient",
            Self::RadialGradient => "radialGradient",
            Self::Stop => "stop",
            Self::ClipPath => "clipPath",
            Self::Mask => "mask",
            Self::Title => "title",
            Self::Desc => "desc",
            Self::Style => "style",
        }
    }

    /// Dispatcher variant used for this element kind.
    pub fn strategy(self) -> DispatchStrategy {
        match self {
            Self::Svg | Self::Symbol => DispatchStrategy::Viewport,
            Self::Rect
            | Self::Circle
            | Self::Ellipse
            | Self::Line
            | Self::Polyline
            | Self::Polygon => DispatchStrategy::BasicShape,
            _ => DispatchStrategy::Plain,
        }
    }

    /// True for rect, circle, ellipse, line, polyline and polygon.
    pub fn is_basic_shape(self) -> bool {
        self.strategy() == DispatchStrategy::BasicShape
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
