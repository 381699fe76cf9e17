//! Dispatch configuration: attribute sets, shape/viewport switches and lengths.
//!
//! A [`DispatchConfig`] is plain data. It is validated and compiled into a
//! [`Policy`](crate::Policy) exactly once, before any element is dispatched.

extern crate alloc;

use alloc::vec::Vec;

use crate::attribute::{AttributeTag, LengthDirection};
use crate::element::ElementKind;

/// Matches an attribute either on every element kind or on one kind only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeSelector {
    /// The tag on any element.
    Any(AttributeTag),
    /// The tag on one element kind. Checked before [`AttributeSelector::Any`].
    On(ElementKind, AttributeTag),
}

impl AttributeSelector {
    pub(crate) fn matches_pair(self, kind: ElementKind, tag: AttributeTag) -> bool {
        matches!(self, Self::On(k, t) if k == kind && t == tag)
    }

    pub(crate) fn matches_tag(self, tag: AttributeTag) -> bool {
        matches!(self, Self::Any(t) if t == tag)
    }
}

/// How basic shapes are handed to the consumer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasicShapesPolicy {
    /// Shapes synthesized into path commands instead of forwarding their attributes.
    pub convert_to_path: Vec<ElementKind>,
    /// Shapes whose geometry is collected and emitted as one [`BasicShape`](crate::BasicShape).
    ///
    /// Ignored for kinds listed in `convert_to_path`.
    pub collect_attributes: Vec<ElementKind>,
    /// Convert only rects with non-zero corner radii; square rects are collected.
    pub convert_only_rounded_rect_to_path: bool,
}

impl BasicShapesPolicy {
    /// Convert every basic shape to a path.
    pub fn convert_all() -> Self {
        Self {
            convert_to_path: ElementKind::ALL
                .iter()
                .copied()
                .filter(|kind| kind.is_basic_shape())
                .collect(),
            ..Self::default()
        }
    }

    /// Collect every basic shape's geometry.
    pub fn collect_all() -> Self {
        Self {
            collect_attributes: ElementKind::ALL
                .iter()
                .copied()
                .filter(|kind| kind.is_basic_shape())
                .collect(),
            ..Self::default()
        }
    }
}

/// What svg/symbol viewport attributes turn into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewportMode {
    /// Forward viewport attributes like any other attribute.
    #[default]
    Passthrough,
    /// Emit one computed viewport rectangle with its view-box mapping.
    Calculate,
    /// Emit one transform mapping view-box space to viewport space.
    AsTransform,
}

/// Converts lengths with units into user units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthFactory {
    /// Width that horizontal percentages resolve against.
    pub viewport_width: f64,
    /// Height that vertical percentages resolve against.
    pub viewport_height: f64,
    /// Font size for `em` units.
    pub font_size: f64,
    /// x-height for `ex` units.
    pub x_height: f64,
    /// Device resolution for absolute units.
    pub dpi: f64,
}

impl Default for LengthFactory {
    fn default() -> Self {
        Self {
            viewport_width: 100.0,
            viewport_height: 100.0,
            font_size: 16.0,
            x_height: 8.0,
            dpi: 96.0,
        }
    }
}

impl LengthFactory {
    /// Factory whose percentages resolve against a `width`×`height` viewport.
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Convert `length` to user units along `direction`.
    pub fn to_user(&self, length: svgtypes::Length, direction: LengthDirection) -> f64 {
        use svgtypes::LengthUnit as U;

        let n = length.number;
        match length.unit {
            U::None | U::Px => n,
            U::Em => n * self.font_size,
            U::Ex => n * self.x_height,
            U::In => n * self.dpi,
            U::Cm => n * self.dpi / 2.54,
            U::Mm => n * self.dpi / 25.4,
            U::Pt => n * self.dpi / 72.0,
            U::Pc => n * self.dpi / 6.0,
            U::Percent => {
                let reference = match direction {
                    LengthDirection::Horizontal => self.viewport_width,
                    LengthDirection::Vertical => self.viewport_height,
                    LengthDirection::Other => {
                        let w = self.viewport_width;
                        let h = self.viewport_height;
                        ((w * w + h * h) / 2.0).sqrt()
                    }
                };
                n / 100.0 * reference
            }
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        [
            self.viewport_width,
            self.viewport_height,
            self.font_size,
            self.x_height,
            self.dpi,
        ]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Static dispatch configuration, resolved once ahead of any dispatch.
///
/// Defaults process every known attribute, parse every attribute that has a
/// grammar, forward basic shapes and viewports attribute by attribute, and use
/// a 100×100 viewport at 96 DPI for length conversion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchConfig {
    /// Attributes never handed to the consumer. Must be empty if `processed` is not.
    pub ignored: Vec<AttributeSelector>,
    /// When non-empty, the only attributes handed to the consumer.
    pub processed: Vec<AttributeSelector>,
    /// Attributes forwarded as raw text even if a grammar exists.
    pub passthrough: Vec<AttributeSelector>,
    /// Basic-shape conversion and collection switches.
    pub basic_shapes: BasicShapesPolicy,
    /// Viewport handling for svg and symbol.
    pub viewport: ViewportMode,
    /// Element that instantiates svg/symbol content (typically `use`).
    ///
    /// When set, viewport computation needs a reference size from the caller.
    pub referencing_element: Option<ElementKind>,
    /// Unit conversion used by transformation states.
    pub lengths: LengthFactory,
}

impl DispatchConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ignored attribute set.
    pub fn with_ignored(mut self, ignored: impl IntoIterator<Item = AttributeSelector>) -> Self {
        self.ignored = ignored.into_iter().collect();
        self
    }

    /// Replace the processed attribute set.
    pub fn with_processed(
        mut self,
        processed: impl IntoIterator<Item = AttributeSelector>,
    ) -> Self {
        self.processed = processed.into_iter().collect();
        self
    }

    /// Replace the passthrough attribute set.
    pub fn with_passthrough(
        mut self,
        passthrough: impl IntoIterator<Item = AttributeSelector>,
    ) -> Self {
        self.passthrough = passthrough.into_iter().collect();
        self
    }

    /// Override basic-shape handling.
    pub fn with_basic_shapes(mut self, basic_shapes: BasicShapesPolicy) -> Self {
        self.basic_shapes = basic_shapes;
        self
    }

    /// Override viewport handling.
    pub fn with_viewport(mut self, viewport: ViewportMode) -> Self {
        self.viewport = viewport;
        self
    }

    /// Declare the element that references svg/symbol content.
    pub fn with_referencing_element(mut self, element: ElementKind) -> Self {
        self.referencing_element = Some(element);
        self
    }

    /// Override length conversion.
    pub fn with_lengths(mut self, lengths: LengthFactory) -> Self {
        self.lengths = lengths;
        self
    }
}
