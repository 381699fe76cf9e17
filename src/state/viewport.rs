//! Viewport state for `<svg>` and `<symbol>`.
//!
//! Buffers `x`, `y`, `width`, `height`, `viewBox` and `preserveAspectRatio`,
//! then emits either the view-box to viewport transform or the computed
//! viewport rectangle.

extern crate alloc;

use alloc::format;

use svgtypes::{Align, AspectRatio, Length, LengthUnit, ViewBox};

use super::{FinalizeEnv, TransformationState};
use crate::attribute::{AttributeTag, LengthDirection};
use crate::context::Context;
use crate::error::{DispatchError, ErrorPhase};
use crate::geom::{Rect, Transform};
use crate::value::DomainValue;

pub(super) const VIEWPORT_TAGS: &[AttributeTag] = &[
    AttributeTag::X,
    AttributeTag::Y,
    AttributeTag::Width,
    AttributeTag::Height,
    AttributeTag::ViewBox,
    AttributeTag::PreserveAspectRatio,
];

const DEFAULT_ASPECT: AspectRatio = AspectRatio {
    defer: false,
    align: Align::XMidYMid,
    slice: false,
};

/// Viewport rectangle and its view-box mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComputedViewport {
    /// Viewport in the parent's user space.
    pub viewport: Rect,
    /// View box, if one was given.
    pub view_box: Option<ViewBox>,
    /// Effective aspect-ratio descriptor.
    pub aspect: AspectRatio,
    /// Maps view-box coordinates into the viewport (origin at the viewport corner).
    pub view_box_transform: Transform,
}

/// What a [`ViewportState`] emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportOutput {
    /// [`Context::viewport`]
    Rect,
    /// [`Context::transform`]
    Transform,
}

/// Accumulates viewport attributes.
#[derive(Clone, Debug)]
pub struct ViewportState {
    output: ViewportOutput,
    x: Option<Length>,
    y: Option<Length>,
    width: Option<Length>,
    height: Option<Length>,
    view_box: Option<ViewBox>,
    aspect: Option<AspectRatio>,
}

impl ViewportState {
    /// Empty state emitting `output`.
    pub fn new(output: ViewportOutput) -> Self {
        Self {
            output,
            x: None,
            y: None,
            width: None,
            height: None,
            view_box: None,
            aspect: None,
        }
    }
}

/// Transform mapping `view_box` onto a `width`×`height` viewport.
pub fn view_box_transform(
    view_box: &ViewBox,
    aspect: &AspectRatio,
    width: f64,
    height: f64,
) -> Transform {
    let mut sx = width / view_box.w;
    let mut sy = height / view_box.h;
    if aspect.align == Align::None {
        return Transform::new(sx, 0.0, 0.0, sy, -view_box.x * sx, -view_box.y * sy);
    }

    let s = if aspect.slice { sx.max(sy) } else { sx.min(sy) };
    sx = s;
    sy = s;
    let free_x = width - view_box.w * sx;
    let free_y = height - view_box.h * sy;
    let (fx, fy) = match aspect.align {
        Align::None | Align::XMinYMin => (0.0, 0.0),
        Align::XMidYMin => (0.5, 0.0),
        Align::XMaxYMin => (1.0, 0.0),
        Align::XMinYMid => (0.0, 0.5),
        Align::XMidYMid => (0.5, 0.5),
        Align::XMaxYMid => (1.0, 0.5),
        Align::XMinYMax => (0.0, 1.0),
        Align::XMidYMax => (0.5, 1.0),
        Align::XMaxYMax => (1.0, 1.0),
    };
    Transform::new(
        sx,
        0.0,
        0.0,
        sy,
        -view_box.x * sx + free_x * fx,
        -view_box.y * sy + free_y * fy,
    )
}

fn unexpected(tag: AttributeTag, value: &DomainValue<'_>) -> DispatchError {
    DispatchError::new(
        ErrorPhase::Parse,
        "VALUE_PARSE_ERROR",
        format!("unexpected {:?} for viewport", value),
    )
    .with_attribute(tag.name())
}

impl TransformationState for ViewportState {
    fn name(&self) -> &'static str {
        match self.output {
            ViewportOutput::Rect => "viewport-rect",
            ViewportOutput::Transform => "viewport-transform",
        }
    }

    fn intercepts(&self, tag: AttributeTag) -> bool {
        VIEWPORT_TAGS.contains(&tag)
    }

    fn accept(&mut self, tag: AttributeTag, value: DomainValue<'_>) -> Result<(), DispatchError> {
        match (tag, value) {
            (AttributeTag::X, DomainValue::Length(v)) => self.x = Some(v),
            (AttributeTag::Y, DomainValue::Length(v)) => self.y = Some(v),
            (AttributeTag::Width, DomainValue::Length(v)) => self.width = Some(v),
            (AttributeTag::Height, DomainValue::Length(v)) => self.height = Some(v),
            (AttributeTag::ViewBox, DomainValue::ViewBox(v)) => self.view_box = Some(v),
            (AttributeTag::PreserveAspectRatio, DomainValue::AspectRatio(v)) => {
                self.aspect = Some(v)
            }
            (tag, value) => return Err(unexpected(tag, &value)),
        }
        Ok(())
    }

    fn finalize(
        &mut self,
        context: &mut dyn Context,
        env: &FinalizeEnv<'_>,
    ) -> Result<(), DispatchError> {
        let lengths = env.lengths;
        let to_user = |length: Option<Length>, default: Length, direction| {
            lengths.to_user(length.unwrap_or(default), direction)
        };
        let zero = Length::new(0.0, LengthUnit::None);
        let full = Length::new(100.0, LengthUnit::Percent);

        let x = to_user(self.x, zero, LengthDirection::Horizontal);
        let y = to_user(self.y, zero, LengthDirection::Vertical);
        let (width, height) = match env.referencing_element {
            Some(referencing) => {
                let size = env.reference_size.ok_or_else(|| {
                    DispatchError::new(
                        ErrorPhase::Finalize,
                        "FINALIZE_MISSING_REFERENCE",
                        format!("viewport needs the size of the referencing {}", referencing),
                    )
                    .with_element(env.element)
                })?;
                (size.width, size.height)
            }
            None => (
                to_user(self.width, full, LengthDirection::Horizontal),
                to_user(self.height, full, LengthDirection::Vertical),
            ),
        };

        if width < 0.0 || height < 0.0 {
            return Err(DispatchError::new(
                ErrorPhase::Finalize,
                "VIEWPORT_NEGATIVE_SIZE",
                format!("negative viewport size {}x{}", width, height),
            )
            .with_element(env.element));
        }
        if let Some(vb) = &self.view_box {
            if vb.w <= 0.0 || vb.h <= 0.0 {
                return Err(DispatchError::new(
                    ErrorPhase::Finalize,
                    "VIEWBOX_INVALID",
                    format!("view box size {}x{} is not positive", vb.w, vb.h),
                )
                .with_element(env.element)
                .with_attribute(AttributeTag::ViewBox.name()));
            }
        }

        let aspect = self.aspect.unwrap_or(DEFAULT_ASPECT);
        let disabled = width == 0.0 || height == 0.0;
        let view_box_transform = match &self.view_box {
            Some(vb) if !disabled => view_box_transform(vb, &aspect, width, height),
            _ => Transform::IDENTITY,
        };

        match self.output {
            ViewportOutput::Transform => {
                if disabled {
                    log::debug!("{} viewport has zero size, not rendered", env.element);
                    return Ok(());
                }
                context.transform(view_box_transform.then(Transform::translate(x, y)));
            }
            ViewportOutput::Rect => context.viewport(ComputedViewport {
                viewport: Rect::new(x, y, width, height),
                view_box: self.view_box,
                aspect,
                view_box_transform,
            }),
        }
        Ok(())
    }
}
