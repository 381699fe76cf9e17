//! Transformation states: per-element accumulators that turn several
//! attributes into one derived artifact.
//!
//! A dispatcher owns its states in a fixed order. Each state declares the
//! attribute tags it intercepts; intercepted values are parsed and handed to
//! [`TransformationState::accept`] instead of the consumer. Finalization runs
//! once per state through [`StateSlot`], which caches the outcome so any
//! later trigger replays it without recomputing or re-emitting.

extern crate alloc;

use alloc::boxed::Box;
use core::fmt;

use crate::attribute::AttributeTag;
use crate::config::LengthFactory;
use crate::context::Context;
use crate::element::ElementKind;
use crate::error::DispatchError;
use crate::geom::Size;
use crate::value::DomainValue;

mod shape;
mod viewport;

pub use shape::{BasicShape, CollectShapeState, ShapeToPathState};
pub use viewport::{view_box_transform, ComputedViewport, ViewportOutput, ViewportState};

/// Inputs available to every state at finalization time.
#[derive(Clone, Copy, Debug)]
pub struct FinalizeEnv<'a> {
    /// Element being finalized.
    pub element: ElementKind,
    /// Unit conversion.
    pub lengths: &'a LengthFactory,
    /// Element that instantiates this content, when configured.
    pub referencing_element: Option<ElementKind>,
    /// Size supplied by the referencing element.
    pub reference_size: Option<Size>,
}

/// An accumulator owned by one dispatcher.
pub trait TransformationState: fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// True when values for `tag` belong to this state.
    fn intercepts(&self, tag: AttributeTag) -> bool;

    /// Store one intercepted value.
    fn accept(&mut self, tag: AttributeTag, value: DomainValue<'_>) -> Result<(), DispatchError>;

    /// Compute and emit the derived artifact.
    ///
    /// Called at most once; [`StateSlot`] guarantees it.
    fn finalize(
        &mut self,
        context: &mut dyn Context,
        env: &FinalizeEnv<'_>,
    ) -> Result<(), DispatchError>;
}

/// Built-in state kinds a [`Policy`](crate::Policy) plans per element kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    /// Collect basic-shape geometry into one [`BasicShape`].
    Collect,
    /// Synthesize path commands from basic-shape geometry.
    ShapeToPath {
        /// Convert only rects with rounded corners.
        rounded_only: bool,
    },
    /// Emit a computed viewport rectangle.
    ViewportRect,
    /// Emit a computed view-box transform.
    ViewportTransform,
}

impl StateKind {
    /// Tags this state kind intercepts on `element`.
    pub fn intercepted_tags(self, element: ElementKind) -> &'static [AttributeTag] {
        match self {
            Self::Collect | Self::ShapeToPath { .. } => shape::geometry_tags(element),
            Self::ViewportRect | Self::ViewportTransform => viewport::VIEWPORT_TAGS,
        }
    }

    pub(crate) fn build(self, element: ElementKind) -> Box<dyn TransformationState> {
        match self {
            Self::Collect => Box::new(CollectShapeState::new(element)),
            Self::ShapeToPath { rounded_only } => {
                Box::new(ShapeToPathState::new(element, rounded_only))
            }
            Self::ViewportRect => Box::new(ViewportState::new(ViewportOutput::Rect)),
            Self::ViewportTransform => Box::new(ViewportState::new(ViewportOutput::Transform)),
        }
    }
}

/// A state plus its cached finalization outcome.
#[derive(Debug)]
pub struct StateSlot {
    state: Box<dyn TransformationState>,
    outcome: Option<Result<(), DispatchError>>,
}

impl StateSlot {
    /// Wrap a state that has not been finalized.
    pub fn new(state: Box<dyn TransformationState>) -> Self {
        Self {
            state,
            outcome: None,
        }
    }

    /// The wrapped state.
    pub fn state(&self) -> &dyn TransformationState {
        self.state.as_ref()
    }

    /// True once finalization has run.
    pub fn is_finalized(&self) -> bool {
        self.outcome.is_some()
    }

    pub(crate) fn intercepts(&self, tag: AttributeTag) -> bool {
        self.state.intercepts(tag)
    }

    pub(crate) fn accept(
        &mut self,
        tag: AttributeTag,
        value: DomainValue<'_>,
    ) -> Result<(), DispatchError> {
        self.state.accept(tag, value)
    }

    /// Finalize the state, or replay the cached outcome.
    pub fn finalize(
        &mut self,
        context: &mut dyn Context,
        env: &FinalizeEnv<'_>,
    ) -> Result<(), DispatchError> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        let outcome = self.state.finalize(context, env);
        log::trace!(
            "finalized state={} element={} ok={}",
            self.state.name(),
            env.element,
            outcome.is_ok()
        );
        self.outcome = Some(outcome.clone());
        outcome
    }
}
