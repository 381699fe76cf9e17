//! Per-element dispatcher: routes attribute events and owns finalization.
//!
//! One [`AttributeDispatcher`] exists per element instance. It starts in
//! [`DispatchState::Accepting`], takes zero or more attribute events, and moves
//! to [`DispatchState::Finalized`] on the first of
//! [`notify_early_finalization`](AttributeDispatcher::notify_early_finalization)
//! or [`end_of_attributes`](AttributeDispatcher::end_of_attributes). The
//! finalization outcome is cached; later triggers replay it.

extern crate alloc;

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::ToString;

use smallvec::SmallVec;

use crate::attribute::{resolve_attribute, AttributeTag, ValueSource};
use crate::context::{Context, Notification};
use crate::element::ElementKind;
use crate::error::{DefaultErrorPolicy, DispatchError, ErrorPhase, ErrorPolicy, Recovery};
use crate::geom::Size;
use crate::policy::{Handler, Policy};
use crate::state::{FinalizeEnv, StateSlot, TransformationState};
use crate::value::{parse_tagged, DomainValue, ValueType};

static DEFAULT_ERROR_POLICY: DefaultErrorPolicy = DefaultErrorPolicy;

/// Lifecycle of one dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    /// Attribute events are accepted.
    Accepting,
    /// Finalization ran; only replays remain.
    Finalized,
}

/// Coordinates attribute handling for one element instance.
pub struct AttributeDispatcher<'p, 'c> {
    kind: ElementKind,
    policy: &'p Policy,
    context: &'c mut dyn Context,
    error_policy: &'p dyn ErrorPolicy,
    states: SmallVec<[StateSlot; 2]>,
    reference_size: Option<Size>,
    outcome: Option<Result<(), DispatchError>>,
}

impl<'p, 'c> AttributeDispatcher<'p, 'c> {
    /// Dispatcher for one `kind` element, with the states `policy` plans for it.
    pub fn new(kind: ElementKind, policy: &'p Policy, context: &'c mut dyn Context) -> Self {
        let states = policy
            .states_for(kind)
            .iter()
            .map(|state| StateSlot::new(state.build(kind)))
            .collect();
        Self {
            kind,
            policy,
            context,
            error_policy: &DEFAULT_ERROR_POLICY,
            states,
            reference_size: None,
            outcome: None,
        }
    }

    /// Replace the error policy consulted on unknown attributes and bad values.
    pub fn with_error_policy(mut self, error_policy: &'p dyn ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Append a custom state after the planned ones.
    pub fn with_state(mut self, state: Box<dyn TransformationState>) -> Self {
        self.states.push(StateSlot::new(state));
        self
    }

    /// Supply the referencing element's size for viewport computation.
    pub fn set_reference_size(&mut self, size: Size) {
        if self.outcome.is_some() {
            log::warn!("reference size for {} arrived after finalization", self.kind);
        }
        self.reference_size = Some(size);
    }

    /// Element kind being dispatched.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatchState {
        if self.outcome.is_some() {
            DispatchState::Finalized
        } else {
            DispatchState::Accepting
        }
    }

    /// Handle one attribute event.
    ///
    /// Errors never change the lifecycle state: the element can still be
    /// finalized with the attributes accepted so far.
    pub fn load_attribute(
        &mut self,
        raw_name: &str,
        raw_value: &str,
        source: ValueSource,
    ) -> Result<(), DispatchError> {
        if self.outcome.is_some() {
            log::warn!("attribute {} on finalized {}", raw_name, self.kind);
            return Err(DispatchError::new(
                ErrorPhase::Dispatch,
                "DISPATCH_FINALIZED",
                "attribute received after finalization",
            )
            .with_element(self.kind)
            .with_attribute(raw_name));
        }

        let Some(tag) = resolve_attribute(self.kind, source, raw_name) else {
            let err = DispatchError::new(
                ErrorPhase::Resolve,
                "ATTRIBUTE_UNKNOWN",
                format!("no {} '{}' on {}", source, raw_name, self.kind),
            )
            .with_element(self.kind)
            .with_attribute(raw_name)
            .with_source(source);
            let decision = self.error_policy.on_unknown_attribute(&err);
            if decision == Recovery::Continue {
                log::debug!("ignoring unknown {} '{}' on {}", source, raw_name, self.kind);
                return Ok(());
            }
            return Err(err);
        };

        let handler = self.policy.handler(self.kind, tag);
        log::trace!("{} {} -> {:?}", self.kind, tag, handler);
        match handler {
            Handler::Skip => Ok(()),
            Handler::Passthrough => {
                self.context
                    .set_value(tag, DomainValue::Raw(Cow::Borrowed(raw_value)), source);
                Ok(())
            }
            Handler::Parse(ty) | Handler::Intercept(ty) => {
                self.parse_and_route(tag, ty, raw_name, raw_value, source)
            }
        }
    }

    fn parse_and_route(
        &mut self,
        tag: AttributeTag,
        ty: ValueType,
        raw_name: &str,
        raw_value: &str,
        source: ValueSource,
    ) -> Result<(), DispatchError> {
        let value = match parse_tagged(tag, ty, raw_value) {
            Ok(value) => value,
            Err(failure) => {
                let err = DispatchError::new(
                    ErrorPhase::Parse,
                    "VALUE_PARSE_ERROR",
                    failure.to_string(),
                )
                .with_element(self.kind)
                .with_attribute(raw_name)
                .with_value(raw_value)
                .with_source(source);
                return self.recover_parse(err);
            }
        };

        match self.states.iter_mut().find(|slot| slot.intercepts(tag)) {
            Some(slot) => match slot.accept(tag, value) {
                Ok(()) => Ok(()),
                Err(err) => {
                    let err = err.with_element(self.kind).with_value(raw_value);
                    self.recover_parse(err)
                }
            },
            None => {
                self.context.set_value(tag, value, source);
                Ok(())
            }
        }
    }

    fn recover_parse(&self, err: DispatchError) -> Result<(), DispatchError> {
        match self.error_policy.on_parse_failure(&err) {
            Recovery::Continue => {
                log::warn!("dropping attribute: {}", err);
                Ok(())
            }
            Recovery::Fail => Err(err),
        }
    }

    /// Finalize now, ahead of the end-of-attributes event.
    pub fn notify_early_finalization(&mut self) -> Result<(), DispatchError> {
        self.finalize("early")
    }

    /// Finalize at the natural end of the element's attributes.
    ///
    /// A no-op replaying the cached outcome if finalization already ran.
    pub fn end_of_attributes(&mut self) -> Result<(), DispatchError> {
        self.finalize("end-of-attributes")
    }

    /// Handle a cross-cutting notification.
    ///
    /// [`Notification::AfterViewportAttributes`] triggers early finalization;
    /// anything else is forwarded to the consumer.
    pub fn notify(&mut self, notification: Notification) -> Result<(), DispatchError> {
        match notification {
            Notification::AfterViewportAttributes => self.notify_early_finalization(),
            other => {
                self.context.notify(other);
                Ok(())
            }
        }
    }

    fn finalize(&mut self, trigger: &'static str) -> Result<(), DispatchError> {
        if let Some(outcome) = &self.outcome {
            log::trace!("{} already finalized, {} replays", self.kind, trigger);
            return outcome.clone();
        }
        log::trace!("finalizing {} via {}", self.kind, trigger);

        let env = FinalizeEnv {
            element: self.kind,
            lengths: self.policy.lengths(),
            referencing_element: self.policy.referencing_element(),
            reference_size: self.reference_size,
        };
        let mut first_error = None;
        for slot in self.states.iter_mut() {
            if let Err(err) = slot.finalize(&mut *self.context, &env) {
                first_error.get_or_insert(err);
            }
        }
        let outcome = match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        };
        self.outcome = Some(outcome.clone());
        outcome
    }
}

impl core::fmt::Debug for AttributeDispatcher<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttributeDispatcher")
            .field("kind", &self.kind)
            .field("states", &self.states)
            .field("reference_size", &self.reference_size)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AttributeSelector, BasicShapesPolicy, DispatchConfig, ViewportMode};
    use crate::context::{Output, Recorder};
    use crate::error::{LenientErrorPolicy, StrictErrorPolicy};
    use crate::geom::{PathCommand, Transform};
    use crate::reference::ReferenceForm;
    use crate::value::OwnedReference;

    fn policy(config: DispatchConfig) -> Policy {
        Policy::new(config).expect("valid config")
    }

    #[test]
    fn parsed_and_passthrough_values_reach_consumer_with_source() {
        let policy = policy(DispatchConfig::new());
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::Rect, &policy, &mut recorder);
        dispatcher
            .load_attribute("id", "r1", ValueSource::Attribute)
            .expect("id");
        dispatcher
            .load_attribute("fill-opacity", "0.5", ValueSource::Style)
            .expect("style");
        dispatcher.end_of_attributes().expect("finalize");
        assert_eq!(
            recorder.outputs,
            vec![
                Output::Value {
                    tag: AttributeTag::Id,
                    value: DomainValue::Raw(Cow::Owned("r1".into())),
                    source: ValueSource::Attribute,
                },
                Output::Value {
                    tag: AttributeTag::FillOpacity,
                    value: DomainValue::Number(0.5),
                    source: ValueSource::Style,
                },
            ]
        );
    }

    #[test]
    fn unknown_attribute_follows_error_policy() {
        let policy = policy(DispatchConfig::new());
        let mut recorder = Recorder::new();
        {
            let mut dispatcher =
                AttributeDispatcher::new(ElementKind::Circle, &policy, &mut recorder);
            dispatcher
                .load_attribute("rx", "1", ValueSource::Attribute)
                .expect("default policy continues");
        }
        {
            let mut dispatcher =
                AttributeDispatcher::new(ElementKind::Circle, &policy, &mut recorder)
                    .with_error_policy(&StrictErrorPolicy);
            let err = dispatcher
                .load_attribute("rx", "1", ValueSource::Attribute)
                .expect_err("strict fails");
            assert_eq!(err.code, "ATTRIBUTE_UNKNOWN");
            assert_eq!(dispatcher.state(), DispatchState::Accepting);
        }
        assert!(recorder.outputs.is_empty());
    }

    #[test]
    fn partial_reference_match_invokes_error_policy() {
        let policy = policy(DispatchConfig::new());
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::Use, &policy, &mut recorder);
        let err = dispatcher
            .load_attribute("xlink:href", "#frag extra", ValueSource::Attribute)
            .expect_err("partial match");
        assert_eq!(err.code, "VALUE_PARSE_ERROR");
        assert_eq!(
            err.context.as_ref().and_then(|ctx| ctx.value.as_deref()),
            Some("#frag extra")
        );
        dispatcher
            .load_attribute("href", "#frag", ValueSource::Attribute)
            .expect("full match");
        dispatcher.end_of_attributes().expect("finalize");
        assert_eq!(
            recorder.value(AttributeTag::Href),
            Some(&DomainValue::OwnedReference(OwnedReference {
                iri: "#frag".into(),
                form: ReferenceForm::Iri,
            }))
        );
    }

    #[test]
    fn bad_value_does_not_disturb_siblings() {
        let policy = policy(DispatchConfig::new());
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::Rect, &policy, &mut recorder)
            .with_error_policy(&LenientErrorPolicy);
        dispatcher
            .load_attribute("width", "wide", ValueSource::Attribute)
            .expect("lenient");
        dispatcher
            .load_attribute("height", "5", ValueSource::Attribute)
            .expect("height");
        dispatcher.end_of_attributes().expect("finalize");
        assert_eq!(recorder.outputs.len(), 1);
        assert!(recorder.value(AttributeTag::Height).is_some());
    }

    #[test]
    fn finalization_is_idempotent_across_triggers() {
        let policy = policy(DispatchConfig::new().with_viewport(ViewportMode::AsTransform));
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::Svg, &policy, &mut recorder);
        for (name, value) in [("width", "100"), ("height", "50"), ("viewBox", "0 0 200 100")] {
            dispatcher
                .load_attribute(name, value, ValueSource::Attribute)
                .expect("attribute");
        }
        dispatcher
            .notify(Notification::AfterViewportAttributes)
            .expect("early");
        assert_eq!(dispatcher.state(), DispatchState::Finalized);
        dispatcher.end_of_attributes().expect("replay");
        let err = dispatcher
            .load_attribute("x", "1", ValueSource::Attribute)
            .expect_err("finalized");
        assert_eq!(err.code, "DISPATCH_FINALIZED");
        assert_eq!(recorder.transform_count(), 1);
        assert_eq!(
            recorder.outputs,
            vec![Output::Transform(Transform::new(0.5, 0.0, 0.0, 0.5, 0.0, 0.0))]
        );
    }

    #[test]
    fn failed_finalization_is_replayed() {
        let policy = policy(
            DispatchConfig::new()
                .with_viewport(ViewportMode::Calculate)
                .with_referencing_element(ElementKind::Use),
        );
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::Symbol, &policy, &mut recorder);
        let first = dispatcher.notify_early_finalization();
        let second = dispatcher.end_of_attributes();
        assert_eq!(
            first.as_ref().map_err(|err| err.code),
            Err("FINALIZE_MISSING_REFERENCE")
        );
        assert_eq!(first, second);
    }

    #[test]
    fn reference_size_satisfies_viewport() {
        let policy = policy(
            DispatchConfig::new()
                .with_viewport(ViewportMode::AsTransform)
                .with_referencing_element(ElementKind::Use),
        );
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::Symbol, &policy, &mut recorder);
        dispatcher
            .load_attribute("viewBox", "0 0 10 10", ValueSource::Attribute)
            .expect("viewBox");
        dispatcher.set_reference_size(Size::new(20.0, 20.0));
        dispatcher.end_of_attributes().expect("finalize");
        assert_eq!(
            recorder.outputs,
            vec![Output::Transform(Transform::scale(2.0, 2.0))]
        );
    }

    #[test]
    fn custom_notifications_are_forwarded() {
        let policy = policy(DispatchConfig::new());
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::G, &policy, &mut recorder);
        dispatcher
            .notify(Notification::Custom("before-children"))
            .expect("forward");
        assert_eq!(dispatcher.state(), DispatchState::Accepting);
        assert_eq!(
            recorder.outputs,
            vec![Output::Notify(Notification::Custom("before-children"))]
        );
    }

    #[test]
    fn shape_attributes_are_intercepted_not_forwarded() {
        let policy =
            policy(DispatchConfig::new().with_basic_shapes(BasicShapesPolicy::convert_all()));
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::Line, &policy, &mut recorder);
        let attributes = [
            ("x1", "1"),
            ("y1", "2"),
            ("x2", "3"),
            ("y2", "4"),
            ("stroke", "red"),
        ];
        for (name, value) in attributes {
            dispatcher
                .load_attribute(name, value, ValueSource::Attribute)
                .expect("attribute");
        }
        dispatcher.end_of_attributes().expect("finalize");
        assert_eq!(recorder.outputs.len(), 4);
        assert!(recorder.value(AttributeTag::Stroke).is_some());
        assert_eq!(
            recorder.path_commands().copied().collect::<Vec<_>>(),
            vec![
                PathCommand::MoveTo { x: 1.0, y: 2.0 },
                PathCommand::LineTo { x: 3.0, y: 4.0 },
            ]
        );
    }

    #[test]
    fn skipped_attributes_never_reach_consumer() {
        let policy = policy(
            DispatchConfig::new().with_ignored([AttributeSelector::Any(AttributeTag::Fill)]),
        );
        let mut recorder = Recorder::new();
        let mut dispatcher = AttributeDispatcher::new(ElementKind::Path, &policy, &mut recorder);
        dispatcher
            .load_attribute("fill", "not a paint", ValueSource::Attribute)
            .expect("skipped before parsing");
        dispatcher.end_of_attributes().expect("finalize");
        assert!(recorder.outputs.is_empty());
    }
}
