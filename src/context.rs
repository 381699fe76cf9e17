//! Downstream consumer interface and a recording implementation.

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

use crate::attribute::{AttributeTag, ValueSource};
use crate::element::ElementKind;
use crate::geom::{PathCommand, Transform};
use crate::state::{BasicShape, ComputedViewport};
use crate::value::DomainValue;

/// Cross-cutting event routed through a dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Viewport attributes are complete; finalize before children are visited.
    ///
    /// Consumed by the dispatcher, never forwarded.
    AfterViewportAttributes,
    /// Opaque event forwarded to the consumer unchanged.
    Custom(&'static str),
}

/// Receives parsed values and derived artifacts.
///
/// Values borrow from the raw attribute text; call
/// [`DomainValue::into_owned`] to keep them past the call.
pub trait Context {
    /// A parsed or passthrough attribute value.
    fn set_value(&mut self, tag: AttributeTag, value: DomainValue<'_>, source: ValueSource);

    /// One synthesized path command.
    fn path_command(&mut self, command: PathCommand);

    /// End of a synthesized path.
    fn path_end(&mut self) {}

    /// Computed view-box to viewport transform.
    fn transform(&mut self, transform: Transform);

    /// Computed viewport rectangle.
    fn viewport(&mut self, viewport: ComputedViewport);

    /// Collected basic-shape geometry.
    fn shape(&mut self, shape: BasicShape);

    /// Forwarded notification.
    fn notify(&mut self, _notification: Notification) {}

    /// An element starts; emitted by the document driver.
    fn enter_element(&mut self, _kind: ElementKind) {}

    /// An element ends; emitted by the document driver.
    fn exit_element(&mut self, _kind: ElementKind) {}
}

/// One call received by a [`Recorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    /// `enter_element`
    Enter(ElementKind),
    /// `exit_element`
    Exit(ElementKind),
    /// `set_value`
    Value {
        /// Attribute tag.
        tag: AttributeTag,
        /// Detached value.
        value: DomainValue<'static>,
        /// Provenance.
        source: ValueSource,
    },
    /// `path_command`
    PathCommand(PathCommand),
    /// `path_end`
    PathEnd,
    /// `transform`
    Transform(Transform),
    /// `viewport`
    Viewport(ComputedViewport),
    /// `shape`
    Shape(BasicShape),
    /// `notify`
    Notify(Notification),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter(kind) => write!(f, "enter {}", kind),
            Self::Exit(kind) => write!(f, "exit {}", kind),
            Self::Value { tag, value, source } => write!(f, "{} = {:?} ({})", tag, value, source),
            Self::PathCommand(command) => write!(f, "path {:?}", command),
            Self::PathEnd => f.write_str("path end"),
            Self::Transform(ts) => write!(
                f,
                "transform matrix({} {} {} {} {} {})",
                ts.a, ts.b, ts.c, ts.d, ts.e, ts.f
            ),
            Self::Viewport(viewport) => write!(f, "viewport {:?}", viewport),
            Self::Shape(shape) => write!(f, "shape {:?}", shape),
            Self::Notify(notification) => write!(f, "notify {:?}", notification),
        }
    }
}

/// [`Context`] that stores every call in order.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    /// Calls received so far.
    pub outputs: Vec<Output>,
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of computed transforms received.
    pub fn transform_count(&self) -> usize {
        self.outputs
            .iter()
            .filter(|output| matches!(output, Output::Transform(_)))
            .count()
    }

    /// Synthesized path commands, in order.
    pub fn path_commands(&self) -> impl Iterator<Item = &PathCommand> + '_ {
        self.outputs.iter().filter_map(|output| match output {
            Output::PathCommand(command) => Some(command),
            _ => None,
        })
    }

    /// Last value received for `tag`.
    pub fn value(&self, tag: AttributeTag) -> Option<&DomainValue<'static>> {
        self.outputs.iter().rev().find_map(|output| match output {
            Output::Value { tag: t, value, .. } if *t == tag => Some(value),
            _ => None,
        })
    }
}

impl Context for Recorder {
    fn set_value(&mut self, tag: AttributeTag, value: DomainValue<'_>, source: ValueSource) {
        self.outputs.push(Output::Value {
            tag,
            value: value.into_owned(),
            source,
        });
    }

    fn path_command(&mut self, command: PathCommand) {
        self.outputs.push(Output::PathCommand(command));
    }

    fn path_end(&mut self) {
        self.outputs.push(Output::PathEnd);
    }

    fn transform(&mut self, transform: Transform) {
        self.outputs.push(Output::Transform(transform));
    }

    fn viewport(&mut self, viewport: ComputedViewport) {
        self.outputs.push(Output::Viewport(viewport));
    }

    fn shape(&mut self, shape: BasicShape) {
        self.outputs.push(Output::Shape(shape));
    }

    fn notify(&mut self, notification: Notification) {
        self.outputs.push(Output::Notify(notification));
    }

    fn enter_element(&mut self, kind: ElementKind) {
        self.outputs.push(Output::Enter(kind));
    }

    fn exit_element(&mut self, kind: ElementKind) {
        self.outputs.push(Output::Exit(kind));
    }
}
