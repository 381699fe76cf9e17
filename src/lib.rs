//! Streaming attribute interpreter for SVG element events.
//!
//! `svg-stream` turns `(element kind, attribute name, raw value)` events into
//! typed values and derived artifacts without building a tree:
//!
//! - [`resolve_attribute`] maps a raw name to an [`AttributeTag`] for one
//!   element kind and value source;
//! - [`Policy`] compiles a [`DispatchConfig`] once into per-pair handlers and
//!   per-kind transformation-state plans;
//! - [`parse_value`] runs the value grammar for an attribute's static type;
//! - [`AttributeDispatcher`] routes one element's attributes to the consumer
//!   ([`Context`]) or to transformation states, and finalizes them exactly once.
//!
//! With the default `xml` feature, [`DocumentDriver`] reads a whole document
//! with `quick-xml` and drives one dispatcher per element.
//!
//! ```
//! use svg_stream::{AttributeDispatcher, DispatchConfig, ElementKind, Policy, Recorder};
//! use svg_stream::{BasicShapesPolicy, ValueSource};
//!
//! let config = DispatchConfig::new().with_basic_shapes(BasicShapesPolicy::convert_all());
//! let policy = Policy::new(config).expect("valid config");
//! let mut recorder = Recorder::new();
//! let mut dispatcher = AttributeDispatcher::new(ElementKind::Rect, &policy, &mut recorder);
//! dispatcher.load_attribute("width", "10", ValueSource::Attribute).expect("width");
//! dispatcher.load_attribute("height", "5", ValueSource::Attribute).expect("height");
//! dispatcher.end_of_attributes().expect("finalize");
//! assert_eq!(recorder.path_commands().count(), 5);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod attribute;
pub mod config;
pub mod context;
pub mod dispatcher;
#[cfg(feature = "xml")]
#[cfg_attr(docsrs, doc(cfg(feature = "xml")))]
pub mod driver;
pub mod element;
pub mod error;
pub mod geom;
pub mod policy;
pub mod reference;
pub mod state;
pub mod value;

pub use attribute::{resolve_attribute, AttributeTag, LengthDirection, ValueSource};
pub use config::{
    AttributeSelector, BasicShapesPolicy, DispatchConfig, LengthFactory, ViewportMode,
};
pub use context::{Context, Notification, Output, Recorder};
pub use dispatcher::{AttributeDispatcher, DispatchState};
#[cfg(feature = "xml")]
pub use driver::{DocumentDriver, DocumentSummary, DriverLimits};
pub use element::{DispatchStrategy, ElementKind};
pub use error::{
    DefaultErrorPolicy, DispatchError, DispatchErrorContext, ErrorPhase, ErrorPolicy,
    LenientErrorPolicy, Recovery, StrictErrorPolicy,
};
pub use geom::{PathCommand, Rect, Size, Transform};
pub use policy::{Handler, Policy, ValueMode};
pub use reference::{Reference, ReferenceForm, ReferenceMatch};
pub use state::{
    BasicShape, ComputedViewport, FinalizeEnv, StateKind, StateSlot, TransformationState,
    ViewportOutput,
};
pub use value::{
    parse_typed, parse_value, value_type, DomainValue, OwnedReference, Paint, PaintFallback,
    ParseFailure, ValueType,
};
