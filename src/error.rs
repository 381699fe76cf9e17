//! Structured dispatch errors and the pluggable error policy.

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::attribute::ValueSource;
use crate::element::ElementKind;

/// Pipeline phase where an error originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorPhase {
    /// Policy construction and validation.
    Config,
    /// Attribute tag resolution.
    Resolve,
    /// Value grammar parsing.
    Parse,
    /// Transformation state finalization.
    Finalize,
    /// Dispatcher lifecycle misuse.
    Dispatch,
    /// Markup tokenization in the document driver.
    Tokenize,
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Resolve => "resolve",
            Self::Parse => "parse",
            Self::Finalize => "finalize",
            Self::Dispatch => "dispatch",
            Self::Tokenize => "tokenize",
        };
        f.write_str(name)
    }
}

/// Structured error for configuration, dispatch and finalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchError {
    /// Processing phase where this error originated.
    pub phase: ErrorPhase,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Optional additional context.
    pub context: Option<Box<DispatchErrorContext>>,
}

/// Extended optional context for dispatch errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchErrorContext {
    /// Element kind being dispatched.
    pub element: Option<ElementKind>,
    /// Raw attribute or property name.
    pub attribute: Option<Box<str>>,
    /// Raw attribute value.
    pub value: Option<Box<str>>,
    /// Where the value came from.
    pub source: Option<ValueSource>,
    /// Tokenizer byte offset, when dispatched from markup.
    pub token_offset: Option<usize>,
}

impl DispatchError {
    /// Create an error for `phase` with a stable `code`.
    pub fn new(phase: ErrorPhase, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into().into_boxed_str(),
            context: None,
        }
    }

    fn context_mut(&mut self) -> &mut DispatchErrorContext {
        self.context
            .get_or_insert_with(|| Box::new(DispatchErrorContext::default()))
    }

    /// Attach the element kind.
    pub fn with_element(mut self, element: ElementKind) -> Self {
        self.context_mut().element = Some(element);
        self
    }

    /// Attach the raw attribute name.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.context_mut().attribute = Some(attribute.into().into_boxed_str());
        self
    }

    /// Attach the raw attribute value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.context_mut().value = Some(value.into().into_boxed_str());
        self
    }

    /// Attach the value source.
    pub fn with_source(mut self, source: ValueSource) -> Self {
        self.context_mut().source = Some(source);
        self
    }

    /// Attach a tokenizer byte offset.
    pub fn with_token_offset(mut self, token_offset: usize) -> Self {
        self.context_mut().token_offset = Some(token_offset);
        self
    }

    /// Element kind from the attached context, if any.
    pub fn element(&self) -> Option<ElementKind> {
        self.context.as_ref().and_then(|ctx| ctx.element)
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.phase, self.code, self.message)?;
        if let Some(ctx) = &self.context {
            if let Some(element) = ctx.element {
                write!(f, " [element={}]", element.as_str())?;
            }
            if let Some(attribute) = ctx.attribute.as_deref() {
                write!(f, " [attribute={}]", attribute)?;
            }
            if let Some(value) = ctx.value.as_deref() {
                write!(f, " [value={}]", value)?;
            }
            if let Some(source) = ctx.source {
                write!(f, " [source={}]", source)?;
            }
            if let Some(token_offset) = ctx.token_offset {
                write!(f, " [token_offset={}]", token_offset)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for DispatchError {}

/// Decision returned by an [`ErrorPolicy`] for one recoverable failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Drop the offending attribute and keep processing the element.
    Continue,
    /// Report the failure to the caller of `load_attribute`.
    Fail,
}

/// Decides, per failure, whether attribute processing continues.
///
/// Only tag-resolution and value-parse failures are routed here. Configuration
/// conflicts are rejected when the [`Policy`](crate::Policy) is built and never
/// reach an error policy.
pub trait ErrorPolicy {
    /// Called when a raw attribute name has no tag for the element kind.
    fn on_unknown_attribute(&self, error: &DispatchError) -> Recovery;

    /// Called when a raw value does not match (or does not fully match) its grammar.
    fn on_parse_failure(&self, error: &DispatchError) -> Recovery;
}

/// Ignores unknown attributes, fails on malformed values.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultErrorPolicy;

impl ErrorPolicy for DefaultErrorPolicy {
    fn on_unknown_attribute(&self, _error: &DispatchError) -> Recovery {
        Recovery::Continue
    }

    fn on_parse_failure(&self, _error: &DispatchError) -> Recovery {
        Recovery::Fail
    }
}

/// Fails on every reported error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrictErrorPolicy;

impl ErrorPolicy for StrictErrorPolicy {
    fn on_unknown_attribute(&self, _error: &DispatchError) -> Recovery {
        Recovery::Fail
    }

    fn on_parse_failure(&self, _error: &DispatchError) -> Recovery {
        Recovery::Fail
    }
}

/// Drops every offending attribute and keeps going.
#[derive(Clone, Copy, Debug, Default)]
pub struct LenientErrorPolicy;

impl ErrorPolicy for LenientErrorPolicy {
    fn on_unknown_attribute(&self, _error: &DispatchError) -> Recovery {
        Recovery::Continue
    }

    fn on_parse_failure(&self, _error: &DispatchError) -> Recovery {
        Recovery::Continue
    }
}
