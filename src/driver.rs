//! Markup driver: feeds an SVG document through per-element dispatchers.
//!
//! The driver owns the event loop the dispatchers expect from a tokenizer:
//! one dispatcher per element, markup attributes in document order, then the
//! inline `style` declarations, then finalization before any child element.

extern crate alloc;

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::attribute::ValueSource;
use crate::context::{Context, Notification};
use crate::dispatcher::AttributeDispatcher;
use crate::element::{DispatchStrategy, ElementKind};
use crate::error::{DefaultErrorPolicy, DispatchError, ErrorPhase, ErrorPolicy};
use crate::geom::Size;
use crate::policy::Policy;

static DEFAULT_ERROR_POLICY: DefaultErrorPolicy = DefaultErrorPolicy;

/// Bounds applied while reading a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverLimits {
    /// Maximum element nesting depth.
    pub max_depth: usize,
    /// Maximum bytes in one inline `style` attribute.
    pub max_style_bytes: usize,
}

impl Default for DriverLimits {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_style_bytes: 16 * 1024,
        }
    }
}

/// Counters for one dispatched document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Elements dispatched.
    pub elements: usize,
    /// Markup attributes read (namespace declarations excluded).
    pub attributes: usize,
    /// Unknown elements whose subtree was skipped.
    pub skipped_elements: usize,
    /// Elements that failed while errors were not aborting.
    pub failed_elements: usize,
}

/// Runs a document through dispatchers built from one [`Policy`].
#[derive(Clone, Copy)]
pub struct DocumentDriver<'p> {
    policy: &'p Policy,
    error_policy: &'p dyn ErrorPolicy,
    limits: DriverLimits,
    reference_size: Option<Size>,
    abort_on_element_error: bool,
}

impl core::fmt::Debug for DocumentDriver<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DocumentDriver")
            .field("limits", &self.limits)
            .field("reference_size", &self.reference_size)
            .field("abort_on_element_error", &self.abort_on_element_error)
            .finish_non_exhaustive()
    }
}

impl<'p> DocumentDriver<'p> {
    /// Driver with default limits that aborts on the first failing element.
    pub fn new(policy: &'p Policy) -> Self {
        Self {
            policy,
            error_policy: &DEFAULT_ERROR_POLICY,
            limits: DriverLimits::default(),
            reference_size: None,
            abort_on_element_error: true,
        }
    }

    /// Error policy handed to every dispatcher.
    pub fn with_error_policy(mut self, error_policy: &'p dyn ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Override reading limits.
    pub fn with_limits(mut self, limits: DriverLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Reference size given to every dispatcher.
    pub fn with_reference_size(mut self, size: Size) -> Self {
        self.reference_size = Some(size);
        self
    }

    /// Whether one failing element aborts the document.
    pub fn with_abort_on_element_error(mut self, abort: bool) -> Self {
        self.abort_on_element_error = abort;
        self
    }

    /// Dispatch every element of `bytes` into `context`.
    pub fn dispatch_document(
        &self,
        bytes: &[u8],
        context: &mut dyn Context,
    ) -> Result<DocumentSummary, DispatchError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::with_capacity(256);
        let mut stack: Vec<ElementKind> = Vec::with_capacity(16);
        let mut skip_depth = 0usize;
        let mut summary = DocumentSummary::default();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    if skip_depth > 0 {
                        skip_depth += 1;
                    } else {
                        match element_kind(&reader, &e)? {
                            Some(kind) => {
                                self.check_depth(&reader, stack.len())?;
                                self.dispatch_element(&reader, &e, kind, context, &mut summary)?;
                                stack.push(kind);
                            }
                            None => {
                                skip_depth = 1;
                                summary.skipped_elements += 1;
                            }
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    if skip_depth == 0 {
                        match element_kind(&reader, &e)? {
                            Some(kind) => {
                                self.check_depth(&reader, stack.len())?;
                                self.dispatch_element(&reader, &e, kind, context, &mut summary)?;
                                context.exit_element(kind);
                            }
                            None => summary.skipped_elements += 1,
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    if skip_depth > 0 {
                        skip_depth -= 1;
                    } else if let Some(kind) = stack.pop() {
                        context.exit_element(kind);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    return Err(DispatchError::new(
                        ErrorPhase::Tokenize,
                        "DRIVER_XML_ERROR",
                        format!("XML error: {:?}", err),
                    )
                    .with_token_offset(reader_token_offset(&reader)));
                }
            }
            buf.clear();
        }

        log::debug!(
            "dispatched {} elements ({} skipped, {} failed)",
            summary.elements,
            summary.skipped_elements,
            summary.failed_elements
        );
        Ok(summary)
    }

    fn check_depth(&self, reader: &Reader<&[u8]>, depth: usize) -> Result<(), DispatchError> {
        if depth >= self.limits.max_depth {
            return Err(DispatchError::new(
                ErrorPhase::Tokenize,
                "DRIVER_DEPTH_LIMIT",
                format!("element nesting exceeds max_depth ({})", self.limits.max_depth),
            )
            .with_token_offset(reader_token_offset(reader)));
        }
        Ok(())
    }

    fn dispatch_element(
        &self,
        reader: &Reader<&[u8]>,
        e: &BytesStart<'_>,
        kind: ElementKind,
        context: &mut dyn Context,
        summary: &mut DocumentSummary,
    ) -> Result<(), DispatchError> {
        summary.elements += 1;
        context.enter_element(kind);
        match self.load_element(reader, e, kind, context, summary) {
            Ok(()) => Ok(()),
            Err(err) => {
                let err = err.with_token_offset(reader_token_offset(reader));
                if self.abort_on_element_error {
                    return Err(err);
                }
                summary.failed_elements += 1;
                log::warn!("continuing past failed <{}>: {}", kind, err);
                Ok(())
            }
        }
    }

    fn load_element(
        &self,
        reader: &Reader<&[u8]>,
        e: &BytesStart<'_>,
        kind: ElementKind,
        context: &mut dyn Context,
        summary: &mut DocumentSummary,
    ) -> Result<(), DispatchError> {
        let mut dispatcher = AttributeDispatcher::new(kind, self.policy, context)
            .with_error_policy(self.error_policy);
        if let Some(size) = self.reference_size {
            dispatcher.set_reference_size(size);
        }

        let mut first_error = None;
        let mut style: Option<String> = None;
        for attr in e.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(err) => {
                    first_error.get_or_insert(
                        DispatchError::new(
                            ErrorPhase::Tokenize,
                            "DRIVER_XML_ERROR",
                            format!("Attribute error: {:?}", err),
                        )
                        .with_element(kind)
                        .with_token_offset(reader_token_offset(reader)),
                    );
                    continue;
                }
            };
            let (key, value) = match read_attribute(reader, &attr, kind) {
                Ok(Some(pair)) => pair,
                Ok(None) => continue,
                Err(err) => {
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            summary.attributes += 1;

            if key == "style" {
                if value.len() > self.limits.max_style_bytes {
                    first_error.get_or_insert(
                        DispatchError::new(
                            ErrorPhase::Tokenize,
                            "DRIVER_STYLE_BYTES_LIMIT",
                            format!(
                                "inline style exceeds max_style_bytes ({} > {})",
                                value.len(),
                                self.limits.max_style_bytes
                            ),
                        )
                        .with_element(kind),
                    );
                    continue;
                }
                style = Some(value.clone().into_owned());
            }
            if let Err(err) = dispatcher.load_attribute(&key, &value, ValueSource::Attribute) {
                first_error.get_or_insert(err);
            }
        }

        if let Some(style) = style.as_deref() {
            for (name, value) in style_declarations(style) {
                if let Err(err) = dispatcher.load_attribute(name, value, ValueSource::Style) {
                    first_error.get_or_insert(err);
                }
            }
        }

        if kind.strategy() == DispatchStrategy::Viewport {
            if let Err(err) = dispatcher.notify(Notification::AfterViewportAttributes) {
                first_error.get_or_insert(err);
            }
        }
        let finalized = dispatcher.end_of_attributes();
        match first_error {
            Some(err) => Err(err),
            None => finalized,
        }
    }
}

/// Decoded, unescaped `(name, value)` of one markup attribute.
///
/// Namespace declarations yield `None`.
fn read_attribute<'a>(
    reader: &Reader<&[u8]>,
    attr: &'a Attribute<'_>,
    kind: ElementKind,
) -> Result<Option<(Cow<'a, str>, Cow<'a, str>)>, DispatchError> {
    let key = decode(reader, attr.key.as_ref(), "attribute name")?;
    if key == "xmlns" || key.starts_with("xmlns:") {
        return Ok(None);
    }
    let raw = decode(reader, &attr.value, "attribute value")?;
    let unescaped = match quick_xml::escape::unescape(&raw) {
        Ok(Cow::Owned(unescaped)) => Some(unescaped),
        Ok(Cow::Borrowed(_)) => None,
        Err(err) => {
            return Err(DispatchError::new(
                ErrorPhase::Tokenize,
                "DRIVER_XML_ERROR",
                format!("Unescape error: {:?}", err),
            )
            .with_element(kind)
            .with_attribute(key.as_ref()));
        }
    };
    let value = unescaped.map_or(raw, Cow::Owned);
    Ok(Some((key, value)))
}

/// `name: value` pairs of an inline style, in order.
///
/// Separators inside parentheses or quotes do not split, and a trailing
/// `!important` is dropped from the value.
fn style_declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    Declarations { rest: style }.filter_map(|declaration| {
        let (name, value) = declaration.split_once(':')?;
        let name = name.trim();
        (!name.is_empty()).then(|| (name, strip_important(value.trim())))
    })
}

struct Declarations<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Declarations<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let (declaration, rest) = self.rest.split_at(declaration_end(self.rest));
        self.rest = rest.strip_prefix(';').unwrap_or(rest);
        Some(declaration)
    }
}

fn declaration_end(style: &str) -> usize {
    let mut depth = 0usize;
    let mut quote = None;
    for (idx, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => return idx,
            _ => {}
        }
    }
    style.len()
}

fn strip_important(value: &str) -> &str {
    match value.rfind('!') {
        Some(bang) if value[bang + 1..].trim().eq_ignore_ascii_case("important") => {
            value[..bang].trim_end()
        }
        _ => value,
    }
}

fn element_kind(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
) -> Result<Option<ElementKind>, DispatchError> {
    let qname = e.name();
    let name = decode(reader, qname.as_ref(), "element name")?;
    let local_name = name.rsplit(':').next().unwrap_or(name.as_ref());
    let kind = ElementKind::from_name(local_name);
    if kind.is_none() {
        log::debug!("skipping unknown element <{}>", name);
    }
    Ok(kind)
}

fn decode<'b>(
    reader: &Reader<&[u8]>,
    raw: &'b [u8],
    what: &'static str,
) -> Result<Cow<'b, str>, DispatchError> {
    reader.decoder().decode(raw).map_err(|err| {
        DispatchError::new(
            ErrorPhase::Tokenize,
            "DRIVER_XML_ERROR",
            format!("Decode error in {}: {:?}", what, err),
        )
        .with_token_offset(reader_token_offset(reader))
    })
}

fn reader_token_offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}
