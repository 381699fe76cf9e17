//! Reference value grammars: plain IRI and functional `url(...)` IRI.
//!
//! Both grammars report how many bytes they matched so callers can insist on
//! the whole value being consumed. A value that matches only a prefix is a
//! parse failure, never a truncated reference.

use core::ops::Range;

/// Which grammar produced a [`Reference`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceForm {
    /// Plain IRI, e.g. `#frag` or `file.svg#frag`.
    Iri,
    /// Functional IRI, e.g. `url(#frag)`.
    FuncIri,
}

/// A reference to another element, borrowed from the raw value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reference<'a> {
    /// The matched IRI text (the inside of `url(...)` for functional IRIs).
    pub iri: &'a str,
    /// Grammar that matched.
    pub form: ReferenceForm,
}

impl<'a> Reference<'a> {
    /// Fragment identifier without the leading `#`, for same-document references.
    pub fn fragment(&self) -> Option<&'a str> {
        self.iri.strip_prefix('#').filter(|frag| !frag.is_empty())
    }

    /// True when the IRI points into the current document.
    pub fn is_local(&self) -> bool {
        self.fragment().is_some()
    }
}

/// Result of running a reference grammar over a prefix of the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceMatch {
    /// Bytes consumed from the start of the input.
    pub consumed: usize,
    /// Byte range of the IRI text inside the input.
    pub iri: Range<usize>,
}

fn is_iri_char(c: char) -> bool {
    !c.is_whitespace()
}

fn is_func_iri_char(c: char) -> bool {
    !c.is_whitespace() && c != ')' && c != '\'' && c != '"'
}

fn take_while(input: &str, start: usize, pred: impl Fn(char) -> bool) -> usize {
    input[start..]
        .char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(input.len(), |(idx, _)| start + idx)
}

fn skip_spaces(input: &str, start: usize) -> usize {
    take_while(input, start, |c| c.is_ascii_whitespace())
}

/// Match a plain IRI at the start of `input`.
pub fn match_iri(input: &str) -> Option<ReferenceMatch> {
    let end = take_while(input, 0, is_iri_char);
    (end > 0).then(|| ReferenceMatch {
        consumed: end,
        iri: 0..end,
    })
}

/// Match a functional IRI, `url(` IRI `)`, at the start of `input`.
///
/// Whitespace is allowed inside the parentheses and the IRI may be quoted.
pub fn match_func_iri(input: &str) -> Option<ReferenceMatch> {
    let rest = input.strip_prefix("url(")?;
    let mut pos = input.len() - rest.len();
    pos = skip_spaces(input, pos);

    let quote = input[pos..].chars().next().filter(|c| matches!(c, '\'' | '"'));
    if quote.is_some() {
        pos += 1;
    }
    let iri_start = pos;
    let iri_end = take_while(input, iri_start, is_func_iri_char);
    if iri_end == iri_start {
        return None;
    }
    pos = iri_end;
    if let Some(q) = quote {
        if !input[pos..].starts_with(q) {
            return None;
        }
        pos += q.len_utf8();
    }
    pos = skip_spaces(input, pos);
    if !input[pos..].starts_with(')') {
        return None;
    }
    Some(ReferenceMatch {
        consumed: pos + 1,
        iri: iri_start..iri_end,
    })
}

/// Parse a complete plain IRI value.
pub fn parse_iri(value: &str) -> Option<Reference<'_>> {
    let m = match_iri(value)?;
    (m.consumed == value.len()).then(|| Reference {
        iri: &value[m.iri],
        form: ReferenceForm::Iri,
    })
}

/// Parse a complete functional IRI value.
pub fn parse_func_iri(value: &str) -> Option<Reference<'_>> {
    let m = match_func_iri(value)?;
    (m.consumed == value.len()).then(|| Reference {
        iri: &value[m.iri],
        form: ReferenceForm::FuncIri,
    })
}
