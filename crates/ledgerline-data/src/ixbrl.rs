//! Inline-XBRL fact extraction from XHTML accounts documents.
//!
//! Accounts filed as inline XBRL embed tagged facts inside ordinary XHTML:
//!
//! ```xml
//! <ix:nonFraction name="uk-core:Equity" contextRef="FY2024" unitRef="GBP"
//!                 decimals="0">1,234</ix:nonFraction>
//! ```
//!
//! The extractor streams the document once, picks out `ix:nonFraction` and
//! `ix:nonNumeric` elements, and groups their `(contextRef, value)` pairs by
//! fact name in document order.
//!
//! # Example
//!
//! ```
//! use ledgerline_data::ixbrl::FactExtractor;
//!
//! let xhtml = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"><body>
//!     <ix:nonFraction name="uk-core:Equity" contextRef="c1">1,234.00</ix:nonFraction>
//!     <ix:nonNumeric name="uk-core:EntityName" contextRef="c1">Acme Ltd</ix:nonNumeric>
//! </body></html>"#;
//!
//! let facts = FactExtractor::new().extract_str(xhtml).unwrap();
//! assert_eq!(facts.len(), 1);
//! assert_eq!(facts.get("uk-core:Equity").unwrap()[0], ("c1".to_string(), "1,234.00".to_string()));
//! ```

use crate::artifact::DocumentArtifact;
use crate::error::{DataError, Result};
use indexmap::IndexMap;
use quick_xml::NsReader;
use quick_xml::encoding::Decoder;
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Name recorded for facts without a `name` attribute.
pub const UNNAMED_FACT: &str = "Unnamed";

/// Context recorded for facts without a `contextRef` attribute.
pub const NO_CONTEXT_REF: &str = "NoContextRef";

/// Inline XBRL 1.1 and 1.0 namespaces.
const INLINE_XBRL_NAMESPACES: [&[u8]; 2] = [
    b"http://www.xbrl.org/2013/inlineXBRL",
    b"http://www.xbrl.org/2008/inlineXBRL",
];

const FACT_ELEMENTS: [&[u8]; 2] = [b"nonFraction", b"nonNumeric"];

/// Fact name to `(contextRef, value)` pairs.
///
/// Names keep the order of their first occurrence and each name's pairs keep
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactMapping {
    facts: IndexMap<String, Vec<(String, String)>>,
}

impl FactMapping {
    /// Creates an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `(context_ref, value)` observation for `name`.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        context_ref: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.facts
            .entry(name.into())
            .or_default()
            .push((context_ref.into(), value.into()));
    }

    /// Observations recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&[(String, String)]> {
        self.facts.get(name).map(Vec::as_slice)
    }

    /// Number of distinct fact names.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if no fact was recorded.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Fact names in first-occurrence order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }

    /// Total number of observations across all names.
    pub fn observation_count(&self) -> usize {
        self.facts.values().map(Vec::len).sum()
    }

    /// Iterate over names and their observations.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[(String, String)])> {
        self.facts
            .iter()
            .map(|(name, pairs)| (name.as_str(), pairs.as_slice()))
    }
}

/// Which fact values make it into the mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactFilter {
    /// Keep values made only of digits once `,` and `.` are removed.
    ///
    /// Excludes text disclosures, but also negatives written as `-500` or
    /// `(500)`, and empty values.
    #[default]
    NumericOnly,
    /// Keep every fact, including text disclosures.
    All,
}

impl FactFilter {
    /// Returns true if a fact with this trimmed `value` should be kept.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::NumericOnly => is_numeric_token(value),
            Self::All => true,
        }
    }
}

/// Returns true if `value` is non-empty and all ASCII digits after removing `,` and `.`.
pub fn is_numeric_token(value: &str) -> bool {
    let mut digits = value.chars().filter(|c| *c != ',' && *c != '.').peekable();
    digits.peek().is_some() && digits.all(|c| c.is_ascii_digit())
}

/// A fact element whose end tag has not been seen yet.
#[derive(Debug)]
struct OpenFact {
    depth: usize,
    slot: usize,
    name: String,
    context_ref: String,
    text: String,
}

#[derive(Debug)]
struct RawFact {
    name: String,
    context_ref: String,
    text: String,
}

/// Streaming inline-XBRL fact extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactExtractor {
    filter: FactFilter,
}

impl FactExtractor {
    /// Extractor keeping numeric facts only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor with an explicit value filter.
    pub const fn with_filter(filter: FactFilter) -> Self {
        Self { filter }
    }

    /// The active value filter.
    pub const fn filter(&self) -> FactFilter {
        self.filter
    }

    /// Extract facts from a downloaded artifact, deleting it afterwards.
    pub fn extract_artifact(&self, artifact: DocumentArtifact) -> Result<FactMapping> {
        self.extract_path(artifact.path())
    }

    /// Extract facts from the XHTML file at `path`.
    pub fn extract_path(&self, path: &Path) -> Result<FactMapping> {
        let file = File::open(path).map_err(|e| {
            DataError::ExtractionFailed(format!("cannot open {}: {}", path.display(), e))
        })?;
        self.extract_reader(BufReader::new(file))
    }

    /// Extract facts from an in-memory XHTML document.
    pub fn extract_str(&self, xhtml: &str) -> Result<FactMapping> {
        self.extract_reader(xhtml.as_bytes())
    }

    /// Extract facts from any buffered XHTML source.
    ///
    /// # Errors
    /// Returns `DataError::ExtractionFailed` for malformed XML or bytes that
    /// are invalid in the document's declared encoding. Unknown entity
    /// references are kept verbatim in the affected fact.
    pub fn extract_reader<R: BufRead>(&self, source: R) -> Result<FactMapping> {
        let mut reader = NsReader::from_reader(source);
        let mut buf = Vec::new();

        let mut depth = 0usize;
        let mut open: Vec<OpenFact> = Vec::new();
        // Slots are reserved at the start tag so nested facts keep start-tag order.
        let mut slots: Vec<Option<RawFact>> = Vec::new();

        loop {
            let (namespace, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| DataError::ExtractionFailed(format!("malformed XHTML: {}", e)))?;
            let in_inline_xbrl = is_inline_xbrl(&namespace);
            // Follows the BOM or the encoding named in the XML declaration
            let decoder = reader.decoder();

            match event {
                Event::Start(start) => {
                    depth += 1;
                    if in_inline_xbrl && is_fact_element(&start) {
                        let (name, context_ref) = fact_attributes(&start, decoder)?;
                        open.push(OpenFact {
                            depth,
                            slot: slots.len(),
                            name,
                            context_ref,
                            text: String::new(),
                        });
                        slots.push(None);
                    }
                }
                Event::Empty(start) => {
                    if in_inline_xbrl && is_fact_element(&start) {
                        let (name, context_ref) = fact_attributes(&start, decoder)?;
                        slots.push(Some(RawFact {
                            name,
                            context_ref,
                            text: String::new(),
                        }));
                    }
                }
                Event::End(_) => {
                    if open.last().is_some_and(|fact| fact.depth == depth)
                        && let Some(fact) = open.pop()
                    {
                        slots[fact.slot] = Some(RawFact {
                            name: fact.name,
                            context_ref: fact.context_ref,
                            text: fact.text,
                        });
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Text(text) if !open.is_empty() => {
                    let raw = decode(decoder, &text, "text")?;
                    let text = unescape(&raw);
                    for fact in &mut open {
                        fact.text.push_str(&text);
                    }
                }
                Event::CData(data) if !open.is_empty() => {
                    let text = decode(decoder, &data, "CDATA")?;
                    for fact in &mut open {
                        fact.text.push_str(&text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !open.is_empty() {
            return Err(DataError::ExtractionFailed(
                "document ended inside a fact element".to_string(),
            ));
        }

        let mut mapping = FactMapping::new();
        for fact in slots.into_iter().flatten() {
            let value = fact.text.trim();
            if self.filter.accepts(value) {
                mapping.push(fact.name, fact.context_ref, value);
            }
        }
        Ok(mapping)
    }
}

fn is_inline_xbrl(namespace: &ResolveResult<'_>) -> bool {
    match namespace {
        ResolveResult::Bound(Namespace(uri)) => {
            INLINE_XBRL_NAMESPACES.iter().any(|known| *known == *uri)
        }
        // Fragments sometimes use the conventional prefix without declaring it
        ResolveResult::Unknown(prefix) => prefix.as_slice() == b"ix",
        ResolveResult::Unbound => false,
    }
}

fn is_fact_element(start: &BytesStart<'_>) -> bool {
    let local_name = start.local_name();
    FACT_ELEMENTS
        .iter()
        .any(|element| *element == local_name.as_ref())
}

/// `name` and `contextRef`, defaulted when absent.
fn fact_attributes(start: &BytesStart<'_>, decoder: Decoder) -> Result<(String, String)> {
    let mut name = None;
    let mut context_ref = None;

    for attribute in start.attributes() {
        let attribute = attribute
            .map_err(|e| DataError::ExtractionFailed(format!("invalid attribute: {}", e)))?;
        let target = match attribute.key.as_ref() {
            b"name" => &mut name,
            b"contextRef" => &mut context_ref,
            _ => continue,
        };
        let raw = decode(decoder, &attribute.value, "attribute")?;
        *target = Some(unescape(&raw).into_owned());
    }

    Ok((
        name.unwrap_or_else(|| UNNAMED_FACT.to_string()),
        context_ref.unwrap_or_else(|| NO_CONTEXT_REF.to_string()),
    ))
}

fn decode<'b>(decoder: Decoder, bytes: &'b [u8], what: &str) -> Result<Cow<'b, str>> {
    decoder
        .decode(bytes)
        .map_err(|e| DataError::ExtractionFailed(format!("undecodable {}: {}", what, e)))
}

/// Resolves entity references; a chunk with an unknown or broken reference is kept as written.
fn unescape(raw: &str) -> Cow<'_, str> {
    match unescape_with(raw, resolve_entity) {
        Ok(text) => text,
        Err(e) => {
            debug!(error = %e, "unresolved entity reference kept verbatim");
            Cow::Borrowed(raw)
        }
    }
}

/// XML predefined entities plus the HTML ones common in filed accounts.
fn resolve_entity(entity: &str) -> Option<&'static str> {
    let resolved = match entity {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        "nbsp" => "\u{a0}",
        "pound" => "\u{a3}",
        "euro" => "\u{20ac}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "hellip" => "\u{2026}",
        _ => return None,
    };
    Some(resolved)
}
