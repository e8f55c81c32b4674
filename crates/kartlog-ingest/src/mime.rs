//! Result-email decoding: headers, transfer encodings, charsets, multipart.
//!
//! Timing vendors send results as `.eml` files that may be base64 or
//! quoted-printable encoded and frequently carry both an HTML and a plain
//! text alternative. `mailparse` does the MIME parsing; this module picks
//! the one body the extractors read. Decoding never fails: every tier falls
//! back to the previous one and ultimately to the raw input.

use std::collections::BTreeMap;

use mailparse::{MailHeader, ParsedMail};
use tracing::debug;

/// Multipart bodies shorter than this (in characters) are passed over.
pub const MIN_PART_LEN: usize = 100;

/// Nested `multipart/*` parts deeper than this are not descended into.
const MAX_MULTIPART_DEPTH: usize = 4;

/// Header names whose presence marks the input as an email message.
const MESSAGE_HEADERS: &[&str] = &[
    "content-type",
    "subject",
    "from",
    "to",
    "date",
    "mime-version",
    "message-id",
    "received",
];

/// Lower-cased header name to decoded value. Repeated headers keep the
/// last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedHeaders {
    fields: BTreeMap<String, String>,
}

impl DecodedHeaders {
    /// Collect parsed headers. Folding and RFC 2047 encoded words are
    /// already undone by `mailparse`.
    pub fn from_headers(headers: &[MailHeader]) -> Self {
        let fields = headers
            .iter()
            .map(|h| (h.get_key().trim().to_lowercase(), h.get_value().trim().to_string()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("subject")
    }

    pub fn from(&self) -> Option<&str> {
        self.get("from")
    }

    pub fn date(&self) -> Option<&str> {
        self.get("date")
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether any well-known email header is present.
    pub fn looks_like_message(&self) -> bool {
        MESSAGE_HEADERS.iter().any(|h| self.fields.contains_key(*h))
    }
}

/// A decoded message: its headers and a single text body (HTML or plain).
#[derive(Debug, Clone, Default)]
pub struct DecodedMessage {
    pub headers: DecodedHeaders,
    pub body: String,
}

/// Decodes raw message bytes into headers and one text body.
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a raw message. Never fails.
    pub fn decode(raw: &[u8]) -> DecodedMessage {
        let text = bytes_to_text(raw);
        let parsed = match mailparse::parse_mail(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Input is not a parseable message ({}), using raw text", e);
                return DecodedMessage {
                    headers: DecodedHeaders::default(),
                    body: text,
                };
            }
        };
        let headers = DecodedHeaders::from_headers(&parsed.headers);

        let mut body = if parsed.subparts.is_empty() {
            part_text(&parsed)
        } else {
            select_part(&parsed).unwrap_or_else(|| {
                debug!("No multipart section longer than {} chars", MIN_PART_LEN);
                part_text(&parsed)
            })
        };

        if body.trim().is_empty() {
            debug!("Decoded body is empty, using raw input");
            body = text;
        }

        DecodedMessage { headers, body }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    Html,
    Plain,
}

/// Pick the first HTML part longer than `MIN_PART_LEN`, else the first
/// such plain-text part.
fn select_part(mail: &ParsedMail) -> Option<String> {
    let mut parts = Vec::new();
    collect_parts(mail, 0, &mut parts);

    let long_enough = |s: &String| s.trim().chars().count() > MIN_PART_LEN;
    parts
        .iter()
        .find(|(kind, body)| *kind == PartKind::Html && long_enough(body))
        .or_else(|| {
            parts
                .iter()
                .find(|(kind, body)| *kind == PartKind::Plain && long_enough(body))
        })
        .map(|(_, body)| body.clone())
}

fn collect_parts(mail: &ParsedMail, depth: usize, out: &mut Vec<(PartKind, String)>) {
    for part in &mail.subparts {
        if !part.subparts.is_empty() {
            if depth < MAX_MULTIPART_DEPTH {
                collect_parts(part, depth + 1, out);
            }
            continue;
        }

        let kind = match part.ctype.mimetype.as_str() {
            "text/html" => PartKind::Html,
            "text/plain" => PartKind::Plain,
            _ => continue,
        };
        out.push((kind, part_text(part).trim_end().to_string()));
    }
}

/// Transfer-decoded text of one part. A declared charset is honoured;
/// without one the bytes are read as UTF-8, else Latin-1.
fn part_text(part: &ParsedMail) -> String {
    if part.ctype.params.contains_key("charset") {
        match part.get_body() {
            Ok(text) => return text,
            Err(e) => debug!("Charset decoding failed ({}), reading bytes", e),
        }
    }
    match part.get_body_raw() {
        Ok(bytes) => bytes_to_text(&bytes),
        Err(e) => {
            debug!("Transfer decoding failed: {}", e);
            String::new()
        }
    }
}

/// UTF-8 when valid, otherwise Latin-1 (which every byte sequence is).
pub fn bytes_to_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
