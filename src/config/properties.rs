//! Flat backend: string keys to string values, stored as `key=value` lines.
//!
//! The text format follows the conventional properties syntax:
//!
//! - `#` and `!` start comment lines; blank lines are ignored.
//! - A key ends at the first unescaped `=`, `:` or whitespace.
//! - A line ending in an odd number of backslashes continues on the next line.
//! - `\t`, `\n`, `\r`, `\f` and `\uXXXX` are escapes; any other `\c` is `c`.
//!
//! Keys are never interpreted: `a.b` is just a key with a dot in it.

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use thiserror::Error;

use super::{Config, FileConfig, Format};
use crate::error::{BoxError, CommonsError};
use crate::path::KeyPath;

const HEADER: &str = "#appcommons generated config";

const WHITESPACE: [char; 3] = [' ', '\t', '\x0c'];

/// The properties [`Format`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Properties;

pub type PropertiesConfig = FileConfig<Properties>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropertiesError {
    #[error("Malformed \\uXXXX escape on line {line}")]
    MalformedEscape { line: usize },
}

impl Format for Properties {
    type Document = IndexMap<String, String>;

    const NAME: &'static str = "properties";

    fn parse(input: &str) -> Result<Self::Document, BoxError> {
        Ok(parse(input)?)
    }

    fn render(document: &Self::Document) -> Result<String, BoxError> {
        Ok(render(document))
    }
}

/// Parse properties text into an ordered map. Later duplicates win.
pub fn parse(input: &str) -> Result<IndexMap<String, String>, PropertiesError> {
    let mut entries = IndexMap::new();
    let mut logical = String::new();
    let mut continuing = false;
    let mut start_line = 0;

    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim_start_matches(WHITESPACE);
        if !continuing {
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            start_line = i + 1;
        }

        let (body, continues) = strip_continuation(line);
        logical.push_str(body);
        continuing = continues;
        if continuing {
            continue;
        }

        let (key, value) = split_entry(&logical);
        entries.insert(unescape(key, start_line)?, unescape(value, start_line)?);
        logical.clear();
    }

    if continuing && !logical.is_empty() {
        let (key, value) = split_entry(&logical);
        entries.insert(unescape(key, start_line)?, unescape(value, start_line)?);
    }

    Ok(entries)
}

/// Render entries as properties text, preceded by a header comment.
pub fn render(entries: &IndexMap<String, String>) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (key, value) in entries {
        escape_into(&mut out, key, true);
        out.push('=');
        escape_into(&mut out, value, false);
        out.push('\n');
    }
    out
}

/// Drop the trailing backslash of a continued line.
fn strip_continuation(line: &str) -> (&str, bool) {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        (&line[..line.len() - 1], true)
    } else {
        (line, false)
    }
}

/// Split a logical line into its still-escaped key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                value_start = i + 1;
                has_separator = true;
                break;
            }
            ' ' | '\t' | '\x0c' => {
                key_end = i;
                value_start = i + 1;
                break;
            }
            _ => {}
        }
    }

    let mut value = line[value_start..].trim_start_matches(WHITESPACE);
    if !has_separator && let Some(rest) = value.strip_prefix(['=', ':']) {
        value = rest.trim_start_matches(WHITESPACE);
    }
    (&line[..key_end], value)
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(raw.len());
    let mut units: Vec<u16> = Vec::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.as_str().starts_with('u') {
            chars.next();
            let hex: String = chars.by_ref().take(4).collect();
            if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                return Err(PropertiesError::MalformedEscape { line });
            }
            let unit =
                u16::from_str_radix(&hex, 16).map_err(|_| PropertiesError::MalformedEscape { line })?;
            units.push(unit);
            continue;
        }

        flush_units(&mut out, &mut units);
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    flush_units(&mut out, &mut units);
    Ok(out)
}

/// Decode pending `\uXXXX` units, pairing surrogates.
fn flush_units(out: &mut String, units: &mut Vec<u16>) {
    if units.is_empty() {
        return;
    }
    out.extend(
        char::decode_utf16(units.drain(..)).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (i, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if !(' '..='~').contains(&c) => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
            c => out.push(c),
        }
    }
}

impl Config for FileConfig<Properties> {
    fn get(&self, key: &str, default: &str) -> Result<String, CommonsError> {
        check_key(key)?;
        Ok(self
            .document
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    fn get_as<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, CommonsError> {
        check_key(key)?;
        match self.document.get(key) {
            Some(value) => decode(key, value),
            None => Ok(default),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CommonsError> {
        check_key(key)?;
        self.document.insert(key.to_string(), value.to_string());
        self.after_mutation()
    }

    fn set_value<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<(), CommonsError> {
        if KeyPath::parse(key)?.is_nested() {
            return Err(CommonsError::Unsupported(format!(
                "'{key}': properties configs have no nested objects"
            )));
        }
        match serde_json::to_value(value) {
            Ok(serde_json::Value::String(s)) => self.set(key, &s),
            _ => Err(CommonsError::Unsupported(format!(
                "'{key}': properties configs only store strings"
            ))),
        }
    }

    /// Literal lookup: dots are part of the key.
    fn at<T: DeserializeOwned>(&self, path: &str, _default: T) -> Result<Option<T>, CommonsError> {
        check_key(path)?;
        self.document
            .get(path)
            .map(|value| decode(path, value))
            .transpose()
    }

    fn objects_supported(&self) -> bool {
        false
    }

    fn saving_supported(&self) -> bool {
        self.source_is_writable()
    }
}

fn check_key(key: &str) -> Result<(), CommonsError> {
    if key.is_empty() {
        return Err(CommonsError::InvalidArgument("key is empty".into()));
    }
    Ok(())
}

/// Values are strings; only string-shaped targets can be built from them.
fn decode<T: DeserializeOwned>(key: &str, value: &str) -> Result<T, CommonsError> {
    let deserializer: StrDeserializer<'_, serde::de::value::Error> = value.into_deserializer();
    T::deserialize(deserializer).map_err(|e| {
        CommonsError::Unsupported(format!("'{key}' holds a string, cannot decode it: {e}"))
    })
}
