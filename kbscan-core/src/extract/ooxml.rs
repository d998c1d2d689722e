//! Shared helpers for the OOXML (zip + XML) formats
//!
//! The office containers are opened with the `zip` crate; the XML
//! payloads are scraped with a small bounded tag scanner instead of a
//! full XML parse. Extraction only ever keeps headings and a short
//! preview, so element text and a handful of attributes are all that
//! is needed.

use crate::error::{Result, ScanError};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

fn archive_error(path: &Path, reason: impl ToString) -> ScanError {
    ScanError::Extraction {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Read one named entry of the container as UTF-8 text
pub(crate) fn read_entry(path: &Path, name: &str) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| archive_error(path, e))?;
    let mut entry = archive
        .by_name(name)
        .map_err(|e| archive_error(path, format!("{}: {}", name, e)))?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| archive_error(path, format!("{}: {}", name, e)))?;
    Ok(text)
}

/// List entry names of the container
pub(crate) fn entry_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let archive = ZipArchive::new(file).map_err(|e| archive_error(path, e))?;
    Ok(archive.file_names().map(|n| n.to_string()).collect())
}

/// Text content of every `<tag ...>...</tag>` element, in document
/// order. Self-closing elements and longer tag names sharing the same
/// prefix (`<w:t>` vs `<w:tbl>`) are skipped.
pub(crate) fn tag_texts(xml: &str, tag: &str) -> Vec<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut out = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(gt) = after.find('>') else { break };
        let head = &after[..gt];
        let body = &after[gt + 1..];

        // Exact tag name: next char must close the tag or start attrs
        let boundary_ok = head.is_empty() || head.starts_with(|c: char| c.is_whitespace());
        if !boundary_ok || head.ends_with('/') {
            rest = body;
            continue;
        }

        match body.find(&close) {
            Some(end) => {
                out.push(unescape(&body[..end]));
                rest = &body[end + close.len()..];
            }
            None => break,
        }
    }
    out
}

/// Values of `attr="..."` on every `<elem ...>` tag
pub(crate) fn attr_values(xml: &str, elem: &str, attr: &str) -> Vec<String> {
    let open = format!("<{}", elem);
    let needle = format!(" {}=\"", attr);
    let mut out = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(gt) = after.find('>') else { break };
        let head = &after[..gt];

        let boundary_ok = head.starts_with(|c: char| c.is_whitespace());
        if boundary_ok {
            if let Some(value) = attr_in(head, &needle) {
                out.push(unescape(value));
            }
        }
        rest = &after[gt + 1..];
    }
    out
}

/// First `attr="..."` value appearing after `marker` in `xml`. Used
/// for things like the `w:val` of a paragraph's `w:pStyle`.
pub(crate) fn attr_after(xml: &str, marker: &str, attr: &str) -> Option<String> {
    let pos = xml.find(marker)?;
    let needle = format!("{}=\"", attr);
    attr_in(&xml[pos..], &needle).map(unescape)
}

fn attr_in<'a>(head: &'a str, needle: &str) -> Option<&'a str> {
    let start = head.find(needle)? + needle.len();
    let rest = &head[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Minimal XML entity unescaping for the five predefined entities
pub(crate) fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
