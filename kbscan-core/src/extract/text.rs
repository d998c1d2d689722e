//! Plain-text extraction (txt, md, sql)

use super::{truncate_chars, Outline};
use crate::config::ExtractLimits;
use crate::error::Result;
use std::io::Read;
use std::path::Path;

pub(super) fn extract(path: &Path, limits: &ExtractLimits) -> Result<Outline> {
    // Bound the read: a char is at most 4 bytes, so this always covers
    // max_extract_chars without pulling a huge file into memory.
    let cap = (limits.max_extract_chars as u64).saturating_mul(4);
    let mut bytes = Vec::new();
    std::fs::File::open(path)?
        .take(cap)
        .read_to_end(&mut bytes)?;

    let text = String::from_utf8_lossy(&bytes);
    let preview = truncate_chars(&text, limits.max_extract_chars);

    let headings = preview
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|h| !h.is_empty())
        .take(limits.max_headings)
        .collect();

    Ok(Outline {
        headings,
        preview,
        metadata: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_markdown_headings_and_preview() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# Title\n\nBody line.\n\n## Section\nMore.\n").unwrap();

        let outline = extract(&file, &ExtractLimits::default()).unwrap();
        assert_eq!(outline.headings, vec!["Title", "Section"]);
        assert!(outline.preview.contains("Body line."));
    }

    #[test]
    fn test_preview_is_bounded() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, "x".repeat(100_000)).unwrap();

        let limits = ExtractLimits {
            max_extract_chars: 50,
            ..ExtractLimits::default()
        };
        let outline = extract(&file, &limits).unwrap();
        assert_eq!(outline.preview.chars().count(), 50);
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mixed.txt");
        std::fs::write(&file, [b'o', b'k', 0xff, 0xfe, b'!']).unwrap();

        let outline = extract(&file, &ExtractLimits::default()).unwrap();
        assert!(outline.preview.starts_with("ok"));
    }
}
