//! Word document extraction
//!
//! Paragraphs styled `Heading*` (or the Japanese `見出し` styles)
//! become headings; the first few body paragraphs become the preview.

use super::{ooxml, Outline};
use crate::config::ExtractLimits;
use crate::error::Result;
use std::path::Path;

pub(super) fn extract(path: &Path, limits: &ExtractLimits) -> Result<Outline> {
    let xml = ooxml::read_entry(path, "word/document.xml")?;

    let mut headings = Vec::new();
    let mut preview_parts: Vec<String> = Vec::new();
    let mut collected = 0usize;

    for para in xml.split("</w:p>") {
        let text = ooxml::tag_texts(para, "w:t").concat();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let style = ooxml::attr_after(para, "w:pStyle", "w:val").unwrap_or_default();
        let is_heading =
            style.to_lowercase().starts_with("heading") || style.contains("見出し");

        if is_heading {
            if headings.len() < limits.max_headings {
                headings.push(text.to_string());
            }
        } else if preview_parts.len() < limits.max_preview_paragraphs {
            preview_parts.push(text.to_string());
        }

        collected += text.len();
        if collected >= limits.max_extract_chars {
            break;
        }
    }

    Ok(Outline {
        headings,
        preview: preview_parts.join("\n"),
        metadata: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_docx(path: &Path, document_xml: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_headings_and_preview() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.docx");
        write_docx(
            &path,
            r#"<w:document><w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Overview</w:t></w:r></w:p>
<w:p><w:r><w:t>This system handles orders.</w:t></w:r></w:p>
<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Screens</w:t></w:r></w:p>
<w:p><w:r><w:t>Login and </w:t></w:r><w:r><w:t>search.</w:t></w:r></w:p>
</w:body></w:document>"#,
        );

        let outline = extract(&path, &ExtractLimits::default()).unwrap();
        assert_eq!(outline.headings, vec!["Overview", "Screens"]);
        assert_eq!(
            outline.preview,
            "This system handles orders.\nLogin and search."
        );
    }

    #[test]
    fn test_japanese_heading_style() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.docx");
        write_docx(
            &path,
            r#"<w:p><w:pPr><w:pStyle w:val="見出し 1"/></w:pPr><w:r><w:t>概要</w:t></w:r></w:p>"#,
        );

        let outline = extract(&path, &ExtractLimits::default()).unwrap();
        assert_eq!(outline.headings, vec!["概要"]);
    }

    #[test]
    fn test_not_a_zip_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, "this is not a zip").unwrap();
        assert!(extract(&path, &ExtractLimits::default()).is_err());
    }
}
