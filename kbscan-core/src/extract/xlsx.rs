//! Workbook extraction
//!
//! Sheet names become headings; the preview is a bounded sample of the
//! shared-string table, which covers most text cells without walking
//! every sheet.

use super::{ooxml, Outline};
use crate::config::ExtractLimits;
use crate::error::Result;
use std::path::Path;

pub(super) fn extract(path: &Path, limits: &ExtractLimits) -> Result<Outline> {
    let workbook = ooxml::read_entry(path, "xl/workbook.xml")?;

    let headings: Vec<String> = ooxml::attr_values(&workbook, "sheet", "name")
        .into_iter()
        .map(|name| format!("Sheet: {}", name))
        .take(limits.max_headings)
        .collect();

    // sharedStrings.xml is absent when the workbook has no text cells
    let preview = match ooxml::read_entry(path, "xl/sharedStrings.xml") {
        Ok(shared) => {
            let cells: Vec<String> = ooxml::tag_texts(&shared, "t")
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .take(limits.max_preview_cells)
                .collect();
            cells.join(" | ")
        }
        Err(_) => String::new(),
    };

    Ok(Outline {
        headings,
        preview,
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

    fn write_xlsx(path: &Path, workbook: &str, shared: Option<&str>) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file("xl/workbook.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(workbook.as_bytes()).unwrap();
        if let Some(shared) = shared {
            zip.start_file("xl/sharedStrings.xml", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(shared.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_sheets_and_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.xlsx");
        write_xlsx(
            &path,
            r#"<workbook><sheets><sheet name="画面一覧" sheetId="1"/><sheet name="History" sheetId="2"/></sheets></workbook>"#,
            Some(r#"<sst><si><t>screen_id</t></si><si><t>Login</t></si><si><t> </t></si></sst>"#),
        );

        let outline = extract(&path, &ExtractLimits::default()).unwrap();
        assert_eq!(outline.headings, vec!["Sheet: 画面一覧", "Sheet: History"]);
        assert_eq!(outline.preview, "screen_id | Login");
    }

    #[test]
    fn test_no_shared_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nums.xlsx");
        write_xlsx(
            &path,
            r#"<workbook><sheets><sheet name="Data" sheetId="1"/></sheets></workbook>"#,
            None,
        );

        let outline = extract(&path, &ExtractLimits::default()).unwrap();
        assert_eq!(outline.headings, vec!["Sheet: Data"]);
        assert!(outline.preview.is_empty());
    }

    #[test]
    fn test_cell_sample_is_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.xlsx");
        let cells: String = (0..200).map(|i| format!("<si><t>c{}</t></si>", i)).collect();
        write_xlsx(
            &path,
            r#"<workbook><sheets><sheet name="S" sheetId="1"/></sheets></workbook>"#,
            Some(&format!("<sst>{}</sst>", cells)),
        );

        let limits = ExtractLimits {
            max_preview_cells: 5,
            ..ExtractLimits::default()
        };
        let outline = extract(&path, &limits).unwrap();
        assert_eq!(outline.preview, "c0 | c1 | c2 | c3 | c4");
    }
}
