//! Markdown surrogate and latest-map rendering
//!
//! A surrogate is YAML front matter plus fixed sections. Rendering is
//! pure string assembly over already-redacted content; nothing here
//! touches the filesystem.

use crate::error::Result;
use crate::version::{LatestEntry, VersionOrdinal};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything known about one scanned document, after extraction,
/// classification and redaction.
#[derive(Debug, Clone)]
pub struct DocRecord {
    pub doc_id: String,
    pub title: String,
    pub path: String,
    pub rel_path: String,
    pub format: String,
    pub size_bytes: u64,
    pub updated_at: String,
    pub mtime_epoch: i64,
    pub content_hash: Option<String>,
    pub system: Option<String>,
    pub screen_id: Option<String>,
    pub doc_type: Option<String>,
    pub version_key: String,
    pub ordinal: VersionOrdinal,
    pub headings: Vec<String>,
    pub preview: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub raw_metadata: BTreeMap<String, String>,
    pub aliases: Vec<PathBuf>,
}

#[derive(Serialize)]
struct FrontMatter<'a> {
    doc_id: &'a str,
    title: &'a str,
    path: &'a str,
    rel_path: &'a str,
    format: &'a str,
    size_bytes: u64,
    updated_at: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    screen_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_type: Option<&'a str>,
    version_key: &'a str,
}

/// Render one document surrogate. Empty sections are omitted rather
/// than rendered as placeholders.
pub fn render_document(record: &DocRecord) -> Result<String> {
    let front = FrontMatter {
        doc_id: &record.doc_id,
        title: &record.title,
        path: &record.path,
        rel_path: &record.rel_path,
        format: &record.format,
        size_bytes: record.size_bytes,
        updated_at: &record.updated_at,
        content_hash: record.content_hash.as_deref(),
        system: record.system.as_deref(),
        screen_id: record.screen_id.as_deref(),
        doc_type: record.doc_type.as_deref(),
        version_key: &record.version_key,
    };

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&serde_yaml::to_string(&front)?);
    out.push_str("---\n\n");

    out.push_str(&format!("# {}\n\n", record.title));

    out.push_str("## PATH\n\n");
    out.push_str(&format!("{}\n", record.path));

    if !record.aliases.is_empty() {
        out.push_str("\n## ALIASES (shortcuts / links)\n\n");
        for alias in &record.aliases {
            out.push_str(&format!("- {}\n", alias.display()));
        }
    }

    out.push_str("\n## METADATA\n\n");
    out.push_str(&format!("- format: {}\n", record.format));
    out.push_str(&format!("- size_bytes: {}\n", record.size_bytes));
    out.push_str(&format!("- updated_at: {}\n", record.updated_at));
    if let Some(system) = &record.system {
        out.push_str(&format!("- system: {}\n", system));
    }
    if let Some(screen_id) = &record.screen_id {
        out.push_str(&format!("- screen_id: {}\n", screen_id));
    }
    if let Some(doc_type) = &record.doc_type {
        out.push_str(&format!("- doc_type: {}\n", doc_type));
    }
    for (key, value) in &record.raw_metadata {
        out.push_str(&format!("- {}: {}\n", key, value));
    }

    if !record.headings.is_empty() {
        out.push_str("\n## HEADINGS\n\n");
        for heading in &record.headings {
            out.push_str(&format!("- {}\n", heading));
        }
    }

    if !record.preview.is_empty() {
        out.push_str("\n## PREVIEW (limited)\n\n");
        out.push_str(&format!("{}\n", record.preview));
    }

    if !record.summary.is_empty() {
        out.push_str("\n## SUMMARY\n\n");
        out.push_str(&format!("{}\n", record.summary));
    }

    if !record.keywords.is_empty() {
        out.push_str("\n## KEYWORDS\n\n");
        out.push_str(&format!("{}\n", record.keywords.join(", ")));
    }

    Ok(out)
}

/// Render the latest-document map: one block per group, in key order.
pub fn render_latest_map(entries: &[LatestEntry<'_>], generated_at: &str) -> String {
    let mut out = String::new();
    out.push_str("# latest_map\n\n");
    out.push_str(&format!("generated_at: {}\n", generated_at));

    for entry in entries {
        out.push_str(&format!(
            "\n## {} / {} / {}\n\n",
            entry.key.system, entry.key.screen_id, entry.key.doc_type
        ));
        out.push_str(&format!("- latest: {}\n", entry.winner.title));
        out.push_str(&format!("- path: {}\n", entry.winner.path));
        out.push_str(&format!("- updated_at: {}\n", entry.winner.updated_at));
        out.push_str(&format!("- version_key: {}\n", entry.winner.version_key));
        out.push_str(&format!("- candidates: {}\n", entry.members));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::version::{GroupMember, VersionResolver};

    fn record() -> DocRecord {
        DocRecord {
            doc_id: "0011223344556677".to_string(),
            title: "SCR-001_design_v2".to_string(),
            path: "/srv/share/ordering/SCR-001_design_v2.docx".to_string(),
            rel_path: "ordering/SCR-001_design_v2.docx".to_string(),
            format: "docx".to_string(),
            size_bytes: 4096,
            updated_at: "2024-03-15T10:00:00".to_string(),
            mtime_epoch: 1_710_496_800_000,
            content_hash: None,
            system: Some("ordering".to_string()),
            screen_id: Some("SCR-001".to_string()),
            doc_type: Some("design".to_string()),
            version_key: "P2-D00000000-V002000000000-R000-M0000000000".to_string(),
            ordinal: VersionOrdinal::default(),
            headings: vec!["Overview".to_string(), "Layout".to_string()],
            preview: "The login screen shows two fields.".to_string(),
            summary: "The login screen shows two fields.".to_string(),
            keywords: vec!["login".to_string(), "screen".to_string()],
            raw_metadata: BTreeMap::new(),
            aliases: vec![PathBuf::from("/srv/share/links/latest_design.lnk")],
        }
    }

    #[test]
    fn test_front_matter_fences_and_fields() {
        let md = render_document(&record()).unwrap();
        assert!(md.starts_with("---\n"));
        let close = md.find("\n---\n").unwrap();
        let front = &md[4..close + 1];
        assert!(front.contains("doc_id: '0011223344556677'") || front.contains("doc_id: \"0011223344556677\"") || front.contains("doc_id: 0011223344556677"));
        assert!(front.contains("system: ordering"));
        assert!(front.contains("version_key:"));
        assert!(!front.contains("content_hash"));
    }

    #[test]
    fn test_sections_present() {
        let md = render_document(&record()).unwrap();
        assert!(md.contains("# SCR-001_design_v2\n"));
        assert!(md.contains("## PATH\n"));
        assert!(md.contains("## ALIASES (shortcuts / links)\n"));
        assert!(md.contains("- /srv/share/links/latest_design.lnk\n"));
        assert!(md.contains("## HEADINGS\n\n- Overview\n- Layout\n"));
        assert!(md.contains("## PREVIEW (limited)\n"));
        assert!(md.contains("## KEYWORDS\n\nlogin, screen\n"));
    }

    #[test]
    fn test_empty_sections_omitted() {
        let mut r = record();
        r.aliases.clear();
        r.headings.clear();
        r.summary.clear();
        r.keywords.clear();
        let md = render_document(&r).unwrap();
        assert!(!md.contains("## ALIASES"));
        assert!(!md.contains("## HEADINGS"));
        assert!(!md.contains("## SUMMARY"));
        assert!(!md.contains("## KEYWORDS"));
        assert!(md.contains("## PATH"));
        assert!(md.contains("## METADATA"));
    }

    #[test]
    fn test_latest_map_rendering() {
        let mut resolver = VersionResolver::new(true);
        let identity = Classification {
            system: Some("ordering".into()),
            screen_id: Some("SCR-001".into()),
            doc_type: Some("design".into()),
        };
        resolver.insert(
            &identity,
            GroupMember {
                title: "SCR-001_design_v2".to_string(),
                path: "ordering/SCR-001_design_v2.docx".to_string(),
                updated_at: "2024-03-15T10:00:00".to_string(),
                version_key: "P2-D00000000-V002000000000-R000-M0000000000".to_string(),
                ordinal: VersionOrdinal {
                    priority: 2,
                    semver: [2, 0, 0, 0],
                    ..VersionOrdinal::default()
                },
            },
        );

        let entries = resolver.latest();
        let md = render_latest_map(&entries, "2024-03-16T00:00:00");
        assert!(md.starts_with("# latest_map\n"));
        assert!(md.contains("generated_at: 2024-03-16T00:00:00\n"));
        assert!(md.contains("## ordering / SCR-001 / design\n"));
        assert!(md.contains("- latest: SCR-001_design_v2\n"));
        assert!(md.contains("- candidates: 1\n"));
    }
}
