//! Logical document identity: system, screen_id, doc_type
//!
//! Identity is inferred only from the relative path, the filename and
//! any alias names pointing at the file. File content never
//! participates, so classification is stable across content edits and
//! cannot leak extracted text into grouping keys.

use crate::config::{ClassifyConfig, DocTypeRule};
use crate::error::{Result, ScanError};
use regex::Regex;
use std::path::{Component, Path};

/// The inferred identity triple; each part is independently optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub system: Option<String>,
    pub screen_id: Option<String>,
    pub doc_type: Option<String>,
}

pub struct Classifier {
    system_from_path: bool,
    system_depth: usize,
    screen_patterns: Vec<Regex>,
    doc_type_rules: Vec<DocTypeRule>,
}

impl Classifier {
    pub fn new(config: &ClassifyConfig) -> Result<Self> {
        let screen_patterns = config
            .screen_id_patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| ScanError::Config(format!("invalid pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            system_from_path: config.system_from_path,
            system_depth: config.system_depth.max(1),
            screen_patterns,
            doc_type_rules: config.doc_type_rules.clone(),
        })
    }

    /// `rel_path` is the path below the nearest root; `name_texts` are
    /// the filename stem and the stems of any aliases, in that order.
    pub fn classify(&self, rel_path: &str, name_texts: &[String]) -> Classification {
        Classification {
            system: self.infer_system(rel_path),
            screen_id: self.infer_screen_id(name_texts),
            doc_type: self.infer_doc_type(name_texts),
        }
    }

    /// Directory component at the configured depth below the root.
    /// A file sitting at a shallower depth has no system.
    fn infer_system(&self, rel_path: &str) -> Option<String> {
        if !self.system_from_path {
            return None;
        }
        let components: Vec<&str> = Path::new(rel_path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        // The last component is the filename, never a system
        if components.len() < self.system_depth + 1 {
            return None;
        }
        Some(components[self.system_depth - 1].to_string())
    }

    /// First pattern wins, over the texts in order. Capture group 1 is
    /// the id when present, otherwise the whole match.
    fn infer_screen_id(&self, name_texts: &[String]) -> Option<String> {
        for rx in &self.screen_patterns {
            for text in name_texts {
                if let Some(caps) = rx.captures(text) {
                    let m = caps.get(1).or_else(|| caps.get(0))?;
                    return Some(m.as_str().to_string());
                }
            }
        }
        None
    }

    /// First rule whose keyword appears (case-insensitive) in any text
    fn infer_doc_type(&self, name_texts: &[String]) -> Option<String> {
        let lowered: Vec<String> = name_texts.iter().map(|t| t.to_lowercase()).collect();
        for rule in &self.doc_type_rules {
            for keyword in &rule.contains_any {
                let keyword = keyword.to_lowercase();
                if lowered.iter().any(|t| t.contains(&keyword)) {
                    return Some(rule.doc_type.clone());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        let config = ClassifyConfig {
            system_from_path: true,
            system_depth: 1,
            screen_id_patterns: vec![r"(SCR-\d{3})".to_string(), r"画面(\d+)".to_string()],
            doc_type_rules: vec![
                DocTypeRule {
                    contains_any: vec!["設計".to_string(), "design".to_string()],
                    doc_type: "design".to_string(),
                },
                DocTypeRule {
                    contains_any: vec!["manual".to_string(), "手順".to_string()],
                    doc_type: "manual".to_string(),
                },
            ],
        };
        Classifier::new(&config).unwrap()
    }

    #[test]
    fn test_system_from_first_component() {
        let c = classifier();
        let id = c.classify("ordering/screens/SCR-001_design.docx", &[]);
        assert_eq!(id.system.as_deref(), Some("ordering"));
    }

    #[test]
    fn test_file_directly_under_root_has_no_system() {
        let c = classifier();
        let id = c.classify("readme.txt", &[]);
        assert_eq!(id.system, None);
    }

    #[test]
    fn test_screen_id_capture_group() {
        let c = classifier();
        let id = c.classify(
            "ordering/SCR-042_design_v2.docx",
            &["SCR-042_design_v2".to_string()],
        );
        assert_eq!(id.screen_id.as_deref(), Some("SCR-042"));
    }

    #[test]
    fn test_screen_id_from_alias_name() {
        let c = classifier();
        // The file itself is named opaquely; the alias carries the id
        let id = c.classify(
            "ordering/final.docx",
            &["final".to_string(), "画面12_設計書".to_string()],
        );
        assert_eq!(id.screen_id.as_deref(), Some("12"));
        assert_eq!(id.doc_type.as_deref(), Some("design"));
    }

    #[test]
    fn test_first_pattern_wins_over_later_text() {
        let c = classifier();
        let id = c.classify(
            "x/a.docx",
            &["no id here".to_string(), "SCR-777 spec".to_string()],
        );
        assert_eq!(id.screen_id.as_deref(), Some("SCR-777"));
    }

    #[test]
    fn test_doc_type_case_insensitive() {
        let c = classifier();
        let id = c.classify("x/ORDER_DESIGN_FINAL.docx", &["ORDER_DESIGN_FINAL".to_string()]);
        assert_eq!(id.doc_type.as_deref(), Some("design"));
    }

    #[test]
    fn test_rule_order_decides_doc_type() {
        let c = classifier();
        // Matches both rule sets; the first configured rule wins
        let id = c.classify("x/design_manual.txt", &["design_manual".to_string()]);
        assert_eq!(id.doc_type.as_deref(), Some("design"));
    }

    #[test]
    fn test_deeper_system_depth() {
        let config = ClassifyConfig {
            system_depth: 2,
            ..ClassifyConfig::default()
        };
        let c = Classifier::new(&config).unwrap();
        let id = c.classify("dept/ordering/spec.docx", &[]);
        assert_eq!(id.system.as_deref(), Some("ordering"));
        let id = c.classify("dept/spec.docx", &[]);
        assert_eq!(id.system, None);
    }
}
