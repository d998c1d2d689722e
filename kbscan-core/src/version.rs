//! Filename version markers and latest-document resolution
//!
//! Ordering is explicit-marker first: a date in the filename outranks
//! any `v2`-style marker, which outranks a bare revision number. The
//! file mtime participates only when the filename carries no marker at
//! all, so renaming-free save churn cannot reorder explicitly
//! versioned documents. Full ties are broken by path, making the
//! winner deterministic across runs.

use crate::classify::Classification;
use crate::config::VersionRules;
use crate::error::{Result, ScanError};
use regex::Regex;
use std::collections::BTreeMap;

pub const FALLBACK_SYSTEM: &str = "__NO_SYSTEM__";
pub const FALLBACK_SCREEN: &str = "__NO_SCREEN__";
pub const FALLBACK_TYPE: &str = "__NO_TYPE__";

const DATE_PATTERN: &str =
    r"((?:19|20)\d{2})[._/-]?(0[1-9]|1[0-2])[._/-]?(0[1-9]|[12]\d|3[01])";
const DATE_JP_PATTERN: &str =
    r"((?:19|20)\d{2})年(0?[1-9]|1[0-2])月(0?[1-9]|[12]\d|3[01])日";
const SEMVER_PATTERN: &str = r"(?i)(?:\b|_)(?:v|ver|version)[-_ ]?(\d+(?:\.\d+){0,3})\b";
const REVISION_PATTERN: &str = r"(?i)(?:\b|_)(?:rev|r)[-_ ]?(\d{1,3})\b";

/// Total order over document versions. Field order is the comparison
/// order: marker priority, then date, semver, revision, and mtime
/// last. mtime is zero whenever any explicit marker was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionOrdinal {
    pub priority: u8,
    pub date: u32,
    pub semver: [u16; 4],
    pub revision: u16,
    pub mtime_epoch: i64,
}

impl VersionOrdinal {
    /// Fixed-width sortable key for state files and front matter
    pub fn encode(&self) -> String {
        format!(
            "P{}-D{:08}-V{:03}{:03}{:03}{:03}-R{:03}-M{:010}",
            self.priority,
            self.date,
            self.semver[0].min(999),
            self.semver[1].min(999),
            self.semver[2].min(999),
            self.semver[3].min(999),
            self.revision,
            self.mtime_epoch.max(0)
        )
    }
}

pub struct VersionParser {
    date: Option<(Regex, Regex)>,
    semver: Option<Regex>,
    revision: Option<Regex>,
}

impl VersionParser {
    pub fn new(rules: &VersionRules) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ScanError::Config(format!("version pattern '{}': {}", pattern, e)))
        };
        Ok(Self {
            date: if rules.date {
                Some((compile(DATE_PATTERN)?, compile(DATE_JP_PATTERN)?))
            } else {
                None
            },
            semver: if rules.semver {
                Some(compile(SEMVER_PATTERN)?)
            } else {
                None
            },
            revision: if rules.revision {
                Some(compile(REVISION_PATTERN)?)
            } else {
                None
            },
        })
    }

    /// Parse every enabled marker out of `filename`. The mtime is kept
    /// in the ordinal only when no marker matched.
    pub fn infer(&self, filename: &str, mtime_epoch: i64) -> VersionOrdinal {
        let mut date = 0u32;
        if let Some((ascii, jp)) = &self.date {
            for rx in [ascii, jp] {
                if let Some(caps) = rx.captures(filename) {
                    let year: u32 = caps[1].parse().unwrap_or(0);
                    let month: u32 = caps[2].parse().unwrap_or(0);
                    let day: u32 = caps[3].parse().unwrap_or(0);
                    date = year * 10_000 + month * 100 + day;
                    break;
                }
            }
        }

        let mut semver = [0u16; 4];
        let mut semver_found = false;
        if let Some(rx) = &self.semver {
            if let Some(caps) = rx.captures(filename) {
                semver_found = true;
                for (i, part) in caps[1].split('.').take(4).enumerate() {
                    semver[i] = part.parse().unwrap_or(0);
                }
            }
        }

        let mut revision = 0u16;
        let mut revision_found = false;
        if let Some(rx) = &self.revision {
            if let Some(caps) = rx.captures(filename) {
                revision_found = true;
                revision = caps[1].parse().unwrap_or(0);
            }
        }

        let priority = if date > 0 {
            3
        } else if semver_found {
            2
        } else if revision_found {
            1
        } else {
            0
        };

        VersionOrdinal {
            priority,
            date,
            semver,
            revision,
            mtime_epoch: if priority == 0 { mtime_epoch } else { 0 },
        }
    }
}

/// Grouping key for the latest-document map
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    pub system: String,
    pub screen_id: String,
    pub doc_type: String,
}

/// One candidate document within a group
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub title: String,
    pub path: String,
    pub updated_at: String,
    pub version_key: String,
    pub ordinal: VersionOrdinal,
}

/// The winner of one group, with the number of candidates it beat
#[derive(Debug)]
pub struct LatestEntry<'a> {
    pub key: &'a GroupKey,
    pub winner: &'a GroupMember,
    pub members: usize,
}

pub struct VersionResolver {
    allow_fallback: bool,
    groups: BTreeMap<GroupKey, Vec<GroupMember>>,
}

impl VersionResolver {
    pub fn new(allow_fallback: bool) -> Self {
        Self {
            allow_fallback,
            groups: BTreeMap::new(),
        }
    }

    /// Add a document under its group. Partially classified documents
    /// get placeholder key parts when fallback keys are allowed, and
    /// are dropped from the map otherwise.
    pub fn insert(&mut self, identity: &Classification, member: GroupMember) {
        let complete = identity.system.is_some()
            && identity.screen_id.is_some()
            && identity.doc_type.is_some();
        if !complete && !self.allow_fallback {
            return;
        }
        let key = GroupKey {
            system: identity
                .system
                .clone()
                .unwrap_or_else(|| FALLBACK_SYSTEM.to_string()),
            screen_id: identity
                .screen_id
                .clone()
                .unwrap_or_else(|| FALLBACK_SCREEN.to_string()),
            doc_type: identity
                .doc_type
                .clone()
                .unwrap_or_else(|| FALLBACK_TYPE.to_string()),
        };
        self.groups.entry(key).or_default().push(member);
    }

    /// One winner per group, in key order. Ordinal decides; a full tie
    /// goes to the lexicographically greatest path.
    pub fn latest(&self) -> Vec<LatestEntry<'_>> {
        self.groups
            .iter()
            .filter_map(|(key, members)| {
                members
                    .iter()
                    .max_by(|a, b| a.ordinal.cmp(&b.ordinal).then(a.path.cmp(&b.path)))
                    .map(|winner| LatestEntry {
                        key,
                        winner,
                        members: members.len(),
                    })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> VersionParser {
        VersionParser::new(&VersionRules::default()).unwrap()
    }

    fn member(path: &str, ordinal: VersionOrdinal) -> GroupMember {
        GroupMember {
            title: path.to_string(),
            path: path.to_string(),
            updated_at: String::new(),
            version_key: ordinal.encode(),
            ordinal,
        }
    }

    fn full_identity() -> Classification {
        Classification {
            system: Some("ordering".into()),
            screen_id: Some("SCR-001".into()),
            doc_type: Some("design".into()),
        }
    }

    #[test]
    fn test_date_markers() {
        let p = parser();
        assert_eq!(p.infer("design_2024-03-15.docx", 99).date, 20240315);
        assert_eq!(p.infer("design_20240315.docx", 99).date, 20240315);
        assert_eq!(p.infer("設計書2024年3月5日.docx", 99).date, 20240305);
        let ord = p.infer("design_2024-03-15.docx", 99);
        assert_eq!(ord.priority, 3);
        assert_eq!(ord.mtime_epoch, 0);
    }

    #[test]
    fn test_semver_markers() {
        let p = parser();
        assert_eq!(p.infer("spec_v2.docx", 0).semver, [2, 0, 0, 0]);
        assert_eq!(p.infer("spec_v1.2.3.docx", 0).semver, [1, 2, 3, 0]);
        assert_eq!(p.infer("spec Ver 10.docx", 0).semver, [10, 0, 0, 0]);
        assert_eq!(p.infer("spec_v2.docx", 0).priority, 2);
    }

    #[test]
    fn test_revision_marker() {
        let p = parser();
        let ord = p.infer("layout_rev7.xlsx", 0);
        assert_eq!((ord.priority, ord.revision), (1, 7));
        // SCR-001 is a screen id, not a revision
        assert_eq!(p.infer("SCR-001_layout.xlsx", 0).priority, 0);
    }

    #[test]
    fn test_no_marker_falls_back_to_mtime() {
        let p = parser();
        let older = p.infer("notes.txt", 1_000);
        let newer = p.infer("notes.txt", 2_000);
        assert_eq!(older.priority, 0);
        assert!(newer > older);
    }

    #[test]
    fn test_date_outranks_semver_and_semver_outranks_revision() {
        let p = parser();
        let dated = p.infer("spec_20200101.docx", 0);
        let semver = p.infer("spec_v99.docx", i64::MAX);
        let rev = p.infer("spec_rev99.docx", i64::MAX);
        assert!(dated > semver);
        assert!(semver > rev);
    }

    #[test]
    fn test_explicit_marker_ignores_mtime() {
        let p = parser();
        let a = p.infer("spec_v2.docx", 1_000);
        let b = p.infer("spec_v2.docx", 9_999);
        assert_eq!(a, b);
    }

    #[test]
    fn test_numeric_version_ordering_not_lexicographic() {
        let p = parser();
        assert!(p.infer("spec_v10.docx", 0) > p.infer("spec_v9.docx", 0));
        assert!(p.infer("spec_v2.10.docx", 0) > p.infer("spec_v2.9.docx", 0));
    }

    #[test]
    fn test_encode_is_order_preserving() {
        let p = parser();
        let lower = p.infer("spec_v2.docx", 0);
        let higher = p.infer("spec_20240101.docx", 0);
        assert!(higher.encode() > lower.encode());
        assert_eq!(
            p.infer("spec_v1.2.3.docx", 0).encode(),
            "P2-D00000000-V001002003000-R000-M0000000000"
        );
    }

    #[test]
    fn test_disabled_rule_is_not_parsed() {
        let rules = VersionRules {
            semver: false,
            ..VersionRules::default()
        };
        let p = VersionParser::new(&rules).unwrap();
        assert_eq!(p.infer("spec_v2.docx", 123).priority, 0);
        assert_eq!(p.infer("spec_v2.docx", 123).mtime_epoch, 123);
    }

    #[test]
    fn test_latest_picks_highest_ordinal() {
        let p = parser();
        let mut resolver = VersionResolver::new(true);
        resolver.insert(&full_identity(), member("a/spec_v1.docx", p.infer("spec_v1.docx", 0)));
        resolver.insert(&full_identity(), member("a/spec_v3.docx", p.infer("spec_v3.docx", 0)));
        resolver.insert(&full_identity(), member("a/spec_v2.docx", p.infer("spec_v2.docx", 0)));

        let latest = resolver.latest();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].winner.path, "a/spec_v3.docx");
        assert_eq!(latest[0].members, 3);
    }

    #[test]
    fn test_full_tie_breaks_on_greatest_path() {
        let p = parser();
        let mut resolver = VersionResolver::new(true);
        let ord = p.infer("spec_v2.docx", 0);
        resolver.insert(&full_identity(), member("a/spec_v2.docx", ord));
        resolver.insert(&full_identity(), member("b/spec_v2.docx", ord));

        assert_eq!(resolver.latest()[0].winner.path, "b/spec_v2.docx");
    }

    #[test]
    fn test_fallback_keys_for_partial_identity() {
        let mut resolver = VersionResolver::new(true);
        let identity = Classification {
            system: Some("ordering".into()),
            screen_id: None,
            doc_type: Some("design".into()),
        };
        resolver.insert(&identity, member("x.docx", VersionOrdinal::default()));

        let latest = resolver.latest();
        assert_eq!(latest[0].key.screen_id, FALLBACK_SCREEN);
        assert_eq!(latest[0].key.system, "ordering");
    }

    #[test]
    fn test_partial_identity_dropped_without_fallback() {
        let mut resolver = VersionResolver::new(false);
        let identity = Classification {
            system: Some("ordering".into()),
            screen_id: None,
            doc_type: None,
        };
        resolver.insert(&identity, member("x.docx", VersionOrdinal::default()));
        assert!(resolver.is_empty());
    }
}
