//! Scan run orchestration
//!
//! A run is a fixed pipeline: validate config, expand roots into
//! targets, fingerprint everything, extract only what changed (in
//! parallel), redact, render, then persist state and the latest map.
//! Per-file failures become recorded skips; only config errors,
//! unavailable roots and state persistence abort the run.

use crate::classify::{Classification, Classifier};
use crate::config::ScanConfig;
use crate::error::{Result, ScanError, Skip, SkipReason};
use crate::extract::{self, DocumentFormat, ExtractedDocument, Outline};
use crate::filter::PathFilter;
use crate::fingerprint::FileFingerprint;
use crate::mask::{Masker, RedactedDocument};
use crate::paths;
use crate::render::{self, DocRecord};
use crate::shortcut::ShortcutResolver;
use crate::state::{DocMeta, StateEntry, StateStore};
use crate::summary::Summarizer;
use crate::version::{GroupMember, VersionParser, VersionResolver};
use chrono::Utc;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a run did, for reporting
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Documents rendered this run (changed or new)
    pub records: Vec<DocRecord>,
    pub extracted: usize,
    pub reused: usize,
    pub skips: Vec<Skip>,
    /// Paths present last run but gone now
    pub deleted: Vec<String>,
}

struct Job {
    key: String,
    path: PathBuf,
    aliases: Vec<String>,
    fingerprint: FileFingerprint,
    format: DocumentFormat,
}

pub struct ScanOrchestrator {
    config: ScanConfig,
    out_dir: PathBuf,
    state_path: PathBuf,
    dry_run: bool,
}

impl ScanOrchestrator {
    pub fn new(config: ScanConfig, out_dir: impl Into<PathBuf>) -> Self {
        let out_dir = out_dir.into();
        let state_path = out_dir.join("state.json");
        Self {
            config,
            out_dir,
            state_path,
            dry_run: false,
        }
    }

    /// Keep the state file somewhere other than `<out>/state.json`
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Walk, fingerprint and report without writing anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(&self) -> Result<ScanOutcome> {
        self.config.validate()?;

        let roots = self.canonical_roots()?;
        let filter = PathFilter::new(&self.config)?;
        let masker = Masker::new(&self.config.masking)?;
        let classifier = Classifier::new(&self.config.classify)?;
        let version_parser = VersionParser::new(&self.config.version)?;
        let summarizer = Summarizer::new(self.config.summary_sentences, self.config.keywords_topk)?;

        let docs_dir = self.out_dir.join("docs");
        if !self.dry_run {
            std::fs::create_dir_all(&docs_dir)?;
        }

        let mut state = StateStore::load(&self.state_path);
        let mut outcome = ScanOutcome::default();
        let mut latest = VersionResolver::new(self.config.latest_map.allow_fallback_keys);

        info!(roots = roots.len(), "scan starting");
        let resolver = ShortcutResolver::new(self.config.shortcuts.clone(), roots.clone());
        let expansion = resolver.expand(&filter);
        outcome.skips = expansion.skips;

        // One entry per real file, with every alias that reached it
        let mut unique: BTreeMap<String, (PathBuf, BTreeSet<String>)> = BTreeMap::new();
        for target in expansion.targets {
            let key = paths::canonical_key(&target.path);
            let slot = unique.entry(key).or_insert_with(|| (target.path, BTreeSet::new()));
            for alias in &target.alias_chain {
                slot.1.insert(alias.to_string_lossy().into_owned());
            }
        }
        info!(targets = unique.len(), "targets resolved");

        let mut jobs = Vec::new();
        for (key, (path, alias_set)) in unique {
            let fingerprint = match FileFingerprint::from_path(&path, self.config.hash_contents) {
                Ok(fp) => fp,
                Err(e) => {
                    outcome.skips.push(Skip::new(path, SkipReason::Stat(e.to_string())));
                    continue;
                }
            };
            let aliases: Vec<String> = alias_set.into_iter().collect();

            // An alias-set change re-renders even when content did not
            // change, so surrogates never show stale alias lists.
            let unchanged = !state.is_changed(&key, &fingerprint)
                && state
                    .previous_entry(&key)
                    .map_or(false, |e| e.aliases == aliases);

            if unchanged {
                let previous = state
                    .previous_entry(&key)
                    .cloned()
                    .unwrap_or_else(|| unreachable_entry(&path));
                self.reuse_entry(&previous, &version_parser, &roots, &mut latest);
                outcome.reused += 1;
                state.record(
                    key,
                    StateEntry {
                        fingerprint,
                        ..previous
                    },
                );
                continue;
            }

            let Some(format) = DocumentFormat::from_path(&path) else {
                let ext = path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default();
                outcome.skips.push(Skip::new(path, SkipReason::UnsupportedFormat(ext)));
                continue;
            };

            jobs.push(Job {
                key,
                path,
                aliases,
                fingerprint,
                format,
            });
        }
        info!(changed = jobs.len(), reused = outcome.reused, "change detection done");

        // Extraction is the expensive part; everything after it is
        // cheap and runs sequentially for deterministic state updates.
        let limits = self.config.limits.clone();
        let extracted: Vec<(Job, Result<Outline>)> = jobs
            .into_par_iter()
            .map(|job| {
                let outline = extract::extract(&job.path, job.format, &limits);
                (job, outline)
            })
            .collect();

        for (job, outline) in extracted {
            let outline = match outline {
                Ok(o) => o,
                Err(e) => {
                    warn!(path = %job.path.display(), "extraction failed: {}", e);
                    outcome
                        .skips
                        .push(Skip::new(&job.path, SkipReason::Extraction(e.to_string())));
                    continue;
                }
            };

            let record = self.build_record(
                &job,
                outline,
                &roots,
                &masker,
                &classifier,
                &version_parser,
                &summarizer,
            );

            if !self.dry_run {
                let target = docs_dir.join(format!("{}.md", record.doc_id));
                let written = render::render_document(&record)
                    .and_then(|rendered| std::fs::write(&target, rendered).map_err(ScanError::from));
                if let Err(e) = written {
                    // Not recorded in state, so the next run retries
                    outcome
                        .skips
                        .push(Skip::new(&job.path, SkipReason::WriteFailed(e.to_string())));
                    continue;
                }
            }

            if self.config.latest_map.enabled {
                let identity = Classification {
                    system: record.system.clone(),
                    screen_id: record.screen_id.clone(),
                    doc_type: record.doc_type.clone(),
                };
                latest.insert(
                    &identity,
                    GroupMember {
                        title: record.title.clone(),
                        path: record.rel_path.clone(),
                        updated_at: record.updated_at.clone(),
                        version_key: record.version_key.clone(),
                        ordinal: record.ordinal,
                    },
                );
            }

            state.record(
                job.key.clone(),
                StateEntry {
                    path: record.path.clone(),
                    fingerprint: job.fingerprint.clone(),
                    meta: DocMeta {
                        doc_id: record.doc_id.clone(),
                        title: record.title.clone(),
                        system: record.system.clone(),
                        screen_id: record.screen_id.clone(),
                        doc_type: record.doc_type.clone(),
                        version_key: record.version_key.clone(),
                        updated_at: record.updated_at.clone(),
                    },
                    aliases: job.aliases.clone(),
                },
            );
            outcome.extracted += 1;
            outcome.records.push(record);
        }

        // A skipped file still exists on disk and is retried next run;
        // only files absent from both lists are truly gone.
        let skipped: BTreeSet<String> = outcome
            .skips
            .iter()
            .map(|s| paths::canonical_key(&s.path))
            .collect();
        outcome.deleted = state
            .deleted()
            .iter()
            .map(|e| e.path.clone())
            .filter(|p| !skipped.contains(&paths::canonical_key(Path::new(p))))
            .collect();
        for path in &outcome.deleted {
            info!(path = %path, "previously indexed file is gone");
        }

        if !self.dry_run {
            state.save()?;
            if self.config.latest_map.enabled {
                let entries = latest.latest();
                let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
                let map = render::render_latest_map(&entries, &now);
                std::fs::write(self.out_dir.join("latest_map.md"), map)?;
            }
        }

        info!(
            extracted = outcome.extracted,
            reused = outcome.reused,
            skipped = outcome.skips.len(),
            deleted = outcome.deleted.len(),
            "scan finished"
        );
        Ok(outcome)
    }

    fn canonical_roots(&self) -> Result<Vec<PathBuf>> {
        self.config
            .roots
            .iter()
            .map(|root| {
                let canonical = root
                    .canonicalize()
                    .map_err(|_| ScanError::RootUnavailable(root.clone()))?;
                if !canonical.is_dir() {
                    return Err(ScanError::RootUnavailable(root.clone()));
                }
                Ok(canonical)
            })
            .collect()
    }

    /// Feed an unchanged file into the latest map from its stored
    /// metadata; no extraction happens.
    fn reuse_entry(
        &self,
        entry: &StateEntry,
        version_parser: &VersionParser,
        roots: &[PathBuf],
        latest: &mut VersionResolver,
    ) {
        if !self.config.latest_map.enabled {
            return;
        }
        let path = Path::new(&entry.path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ordinal = version_parser.infer(&file_name, entry.fingerprint.mtime_epoch / 1000);
        let identity = Classification {
            system: entry.meta.system.clone(),
            screen_id: entry.meta.screen_id.clone(),
            doc_type: entry.meta.doc_type.clone(),
        };
        latest.insert(
            &identity,
            GroupMember {
                title: entry.meta.title.clone(),
                path: paths::relative_to_nearest_root(path, roots),
                updated_at: entry.meta.updated_at.clone(),
                version_key: entry.meta.version_key.clone(),
                ordinal,
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn build_record(
        &self,
        job: &Job,
        outline: Outline,
        roots: &[PathBuf],
        masker: &Masker,
        classifier: &Classifier,
        version_parser: &VersionParser,
        summarizer: &Summarizer,
    ) -> DocRecord {
        let stem = job
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = job
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rel_path = paths::relative_to_nearest_root(&job.path, roots);

        // Identity comes from names only, never from content
        let mut name_texts = vec![stem.clone()];
        for alias in &job.aliases {
            if let Some(alias_stem) = Path::new(alias).file_stem() {
                name_texts.push(alias_stem.to_string_lossy().into_owned());
            }
        }
        let identity = classifier.classify(&rel_path, &name_texts);
        let ordinal = version_parser.infer(&file_name, job.fingerprint.mtime_epoch / 1000);

        let scored_text = if outline.headings.is_empty() {
            outline.preview.clone()
        } else {
            format!("{}\n{}", outline.headings.join("\n"), outline.preview)
        };
        let doc = ExtractedDocument {
            path: job.path.clone(),
            format: job.format,
            headings: outline.headings,
            preview: outline.preview.clone(),
            summary: summarizer.summarize(&outline.preview),
            keywords: summarizer.keywords(&scored_text),
            raw_metadata: outline.metadata,
        };
        let doc = RedactedDocument::new(doc, masker).into_inner();

        DocRecord {
            doc_id: doc_id_for(&job.key),
            title: masker.redact(&stem),
            path: job.path.to_string_lossy().into_owned(),
            rel_path,
            format: doc.format.as_str().to_string(),
            size_bytes: job.fingerprint.size,
            updated_at: format_timestamp(job.fingerprint.mtime_epoch),
            mtime_epoch: job.fingerprint.mtime_epoch,
            content_hash: job.fingerprint.content_hash.clone(),
            system: identity.system,
            screen_id: identity.screen_id,
            doc_type: identity.doc_type,
            version_key: ordinal.encode(),
            ordinal,
            headings: doc.headings,
            preview: doc.preview,
            summary: doc.summary,
            keywords: doc.keywords,
            raw_metadata: doc.raw_metadata,
            aliases: job.aliases.iter().map(PathBuf::from).collect(),
        }
    }
}

/// Stable document id: first 16 hex chars of the canonical key's SHA-256
fn doc_id_for(canonical_key: &str) -> String {
    let digest = Sha256::digest(canonical_key.as_bytes());
    hex::encode(digest)[..16].to_string()
}

fn format_timestamp(mtime_ms: i64) -> String {
    chrono::DateTime::<Utc>::from_timestamp_millis(mtime_ms)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

// `unchanged` implies the previous entry exists; this keeps the reuse
// path total without an unwrap.
fn unreachable_entry(path: &Path) -> StateEntry {
    StateEntry {
        path: path.to_string_lossy().into_owned(),
        fingerprint: FileFingerprint {
            size: 0,
            mtime_epoch: 0,
            content_hash: None,
        },
        meta: DocMeta::default(),
        aliases: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> ScanConfig {
        ScanConfig::default().add_root(root)
    }

    #[test]
    fn test_doc_id_is_stable_and_short() {
        let a = doc_id_for("/srv/share/a.txt");
        let b = doc_id_for("/srv/share/a.txt");
        let c = doc_id_for("/srv/share/b.txt");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14T22:13:20");
    }

    #[test]
    fn test_basic_run_writes_surrogate_state_and_map() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("ordering")).unwrap();
        std::fs::write(
            root.path().join("ordering/design_v2.txt"),
            "# Login screen\n\nShows two input fields and a submit button for login.\n",
        )
        .unwrap();

        let outcome = ScanOrchestrator::new(config_for(root.path()), out.path())
            .run()
            .unwrap();

        assert_eq!(outcome.extracted, 1);
        assert_eq!(outcome.reused, 0);
        assert!(outcome.skips.is_empty());
        assert!(out.path().join("state.json").exists());
        assert!(out.path().join("latest_map.md").exists());

        let doc_path = out.path().join("docs").join(format!("{}.md", outcome.records[0].doc_id));
        let md = std::fs::read_to_string(doc_path).unwrap();
        assert!(md.contains("# design_v2"));
        assert!(md.contains("Login screen"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(root.path().join("a.txt"), "some content for the scan").unwrap();

        let outcome = ScanOrchestrator::new(config_for(root.path()), out.path())
            .with_dry_run(true)
            .run()
            .unwrap();

        assert_eq!(outcome.extracted, 1);
        assert!(!out.path().join("state.json").exists());
        assert!(!out.path().join("docs").exists());
        assert!(!out.path().join("latest_map.md").exists());
    }

    #[test]
    fn test_missing_root_aborts() {
        let out = TempDir::new().unwrap();
        let config = ScanConfig::default().add_root("/definitely/not/here");
        let err = ScanOrchestrator::new(config, out.path()).run().unwrap_err();
        assert!(matches!(err, ScanError::RootUnavailable(_)));
    }
}
