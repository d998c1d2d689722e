//! Shortcut and symlink resolution, and root expansion
//!
//! A scan target is a real file plus the alias chain that led to it.
//! Two hard rules hold regardless of configuration: resolution never
//! loops (visited-set cycle guard) and targets outside the configured
//! roots are rejected unless `allow_outside_roots` is set.

use crate::config::ShortcutConfig;
use crate::error::{Result, ScanError, Skip, SkipReason};
use crate::filter::PathFilter;
use crate::paths;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A real file to fingerprint and possibly extract, with the shortcut
/// files (if any) that were followed to reach it.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    pub path: PathBuf,
    pub alias_chain: Vec<PathBuf>,
}

/// Result of walking the roots: concrete targets plus recorded skips
#[derive(Debug, Default)]
pub struct Expansion {
    pub targets: Vec<ScanTarget>,
    pub skips: Vec<Skip>,
}

struct Resolved {
    target: PathBuf,
    chain: Vec<PathBuf>,
}

pub struct ShortcutResolver {
    config: ShortcutConfig,
    roots: Vec<PathBuf>,
}

impl ShortcutResolver {
    /// `roots` must already be canonicalized by the caller.
    pub fn new(config: ShortcutConfig, roots: Vec<PathBuf>) -> Self {
        Self { config, roots }
    }

    /// A shortcut is a `.lnk` file or an OS symlink.
    pub fn is_shortcut(&self, path: &Path) -> bool {
        if has_lnk_extension(path) {
            return true;
        }
        std::fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    /// One resolution hop: symlink target or `.lnk` payload path.
    fn resolve_step(&self, path: &Path) -> Result<PathBuf> {
        if has_lnk_extension(path) {
            return parse_lnk(path);
        }
        let target = std::fs::read_link(path)?;
        if target.is_relative() {
            Ok(path.parent().unwrap_or(Path::new("")).join(target))
        } else {
            Ok(target)
        }
    }

    /// Follow a shortcut through at most `max_chain` shortcut-to-shortcut
    /// hops, guarding against cycles. The skip is attributed to the
    /// original shortcut file.
    fn resolve_chain(&self, shortcut: &Path) -> std::result::Result<Resolved, Skip> {
        let mut chain = vec![shortcut.to_path_buf()];
        // Lexical keys: canonicalizing would collapse every link in a
        // valid chain onto the final target and misreport a cycle.
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(paths::lexical_key(shortcut));
        let mut current = shortcut.to_path_buf();

        for _ in 0..=self.config.max_chain {
            let target = match self.resolve_step(&current) {
                Ok(t) => t,
                Err(e) => {
                    return Err(Skip::new(
                        shortcut,
                        SkipReason::BrokenShortcut(e.to_string()),
                    ))
                }
            };

            if self.is_shortcut(&target) {
                if !seen.insert(paths::lexical_key(&target)) {
                    return Err(Skip::new(shortcut, SkipReason::AliasCycle));
                }
                chain.push(target.clone());
                current = target;
                continue;
            }

            if !target.exists() {
                return Err(Skip::new(
                    shortcut,
                    SkipReason::BrokenShortcut(format!(
                        "target does not exist: {}",
                        target.display()
                    )),
                ));
            }
            return Ok(Resolved { target, chain });
        }

        Err(Skip::new(
            shortcut,
            SkipReason::BrokenShortcut(format!("chain exceeds {} hops", self.config.max_chain)),
        ))
    }

    /// Walk every root (and every followed directory alias) once and
    /// collect eligible file targets. Cheap filters run before any
    /// resolution; directory aliases back into visited territory are
    /// recorded as cycles, not followed.
    pub fn expand(&self, filter: &PathFilter) -> Expansion {
        let mut targets = Vec::new();
        let mut skips = Vec::new();
        let mut visited_dirs: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(PathBuf, Vec<PathBuf>)> =
            self.roots.iter().map(|r| (r.clone(), Vec::new())).collect();

        while let Some((dir, chain)) = queue.pop_front() {
            if !visited_dirs.insert(paths::canonical_key(&dir)) {
                continue;
            }
            debug!(dir = %dir.display(), "walking");

            let walker = WalkDir::new(&dir)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| {
                    e.depth() == 0
                        || !e.file_type().is_dir()
                        || !filter.is_dir_excluded(&e.file_name().to_string_lossy(), e.path())
                });

            for entry in walker {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        let at = e
                            .path()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| dir.clone());
                        skips.push(Skip::new(at, SkipReason::WalkError(e.to_string())));
                        continue;
                    }
                };
                let path = entry.path();

                if entry.file_type().is_dir() {
                    // Mark subdirectories so an alias pointing back in
                    // is caught as a cycle rather than walked twice.
                    visited_dirs.insert(paths::canonical_key(path));
                    continue;
                }

                if self.is_shortcut(path) {
                    if !self.config.enabled {
                        continue;
                    }
                    let resolved = match self.resolve_chain(path) {
                        Ok(r) => r,
                        Err(skip) => {
                            skips.push(skip);
                            continue;
                        }
                    };
                    if !self.config.allow_outside_roots
                        && !paths::is_within_any(&resolved.target, &self.roots)
                    {
                        skips.push(Skip::new(path, SkipReason::OutsideRoots));
                        continue;
                    }
                    // The hops that reached this directory come first,
                    // then the hops of the shortcut found inside it.
                    let mut full_chain = chain.clone();
                    full_chain.extend(resolved.chain);
                    if resolved.target.is_dir() {
                        if self.config.follow_dir_targets {
                            if visited_dirs.contains(&paths::canonical_key(&resolved.target)) {
                                skips.push(Skip::new(path, SkipReason::AliasCycle));
                            } else {
                                queue.push_back((resolved.target, full_chain));
                            }
                        }
                    } else if filter.is_file_eligible(&resolved.target) {
                        targets.push(ScanTarget {
                            path: resolved.target,
                            alias_chain: full_chain,
                        });
                    }
                    continue;
                }

                if filter.is_file_eligible(path) {
                    targets.push(ScanTarget {
                        path: path.to_path_buf(),
                        alias_chain: chain.clone(),
                    });
                }
            }
        }

        Expansion { targets, skips }
    }
}

fn has_lnk_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("lnk"))
        .unwrap_or(false)
}

const LNK_HEADER_SIZE: usize = 0x4C;
const LNK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x46,
];
const HAS_LINK_TARGET_ID_LIST: u32 = 0x01;
const HAS_LINK_INFO: u32 = 0x02;
const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 0x01;

/// Minimal shell-link reader: header, optional ID list skip, then the
/// local base path + common path suffix from the LinkInfo block.
/// Anything else (network-only links, missing LinkInfo) is an error.
fn parse_lnk(path: &Path) -> Result<PathBuf> {
    let bytes = std::fs::read(path)?;
    let fail = |reason: &str| ScanError::Alias {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if bytes.len() < LNK_HEADER_SIZE
        || read_u32(&bytes, 0) != Some(LNK_HEADER_SIZE as u32)
        || bytes[4..20] != LNK_CLSID
    {
        return Err(fail("not a shell link file"));
    }
    let flags = read_u32(&bytes, 20).ok_or_else(|| fail("truncated header"))?;

    let mut offset = LNK_HEADER_SIZE;
    if flags & HAS_LINK_TARGET_ID_LIST != 0 {
        let size = read_u16(&bytes, offset).ok_or_else(|| fail("truncated id list"))? as usize;
        offset += 2 + size;
    }
    if flags & HAS_LINK_INFO == 0 {
        return Err(fail("no LinkInfo block"));
    }

    let info = bytes
        .get(offset..)
        .filter(|s| s.len() >= 28)
        .ok_or_else(|| fail("truncated LinkInfo"))?;
    let header_size = read_u32(info, 4).ok_or_else(|| fail("truncated LinkInfo"))?;
    let info_flags = read_u32(info, 8).ok_or_else(|| fail("truncated LinkInfo"))?;
    if info_flags & VOLUME_ID_AND_LOCAL_BASE_PATH == 0 {
        return Err(fail("link has no local base path"));
    }

    // header_size >= 0x24 means the unicode offset pair is present
    let (base, suffix) = if header_size >= 0x24 {
        let base_off = read_u32(info, 28).ok_or_else(|| fail("truncated LinkInfo"))?;
        let suffix_off = read_u32(info, 32).ok_or_else(|| fail("truncated LinkInfo"))?;
        (wstr_at(info, base_off as usize), wstr_at(info, suffix_off as usize))
    } else {
        let base_off = read_u32(info, 16).ok_or_else(|| fail("truncated LinkInfo"))?;
        let suffix_off = read_u32(info, 24).ok_or_else(|| fail("truncated LinkInfo"))?;
        (cstr_at(info, base_off as usize), cstr_at(info, suffix_off as usize))
    };

    let base = base.ok_or_else(|| fail("missing base path"))?;
    let full = format!("{}{}", base, suffix.unwrap_or_default());
    if full.is_empty() {
        return Err(fail("empty target path"));
    }
    Ok(PathBuf::from(full))
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    bytes
        .get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

/// NUL-terminated ANSI string at `offset`
fn cstr_at(bytes: &[u8], offset: usize) -> Option<String> {
    let slice = bytes.get(offset..)?;
    let end = slice.iter().position(|&b| b == 0)?;
    Some(String::from_utf8_lossy(&slice[..end]).into_owned())
}

/// NUL-terminated UTF-16LE string at `offset`
fn wstr_at(bytes: &[u8], offset: usize) -> Option<String> {
    let slice = bytes.get(offset..)?;
    let mut units = Vec::new();
    for pair in slice.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        if unit == 0 {
            return Some(String::from_utf16_lossy(&units));
        }
        units.push(unit);
    }
    None
}
