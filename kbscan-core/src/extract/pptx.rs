//! Presentation extraction
//!
//! The first text run of each slide is treated as its title. Slides
//! are visited in deck order up to the configured slide cap.

use super::{ooxml, Outline};
use crate::config::ExtractLimits;
use crate::error::Result;
use std::path::Path;

fn slide_number(name: &str) -> Option<usize> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

pub(super) fn extract(path: &Path, limits: &ExtractLimits) -> Result<Outline> {
    let mut slides: Vec<(usize, String)> = ooxml::entry_names(path)?
        .into_iter()
        .filter_map(|name| slide_number(&name).map(|n| (n, name)))
        .collect();
    slides.sort();
    slides.truncate(limits.max_preview_slides);

    let mut headings = Vec::new();
    let mut preview_parts = Vec::new();

    for (number, entry) in slides {
        let xml = ooxml::read_entry(path, &entry)?;
        let runs = ooxml::tag_texts(&xml, "a:t");
        let mut runs = runs.iter().map(|r| r.trim()).filter(|r| !r.is_empty());

        let Some(title) = runs.next() else { continue };
        if headings.len() < limits.max_headings {
            headings.push(format!("Slide {}: {}", number, title));
        }

        let body: Vec<&str> = runs.collect();
        if !body.is_empty() {
            preview_parts.push(format!("[Slide {}] {}", number, body.join(" ")));
        }
    }

    Ok(Outline {
        headings,
        preview: preview_parts.join("\n"),
        metadata: Default::default(),
    })
}
