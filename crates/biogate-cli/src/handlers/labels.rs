//! `biogate labels`

use super::load_config;
use anyhow::Result;
use biogate_core::{resolve_display_category, LabelKind, LabelTable, ModalityBitmask};
use std::fmt::Write;
use std::path::Path;

const NEUTRAL: &str = "-";

/// Print the category and strings for each of the 16 bitmask values.
pub fn run(path: Option<&Path>) -> Result<String> {
    let labels = match path {
        Some(path) => load_config(path)?.labels,
        None => LabelTable::default(),
    };
    render(&labels)
}

fn render(labels: &LabelTable) -> Result<String> {
    let mut out = String::new();
    for mask in ModalityBitmask::all_values() {
        let category = resolve_display_category(mask);
        let text = |kind| labels.label(category, kind).unwrap_or_else(|| NEUTRAL.to_string());
        writeln!(
            out,
            "{:<32} {:<28} button={:?} prompt={:?} setting={:?}",
            mask.to_string(),
            category.as_str(),
            text(LabelKind::Button),
            text(LabelKind::Prompt),
            text(LabelKind::Setting),
        )?;
    }
    Ok(out)
}
