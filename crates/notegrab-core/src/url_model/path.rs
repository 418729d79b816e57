//! Destination path layout: `<output_dir>/<category>/<title>.<extension>`.

use std::path::{Path, PathBuf};

use super::sanitize::{sanitize_path_component, NAME_MAX};

/// File stem used when a title sanitizes to nothing.
const UNTITLED: &str = "untitled";

/// Builds the destination for a downloaded document.
///
/// An empty category puts the file directly under `output_dir`.
pub fn destination_path(output_dir: &Path, category: &str, title: &str, extension: &str) -> PathBuf {
    tagged_destination_path(output_dir, category, title, "", extension)
}

/// Like [`destination_path`], with `tag` appended to the file stem as
/// `<title> <tag>`. The title is truncated first so the tag always survives.
pub fn tagged_destination_path(
    output_dir: &Path,
    category: &str,
    title: &str,
    tag: &str,
    extension: &str,
) -> PathBuf {
    let ext = extension.trim_start_matches('.');
    let stem_budget = if ext.is_empty() {
        NAME_MAX
    } else {
        NAME_MAX.saturating_sub(ext.len() + 1)
    };
    let tag = sanitize_path_component(tag, stem_budget / 2);
    let title_budget = if tag.is_empty() {
        stem_budget
    } else {
        stem_budget.saturating_sub(tag.len() + 1)
    };
    let mut stem = sanitize_path_component(title, title_budget);
    if stem.is_empty() {
        stem = UNTITLED.to_string();
    }
    if !tag.is_empty() {
        stem = format!("{} {}", stem, tag);
    }
    let file_name = if ext.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, ext)
    };

    let mut path = output_dir.to_path_buf();
    let category = sanitize_path_component(category, NAME_MAX);
    if !category.is_empty() {
        path.push(category);
    }
    path.push(file_name);
    path
}
