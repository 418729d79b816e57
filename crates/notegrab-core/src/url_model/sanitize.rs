//! Text normalization for scanned headings/titles and filesystem-safe path components.

/// Linux NAME_MAX.
pub(crate) const NAME_MAX: usize = 255;

/// Collapses runs of whitespace (including newlines from the markup) into single
/// spaces and trims both ends.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes heading text into a category name: whitespace collapsed and every
/// `/` replaced by `-`.
///
/// `"Week 1/Intro"` → `"Week 1-Intro"`
pub fn normalize_category(raw: &str) -> String {
    normalize_text(raw).replace('/', "-")
}

/// Makes a single path component safe to join under the output directory.
///
/// - `/` and `\` become `-`
/// - NUL and other control characters are dropped
/// - `.` and `..` become `_` so a component can never climb out of its parent
/// - Truncated to `max_bytes` on a char boundary
pub fn sanitize_path_component(name: &str, max_bytes: usize) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '/' | '\\' => out.push('-'),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    let trimmed = out.trim();

    let mut take = trimmed.len().min(max_bytes.min(NAME_MAX));
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    let truncated = trimmed[..take].trim_end();

    match truncated {
        "." | ".." => "_".to_string(),
        s => s.to_string(),
    }
}
