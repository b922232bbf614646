// Filename-safe and display labels for subtitle tracks

/// Characters that survive unchanged in a safe label.
pub fn is_safe_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
///
/// The result is only used to build output filenames; user-facing text keeps
/// the original description.
pub fn build_safe_label(description: &str) -> String {
    description
        .chars()
        .map(|c| if is_safe_label_char(c) { c } else { '_' })
        .collect()
}

/// Human-readable one-line label, e.g. `[eng] (subrip) (default) - English`.
pub fn display_label(language: &str, codec: &str, description: &str) -> String {
    format!("[{}] ({}) {}", language, codec, description)
}
