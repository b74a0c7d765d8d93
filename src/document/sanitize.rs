//! Filename sanitizer.
//!
//! Client-supplied filenames are untrusted. [`sanitize_filename`] reduces any
//! input to a name that is safe both as part of a storage identifier and for
//! display.

/// Maximum length in bytes of a sanitized filename.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Character substituted for anything outside the safe set.
pub const PLACEHOLDER: char = '_';

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

/// Sanitize an untrusted filename.
///
/// - Directory components (both `/` and `\` separated) are dropped.
/// - Characters outside `[A-Za-z0-9._-]` become [`PLACEHOLDER`].
/// - Runs of dots collapse to one dot and a leading dot is replaced, so the
///   result never contains `..` and never names a hidden file.
/// - The result is at most [`MAX_FILENAME_LENGTH`] bytes, keeping the extension.
///
/// Never fails; an empty or fully stripped input yields `"_"`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut out = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if is_safe_char(c) { c } else { PLACEHOLDER };
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }

    if out.starts_with('.') {
        out.replace_range(..1, "_");
    }
    if out.is_empty() {
        out.push(PLACEHOLDER);
    }

    truncate_preserving_extension(&out, MAX_FILENAME_LENGTH)
}

/// Truncate an ASCII name to `max_len` bytes, keeping its extension when the
/// extension itself fits.
pub fn truncate_preserving_extension(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }

    let ext = match name.rfind('.') {
        Some(pos) if pos > 0 && name.len() - pos < max_len => &name[pos..],
        _ => "",
    };

    let stem_budget = max_len - ext.len();
    let stem = floor_char_boundary(name, stem_budget);
    let stem = name[..stem].trim_end_matches('.');
    let stem = if stem.is_empty() { "_" } else { stem };

    format!("{stem}{ext}")
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
