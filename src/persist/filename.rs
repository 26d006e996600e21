//! File names for saved images.

use std::path::{Path, PathBuf};

use url::Url;

const MAX_STEM_CHARS: usize = 80;
const FALLBACK_STEM: &str = "image";

/// Builds `{stem}{ext}` from a record's name value.
///
/// The extension comes from the URL path when it has one, otherwise from the
/// response Content-Type.
pub(crate) fn image_file_name(name: &str, url: &str, content_type: Option<&str>) -> String {
    let stem = sanitize_stem(name);
    let extension = extension_from_url(url).unwrap_or_else(|| {
        content_type
            .map_or(".bin", extension_from_content_type)
            .to_string()
    });
    format!("{stem}{extension}")
}

/// Collapses runs of unsafe characters to `_`, trims, and caps the length.
pub(crate) fn sanitize_stem(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            c if c.is_alphanumeric() || matches!(c, '-' | '_') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    let trimmed: String = out
        .trim_matches('_')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    let trimmed = trimmed.trim_end_matches('_');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index..];
    if ext.len() <= 1 || ext.len() > 6 || !ext[1..].chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

pub(crate) fn extension_from_content_type(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/tiff" => ".tif",
        "image/svg+xml" => ".svg",
        _ => ".bin",
    }
}

/// Returns `dir/filename`, or `dir/{stem}_{n}{ext}` for the first free `n`.
pub(crate) fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let base_path = dir.join(filename);
    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) => (&filename[..pos], &filename[pos..]),
        None => (filename, ""),
    };
    (2..)
        .map(|i| dir.join(format!("{stem}_{i}{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base_path)
}
