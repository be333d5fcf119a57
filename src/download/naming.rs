//! File and folder naming for saved avatars.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static INVALID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[:*?"<>|]"#).expect("static pattern is valid"));

/// Replaces every `:`, `*`, `?`, `"`, `<`, `>` and `|` with `_`.
///
/// Nothing else is touched, so the result is stable under repeated application.
pub fn sanitize(name: &str) -> String {
    INVALID_CHARS.replace_all(name, "_").into_owned()
}

/// Derives the on-disk file name for an avatar URL.
///
/// Takes the last path component, drops any query string, and rewrites a
/// trailing `.webp` to `.png`. Returns `None` when nothing usable is left.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let without_query = url.split('?').next().unwrap_or_default();
    let base = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    if base.is_empty() || base == "." || base == ".." {
        return None;
    }

    let name = match base.strip_suffix(".webp") {
        Some(stem) => format!("{}.png", stem),
        None => base.to_string(),
    };
    Some(sanitize(&name))
}

/// Folder for one server under the output root
pub fn group_dir(root: &Path, display_name: &str) -> PathBuf {
    root.join(sanitize(display_name))
}

/// Final destination of an avatar inside its server folder
pub fn file_path(dir: &Path, url: &str) -> Option<PathBuf> {
    file_name_from_url(url).map(|name| dir.join(name))
}

/// Creates `dir` and any missing ancestors.
///
/// Safe to race from many workers: an existing directory is success.
pub async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::create_dir_all(dir).await {
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        other => other,
    }
}
