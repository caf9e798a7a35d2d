//! Discovery Module
//!
//! Recursively scans the source tree for style files (`**/*.css`).

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::resolve::normalize_path;

pub const STYLE_EXTENSION: &str = "css";

/// Whether `path` names a style file.
pub fn is_style_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == STYLE_EXTENSION)
}

/// Whether `path` lies under `search_root`. Both sides are made absolute and
/// normalized lexically first, so `./src` and `/work/app/src` compare equal
/// when run from `/work/app`.
pub fn is_under(path: &Path, search_root: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(search_root))
}

/// Recursively find all style files in a directory, sorted for stable output.
/// A missing directory yields an empty set.
pub fn find_style_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if !dir.exists() {
        return files;
    }

    for entry in WalkDir::new(dir).follow_links(true) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && is_style_file(path) {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => {
                tracing::warn!("skipping unreadable entry under {}: {}", dir.display(), e);
            }
        }
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_finds_nested_style_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("widgets/button")).unwrap();
        fs::write(src.join("main.css"), ".app {}").unwrap();
        fs::write(src.join("main.ts"), "").unwrap();
        fs::write(src.join("widgets/button/button.css"), ".root {}").unwrap();
        fs::write(src.join("widgets/button/button.css.js"), "").unwrap();
        fs::write(src.join("widgets/button/button.css.d.ts"), "").unwrap();

        let found = find_style_files(&src);
        assert_eq!(
            found,
            vec![src.join("main.css"), src.join("widgets/button/button.css")]
        );
    }

    #[test]
    fn test_is_under_ignores_path_form() {
        let cwd = std::env::current_dir().unwrap();
        assert!(is_under(&cwd.join("src/button.css"), Path::new("./src")));
        assert!(is_under(Path::new("src/a/../button.css"), &cwd.join("src")));
        assert!(!is_under(&cwd.join("srcs/button.css"), Path::new("src")));
        assert!(!is_under(&cwd.join("node_modules/x.css"), Path::new("./src")));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_style_files(&dir.path().join("nope")).is_empty());
    }
}
