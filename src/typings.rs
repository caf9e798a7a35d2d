//! Typings Generator
//!
//! Writes a `<file>.d.ts` declaration next to every style file, listing the
//! class names the file exports. Failures are per file: one unreadable file
//! never blocks the rest of a batch.

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::{DeclarationCache, WriteStatus};
use crate::error::TypingsError;
use crate::style_scan::scan_class_names;

pub const DECLARATION_SUFFIX: &str = ".d.ts";

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[$_a-zA-Z][$_a-zA-Z0-9]*$").unwrap();
}

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "implements", "interface", "let",
    "package", "private", "protected", "public", "static", "yield",
];

/// Result of one successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedTypings {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub class_names: Vec<String>,
    /// Non-fatal diagnostics, e.g. names skipped from the declaration.
    pub messages: Vec<String>,
    pub status: WriteStatus,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub generated: Vec<GeneratedTypings>,
    pub failures: Vec<TypingsError>,
}

/// `button.css` -> `button.css.d.ts`, in the same directory.
pub fn declaration_path(style_path: &Path) -> Result<PathBuf, TypingsError> {
    let name = style_path
        .file_name()
        .ok_or_else(|| TypingsError::InvalidPath(style_path.to_path_buf()))?;
    let mut file_name = name.to_os_string();
    file_name.push(DECLARATION_SUFFIX);
    Ok(style_path.with_file_name(file_name))
}

/// Render the declaration text. Names that cannot be declared as TypeScript
/// bindings are left out and reported.
pub fn render_declaration(class_names: &[String]) -> (String, Vec<String>) {
    let mut out = String::new();
    let mut messages = Vec::new();

    for name in class_names {
        if !IDENTIFIER_RE.is_match(name) || RESERVED_WORDS.contains(&name.as_str()) {
            messages.push(format!("\"{}\" is not valid TypeScript variable name.", name));
            continue;
        }
        out.push_str(&format!("export const {}: string;\n", name));
    }

    (out, messages)
}

#[derive(Default)]
pub struct TypingsGenerator {
    cache: DeclarationCache,
}

impl TypingsGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `file` and write its declaration.
    ///
    /// In watch mode a declaration identical to the previous write is left
    /// alone so the bundler's own watcher is not retriggered; one-shot runs
    /// always overwrite.
    pub fn generate(&self, file: &Path, watch: bool) -> Result<GeneratedTypings, TypingsError> {
        let output_path = declaration_path(file)?;
        let source = fs::read_to_string(file).map_err(|source| TypingsError::Read {
            path: file.to_path_buf(),
            source,
        })?;

        let class_names = scan_class_names(&source);
        let (declaration, messages) = render_declaration(&class_names);

        let status = self
            .cache
            .write(&output_path, &declaration, watch)
            .map_err(|source| TypingsError::Write {
                path: output_path.clone(),
                source,
            })?;

        Ok(GeneratedTypings {
            source_path: file.to_path_buf(),
            output_path,
            class_names,
            messages,
            status,
        })
    }

    /// Generate and report one file; failures are logged, not returned.
    pub fn generate_and_report(&self, file: &Path, watch: bool) -> Option<GeneratedTypings> {
        let result = self.generate(file, watch);
        report(&result);
        result.ok()
    }

    /// Generate declarations for every file in parallel. Each file's outcome
    /// is reported exactly once.
    pub fn generate_all(&self, files: &[PathBuf], watch: bool) -> BatchReport {
        let results: Vec<_> = files
            .par_iter()
            .map(|file| {
                let result = self.generate(file, watch);
                report(&result);
                result
            })
            .collect();

        let mut batch = BatchReport::default();
        for result in results {
            match result {
                Ok(generated) => batch.generated.push(generated),
                Err(e) => batch.failures.push(e),
            }
        }
        batch
    }

    /// Drop the cached state of a removed style file.
    pub fn forget(&self, file: &Path) {
        if let Ok(output) = declaration_path(file) {
            self.cache.invalidate(&output);
        }
    }
}

fn report(result: &Result<GeneratedTypings, TypingsError>) {
    match result {
        Ok(generated) => {
            if generated.status == WriteStatus::Written {
                tracing::info!("Wrote {}", generated.output_path.display());
            } else {
                tracing::debug!("Unchanged {}", generated.output_path.display());
            }
            for message in &generated.messages {
                tracing::warn!(path = %generated.source_path.display(), "{}", message);
            }
        }
        Err(e @ TypingsError::Write { .. }) => tracing::error!("{}", e),
        Err(e) => tracing::warn!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_path() {
        assert_eq!(
            declaration_path(Path::new("/app/src/button.css")).unwrap(),
            PathBuf::from("/app/src/button.css.d.ts")
        );
    }

    #[test]
    fn test_render_skips_invalid_names() {
        let names: Vec<String> = ["root", "is-open", "default", "$theme"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (text, messages) = render_declaration(&names);
        assert_eq!(text, "export const root: string;\nexport const $theme: string;\n");
        assert_eq!(
            messages,
            vec![
                "\"is-open\" is not valid TypeScript variable name.",
                "\"default\" is not valid TypeScript variable name.",
            ]
        );
    }

    #[test]
    fn test_render_empty() {
        let (text, messages) = render_declaration(&[]);
        assert!(text.is_empty());
        assert!(messages.is_empty());
    }
}
