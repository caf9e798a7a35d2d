//! Resolution Rewriter
//!
//! Redirects `.css` imports to their `.css.js` companion descriptor module
//! when one exists on disk.
//!
//! ## Toggle invariant
//!
//! A single logical style import is visited twice per resolution pass: once
//! for the style itself, once when the companion re-imports it. The
//! [`RewriteLedger`] toggles per absolute path, so visits alternate
//! `rewrite, pass-through, rewrite, ...`. The ledger lives inside a
//! [`ResolutionPass`], built per compile and dropped with it, so toggle state
//! never leaks between independent compiles.
//!
//! The alternation is only right for exactly two visits per path per pass. A
//! third visit is logged as a warning; its decision still alternates.

use std::collections::{HashMap, HashSet};
use std::env;
use std::path::{Component, Path, PathBuf};

pub const STYLE_SUFFIX: &str = ".css";
pub const COMPANION_SUFFIX: &str = ".js";

/// Visits per path per pass the toggle is designed for.
pub const EXPECTED_VISITS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionDecision {
    /// Resolve `request` instead; `companion` is the absolute module path.
    Rewrite { request: String, companion: PathBuf },
    PassThrough,
}

/// Absolute paths currently in the rewritten state.
#[derive(Debug, Default)]
pub struct RewriteLedger {
    rewritten: HashSet<PathBuf>,
    visits: HashMap<PathBuf, u32>,
}

impl RewriteLedger {
    /// Flip `path`'s state. Returns `true` when the path just entered the
    /// rewritten state.
    fn toggle(&mut self, path: &Path) -> bool {
        let visits = self.visits.entry(path.to_path_buf()).or_insert(0);
        *visits += 1;
        if *visits > EXPECTED_VISITS {
            tracing::warn!(
                path = %path.display(),
                visits = *visits,
                "style path resolved more often than expected in one pass; rewrite decision keeps alternating"
            );
        }

        if self.rewritten.remove(path) {
            false
        } else {
            self.rewritten.insert(path.to_path_buf());
            true
        }
    }

    pub fn is_rewritten(&self, path: &Path) -> bool {
        self.rewritten.contains(path)
    }

    pub fn visits(&self, path: &Path) -> u32 {
        self.visits.get(path).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rewritten.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewritten.is_empty()
    }
}

/// Rewrite state for one resolution pass. Requests arrive one at a time from
/// the bundler, so the pass needs `&mut self` and no locking.
#[derive(Debug, Default)]
pub struct ResolutionPass {
    ledger: RewriteLedger,
}

impl ResolutionPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `request`, issued from `context`, resolves to its
    /// companion module.
    pub fn resolve(&mut self, context: &Path, request: &str) -> ResolutionDecision {
        if !request.ends_with(STYLE_SUFFIX) {
            return ResolutionDecision::PassThrough;
        }

        let target = resolve_path(context, request);
        let companion = companion_path(&target);
        // A path never rewritten and with no companion leaves the ledger alone.
        if !self.ledger.is_rewritten(&target) && !companion.exists() {
            return ResolutionDecision::PassThrough;
        }

        if self.ledger.toggle(&target) {
            let rewritten = format!("{}{}", request, COMPANION_SUFFIX);
            tracing::debug!(from = request, to = %rewritten, "rewriting style request");
            ResolutionDecision::Rewrite {
                request: rewritten,
                companion,
            }
        } else {
            tracing::debug!(request, "style request passes through");
            ResolutionDecision::PassThrough
        }
    }

    pub fn ledger(&self) -> &RewriteLedger {
        &self.ledger
    }
}

/// `X.css` -> `X.css.js`.
pub fn companion_path(style_path: &Path) -> PathBuf {
    let mut name = style_path.as_os_str().to_os_string();
    name.push(COMPANION_SUFFIX);
    PathBuf::from(name)
}

/// Resolve `request` against `context` lexically, the way a bundler computes
/// a request's absolute path.
pub fn resolve_path(context: &Path, request: &str) -> PathBuf {
    normalize_path(&context.join(request))
}

/// Absolute, lexically normalized form of `path`: relative paths are taken
/// from the current directory and `.`/`..` components are folded away. The
/// filesystem is never consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
