//! # Style Module Build Core
//!
//! ## Pipeline Invariants
//!
//! 1. **Companion Convention**: for a style file `X.css`, the companion
//!    descriptor module is `X.css.js`. Its existence on disk is the only
//!    signal resolution rewriting consults.
//!
//! 2. **Toggle Per Pass**: within one resolution pass each absolute style path
//!    alternates `rewrite, pass-through, ...`. Ledger state belongs to a
//!    [`CompilePass`] and never outlives its compile.
//!
//! 3. **Single Decoration**: a compiled style module is decorated exactly once
//!    per compile. Decorating twice nests the wrapper.
//!
//! 4. **One Output Shape**: a build uses either `{ default: { classes, key } }`
//!    or `{ default: { ...classes, " _key": key } }`, chosen once from the
//!    configuration ([`DecorationMode`]).
//!
//! 5. **Opaque Identifiers**: generated class identifiers are passed through
//!    untouched; only the export object around them changes.
//!
//! 6. **Isolated Typings Failures**: one unreadable style file never blocks
//!    declarations for the rest of a batch; write failures never stop watching.
//!
//! ## Data Flow
//!
//! source tree -> typings generator writes `X.css.d.ts` -> bundler compiles
//! `X.css` -> decorator rewrites its export object -> resolution rewriter
//! redirects the next `X.css` request to `X.css.js`.

#[cfg(feature = "napi")]
mod bindings;

mod cache;
mod config;
mod decorate;
mod discovery;
mod error;
mod exports;
mod logging;
mod pipeline;
mod resolve;
mod style_scan;
mod typings;
mod watch;

#[cfg(test)]
mod decorate_props;

#[cfg(feature = "napi")]
pub use bindings::{
    decorate_css_module_native, generate_typings_native, ResolutionPassNative, TypingsBatch,
};

pub use cache::{DeclarationCache, WriteStatus};
pub use config::{BuildConfig, BundlerOptions, ServeOptions, StatsOptions, DEFAULT_PORT};
pub use decorate::{decorate_module, style_key, DecorationMode, LOCALE_KEY_ENTRY};
pub use discovery::{find_style_files, is_style_file};
pub use error::{
    BundlerError, DecorateError, ExportError, PipelineError, TypingsError, WatchError,
};
pub use exports::{
    parse_exports, replace_literal, ExportLocator, ExportMapping, LocatedExports, LocatorKind,
    PatternLocator, SyntaxLocator,
};
pub use logging::LogConfig;
pub use pipeline::{
    exit_code, BuildOutcome, Bundler, CompilePass, CompileReport, PassFactory,
    PipelineOrchestrator,
};
pub use resolve::{
    companion_path, normalize_path, resolve_path, ResolutionDecision, ResolutionPass,
    RewriteLedger,
};
pub use style_scan::scan_class_names;
pub use typings::{declaration_path, render_declaration, BatchReport, GeneratedTypings, TypingsGenerator};
pub use watch::{ChangeKind, TypingsWatcher};

/// Install the global log subscriber.
pub fn init_logging(config: &LogConfig) {
    logging::init(config);
}
