//! Pipeline Orchestrator
//!
//! Composes typings generation, resolution rewriting and module decoration
//! around an external [`Bundler`], in one of two modes:
//!
//! - **one-shot**: generate typings for every discovered style file, compile
//!   once, fail with the compile errors if there are any;
//! - **watch**: generate typings once, keep regenerating them from filesystem
//!   events on a background thread, and hand control to the bundler's own
//!   watch/serve loop. Nothing here re-triggers a compile; the bundler's
//!   watcher reacts to the files the typings watcher writes.
//!
//! Every compile, including each rebuild in watch mode, gets its own
//! [`CompilePass`], and with it a fresh rewrite ledger.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::config::{BuildConfig, BundlerOptions, ServeOptions};
use crate::decorate::{decorate_module, DecorationMode};
use crate::discovery::{find_style_files, is_under};
use crate::error::{BundlerError, PipelineError};
use crate::exports::ExportLocator;
use crate::resolve::{ResolutionDecision, ResolutionPass};
use crate::typings::{BatchReport, TypingsGenerator};
use crate::watch::TypingsWatcher;

/// The external bundler this core configures and hooks into.
///
/// Implementations route every resolution request through
/// [`CompilePass::resolve`] and every compiled style module through
/// [`CompilePass::transform_style`], once per module per compile.
pub trait Bundler {
    fn compile(
        &mut self,
        options: &BundlerOptions,
        pass: &mut CompilePass,
    ) -> Result<CompileReport, BundlerError>;

    /// Watch and serve until the process is stopped. Each rebuild must start
    /// with [`PassFactory::begin`] and end with [`PassFactory::finish`].
    fn serve(
        &mut self,
        options: &BundlerOptions,
        serve: &ServeOptions,
        passes: &PassFactory,
    ) -> Result<(), BundlerError>;
}

/// Statistics and diagnostics of one compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Human-readable statistics, printed as is.
    pub stats: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CompileReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Hooks for a single compile.
pub struct CompilePass {
    resolution: ResolutionPass,
    locator: Arc<dyn ExportLocator>,
    mode: DecorationMode,
    search_dir: PathBuf,
}

impl CompilePass {
    pub fn resolve(&mut self, context: &Path, request: &str) -> ResolutionDecision {
        self.resolution.resolve(context, request)
    }

    /// Decorate the compiled module of a style file. Only style files under
    /// the search directory are CSS Modules; anything else passes through.
    pub fn transform_style(
        &self,
        resource_path: &Path,
        content: &str,
    ) -> Result<String, PipelineError> {
        if !is_under(resource_path, &self.search_dir) {
            tracing::debug!(path = %resource_path.display(), "style outside search dir, not decorated");
            return Ok(content.to_string());
        }
        decorate_module(self.locator.as_ref(), content, resource_path, self.mode).map_err(
            |source| PipelineError::Decorate {
                path: resource_path.to_path_buf(),
                source,
            },
        )
    }

    pub fn resolution(&self) -> &ResolutionPass {
        &self.resolution
    }
}

/// Hands out a fresh [`CompilePass`] per compile.
pub struct PassFactory {
    locator: Arc<dyn ExportLocator>,
    mode: DecorationMode,
    search_dir: PathBuf,
}

impl PassFactory {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            locator: Arc::from(config.export_locator.locator()),
            mode: config.decoration_mode(),
            search_dir: config.search_dir(),
        }
    }

    pub fn begin(&self) -> CompilePass {
        CompilePass {
            resolution: ResolutionPass::new(),
            locator: Arc::clone(&self.locator),
            mode: self.mode,
            search_dir: self.search_dir.clone(),
        }
    }

    /// Report a finished rebuild. Failures are logged; watching goes on.
    pub fn finish(&self, report: &CompileReport) {
        log_report(report);
    }

    pub fn mode(&self) -> DecorationMode {
        self.mode
    }
}

fn log_report(report: &CompileReport) {
    if !report.stats.is_empty() {
        tracing::info!("{}", report.stats);
    }
    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }
    for error in &report.errors {
        tracing::error!("{}", error);
    }
}

/// Result of a successful one-shot build.
#[derive(Debug)]
pub struct BuildOutcome {
    pub report: CompileReport,
    pub typings: Option<BatchReport>,
}

/// Process status for a one-shot build result.
pub fn exit_code(result: &Result<BuildOutcome, PipelineError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

pub struct PipelineOrchestrator {
    config: BuildConfig,
    generator: Arc<TypingsGenerator>,
    passes: PassFactory,
}

impl PipelineOrchestrator {
    pub fn new(config: BuildConfig) -> Self {
        let passes = PassFactory::from_config(&config);
        Self {
            config,
            generator: Arc::new(TypingsGenerator::new()),
            passes,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn passes(&self) -> &PassFactory {
        &self.passes
    }

    /// Generate typings for every discovered style file, when enabled.
    pub fn generate_typings(&self) -> Option<BatchReport> {
        if !self.config.css_modules {
            return None;
        }
        tracing::info!("Generating CSS Module typings");
        let files = find_style_files(&self.config.search_dir());
        Some(self.generator.generate_all(&files, false))
    }

    /// Dispatch on the configured mode. Watch mode only returns on error.
    pub fn run(&self, bundler: &mut dyn Bundler) -> Result<Option<BuildOutcome>, PipelineError> {
        if self.config.watch {
            self.watch(bundler).map(|()| None)
        } else {
            self.compile(bundler).map(Some)
        }
    }

    /// One-shot build.
    pub fn compile(&self, bundler: &mut dyn Bundler) -> Result<BuildOutcome, PipelineError> {
        let typings = self.generate_typings();

        let options = self.config.bundler_options();
        let mut pass = self.passes.begin();
        let report = bundler.compile(&options, &mut pass)?;
        log_report(&report);

        if report.has_errors() {
            return Err(PipelineError::CompileFailed {
                errors: report.errors,
            });
        }
        Ok(BuildOutcome { report, typings })
    }

    /// Watch and serve. Runs until the bundler's serve loop ends.
    pub fn watch(&self, bundler: &mut dyn Bundler) -> Result<(), PipelineError> {
        if self.config.css_modules {
            self.generate_typings();
            self.spawn_typings_watcher()?;
        }

        let options = self.config.bundler_options();
        let serve = ServeOptions::from_config(&self.config);
        tracing::info!("Starting server on {}", serve.url());
        bundler.serve(&options, &serve, &self.passes)?;
        Ok(())
    }

    fn spawn_typings_watcher(&self) -> Result<(), PipelineError> {
        let watcher = TypingsWatcher::new(&self.config.search_dir())?;
        let generator = Arc::clone(&self.generator);
        thread::Builder::new()
            .name("typings-watch".to_string())
            .spawn(move || watcher.run(&generator))
            .map_err(PipelineError::WatcherThread)?;
        Ok(())
    }
}
