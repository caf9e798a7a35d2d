//! Node binding surface, so a JavaScript bundler can call into the pipeline
//! from its loader and resolver hooks.

use napi_derive::napi;
use std::path::Path;

use crate::decorate::{decorate_module, DecorationMode};
use crate::discovery::find_style_files;
use crate::exports::PatternLocator;
use crate::resolve::{ResolutionDecision, ResolutionPass};
use crate::typings::TypingsGenerator;

#[napi(object)]
pub struct TypingsResult {
    pub output_path: String,
    pub messages: Vec<String>,
}

#[napi(object)]
pub struct TypingsFailure {
    pub path: String,
    pub reason: String,
}

#[napi(object)]
pub struct TypingsBatch {
    pub generated: Vec<TypingsResult>,
    pub failures: Vec<TypingsFailure>,
}

/// Decorate a compiled style module. `mode` is `"classes"` or `"localeKey"`.
#[napi]
pub fn decorate_css_module_native(
    content: String,
    resource_path: String,
    mode: String,
) -> napi::Result<String> {
    let mode: DecorationMode = serde_json::from_value(serde_json::Value::String(mode))
        .map_err(|e| napi::Error::from_reason(format!("Invalid decoration mode: {}", e)))?;

    decorate_module(&PatternLocator, &content, Path::new(&resource_path), mode)
        .map_err(|e| napi::Error::from_reason(format!("{}: {}", resource_path, e)))
}

#[napi]
pub fn generate_typings_native(search_dir: String) -> TypingsBatch {
    let files = find_style_files(Path::new(&search_dir));
    let batch = TypingsGenerator::new().generate_all(&files, false);

    TypingsBatch {
        generated: batch
            .generated
            .into_iter()
            .map(|g| TypingsResult {
                output_path: g.output_path.to_string_lossy().to_string(),
                messages: g.messages,
            })
            .collect(),
        failures: batch
            .failures
            .into_iter()
            .map(|e| TypingsFailure {
                path: e.path().to_string_lossy().to_string(),
                reason: e.to_string(),
            })
            .collect(),
    }
}

/// One resolution pass; create a new instance per compile.
#[napi]
pub struct ResolutionPassNative {
    inner: ResolutionPass,
}

#[napi]
impl ResolutionPassNative {
    #[napi(constructor)]
    pub fn new() -> Self {
        Self {
            inner: ResolutionPass::new(),
        }
    }

    /// The request to hand on: rewritten to the companion, or unchanged.
    #[napi]
    pub fn resolve(&mut self, context: String, request: String) -> String {
        match self.inner.resolve(Path::new(&context), &request) {
            ResolutionDecision::Rewrite { request, .. } => request,
            ResolutionDecision::PassThrough => request,
        }
    }
}
