//! Descriptor Decorator
//!
//! Wraps a parsed export mapping with identity metadata before the style
//! module reaches the rest of the graph. The output shape is fixed once per
//! build by [`DecorationMode`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

use crate::error::DecorateError;
use crate::exports::{parse_exports, replace_literal, ExportLocator, ExportMapping};

/// Entry injected by [`DecorationMode::LocaleKey`]. CSS class names cannot
/// start with a space, so it never collides with a real class.
pub const LOCALE_KEY_ENTRY: &str = " _key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecorationMode {
    /// `{ default: { classes: <mapping>, key: <key> } }`
    Classes,
    /// `{ default: <mapping> + { " _key": <key> } }`
    LocaleKey,
}

impl DecorationMode {
    /// Build the decorated export object for `mapping`.
    pub fn decorate(self, mapping: &ExportMapping, key: &str) -> Result<Value, DecorateError> {
        match self {
            DecorationMode::Classes => Ok(json!({
                "default": {
                    "classes": mapping,
                    "key": key,
                }
            })),
            DecorationMode::LocaleKey => {
                if mapping.contains_key(LOCALE_KEY_ENTRY) {
                    return Err(DecorateError::ReservedKey(LOCALE_KEY_ENTRY.to_string()));
                }
                let mut keyed = mapping.clone();
                keyed.insert(LOCALE_KEY_ENTRY.to_string(), Value::String(key.to_string()));
                Ok(json!({ "default": keyed }))
            }
        }
    }
}

/// Logical key of a style file: its file name without the `.css` suffix.
pub fn style_key(resource_path: &Path) -> String {
    let name = resource_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.strip_suffix(".css") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

/// Decorate the export literal in a compiled style module.
///
/// Text without an export assignment comes back unchanged. Everything outside
/// the literal is preserved byte for byte. Must run exactly once per compiled
/// unit: a second run wraps the already decorated object again.
pub fn decorate_module(
    locator: &dyn ExportLocator,
    content: &str,
    resource_path: &Path,
    mode: DecorationMode,
) -> Result<String, DecorateError> {
    let Some(located) = parse_exports(locator, content)? else {
        return Ok(content.to_string());
    };

    let key = style_key(resource_path);
    let decorated = mode.decorate(&located.mapping, &key)?;
    Ok(replace_literal(content, located.range, &decorated.to_string()))
}
