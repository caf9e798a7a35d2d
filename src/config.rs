//! Build configuration handed in by the outer command layer, and the options
//! this core derives for the external bundler.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::decorate::DecorationMode;
use crate::error::PipelineError;
use crate::exports::LocatorKind;
use crate::resolve::normalize_path;

pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_SEARCH_DIR: &str = "src";
pub const SERVE_HOST: &str = "127.0.0.1";

const WATCH_LOCAL_IDENT_NAME: &str = "[name]__[local]__[hash:base64:5]";
const BUILD_LOCAL_IDENT_NAME: &str = "[hash:base64:8]";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    pub locale: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub supported_locales: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub message_bundles: Vec<String>,
    pub watch: bool,
    pub css_modules: bool,
    pub with_tests: bool,
    pub port: Option<u16>,
    pub root_dir: Option<PathBuf>,
    pub search_dir: Option<PathBuf>,
    pub decoration: Option<DecorationMode>,
    pub export_locator: LocatorKind,
}

/// The outer layer passes list options either as one string or as a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

impl BuildConfig {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(json).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Explicit choice wins; otherwise locale-aware builds use the locale key.
    pub fn decoration_mode(&self) -> DecorationMode {
        match (self.decoration, &self.locale) {
            (Some(mode), _) => mode,
            (None, Some(_)) => DecorationMode::LocaleKey,
            (None, None) => DecorationMode::Classes,
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Absolute project root. A relative `rootDir` is taken from the
    /// current directory.
    pub fn root_dir(&self) -> PathBuf {
        normalize_path(self.root_dir.as_deref().unwrap_or(Path::new(".")))
    }

    /// Absolute directory holding the application's CSS Modules.
    pub fn search_dir(&self) -> PathBuf {
        let search = self
            .search_dir
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_SEARCH_DIR));
        normalize_path(&self.root_dir().join(search))
    }

    pub fn bundler_options(&self) -> BundlerOptions {
        BundlerOptions {
            local_ident_name: if self.watch {
                WATCH_LOCAL_IDENT_NAME
            } else {
                BUILD_LOCAL_IDENT_NAME
            }
            .to_string(),
            devtool: if self.watch {
                "inline-source-map"
            } else {
                "source-map"
            }
            .to_string(),
            resolve_extensions: ["", ".ts", ".js", ".css.js"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            stats: StatsOptions {
                colors: true,
                chunks: false,
            },
            locale: self.locale.clone(),
            supported_locales: self.supported_locales.clone(),
            message_bundles: self.message_bundles.clone(),
            with_tests: self.with_tests,
        }
    }
}

/// Options this core hands the external bundler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerOptions {
    /// Generated class identifier pattern for the CSS-Modules transform.
    pub local_ident_name: String,
    pub devtool: String,
    pub resolve_extensions: Vec<String>,
    pub stats: StatsOptions,
    pub locale: Option<String>,
    pub supported_locales: Vec<String>,
    pub message_bundles: Vec<String>,
    pub with_tests: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsOptions {
    pub colors: bool,
    pub chunks: bool,
}

/// Where and how the bundler serves in watch mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub live_reload: bool,
}

impl ServeOptions {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            host: SERVE_HOST.to_string(),
            port: config.port(),
            live_reload: true,
        }
    }

    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_accept_single_strings() {
        let config = BuildConfig::from_json(
            r#"{"locale":"en","supportedLocales":"fr","messageBundles":["a","b"],"cssModules":true}"#,
        )
        .unwrap();
        assert_eq!(config.supported_locales, vec!["fr"]);
        assert_eq!(config.message_bundles, vec!["a", "b"]);
        assert!(config.css_modules);
        assert!(!config.watch);
    }

    #[test]
    fn test_null_list_is_empty() {
        let config = BuildConfig::from_json(r#"{"supportedLocales":null}"#).unwrap();
        assert!(config.supported_locales.is_empty());
    }

    #[test]
    fn test_decoration_mode_selection() {
        let mut config = BuildConfig::default();
        assert_eq!(config.decoration_mode(), DecorationMode::Classes);

        config.locale = Some("en".to_string());
        assert_eq!(config.decoration_mode(), DecorationMode::LocaleKey);

        config.decoration = Some(DecorationMode::Classes);
        assert_eq!(config.decoration_mode(), DecorationMode::Classes);
    }

    #[test]
    fn test_explicit_modes_from_json() {
        let config =
            BuildConfig::from_json(r#"{"decoration":"localeKey","exportLocator":"syntax"}"#)
                .unwrap();
        assert_eq!(config.decoration_mode(), DecorationMode::LocaleKey);
        assert_eq!(config.export_locator, LocatorKind::Syntax);
    }

    #[test]
    fn test_bundler_options_follow_watch_flag() {
        let mut config = BuildConfig::default();
        let build = config.bundler_options();
        assert_eq!(build.local_ident_name, "[hash:base64:8]");
        assert_eq!(build.devtool, "source-map");
        assert!(build.resolve_extensions.contains(&".css.js".to_string()));

        config.watch = true;
        let watch = config.bundler_options();
        assert_eq!(watch.local_ident_name, "[name]__[local]__[hash:base64:5]");
        assert_eq!(watch.devtool, "inline-source-map");
    }

    #[test]
    fn test_paths_and_port() {
        let config = BuildConfig {
            root_dir: Some(PathBuf::from("/work/app")),
            ..Default::default()
        };
        assert_eq!(config.search_dir(), PathBuf::from("/work/app/src"));
        assert_eq!(ServeOptions::from_config(&config).url(), "http://localhost:9999");
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let config = BuildConfig::from_json(r#"{"rootDir":"."}"#).unwrap();
        assert_eq!(config.root_dir(), cwd);
        assert_eq!(config.search_dir(), cwd.join("src"));

        let config = BuildConfig::from_json(r#"{"rootDir":"app/../web","searchDir":"./styles"}"#)
            .unwrap();
        assert_eq!(config.search_dir(), cwd.join("web/styles"));
        assert_eq!(BuildConfig::default().search_dir(), cwd.join("src"));
    }

    #[test]
    fn test_unknown_mode_is_a_config_error() {
        let err = BuildConfig::from_json(r#"{"decoration":"both"}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
