//! Configuration loader for the report renderer.
//!
//! Settings resolve through a precedence stack:
//! built-in defaults → git root → working directory → override flag → environment.
//! Each resolved value remembers the layer it came from so validation errors
//! can point at the file that needs fixing.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use report_render::{
    RenderOptions, SanitizePolicy, DEFAULT_ASSET_BASE_URL, DEFAULT_ASSET_PREFIX,
    DEFAULT_LINK_KEEP_CHARS, DEFAULT_LINK_MAX_CHARS, DEFAULT_SUMMARY_KEYWORDS,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".report-render.toml";

/// Environment variable overriding `assets.base_url`.
pub const ASSET_BASE_URL_ENV: &str = "REPORT_RENDER_ASSET_BASE_URL";

const DEFAULT_MIN_BODY_LEN: usize = 10;

/// Complete configuration resolved from defaults and overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub assets: AssetSettings,
    pub links: LinkSettings,
    pub sections: SectionSettings,
    pub output: OutputSettings,
    pub sources: ConfigSources,
}

/// Where report images live and how their paths are recognised.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetSettings {
    pub base_url: String,
    pub prefix: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkSettings {
    pub max_chars: usize,
    pub keep_chars: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SectionSettings {
    pub min_body_len: usize,
    pub summary_keywords: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputSettings {
    pub sanitize: SanitizePolicy,
}

impl Config {
    /// Options for [`report_render::ReportRenderer::new`].
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            asset_base_url: self.assets.base_url.clone(),
            asset_prefix: self.assets.prefix.clone(),
            link_max_chars: self.links.max_chars,
            link_keep_chars: self.links.keep_chars,
            min_body_len: self.sections.min_body_len,
            summary_keywords: self.sections.summary_keywords.clone(),
        }
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn defaults() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn environment() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Environment,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (ConfigSourceKind::Environment, _) => format!("environment ({ASSET_BASE_URL_ENV})"),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
    Environment,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
            ConfigSourceKind::Environment => "environment",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    /// Variables to read instead of the process environment.
    pub environment: Option<HashMap<String, String>>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    fn env_var(&self, key: &str) -> Option<String> {
        match &self.environment {
            Some(vars) => vars.get(key).cloned(),
            None => env::var(key).ok(),
        }
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir.clone())?;
        let override_path = options
            .override_path
            .as_ref()
            .map(|path| make_absolute(path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::defaults();
        let mut merged = defaults_layer(default_source.clone());
        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(base_url) = options.env_var(ASSET_BASE_URL_ENV) {
            let source = ConfigSource::environment();
            merged.merge(PartialConfig {
                assets: AssetsPartial {
                    base_url: Some(Located::new(base_url, source.clone())),
                    ..AssetsPartial::default()
                },
                ..PartialConfig::default()
            });
            source_layers.push(source);
        }

        let config = merged.finalize().map_err(ConfigError::Validation)?;
        debug!(layers = source_layers.len(), "configuration loaded");

        Ok(Config {
            assets: config.assets,
            links: config.links,
            sections: config.sections,
            output: config.output,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    PartialConfig {
        assets: AssetsPartial {
            base_url: Some(Located::new(DEFAULT_ASSET_BASE_URL.into(), source.clone())),
            prefix: Some(Located::new(DEFAULT_ASSET_PREFIX.into(), source.clone())),
        },
        links: LinksPartial {
            max_chars: Some(Located::new(DEFAULT_LINK_MAX_CHARS, source.clone())),
            keep_chars: Some(Located::new(DEFAULT_LINK_KEEP_CHARS, source.clone())),
        },
        sections: SectionsPartial {
            min_body_len: Some(Located::new(DEFAULT_MIN_BODY_LEN, source.clone())),
            summary_keywords: Some(Located::new(
                DEFAULT_SUMMARY_KEYWORDS
                    .iter()
                    .map(|keyword| keyword.to_string())
                    .collect(),
                source.clone(),
            )),
        },
        output: OutputPartial {
            sanitize: Some(Located::new("trust".into(), source)),
        },
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    assets: AssetsPartial,
    links: LinksPartial,
    sections: SectionsPartial,
    output: OutputPartial,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        self.assets.merge(other.assets);
        self.links.merge(other.links);
        self.sections.merge(other.sections);
        self.output.merge(other.output);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let base_url = required(self.assets.base_url, DEFAULT_ASSET_BASE_URL.into());
        let base_url_value = base_url.value.trim();
        if !(base_url_value.starts_with("http://") || base_url_value.starts_with("https://")) {
            errors.push(ConfigValidationError::new(
                Some(base_url.source.clone()),
                format!("assets.base_url must be an http(s) URL (received '{base_url_value}')"),
            ));
        }

        let prefix = required(self.assets.prefix, DEFAULT_ASSET_PREFIX.into());
        if prefix.value.trim().is_empty() {
            errors.push(ConfigValidationError::new(
                Some(prefix.source.clone()),
                "assets.prefix cannot be empty".into(),
            ));
        }

        let max_chars = required(self.links.max_chars, DEFAULT_LINK_MAX_CHARS);
        let keep_chars = required(self.links.keep_chars, DEFAULT_LINK_KEEP_CHARS);
        if keep_chars.value >= max_chars.value {
            errors.push(ConfigValidationError::new(
                Some(keep_chars.source.clone()),
                format!(
                    "links.keep_chars ({}) must be smaller than links.max_chars ({})",
                    keep_chars.value, max_chars.value
                ),
            ));
        }

        let min_body_len = required(self.sections.min_body_len, DEFAULT_MIN_BODY_LEN);

        let keywords = required(self.sections.summary_keywords, Vec::new());
        if keywords.value.is_empty() {
            errors.push(ConfigValidationError::new(
                Some(keywords.source.clone()),
                "sections.summary_keywords must list at least one keyword".into(),
            ));
        }
        if keywords.value.iter().any(|keyword| keyword.trim().is_empty()) {
            errors.push(ConfigValidationError::new(
                Some(keywords.source.clone()),
                "sections.summary_keywords cannot contain empty entries".into(),
            ));
        }

        let sanitize_loc = required(self.output.sanitize, "trust".into());
        let sanitize = match sanitize_loc.value.parse::<SanitizePolicy>() {
            Ok(policy) => policy,
            Err(()) => {
                errors.push(ConfigValidationError::new(
                    Some(sanitize_loc.source.clone()),
                    format!(
                        "output.sanitize must be 'trust' or 'escape' (received '{}')",
                        sanitize_loc.value
                    ),
                ));
                SanitizePolicy::default()
            }
        };

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            assets: AssetSettings {
                base_url: base_url_value.to_string(),
                prefix: prefix.value,
            },
            links: LinkSettings {
                max_chars: max_chars.value,
                keep_chars: keep_chars.value,
            },
            sections: SectionSettings {
                min_body_len: min_body_len.value,
                summary_keywords: keywords.value,
            },
            output: OutputSettings { sanitize },
        })
    }
}

fn required<T>(located: Option<Located<T>>, fallback: T) -> Located<T> {
    located.unwrap_or_else(|| Located::new(fallback, ConfigSource::defaults()))
}

#[derive(Clone, Debug, Default)]
struct AssetsPartial {
    base_url: Option<Located<String>>,
    prefix: Option<Located<String>>,
}

impl AssetsPartial {
    fn merge(&mut self, other: AssetsPartial) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.prefix.is_some() {
            self.prefix = other.prefix;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct LinksPartial {
    max_chars: Option<Located<usize>>,
    keep_chars: Option<Located<usize>>,
}

impl LinksPartial {
    fn merge(&mut self, other: LinksPartial) {
        if other.max_chars.is_some() {
            self.max_chars = other.max_chars;
        }
        if other.keep_chars.is_some() {
            self.keep_chars = other.keep_chars;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct SectionsPartial {
    min_body_len: Option<Located<usize>>,
    summary_keywords: Option<Located<Vec<String>>>,
}

impl SectionsPartial {
    fn merge(&mut self, other: SectionsPartial) {
        if other.min_body_len.is_some() {
            self.min_body_len = other.min_body_len;
        }
        if other.summary_keywords.is_some() {
            self.summary_keywords = other.summary_keywords;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct OutputPartial {
    sanitize: Option<Located<String>>,
}

impl OutputPartial {
    fn merge(&mut self, other: OutputPartial) {
        if other.sanitize.is_some() {
            self.sanitize = other.sanitize;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    assets: AssetSettings,
    links: LinkSettings,
    sections: SectionSettings,
    output: OutputSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError { source, message }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    assets: Option<RawAssets>,
    #[serde(default)]
    links: Option<RawLinks>,
    #[serde(default)]
    sections: Option<RawSections>,
    #[serde(default)]
    output: Option<RawOutput>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let mut partial = PartialConfig::default();

        if let Some(assets) = self.assets {
            partial.assets = assets.into_partial(&source);
        }
        if let Some(links) = self.links {
            partial.links = LinksPartial {
                max_chars: located(links.max_chars, &source),
                keep_chars: located(links.keep_chars, &source),
            };
        }
        if let Some(sections) = self.sections {
            partial.sections = SectionsPartial {
                min_body_len: located(sections.min_body_len, &source),
                summary_keywords: located(sections.summary_keywords, &source),
            };
        }
        if let Some(output) = self.output {
            partial.output = OutputPartial {
                sanitize: located(output.sanitize, &source),
            };
        }

        partial
    }
}

fn located<T>(value: Option<T>, source: &ConfigSource) -> Option<Located<T>> {
    value.map(|value| Located::new(value, source.clone()))
}

#[derive(Debug, Deserialize)]
struct RawAssets {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    prefix: Option<String>,
}

impl RawAssets {
    fn into_partial(self, source: &ConfigSource) -> AssetsPartial {
        AssetsPartial {
            base_url: located(self.base_url, source),
            prefix: located(self.prefix, source),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLinks {
    #[serde(default)]
    max_chars: Option<usize>,
    #[serde(default)]
    keep_chars: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawSections {
    #[serde(default)]
    min_body_len: Option<usize>,
    #[serde(default)]
    summary_keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(default)]
    sanitize: Option<String>,
}
