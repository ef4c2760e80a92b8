//! Configuration management for quire.
//!
//! Parses `quire.toml` with serde and discovers it in the current directory or
//! any parent. [`CliSettings`] overrides are applied after loading.
//!
//! ```toml
//! [site]
//! url = "${QUIRE_SITE_URL:-http://localhost/}"
//!
//! [[content]]          # ordered; later entries take precedence
//! dir = "content"
//!
//! [[content]]
//! dir = "blog"
//! namespace = "blog"
//!
//! [cache]
//! enabled = true
//! ttl = 3600           # seconds, 0 = no expiry
//!
//! [assets]
//! output_prefix = "assets"
//!
//! [extensions]
//! css = ["css", "scss", "less"]
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `site.url` supports `${VAR}` (error if unset) and `${VAR:-default}`.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the site base URL.
    pub site_url: Option<String>,
    /// Extra content directory, registered with the highest precedence.
    pub content_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Project data directory, beside the config file.
const PROJECT_DIRNAME: &str = ".quire";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    /// Content directories as written (relative strings).
    #[serde(rename = "content")]
    content_raw: Vec<ContentDirRaw>,
    pub cache: CacheConfig,
    pub assets: AssetsConfig,
    /// Equivalent-extension classes, keyed by the requested extension.
    ///
    /// A request for `site.css` searches `site.{css,scss,less}`. A table in the
    /// file replaces the defaults.
    #[serde(default = "default_extensions")]
    pub extensions: BTreeMap<String, Vec<String>>,

    /// Resolved content directories, lowest precedence first.
    #[serde(skip)]
    pub content: Vec<ContentDir>,
    /// Project directory for quire data (`.quire/`).
    #[serde(skip)]
    pub project_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Site configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// External base URL the site is mounted at.
    pub url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost/".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentDirRaw {
    dir: String,
    namespace: Option<String>,
}

/// A resolved content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDir {
    pub dir: PathBuf,
    /// Namespace scope; `None` participates in every lookup.
    pub namespace: Option<String>,
}

/// Render cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Entry lifetime in seconds; `0` disables expiry.
    pub ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 3600,
        }
    }
}

/// Asset output configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// First path segment of content-hashed asset URLs.
    pub output_prefix: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            output_prefix: "assets".to_owned(),
        }
    }
}

fn default_extensions() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([(
        "css".to_owned(),
        vec!["css".to_owned(), "scss".to_owned(), "less".to_owned()],
    )])
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.url`").
        field: String,
        /// Error message (e.g., "${`QUIRE_SITE_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn is_valid_namespace(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise, searches
    /// for `quire.toml` in the current directory and parents, falling back to
    /// defaults rooted at the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the result (with CLI settings applied) is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            tracing::debug!("no {CONFIG_FILENAME} found, using defaults");
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(url) = &settings.site_url {
            self.site.url.clone_from(url);
        }
        if let Some(dir) = &settings.content_dir {
            self.content.push(ContentDir {
                dir: dir.clone(),
                namespace: None,
            });
        }
        if let Some(enabled) = settings.cache_enabled {
            self.cache.enabled = enabled;
        }
    }

    /// Search for a config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Default config for a project rooted at `base`: content from
    /// `base/content`, project state under `base/.quire`.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfig::default(),
            content_raw: Vec::new(),
            cache: CacheConfig::default(),
            assets: AssetsConfig::default(),
            extensions: default_extensions(),
            content: vec![ContentDir {
                dir: base.join("content"),
                namespace: None,
            }],
            project_dir: base.join(PROJECT_DIRNAME),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site.url, "site.url")?;
        require_http_url(&self.site.url, "site.url")?;
        self.validate_content()?;
        require_non_empty(
            self.assets.output_prefix.trim_matches('/'),
            "assets.output_prefix",
        )?;
        self.validate_extensions()
    }

    fn validate_content(&self) -> Result<(), ConfigError> {
        if self.content.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[content]] directory is required".to_owned(),
            ));
        }
        for entry in &self.content {
            if let Some(ns) = &entry.namespace
                && !is_valid_namespace(ns)
            {
                return Err(ConfigError::Validation(format!(
                    "content namespace `{ns}` must match [a-z0-9_-]+"
                )));
            }
        }
        Ok(())
    }

    fn validate_extensions(&self) -> Result<(), ConfigError> {
        for (ext, class) in &self.extensions {
            if class.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "extensions.{ext} cannot be empty"
                )));
            }
            if let Some(bad) = std::iter::once(ext)
                .chain(class)
                .find(|e| e.is_empty() || e.chars().any(|c| c.is_ascii_uppercase() || c == '.'))
            {
                return Err(ConfigError::Validation(format!(
                    "extensions.{ext}: `{bad}` must be a lowercase extension without a dot"
                )));
            }
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.url = expand::expand_env(&self.site.url, "site.url")?;
        for (i, raw) in self.content_raw.iter_mut().enumerate() {
            raw.dir = expand::expand_env(&raw.dir, &format!("content[{i}].dir"))?;
        }
        Ok(())
    }

    /// Resolve relative content directories against `config_dir`.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.content = if self.content_raw.is_empty() {
            vec![ContentDir {
                dir: config_dir.join("content"),
                namespace: None,
            }]
        } else {
            self.content_raw
                .iter()
                .map(|raw| ContentDir {
                    dir: config_dir.join(&raw.dir),
                    namespace: raw.namespace.clone(),
                })
                .collect()
        };
        self.project_dir = config_dir.join(PROJECT_DIRNAME);
    }

    /// Cache directory (`.quire/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }

    /// Cache entry lifetime; `None` when entries never expire.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache.ttl > 0).then(|| Duration::from_secs(self.cache.ttl))
    }

    /// Equivalent extensions for `ext`, in search order.
    #[must_use]
    pub fn extension_class(&self, ext: &str) -> Option<&[String]> {
        self.extensions.get(ext).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));

        assert_eq!(config.site.url, "http://localhost/");
        assert_eq!(
            config.content,
            vec![ContentDir {
                dir: PathBuf::from("/test/content"),
                namespace: None
            }]
        );
        assert_eq!(config.cache_dir(), PathBuf::from("/test/.quire/cache"));
        assert!(config.cache.enabled);
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(config.assets.output_prefix, "assets");
        assert_eq!(
            config.extension_class("css"),
            Some(&["css".to_owned(), "scss".to_owned(), "less".to_owned()][..])
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.site.url, "http://localhost/");
        assert!(config.content_raw.is_empty());
        assert!(config.extensions.contains_key("css"));
    }

    #[test]
    fn test_resolve_ordered_content_dirs() {
        let toml = r#"
[[content]]
dir = "content"

[[content]]
dir = "posts"
namespace = "blog"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.content,
            vec![
                ContentDir {
                    dir: PathBuf::from("/project/content"),
                    namespace: None
                },
                ContentDir {
                    dir: PathBuf::from("/project/posts"),
                    namespace: Some("blog".to_owned())
                },
            ]
        );
        assert_eq!(config.project_dir, PathBuf::from("/project/.quire"));
    }

    #[test]
    fn test_content_dir_variable_default() {
        let toml = r#"
[[content]]
dir = "${QUIRE_TEST_UNSET_CONTENT_DIR:-docs}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.content[0].dir, PathBuf::from("/project/docs"));
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let config: Config = toml::from_str("[cache]\nttl = 0\n").unwrap();
        assert_eq!(config.cache_ttl(), None);
    }

    #[test]
    fn test_custom_extensions_replace_defaults() {
        let toml = r#"
[extensions]
js = ["js", "mjs"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.extension_class("css"), None);
        assert_eq!(
            config.extension_class("js"),
            Some(&["js".to_owned(), "mjs".to_owned()][..])
        );
    }

    #[test]
    fn test_validate_rejects_non_http_site() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.site.url = "ftp://example.com/".to_owned();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("site.url"));
    }

    #[test]
    fn test_validate_rejects_bad_namespace() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.content.push(ContentDir {
            dir: PathBuf::from("/test/blog"),
            namespace: Some("My Blog".to_owned()),
        });

        assert!(config.validate().unwrap_err().to_string().contains("My Blog"));
    }

    #[test]
    fn test_validate_requires_content() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.content.clear();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_extension_classes() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.extensions.insert("js".to_owned(), Vec::new());
        assert!(config.validate().is_err());

        config.extensions.insert("js".to_owned(), vec!["JS".to_owned()]);
        assert!(config.validate().is_err());

        config.extensions.insert("js".to_owned(), vec![".js".to_owned()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            site_url: Some("https://docs.example.com/".to_owned()),
            content_dir: Some(PathBuf::from("/extra")),
            cache_enabled: Some(false),
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.site.url, "https://docs.example.com/");
        assert_eq!(config.content.last().unwrap().dir, PathBuf::from("/extra"));
        assert_eq!(config.content.len(), 2);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_apply_empty_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.site.url, "http://localhost/");
        assert_eq!(config.content.len(), 1);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_discover_from_parent() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_from(&nested),
            Some(tmp.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[site]
url = "https://example.com/docs/"

[[content]]
dir = "pages"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.site.url, "https://example.com/docs/");
        assert_eq!(config.content[0].dir, tmp.path().join("pages"));
        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.project_dir, tmp.path().join(".quire"));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/quire.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[site\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path), None).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }
}
