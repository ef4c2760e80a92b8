//! CLI command implementations.

pub(crate) mod hash;
pub(crate) mod ls;
pub(crate) mod resolve;

pub(crate) use hash::HashArgs;
pub(crate) use ls::LsArgs;
pub(crate) use resolve::ResolveArgs;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use quire_config::{CliSettings, Config};
use quire_site::Site;

use crate::error::CliError;

/// Site selection shared by every command.
#[derive(Args, Debug, Default)]
pub(crate) struct SiteArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site base URL (overrides config).
    #[arg(long)]
    site_url: Option<String>,

    /// Extra content directory with the highest precedence.
    #[arg(short = 'd', long)]
    content_dir: Option<PathBuf>,

    /// Enable the render cache (default: enabled).
    #[arg(long)]
    cache: Option<bool>,

    /// Disable the render cache.
    #[arg(long, conflicts_with = "cache")]
    no_cache: bool,
}

impl SiteArgs {
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            site_url: self.site_url.clone(),
            content_dir: self.content_dir.clone(),
            cache_enabled: self.no_cache.then_some(false).or(self.cache),
        }
    }

    /// Load configuration with CLI overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        Ok(Config::load(self.config.as_deref(), Some(&self.cli_settings()))?)
    }

    /// Load configuration and build the site.
    pub(crate) fn build_site(&self) -> Result<Arc<Site>, CliError> {
        let config = self.load_config()?;
        if config.cache.enabled {
            ensure_project_dir(&config.project_dir)?;
        }
        Ok(Site::from_config(&config)?)
    }
}

/// Ensure the `.quire/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir)?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by quire\n*\n");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_no_cache_wins() {
        let args = SiteArgs {
            no_cache: true,
            ..SiteArgs::default()
        };
        assert_eq!(args.cli_settings().cache_enabled, Some(false));

        let args = SiteArgs {
            cache: Some(true),
            ..SiteArgs::default()
        };
        assert_eq!(args.cli_settings().cache_enabled, Some(true));
        assert_eq!(SiteArgs::default().cli_settings().cache_enabled, None);
    }

    #[test]
    fn test_build_site_from_config_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/index.md"), "# Hi").unwrap();
        std::fs::write(
            temp.path().join("quire.toml"),
            "[site]\nurl = \"https://ex.com/\"\n\n[[content]]\ndir = \"docs\"\n",
        )
        .unwrap();

        let args = SiteArgs {
            config: Some(temp.path().join("quire.toml")),
            ..SiteArgs::default()
        };
        let site = args.build_site().unwrap();

        assert_eq!(site.url().to_string(), "https://ex.com/");
        assert!(temp.path().join(".quire/.gitignore").exists());
    }

    #[test]
    fn test_missing_config_file() {
        let args = SiteArgs {
            config: Some(PathBuf::from("/nonexistent/quire.toml")),
            ..SiteArgs::default()
        };
        assert!(matches!(args.load_config(), Err(CliError::Config(_))));
    }
}
