//! `quire ls` command implementation.

use clap::Args;
use quire_content::{ContentDirectory, ContentFile};

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the ls command.
#[derive(Args)]
pub(crate) struct LsArgs {
    /// Glob pattern (e.g. `/**/*.md`, `/theme/site.{css,scss}`).
    pattern: String,

    /// Search within a namespace.
    #[arg(short, long)]
    namespace: Option<String>,

    /// List directories instead of files.
    #[arg(long)]
    dirs: bool,

    #[command(flatten)]
    site: SiteArgs,
}

impl LsArgs {
    /// Execute the ls command.
    ///
    /// Matches are printed in precedence order, so an overridden file appears
    /// after the file that shadows it.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the pattern is invalid.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let site = self.site.build_site()?;
        let content = site.content();
        let namespace = self.namespace.as_deref();

        let lines: Vec<String> = if self.dirs {
            content
                .directories(&self.pattern, namespace)?
                .iter()
                .map(describe_directory)
                .collect()
        } else {
            content
                .files(&self.pattern, namespace)?
                .iter()
                .map(describe_file)
                .collect()
        };

        if lines.is_empty() {
            output.warning(&format!("No matches for {}", self.pattern));
        }
        for line in &lines {
            output.print(line);
        }
        Ok(())
    }
}

fn describe_file(file: &ContentFile) -> String {
    match file.path() {
        Some(path) => format!("{}\t{}", file.url_path(), path.display()),
        None => format!("{}\t(embedded)", file.url_path()),
    }
}

fn describe_directory(dir: &ContentDirectory) -> String {
    match dir.path() {
        Some(path) => format!("{}\t{}", dir.url_path(), path.display()),
        None => format!("{}\t(virtual)", dir.url_path()),
    }
}
