//! `quire hash` command implementation.

use clap::Args;

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the hash command.
#[derive(Args)]
pub(crate) struct HashArgs {
    /// Content path (e.g. `/guide`).
    path: String,

    /// Hash the path within a namespace.
    #[arg(short, long)]
    namespace: Option<String>,

    #[command(flatten)]
    site: SiteArgs,
}

impl HashArgs {
    /// Execute the hash command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or a backend rejects the path.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let site = self.site.build_site()?;
        let hash = site.session().hash(&self.path, self.namespace.as_deref())?;
        output.print(&hash);
        Ok(())
    }
}
