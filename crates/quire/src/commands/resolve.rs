//! `quire resolve` command implementation.

use clap::Args;

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    /// Request path or URL (e.g. `/guide/`, `@blog/post.html`).
    path: String,

    /// Print the response summary only.
    #[arg(long)]
    no_body: bool,

    #[command(flatten)]
    site: SiteArgs,
}

impl ResolveArgs {
    /// Execute the resolve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or a hook fails while resolving.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let site = self.site.build_site()?;
        let mut session = site.session();
        let response = session.respond(&self.path)?;

        output.highlight(&format!("{} {}", response.status, response.url));
        output.detail("content-type", &response.content_type);
        if let Some(template) = &response.template {
            output.detail("template", template);
        }
        if let Some(location) = &response.location {
            output.detail("location", &location.to_string());
        }
        output.detail("cacheable", if response.cacheable { "yes" } else { "no" });
        if response.status != 200 {
            output.warning(&format!("No content at {}, showing error page", self.path));
        }

        if self.no_body {
            return Ok(());
        }
        output.separator();
        if is_textual(&response.content_type) {
            output.print(&response.body_str());
        } else {
            output.print(&format!("<{} bytes of binary content>", response.body.len()));
        }
        Ok(())
    }
}

fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/") || content_type.contains("charset=")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_textual() {
        assert!(is_textual("text/html; charset=utf-8"));
        assert!(is_textual("application/javascript; charset=utf-8"));
        assert!(!is_textual("image/png"));
    }
}
