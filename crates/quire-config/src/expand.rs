//! `${VAR}` references in `quire.toml` string values.
//!
//! Applied to `site.url` and every `[[content]].dir`, so one config file can
//! serve several deployments.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` in `value` from the process
/// environment. `field` names the config key in errors.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    expand_with(value, field, |name| std::env::var(name).ok())
}

/// Expand with variables from `lookup`.
///
/// Values with no `${` pass through untouched, so a URL such as
/// `https://ex.com/$path` needs no escaping.
fn expand_with(
    value: &str,
    field: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |name| {
        lookup(name).map(Some).ok_or_else(|| Unset(name.to_owned()))
    })
    .map(Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a variable with no value and no default.
struct Unset(String);

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_host_from_variable() {
        let lookup = vars(&[("DOCS_HOST", "docs.example.com")]);

        let url = expand_with("https://${DOCS_HOST:-localhost}/", "site.url", lookup).unwrap();
        assert_eq!(url, "https://docs.example.com/");
    }

    #[test]
    fn test_default_when_unset() {
        let url = expand_with("${SITE_URL:-http://localhost/}", "site.url", vars(&[])).unwrap();
        assert_eq!(url, "http://localhost/");
    }

    #[test]
    fn test_content_dir_from_variables() {
        let lookup = vars(&[("CHECKOUT", "/srv/repo"), ("BRANCH", "main")]);

        let dir = expand_with("${CHECKOUT}/${BRANCH}/docs", "content[0].dir", lookup).unwrap();
        assert_eq!(dir, "/srv/repo/main/docs");
    }

    #[test]
    fn test_unset_names_variable_and_field() {
        let err = expand_with("${CHECKOUT}/docs", "content[1].dir", vars(&[])).unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("CHECKOUT"));
        assert!(message.contains("content[1].dir"));
    }

    #[test]
    fn test_without_braces_unchanged() {
        let lookup = vars(&[("path", "nope")]);

        assert_eq!(
            expand_with("https://ex.com/$path", "site.url", lookup).unwrap(),
            "https://ex.com/$path"
        );
    }

    #[test]
    fn test_process_environment() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env("${PATH:-}", "site.url").unwrap(), path);
    }
}
