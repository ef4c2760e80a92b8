//! Page metadata and front matter.

use serde_yaml::{Mapping, Value};

/// Key-value page metadata with dotted-path access.
///
/// ```
/// use quire_site::Metadata;
///
/// let meta = Metadata::from_yaml("title: Guide\nauthor:\n  name: Ada\n")?;
/// assert_eq!(meta.get_str("title"), Some("Guide"));
/// assert_eq!(meta.get_str("author.name"), Some("Ada"));
/// assert_eq!(meta.get("author.email"), None);
/// # Ok::<(), serde_yaml::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    values: Mapping,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML mapping. Empty input yields empty metadata.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid YAML or a top-level value that is not a
    /// mapping.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        match serde_yaml::from_str::<Value>(source)? {
            Value::Null => Ok(Self::new()),
            Value::Mapping(values) => Ok(Self { values }),
            _ => Err(serde::de::Error::custom("metadata must be a mapping")),
        }
    }

    /// Value at a dotted path (`author.name`, `tags.0`).
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.values.get(first)?;
        for segment in segments {
            current = match current {
                Value::Mapping(map) => map.get(segment)?,
                Value::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    #[must_use]
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Set the value at a dotted path, creating intermediate mappings and
    /// replacing non-mapping values in the way.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };
        let mut map = &mut self.values;
        for segment in parents {
            let slot = map
                .entry(Value::from(*segment))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if !slot.is_mapping() {
                *slot = Value::Mapping(Mapping::new());
            }
            let Value::Mapping(next) = slot else {
                return;
            };
            map = next;
        }
        map.insert(Value::from(*last), value.into());
    }

    /// Top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().filter_map(Value::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Split a leading `---` YAML block from a document.
///
/// Returns the YAML (without fences) and the remaining body. Documents without
/// a complete block are returned whole as the body.
#[must_use]
pub fn split_front_matter(source: &str) -> (Option<&str>, &str) {
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return (None, source);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, source)
}

/// Parse front matter into [`Metadata`], returning it with the body.
///
/// # Errors
///
/// Returns an error if the front matter block is not a valid YAML mapping.
pub fn parse_front_matter(source: &str) -> Result<(Metadata, &str), serde_yaml::Error> {
    match split_front_matter(source) {
        (Some(yaml), body) => Ok((Metadata::from_yaml(yaml)?, body)),
        (None, body) => Ok((Metadata::new(), body)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_dotted_get() {
        let meta = Metadata::from_yaml("a:\n  b:\n    c: deep\ntags: [x, y]\n").unwrap();

        assert_eq!(meta.get_str("a.b.c"), Some("deep"));
        assert_eq!(meta.get_str("tags.1"), Some("y"));
        assert_eq!(meta.get("a.b.c.d"), None);
        assert_eq!(meta.get("tags.9"), None);
        assert_eq!(meta.get("missing"), None);
    }

    #[test]
    fn test_set_creates_parents() {
        let mut meta = Metadata::new();
        meta.set("seo.title", "Home");
        meta.set("dynamic", true);

        assert_eq!(meta.get_str("seo.title"), Some("Home"));
        assert_eq!(meta.get_bool("dynamic"), Some(true));
        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["seo", "dynamic"]);
    }

    #[test]
    fn test_set_replaces_scalar_parent() {
        let mut meta = Metadata::from_yaml("seo: plain").unwrap();
        meta.set("seo.title", "Home");

        assert_eq!(meta.get_str("seo.title"), Some("Home"));
    }

    #[test]
    fn test_non_mapping_rejected() {
        assert!(Metadata::from_yaml("- a\n- b\n").is_err());
        assert!(Metadata::from_yaml("").unwrap().is_empty());
    }

    #[test]
    fn test_split_front_matter() {
        let (yaml, body) = split_front_matter("---\ntitle: Hi\n---\n# Body\n");
        assert_eq!(yaml, Some("title: Hi\n"));
        assert_eq!(body, "# Body\n");

        let (yaml, body) = split_front_matter("---\r\ntitle: Hi\r\n---\r\nBody");
        assert_eq!(yaml, Some("title: Hi\r\n"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_front_matter_absent_or_unclosed() {
        assert_eq!(split_front_matter("# Title\n"), (None, "# Title\n"));
        assert_eq!(split_front_matter("---\ntitle: x\n"), (None, "---\ntitle: x\n"));
        assert_eq!(split_front_matter("--- not fm"), (None, "--- not fm"));
    }

    #[test]
    fn test_parse_front_matter() {
        let (meta, body) = parse_front_matter("---\ntemplate: post\n---\ntext").unwrap();
        assert_eq!(meta.get_str("template"), Some("post"));
        assert_eq!(body, "text");

        assert!(parse_front_matter("---\ntitle: [unclosed\n---\n").is_err());
    }
}
