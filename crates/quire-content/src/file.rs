//! Content files and directories returned by lookups.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use quire_url::Url;

use crate::ContentError;

/// Where a [`ContentFile`]'s bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A real file on disk.
    Disk(PathBuf),
    /// Bytes bundled into the binary or held in memory.
    Embedded(Arc<[u8]>),
}

/// One real file matched by a content lookup.
///
/// Pairs the file's source with its content path: the site-relative path the
/// file is published under, starting with `/` and prefixed with `/@namespace`
/// for namespaced lookups (e.g. `/guide/index.md`, `/@blog/post.md`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    source: FileSource,
    url_path: String,
}

impl ContentFile {
    /// A file on disk published under `url_path`.
    #[must_use]
    pub fn disk(path: impl Into<PathBuf>, url_path: impl Into<String>) -> Self {
        Self {
            source: FileSource::Disk(path.into()),
            url_path: url_path.into(),
        }
    }

    /// An in-memory file published under `url_path`.
    #[must_use]
    pub fn embedded(bytes: Arc<[u8]>, url_path: impl Into<String>) -> Self {
        Self {
            source: FileSource::Embedded(bytes),
            url_path: url_path.into(),
        }
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Filesystem path, for files on disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Disk(path) => Some(path),
            FileSource::Embedded(_) => None,
        }
    }

    /// Site-relative content path.
    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    /// Final path segment.
    pub fn name(&self) -> &str {
        self.url_path.rsplit('/').next().unwrap_or_default()
    }

    /// Final segment without its extension.
    pub fn stem(&self) -> &str {
        let name = self.name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        }
    }

    /// Lowercased extension.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name().rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    /// URL of this file under `site`.
    pub fn url(&self, site: &Url) -> Url {
        content_url(site, &self.url_path)
    }

    /// Read the raw bytes.
    pub fn read(&self) -> Result<Vec<u8>, ContentError> {
        match &self.source {
            FileSource::Disk(path) => {
                std::fs::read(path).map_err(|e| ContentError::io(e, Some(path.clone())))
            }
            FileSource::Embedded(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// Read the contents as UTF-8 (invalid sequences are replaced).
    pub fn read_to_string(&self) -> Result<String, ContentError> {
        let bytes = self.read()?;
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Replace the content path; used when re-homing `~namespace` results.
    pub(crate) fn with_url_path(mut self, url_path: String) -> Self {
        self.url_path = url_path;
        self
    }
}

/// One real directory matched by a content lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDirectory {
    path: Option<PathBuf>,
    url_path: String,
}

impl ContentDirectory {
    /// A directory on disk published under `url_path`.
    #[must_use]
    pub fn disk(path: impl Into<PathBuf>, url_path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            url_path: url_path.into(),
        }
    }

    /// A directory with no filesystem location.
    #[must_use]
    pub fn virtual_dir(url_path: impl Into<String>) -> Self {
        Self {
            path: None,
            url_path: url_path.into(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Site-relative content path, ending in `/`.
    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    /// Final path segment (empty for the root).
    pub fn name(&self) -> &str {
        self.url_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// URL of this directory under `site`.
    pub fn url(&self, site: &Url) -> Url {
        content_url(site, &self.url_path)
    }

    pub(crate) fn with_url_path(mut self, url_path: String) -> Self {
        self.url_path = url_path;
        self
    }
}

fn content_url(site: &Url, url_path: &str) -> Url {
    site.with_path(&format!(
        "{}{}",
        site.dir_path(),
        url_path.trim_start_matches('/')
    ))
}
