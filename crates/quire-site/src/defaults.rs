//! Content bundled into the binary.
//!
//! Registered as the lowest-precedence backend of every site, so any content
//! directory can override these files.

use quire_content::MemoryBackend;

const ERROR_INDEX: &str = "---
title: Error
dynamic: true
---
<h1>Something went wrong</h1>
";

const ERROR_404: &str = "---
title: Not Found
dynamic: true
---
<h1>Page not found</h1>
<p>The requested page does not exist.</p>
";

const ERROR_508: &str = "---
title: Resolution Cycle
dynamic: true
---
<h1>Resolution cycle</h1>
<p>The page refers back to itself.</p>
";

/// Built-in error pages.
pub fn bundle() -> MemoryBackend {
    MemoryBackend::new("defaults")
        .with_file("/_error/index.html", ERROR_INDEX)
        .with_file("/_error/404.html", ERROR_404)
        .with_file("/_error/508.html", ERROR_508)
}

#[cfg(test)]
mod tests {
    use quire_content::ContentBackend;

    use super::*;

    #[test]
    fn test_bundle_error_pages() {
        let bundle = bundle();
        let files = bundle.files("/_error/*.html").unwrap();
        assert_eq!(files.len(), 3);
    }
}
