//! Import collation.
//!
//! Builds the single document a host file compiles from by inlining its
//! `@import` statements.

use std::fs;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(?:url)?\s*\(?\s*['"]?([^'");]+)['"]?\s*\)?\s*([^;]*);?"#).unwrap()
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Nesting limit for imports within imports.
const MAX_DEPTH: usize = 10;

/// A host file with its imports inlined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collated {
    /// Full document text.
    pub css: String,
    /// Inlined imports in the order they were read. Paths are relative to
    /// the host file directory, or `/`-prefixed when relative to the
    /// document root.
    pub imports: Vec<String>,
}

/// Produces the document text for a host file.
pub trait ImportCollator: Send + Sync {
    /// Read `host_file` and inline what it imports.
    fn collate(&self, host_file: &Path, doc_root: &Path) -> std::io::Result<Collated>;
}

/// Filesystem importer.
///
/// Inlines local `@import "x.css"` and `@import url(x.css)` statements
/// recursively. Paths starting with `/` resolve against the document root,
/// others against the importing file. A media argument wraps the inlined
/// text in `@media`. Remote URLs, missing files and statements nested too
/// deep are left in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsImporter;

impl ImportCollator for FsImporter {
    fn collate(&self, host_file: &Path, doc_root: &Path) -> std::io::Result<Collated> {
        let source = fs::read_to_string(host_file)?;
        let host_dir = host_file.parent().unwrap_or(Path::new(""));
        let mut imports = Vec::new();
        let css = inline(&source, None, host_dir, doc_root, 0, &mut imports);
        Ok(Collated { css, imports })
    }
}

/// Inline the imports of `source`, whose own recorded path is `parent`
/// (`None` for the host file).
fn inline(
    source: &str,
    parent: Option<&str>,
    host_dir: &Path,
    doc_root: &Path,
    depth: usize,
    imports: &mut Vec<String>,
) -> String {
    let comments: Vec<Range<usize>> = COMMENT.find_iter(source).map(|m| m.range()).collect();
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for caps in IMPORT.captures_iter(source) {
        let Some(statement) = caps.get(0) else {
            continue;
        };
        if comments.iter().any(|c| c.contains(&statement.start())) {
            continue;
        }

        let url = caps[1].trim();
        if is_remote(url) {
            continue;
        }
        if depth >= MAX_DEPTH {
            tracing::warn!("import depth limit reached, leaving @import {url}");
            continue;
        }

        let recorded = record_path(parent, url);
        let path = crush_cache::resolve_import(&recorded, host_dir, doc_root);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("import {} not inlined: {e}", path.display());
                continue;
            }
        };
        tracing::debug!("inlining {}", path.display());
        imports.push(recorded.clone());

        let body = inline(&content, Some(&recorded), host_dir, doc_root, depth + 1, imports);
        let media = caps[2].trim();

        out.push_str(&source[last..statement.start()]);
        if media.is_empty() {
            out.push_str(&body);
        } else {
            out.push_str(&format!("@media {media} {{\n{body}\n}}"));
        }
        last = statement.end();
    }

    out.push_str(&source[last..]);
    out
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Path of `url` as recorded for the cache: relative to the host directory,
/// or `/`-prefixed for the document root.
fn record_path(parent: Option<&str>, url: &str) -> String {
    if url.starts_with('/') {
        return url.to_owned();
    }
    match parent.and_then(|p| p.rsplit_once('/')) {
        Some((dir, _)) => format!("{dir}/{url}"),
        None => url.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (path, content) in files {
            let path = tmp.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        tmp
    }

    fn collate(tmp: &TempDir, host: &str) -> Collated {
        FsImporter
            .collate(&tmp.path().join(host), tmp.path())
            .unwrap()
    }

    #[test]
    fn test_inline_relative_and_rooted() {
        let tmp = site(&[
            ("css/main.css", "@import \"base.css\";\n@import url(/shared/reset.css);\n.main{}"),
            ("css/base.css", ".base{}"),
            ("shared/reset.css", ".reset{}"),
        ]);
        let collated = collate(&tmp, "css/main.css");
        assert_eq!(collated.css, ".base{}\n.reset{}\n.main{}");
        assert_eq!(collated.imports, vec!["base.css", "/shared/reset.css"]);
    }

    #[test]
    fn test_nested_imports_are_recorded_from_host() {
        let tmp = site(&[
            ("css/main.css", "@import 'parts/a.css';"),
            ("css/parts/a.css", "@import 'b.css'; .a{}"),
            ("css/parts/b.css", ".b{}"),
        ]);
        let collated = collate(&tmp, "css/main.css");
        assert_eq!(collated.css, ".b{} .a{}");
        assert_eq!(collated.imports, vec!["parts/a.css", "parts/b.css"]);
    }

    #[test]
    fn test_media_argument_wraps_content() {
        let tmp = site(&[
            ("main.css", "@import url(print.css) print;"),
            ("print.css", ".p{}"),
        ]);
        assert_eq!(collate(&tmp, "main.css").css, "@media print {\n.p{}\n}");
    }

    #[test]
    fn test_remote_and_missing_are_kept() {
        let source = "@import url(https://fonts.example.com/a.css);\n@import \"gone.css\";";
        let tmp = site(&[("main.css", source)]);
        let collated = collate(&tmp, "main.css");
        assert_eq!(collated.css, source);
        assert!(collated.imports.is_empty());
    }

    #[test]
    fn test_commented_import_is_ignored() {
        let tmp = site(&[
            ("main.css", "/* @import \"a.css\"; */ .m{}"),
            ("a.css", ".a{}"),
        ]);
        assert_eq!(collate(&tmp, "main.css").css, "/* @import \"a.css\"; */ .m{}");
    }

    #[test]
    fn test_self_import_stops_at_depth_limit() {
        let tmp = site(&[("loop.css", "@import \"loop.css\"; .x{}")]);
        let collated = collate(&tmp, "loop.css");
        assert_eq!(collated.imports.len(), MAX_DEPTH);
        assert_eq!(collated.css.matches(".x{}").count(), MAX_DEPTH + 1);
    }

    #[test]
    fn test_record_path() {
        assert_eq!(record_path(None, "a.css"), "a.css");
        assert_eq!(record_path(Some("/lib/x.css"), "y.css"), "/lib/y.css");
        assert_eq!(record_path(Some("x.css"), "../y.css"), "../y.css");
        assert_eq!(record_path(Some("sub/x.css"), "/abs.css"), "/abs.css");
    }
}
