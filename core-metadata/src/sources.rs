//! Source document parsing.
//!
//! A source document is JSON in one of three shapes:
//!
//! ```json
//! ["https://youtu.be/a", "https://youtu.be/b"]
//! {"url": "https://youtu.be/a"}
//! {"urls": ["https://youtu.be/a", "https://youtu.be/b"]}
//! ```
//!
//! Any other well-formed JSON yields no references. Malformed JSON is an
//! error so callers can log and skip the document.

use crate::error::{MetadataError, Result};
use core_async::fs;
use core_runtime::config::CatalogSource;
use core_runtime::logging::strip_path;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parse one source document into its references, in document order.
pub fn parse_source_document(json: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| MetadataError::InvalidSource(e.to_string()))?;
    Ok(extract_source_refs(&value))
}

/// Extract references from an already parsed document.
///
/// A non-empty `url` wins over `urls`. Non-string array entries are ignored.
pub fn extract_source_refs(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => string_items(items),
        Value::Object(map) => {
            if let Some(url) = map.get("url").and_then(Value::as_str) {
                if !url.is_empty() {
                    return vec![url.to_string()];
                }
            }
            match map.get("urls") {
                Some(Value::Array(items)) => string_items(items),
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drop repeated references, keeping the first occurrence of each.
pub fn dedupe_preserving_order(refs: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(refs.len());
    refs.into_iter()
        .filter(|source| seen.insert(source.clone()))
        .collect()
}

/// Read every `*.json` file in `dir`, sorted by file name.
///
/// Unreadable or malformed files are skipped with a warning; only a missing
/// or unreadable directory is an error.
pub async fn load_source_dir(dir: &Path) -> Result<Vec<String>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files: Vec<PathBuf> = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut refs = Vec::new();
    for path in files {
        let display = path.to_string_lossy().into_owned();
        let file = strip_path(&display);

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!(file, error = %e, "Skipping unreadable source file");
                continue;
            }
        };

        match parse_source_document(&contents) {
            Ok(found) => {
                debug!(file, count = found.len(), "Read source file");
                refs.extend(found);
            }
            Err(e) => warn!(file, error = %e, "Skipping malformed source file"),
        }
    }

    Ok(refs)
}

/// Gather references from all configured sources, in order, deduplicated.
pub async fn collect_source_refs(sources: &[CatalogSource]) -> Vec<String> {
    let mut refs = Vec::new();

    for source in sources {
        match source {
            CatalogSource::Inline(inline) => {
                refs.extend(inline.iter().filter(|s| !s.is_empty()).cloned())
            }
            CatalogSource::Document(json) => match parse_source_document(json) {
                Ok(found) => refs.extend(found),
                Err(e) => warn!(error = %e, "Skipping malformed source document"),
            },
            CatalogSource::Directory(dir) => match load_source_dir(dir).await {
                Ok(found) => refs.extend(found),
                Err(e) => warn!(
                    dir = %dir.display(),
                    error = %e,
                    "Skipping unreadable source directory"
                ),
            },
        }
    }

    dedupe_preserving_order(refs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_document_shapes() {
        assert_eq!(
            parse_source_document(r#"["a", "b"]"#).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(parse_source_document(r#"{"url": "a"}"#).unwrap(), vec!["a"]);
        assert_eq!(
            parse_source_document(r#"{"urls": ["a", "b"]}"#).unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn url_takes_precedence_unless_empty() {
        assert_eq!(
            parse_source_document(r#"{"url": "a", "urls": ["b"]}"#).unwrap(),
            vec!["a"]
        );
        assert_eq!(
            parse_source_document(r#"{"url": "", "urls": ["b"]}"#).unwrap(),
            vec!["b"]
        );
    }

    #[test]
    fn unknown_shapes_yield_nothing() {
        assert!(parse_source_document(r#"{"songs": ["a"]}"#).unwrap().is_empty());
        assert!(parse_source_document("42").unwrap().is_empty());
        assert!(parse_source_document("null").unwrap().is_empty());
        assert_eq!(
            parse_source_document(r#"["a", 3, null, "b"]"#).unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn malformed_json_is_invalid_source() {
        assert!(matches!(
            parse_source_document("[\"a\","),
            Err(MetadataError::InvalidSource(_))
        ));
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let refs = vec!["b", "a", "b", "c", "a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedupe_preserving_order(refs), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn collects_across_sources_in_order() {
        let sources = vec![
            CatalogSource::inline(["x", "y"]),
            CatalogSource::document("not json"),
            CatalogSource::document(r#"{"urls": ["y", "z"]}"#),
            CatalogSource::directory("/definitely/not/here"),
        ];

        assert_eq!(collect_source_refs(&sources).await, vec!["x", "y", "z"]);
    }
}
