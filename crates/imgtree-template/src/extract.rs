//! Template key extraction
//!
//! A template's use of another image's version (`{{ base }}`) is itself the
//! dependency declaration, so extraction is the first half of graph building.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    // Keys are identifiers; repository directory names follow the same rule.
    KEY_RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

/// Enumerate the distinct substitution keys a template references.
///
/// Pure scan over the text; the template is never evaluated, and a key
/// appearing multiple times is reported once.
pub fn extract_keys(template: &str) -> BTreeSet<String> {
    key_re()
        .captures_iter(template)
        .map(|captures| captures[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_distinct_keys() {
        let template = "FROM mvpstudio/base:{{ base }}\nCOPY --from=mvpstudio/base:{{ base }} /x /x\nRUN echo {{ python }}";
        let keys = extract_keys(template);
        assert_eq!(keys, BTreeSet::from(["base".to_string(), "python".to_string()]));
    }

    #[test]
    fn whitespace_inside_markers_is_ignored() {
        assert_eq!(
            extract_keys("{{base}} {{  base  }}"),
            BTreeSet::from(["base".to_string()])
        );
    }

    #[test]
    fn plain_dockerfile_has_no_keys() {
        assert!(extract_keys("FROM ubuntu:24.04\nRUN apt-get update").is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let template = "FROM mvpstudio/base:{{ base }}";
        assert_eq!(extract_keys(template), extract_keys(template));
    }
}
