//! rules-file — JSON data source for the parameter registry and banned terms.
//!
//! Purpose
//! - Load the externally supplied rule tables once at startup and hand them to
//!   the domain as an immutable `Rules` value.
//!
//! Format
//! ```json
//! { "params": ["ar", "chaos", "..."], "banned_words": ["word", "some phrase"] }
//! ```
//! - `params` missing → the standard registry; present but empty → error.
//! - `banned_words` missing → no banned terms.

use std::fs;
use std::path::Path;

use domain::banned::BannedTermSet;
use domain::params::ParameterRegistry;
use domain::Rules;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid rules document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rules document lists no parameters")]
    EmptyRegistry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesDoc {
    #[serde(default)]
    params: Option<Vec<String>>,
    #[serde(default)]
    banned_words: Vec<String>,
}

/// Parse a rules document.
pub fn parse(json: &str) -> Result<Rules, RulesError> {
    let doc: RulesDoc = serde_json::from_str(json)?;
    let params = match doc.params {
        Some(names) => {
            let registry = ParameterRegistry::new(names);
            if registry.is_empty() {
                return Err(RulesError::EmptyRegistry);
            }
            registry
        }
        None => ParameterRegistry::standard(),
    };
    Ok(Rules::new(params, BannedTermSet::new(doc.banned_words)))
}

/// Read and parse a rules file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Rules, RulesError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| RulesError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rules = parse(&raw)?;
    info!(
        path = %path.display(),
        params = rules.params.len(),
        banned = rules.banned.len(),
        "rules loaded"
    );
    Ok(rules)
}

/// Load from `path` when given, otherwise fall back to the standard registry
/// and an empty banned set.
pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Rules, RulesError> {
    match path {
        Some(path) => load(path),
        None => Ok(Rules::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_document() {
        let rules = parse(r#"{"params":["--ar","Tile"],"banned_words":["Gore","very bad word"]}"#)
            .unwrap();
        assert!(rules.params.contains("ar"));
        assert!(rules.params.contains("tile"));
        assert!(!rules.params.contains("chaos"));
        assert_eq!(
            rules.banned.terms(),
            &["gore".to_string(), "very bad word".to_string()]
        );
    }

    #[test]
    fn missing_sections_use_defaults() {
        let rules = parse("{}").unwrap();
        assert_eq!(rules.params, ParameterRegistry::standard());
        assert!(rules.banned.is_empty());
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert!(matches!(
            parse(r#"{"params":[]}"#),
            Err(RulesError::EmptyRegistry)
        ));
    }

    #[test]
    fn unknown_keys_and_bad_json_are_rejected() {
        assert!(matches!(parse(r#"{"parms":[]}"#), Err(RulesError::Parse(_))));
        assert!(matches!(parse("not json"), Err(RulesError::Parse(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"banned_words":["ghost"]}}"#).unwrap();
        let rules = load(file.path()).unwrap();
        assert_eq!(rules.banned.terms(), &["ghost".to_string()]);
        assert!(rules.params.contains("sref"));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, RulesError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn no_path_means_defaults() {
        let rules = load_or_default(None::<&Path>).unwrap();
        assert_eq!(rules.params, ParameterRegistry::standard());
        assert!(rules.banned.is_empty());
    }
}
