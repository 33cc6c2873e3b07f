use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Placeholder expansion failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpandError {
    /// Referenced variable is unset and has no default
    #[error("environment variable not found: `{0}`")]
    Missing(String),

    /// Placeholder uses a scope other than `env.`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `{{ env.NAME }}` or `{{ env.NAME | default("value") }}`
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
    })
}

/// Expand `{{ env.VAR }}` placeholders in raw config text
///
/// `{{ env.VAR | default("x") }}` falls back to `x` when `VAR` is unset.
/// Comment lines are copied through untouched so commented-out secrets
/// never have to exist.
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    let mut lines = Vec::new();

    for line in input.split('\n') {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_owned());
            continue;
        }

        let mut failure = None;
        let expanded = placeholder().replace_all(line, |caps: &Captures<'_>| {
            match resolve(&caps[1], caps.get(2).map(|m| m.as_str())) {
                Ok(value) => value,
                Err(e) => {
                    failure.get_or_insert(e);
                    String::new()
                }
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }
        lines.push(expanded.into_owned());
    }

    Ok(lines.join("\n"))
}

fn resolve(key: &str, default: Option<&str>) -> Result<String, ExpandError> {
    let Some(name) = key.strip_prefix("env.").filter(|n| !n.is_empty() && !n.contains('.')) else {
        return Err(ExpandError::UnsupportedScope(key.to_owned()));
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_owned()),
        (Err(_), None) => Err(ExpandError::Missing(name.to_owned())),
    }
}
