//! Label selectors
//!
//! Parses the string form used by `kubectl -l` (`app=web,tier in (a,b),!legacy`)
//! into kube's [`Selector`](kube::core::Selector), which also does the
//! matching and the conversion of typed `LabelSelector`s from workload specs.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::core::{Expression, SelectorExt};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("invalid label selector '{selector}': {reason}")]
    Parse { selector: String, reason: String },

    #[error("invalid label selector in object spec: {0}")]
    LabelSelector(String),
}

/// Conjunction of label requirements; empty matches everything
#[derive(Debug, Clone)]
pub struct Selector {
    inner: kube::core::Selector,
    empty: bool,
}

impl Selector {
    pub fn everything() -> Self {
        Self::from_expressions(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.inner.matches(labels)
    }

    /// Convert a typed selector from an object spec
    pub fn from_label_selector(selector: &LabelSelector) -> Result<Self, SelectorError> {
        let empty = selector.match_labels.as_ref().is_none_or(|m| m.is_empty())
            && selector
                .match_expressions
                .as_ref()
                .is_none_or(|e| e.is_empty());
        let inner = kube::core::Selector::try_from(selector.clone())
            .map_err(|e| SelectorError::LabelSelector(e.to_string()))?;
        Ok(Self { inner, empty })
    }

    fn from_expressions(expressions: Vec<Expression>) -> Self {
        Self {
            empty: expressions.is_empty(),
            inner: expressions.into_iter().collect(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |reason: &str| SelectorError::Parse {
            selector: s.to_string(),
            reason: reason.to_string(),
        };

        let mut expressions = Vec::new();
        for term in split_terms(s).map_err(|reason| error(&reason))? {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            expressions.push(parse_term(term).map_err(|reason| error(&reason))?);
        }
        Ok(Selector::from_expressions(expressions))
    }
}

/// Split on commas that are not inside a value set
fn split_terms(s: &str) -> Result<Vec<&str>, String> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?
            }
            ',' if depth == 0 => {
                terms.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".to_string());
    }
    terms.push(&s[start..]);
    Ok(terms)
}

fn parse_term(term: &str) -> Result<Expression, String> {
    if let Some(key) = term.strip_prefix('!') {
        return Ok(Expression::DoesNotExist(validate_key(key.trim())?));
    }

    if let Some((key, value)) = term.split_once("!=") {
        return Ok(Expression::NotEqual(
            validate_key(key.trim())?,
            value.trim().to_string(),
        ));
    }
    if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
        return Ok(Expression::Equal(
            validate_key(key.trim())?,
            value.trim().to_string(),
        ));
    }

    let mut words = term.splitn(2, char::is_whitespace);
    let key = words.next().unwrap_or_default();
    let rest = words.next().map(str::trim).unwrap_or_default();
    if rest.is_empty() {
        return Ok(Expression::Exists(validate_key(key)?));
    }

    let (negated, set) = if let Some(set) = rest.strip_prefix("notin") {
        (true, set)
    } else if let Some(set) = rest.strip_prefix("in") {
        (false, set)
    } else {
        return Err(format!("unexpected '{}' after key '{}'", rest, key));
    };

    let set = set.trim();
    let inner = set
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| format!("expected '(values)' for key '{}'", key))?;
    let values: BTreeSet<String> = inner
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(format!("empty value set for key '{}'", key));
    }

    let key = validate_key(key)?;
    Ok(if negated {
        Expression::NotIn(key, values)
    } else {
        Expression::In(key, values)
    })
}

fn validate_key(key: &str) -> Result<String, String> {
    if key.is_empty() {
        return Err("empty label key".to_string());
    }
    if key
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')))
    {
        return Err(format!("invalid label key '{}'", key));
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let selector: Selector = "".parse().unwrap();
        assert!(selector.is_empty());
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn test_equality_terms() {
        let selector: Selector = "app=web, tier!=db".parse().unwrap();
        assert!(!selector.is_empty());
        assert!(selector.matches(&labels(&[("app", "web")])));
        assert!(selector.matches(&labels(&[("app", "web"), ("tier", "front")])));
        assert!(!selector.matches(&labels(&[("app", "web"), ("tier", "db")])));
        assert!(!selector.matches(&labels(&[("app", "api")])));

        let doubled: Selector = "app==web".parse().unwrap();
        assert!(doubled.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn test_set_terms() {
        let selector: Selector = "env in (prod, staging),release notin (old),managed,!legacy"
            .parse()
            .unwrap();
        assert!(selector.matches(&labels(&[("env", "prod"), ("managed", "true")])));
        assert!(!selector.matches(&labels(&[("env", "dev"), ("managed", "true")])));
        assert!(!selector.matches(&labels(&[
            ("env", "prod"),
            ("managed", "true"),
            ("legacy", "1")
        ])));
        assert!(!selector.matches(&labels(&[
            ("env", "prod"),
            ("managed", "true"),
            ("release", "old")
        ])));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!("app in (web".parse::<Selector>().is_err());
        assert!("=web".parse::<Selector>().is_err());
        assert!("app in ()".parse::<Selector>().is_err());
        assert!("app between (a,b)".parse::<Selector>().is_err());
    }

    #[test]
    fn test_from_label_selector() {
        let selector: LabelSelector = serde_json::from_value(serde_json::json!({
            "matchLabels": {"app": "zk"},
            "matchExpressions": [{"key": "component", "operator": "In", "values": ["server", "agent"]}]
        }))
        .unwrap();
        let selector = Selector::from_label_selector(&selector).unwrap();
        assert!(!selector.is_empty());
        assert!(selector.matches(&labels(&[("app", "zk"), ("component", "agent")])));
        assert!(!selector.matches(&labels(&[("app", "zk"), ("component", "cli")])));
        assert!(!selector.matches(&labels(&[("component", "server")])));

        let parsed: Selector = selector.to_string().parse().unwrap();
        assert!(parsed.matches(&labels(&[("app", "zk"), ("component", "server")])));
    }

    #[test]
    fn test_from_label_selector_rejects_unknown_operator() {
        let selector: LabelSelector = serde_json::from_value(serde_json::json!({
            "matchExpressions": [{"key": "a", "operator": "Gt", "values": ["1"]}]
        }))
        .unwrap();
        assert!(matches!(
            Selector::from_label_selector(&selector),
            Err(SelectorError::LabelSelector(_))
        ));
    }
}
