//! Dependency references between releases

use crate::models::ReleaseConfig;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("depended release '{0}' is not valid: expected 'name', 'namespace.name' or 'namespace/name'")]
pub struct InvalidDependency(pub String);

/// Resolve a dependency value to `(namespace, name)`
///
/// A bare name lives in `declaring_namespace`. The separator is `/` when
/// present, else `.`.
pub fn parse_dependency(
    declaring_namespace: &str,
    dependency: &str,
) -> Result<(String, String), InvalidDependency> {
    let separator = if dependency.contains('/') { '/' } else { '.' };
    let parts: Vec<&str> = dependency.split(separator).collect();
    match parts.as_slice() {
        [name] if !name.is_empty() => Ok((declaring_namespace.to_string(), name.to_string())),
        [namespace, name] if !namespace.is_empty() && !name.is_empty() => {
            Ok((namespace.to_string(), name.to_string()))
        }
        _ => Err(InvalidDependency(dependency.to_string())),
    }
}

/// Whether two output configs differ
///
/// Two empty configs are equal however they were written.
pub fn output_config_changed(old: &Map<String, Value>, new: &Map<String, Value>) -> bool {
    if old.is_empty() && new.is_empty() {
        return false;
    }
    old != new
}

/// Configs that declare a dependency on `namespace/name`
///
/// Each declaring config appears once no matter how many of its aliases
/// point at the release. Malformed entries are logged and skipped.
pub fn find_dependents<'a>(
    configs: &'a [ReleaseConfig],
    namespace: &str,
    name: &str,
) -> Vec<&'a ReleaseConfig> {
    configs
        .iter()
        .filter(|config| {
            config.dependencies.iter().any(|(alias, dependency)| {
                match parse_dependency(&config.meta.namespace, dependency) {
                    Ok((ns, n)) => ns == namespace && n == name,
                    Err(e) => {
                        error!(
                            namespace = %config.meta.namespace,
                            name = %config.meta.name,
                            alias = %alias,
                            "{}", e
                        );
                        false
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Meta, ResourceKind, State};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn config(namespace: &str, name: &str, deps: &[(&str, &str)]) -> ReleaseConfig {
        ReleaseConfig {
            meta: Meta::new(ResourceKind::ReleaseConfig, namespace, name, State::ready()),
            labels: BTreeMap::new(),
            config_values: Map::new(),
            dependencies_config_values: Map::new(),
            dependencies: deps
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            chart_name: String::new(),
            chart_version: String::new(),
            chart_app_version: String::new(),
            output_config: Map::new(),
            repo: String::new(),
            chart_image: String::new(),
        }
    }

    #[test]
    fn test_parse_dependency_forms() {
        let parse = |s| parse_dependency("home", s);
        assert_eq!(parse("zk").unwrap(), ("home".into(), "zk".into()));
        assert_eq!(parse("ns2.myzk").unwrap(), ("ns2".into(), "myzk".into()));
        assert_eq!(parse("ns2/myzk").unwrap(), ("ns2".into(), "myzk".into()));
        assert!(parse("a.b.c").is_err());
        assert!(parse("a/b/c").is_err());
        assert!(parse("").is_err());
        assert!(parse("ns/").is_err());
    }

    #[test]
    fn test_output_config_diff() {
        let empty = Map::new();
        let port = json!({"port": 2181}).as_object().unwrap().clone();
        let other = json!({"port": 2182}).as_object().unwrap().clone();

        assert!(!output_config_changed(&empty, &Map::new()));
        assert!(!output_config_changed(&port, &port.clone()));
        assert!(output_config_changed(&empty, &port));
        assert!(output_config_changed(&port, &other));
    }

    #[test]
    fn test_find_dependents_matches_once() {
        let configs = vec![
            config("ns1", "app", &[("zk", "ns2.myzk"), ("zk-again", "ns2/myzk")]),
            config("ns2", "local", &[("zk", "myzk")]),
            config("ns1", "other", &[("zk", "myzk"), ("bad", "x.y.z")]),
        ];

        let dependents: Vec<_> = find_dependents(&configs, "ns2", "myzk")
            .iter()
            .map(|c| format!("{}/{}", c.meta.namespace, c.meta.name))
            .collect();
        assert_eq!(dependents, vec!["ns1/app", "ns2/local"]);
    }
}
