//! CLI command handlers

use crate::cache::{ResourceCache, start_cache};
use crate::config::Config;
use crate::controller::find_dependents;
use crate::models::{Resource, ResourceKind, ResourceRef};
use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

/// Main commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate readiness of resources in a namespace
    Status {
        /// Namespace of the resources
        namespace: String,
        /// Resources as Kind/name (e.g., "Deployment/web")
        #[arg(required = true)]
        resources: Vec<String>,
    },
    /// Summarise nodes with their allocated requests and limits
    Nodes {
        /// Label selector (e.g., "zone=a,!gpu")
        #[arg(long, short = 'l', default_value = "")]
        selector: String,
    },
    /// List releases that declare a dependency on a release
    Dependents {
        /// Namespace of the depended release
        namespace: String,
        /// Name of the depended release
        name: String,
    },
    /// Print the effective configuration
    Config,
    /// Show version information
    Version,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    ready: bool,
    blocking: Option<Resource>,
    resources: &'a crate::models::ResourceSet,
}

/// Parse `Kind/name` into a reference within `namespace`
pub fn parse_resource_ref(namespace: &str, value: &str) -> Result<ResourceRef> {
    let (kind, name) = value
        .split_once('/')
        .filter(|(kind, name)| !kind.is_empty() && !name.is_empty())
        .with_context(|| format!("Expected Kind/name, got '{}'", value))?;
    let kind = ResourceKind::from_str_case_insensitive(kind)
        .with_context(|| format!("Unsupported resource kind '{}'", kind))?;
    Ok(ResourceRef::new(kind, namespace, name))
}

/// Run one command against the cluster
pub async fn handle_command(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Config => {
            let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        Command::Version => super::display_version(),
        Command::Status {
            namespace,
            resources,
        } => {
            let refs = resources
                .iter()
                .map(|r| parse_resource_ref(&namespace, r))
                .collect::<Result<Vec<_>>>()?;
            let cache = connect(config).await?;
            let set = cache
                .get_resource_set(&refs)
                .context("Failed to build resource set")?;
            let (ready, blocking) = set.is_ready();
            print_json(&StatusReport {
                ready,
                blocking,
                resources: &set,
            })?;
        }
        Command::Nodes { selector } => {
            let cache = connect(config).await?;
            let nodes = cache
                .get_nodes(&selector)
                .await
                .context("Failed to summarise nodes")?;
            print_json(&nodes)?;
        }
        Command::Dependents { namespace, name } => {
            let cache = connect(config).await?;
            let configs = cache
                .list_release_configs(None, "")
                .context("Failed to list release configs")?;
            for dependent in find_dependents(&configs, &namespace, &name) {
                println!("{}/{}", dependent.meta.namespace, dependent.meta.name);
            }
        }
    }
    Ok(())
}

async fn connect(config: &Config) -> Result<ResourceCache> {
    let client = crate::kube::create_client().await?;
    let (cache, informers) = start_cache(client, config)
        .await
        .context("Failed to start resource cache")?;
    // one-shot commands read a synced snapshot; no further updates needed
    drop(informers);
    Ok(cache)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_ref() {
        let reference = parse_resource_ref("ns", "deployment/web").unwrap();
        assert_eq!(reference, ResourceRef::new(ResourceKind::Deployment, "ns", "web"));

        assert!(parse_resource_ref("ns", "web").is_err());
        assert!(parse_resource_ref("ns", "Deployment/").is_err());
        assert!(parse_resource_ref("ns", "CronJob/nightly").is_err());
    }
}
