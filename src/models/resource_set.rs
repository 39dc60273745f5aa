//! Resources belonging to one application
//!
//! A [`ResourceSet`] is built fresh for every inspection pass. Members that
//! do not exist in the cluster are kept with a `NotFound` state so absence
//! is visible to callers.

use super::kind::ResourceKind;
use super::resources::{
    ConfigMap, DaemonSet, Deployment, Ingress, Job, Pod, Resource, Secret, Service, StatefulSet,
};
use crate::ops::{ScaleError, Scaler};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSet {
    pub services: Vec<Service>,
    pub config_maps: Vec<ConfigMap>,
    pub daemon_sets: Vec<DaemonSet>,
    pub deployments: Vec<Deployment>,
    pub ingresses: Vec<Ingress>,
    pub jobs: Vec<Job>,
    pub secrets: Vec<Secret>,
    pub stateful_sets: Vec<StatefulSet>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate readiness
    ///
    /// Members are scanned kind by kind in a fixed order (Secrets, Jobs,
    /// StatefulSets, Services, Ingresses, Deployments, DaemonSets,
    /// ConfigMaps) and the first member that is not `Ready` is returned
    /// alongside `false`. The order makes the reported blocker stable for
    /// a given snapshot.
    pub fn is_ready(&self) -> (bool, Option<Resource>) {
        let blocking = self
            .secrets
            .iter()
            .find(|r| !r.meta.state.is_ready())
            .map(|r| Resource::Secret(r.clone()))
            .or_else(|| {
                self.jobs
                    .iter()
                    .find(|r| !r.meta.state.is_ready())
                    .map(|r| Resource::Job(r.clone()))
            })
            .or_else(|| {
                self.stateful_sets
                    .iter()
                    .find(|r| !r.meta.state.is_ready())
                    .map(|r| Resource::StatefulSet(r.clone()))
            })
            .or_else(|| {
                self.services
                    .iter()
                    .find(|r| !r.meta.state.is_ready())
                    .map(|r| Resource::Service(r.clone()))
            })
            .or_else(|| {
                self.ingresses
                    .iter()
                    .find(|r| !r.meta.state.is_ready())
                    .map(|r| Resource::Ingress(r.clone()))
            })
            .or_else(|| {
                self.deployments
                    .iter()
                    .find(|r| !r.meta.state.is_ready())
                    .map(|r| Resource::Deployment(r.clone()))
            })
            .or_else(|| {
                self.daemon_sets
                    .iter()
                    .find(|r| !r.meta.state.is_ready())
                    .map(|r| Resource::DaemonSet(r.clone()))
            })
            .or_else(|| {
                self.config_maps
                    .iter()
                    .find(|r| !r.meta.state.is_ready())
                    .map(|r| Resource::ConfigMap(r.clone()))
            });

        (blocking.is_none(), blocking)
    }

    /// Pods owned by DaemonSets, StatefulSets and Deployments, in that order
    ///
    /// Job pods are never restart targets.
    pub fn pods_need_restart(&self) -> Vec<Pod> {
        self.daemon_sets
            .iter()
            .flat_map(|ds| ds.pods.iter())
            .chain(self.stateful_sets.iter().flat_map(|sts| sts.pods.iter()))
            .chain(self.deployments.iter().flat_map(|d| d.pods.iter()))
            .cloned()
            .collect()
    }

    /// Scale every Deployment and StatefulSet to zero replicas
    ///
    /// Stops at the first failure; members scaled before it stay scaled.
    /// Calling again after a failure is safe.
    pub async fn pause(&self, scaler: &dyn Scaler) -> Result<(), ScaleError> {
        for deployment in &self.deployments {
            scaler
                .scale(
                    ResourceKind::Deployment,
                    &deployment.meta.namespace,
                    &deployment.meta.name,
                    0,
                )
                .await?;
        }
        for stateful_set in &self.stateful_sets {
            scaler
                .scale(
                    ResourceKind::StatefulSet,
                    &stateful_set.meta.namespace,
                    &stateful_set.meta.name,
                    0,
                )
                .await?;
        }
        Ok(())
    }

    /// Total number of members
    pub fn len(&self) -> usize {
        self.services.len()
            + self.config_maps.len()
            + self.daemon_sets.len()
            + self.deployments.len()
            + self.ingresses.len()
            + self.jobs.len()
            + self.secrets.len()
            + self.stateful_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Resource> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut set = ResourceSet::new();
        for resource in iter {
            resource.add_to_resource_set(&mut set);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::State;
    use crate::ops::MockScaler;

    fn ready(kind: ResourceKind, name: &str) -> Resource {
        let mut resource = Resource::not_found(kind, "ns", name);
        set_state(&mut resource, State::ready());
        resource
    }

    fn set_state(resource: &mut Resource, state: State) {
        match resource {
            Resource::Secret(r) => r.meta.state = state,
            Resource::Job(r) => r.meta.state = state,
            Resource::StatefulSet(r) => r.meta.state = state,
            Resource::Service(r) => r.meta.state = state,
            Resource::Ingress(r) => r.meta.state = state,
            Resource::Deployment(r) => r.meta.state = state,
            Resource::DaemonSet(r) => r.meta.state = state,
            Resource::ConfigMap(r) => r.meta.state = state,
            _ => unreachable!("not a set member"),
        }
    }

    #[test]
    fn test_empty_set_is_ready() {
        let (ready, blocking) = ResourceSet::new().is_ready();
        assert!(ready);
        assert!(blocking.is_none());
    }

    #[test]
    fn test_all_ready_members() {
        let set: ResourceSet = [
            ready(ResourceKind::Secret, "s"),
            ready(ResourceKind::Deployment, "d"),
            ready(ResourceKind::ConfigMap, "c"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.is_ready(), (true, None));
    }

    #[tokio::test]
    async fn test_pause_scales_deployments_then_stateful_sets() {
        let set: ResourceSet = [
            ready(ResourceKind::StatefulSet, "db"),
            ready(ResourceKind::Deployment, "web"),
        ]
        .into_iter()
        .collect();

        let mut scaler = MockScaler::new();
        let mut seq = mockall::Sequence::new();
        scaler
            .expect_scale()
            .withf(|kind, ns, name, replicas| {
                *kind == ResourceKind::Deployment && ns == "ns" && name == "web" && *replicas == 0
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));
        scaler
            .expect_scale()
            .withf(|kind, _, name, _| *kind == ResourceKind::StatefulSet && name == "db")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));

        set.pause(&scaler).await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_stops_at_first_error() {
        let set: ResourceSet = [
            ready(ResourceKind::Deployment, "a"),
            ready(ResourceKind::Deployment, "b"),
            ready(ResourceKind::StatefulSet, "c"),
        ]
        .into_iter()
        .collect();

        let mut scaler = MockScaler::new();
        scaler
            .expect_scale()
            .withf(|_, _, name, _| name == "a")
            .times(1)
            .returning(|kind, ns, name, _| {
                Err(ScaleError::Rejected {
                    kind,
                    namespace: ns.to_string(),
                    name: name.to_string(),
                    message: "forbidden".to_string(),
                })
            });

        let err = set.pause(&scaler).await.unwrap_err();
        assert!(err.to_string().contains("forbidden"));
    }
}
