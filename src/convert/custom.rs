use super::labels_of;
use crate::models::crd;
use crate::models::{
    ApplicationInstance, Meta, ReleaseConfig, ResourceKind, ResourceRef, ResourceSet, State,
};
use crate::status;
use kube::ResourceExt;
use tracing::warn;

pub fn release_config(config: &crd::ReleaseConfig) -> ReleaseConfig {
    let spec = &config.spec;
    ReleaseConfig {
        meta: Meta::new(
            ResourceKind::ReleaseConfig,
            &config.namespace().unwrap_or_default(),
            &config.name_any(),
            State::ready(),
        ),
        labels: labels_of(config),
        config_values: spec.config_values.clone(),
        dependencies_config_values: spec.dependencies_config_values.clone(),
        dependencies: spec.dependencies.clone(),
        chart_name: spec.chart_name.clone(),
        chart_version: spec.chart_version.clone(),
        chart_app_version: spec.chart_app_version.clone(),
        output_config: spec.output_config.clone(),
        repo: spec.repo.clone(),
        chart_image: spec.chart_image.clone(),
    }
}

/// Module references recorded in the instance status
///
/// References with a kind this crate does not model are skipped. A
/// reference without a namespace lives in the instance's namespace.
pub fn instance_module_refs(instance: &crd::ApplicationInstance) -> Vec<ResourceRef> {
    let instance_namespace = instance.namespace().unwrap_or_default();
    instance
        .status
        .iter()
        .flat_map(|s| s.modules.iter())
        .filter_map(|module| {
            let reference = &module.resource_ref;
            let kind_name = reference.kind.as_deref().unwrap_or_default();
            let Some(kind) = ResourceKind::parse_optional(kind_name) else {
                warn!(
                    instance = %instance.name_any(),
                    "Skipping module of unsupported kind '{}'",
                    kind_name
                );
                return None;
            };
            Some(ResourceRef::new(
                kind,
                reference
                    .namespace
                    .as_deref()
                    .filter(|ns| !ns.is_empty())
                    .unwrap_or(&instance_namespace),
                reference.name.as_deref().unwrap_or_default(),
            ))
        })
        .collect()
}

/// Instance model over its already resolved modules
pub fn application_instance(
    instance: &crd::ApplicationInstance,
    modules: ResourceSet,
) -> ApplicationInstance {
    let state = status::application_instance_state(instance, &modules);
    ApplicationInstance {
        meta: Meta::new(
            ResourceKind::ApplicationInstance,
            &instance.namespace().unwrap_or_default(),
            &instance.name_any(),
            state,
        ),
        labels: labels_of(instance),
        application_name: instance.spec.application_ref.name.clone(),
        application_version: instance.spec.application_ref.version.clone(),
        instance_id: instance.spec.instance_id.clone(),
        modules,
    }
}
