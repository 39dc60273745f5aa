use crate::models::{Meta, ResourceKind, Service, ServicePort, State};
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

/// Service with ports resolved against its Endpoints, when present
pub fn service(service: &corev1::Service, endpoints: Option<&corev1::Endpoints>) -> Service {
    let spec = service.spec.as_ref();
    let ports = spec
        .and_then(|s| s.ports.as_deref())
        .unwrap_or_default()
        .iter()
        .map(|port| {
            let name = port.name.clone().unwrap_or_default();
            ServicePort {
                endpoints: endpoints
                    .map(|e| format_endpoints(e, &name))
                    .unwrap_or_default(),
                name,
                protocol: port.protocol.clone().unwrap_or_default(),
                port: port.port,
                target_port: match &port.target_port {
                    Some(IntOrString::Int(n)) => n.to_string(),
                    Some(IntOrString::String(s)) => s.clone(),
                    None => String::new(),
                },
                node_port: port.node_port.unwrap_or(0),
            }
        })
        .collect();

    Service {
        meta: Meta::new(
            ResourceKind::Service,
            &service.namespace().unwrap_or_default(),
            &service.name_any(),
            State::ready(),
        ),
        ports,
        cluster_ip: spec.and_then(|s| s.cluster_ip.clone()).unwrap_or_default(),
        service_type: spec.and_then(|s| s.type_.clone()).unwrap_or_default(),
    }
}

/// `ip:port` for every address of every subset port named `port_name`
fn format_endpoints(endpoints: &corev1::Endpoints, port_name: &str) -> Vec<String> {
    let mut list = Vec::new();
    for subset in endpoints.subsets.iter().flatten() {
        for port in subset.ports.iter().flatten() {
            if port.name.as_deref().unwrap_or_default() != port_name {
                continue;
            }
            for address in subset.addresses.iter().flatten() {
                list.push(join_host_port(&address.ip, port.port));
            }
        }
    }
    list
}

fn join_host_port(host: &str, port: i32) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
