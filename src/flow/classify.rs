// Event classification
//
// Turns one flow event into a source descriptor (the traced pod, possibly
// folded into its owning workload) and a destination descriptor (service,
// workload pod or external address). Classification never fails: missing
// data already decoded to sentinels.

use super::{Destination, EventType, FlowEvent, Owner};

/// Destination reference kind for a Kubernetes service
pub const REF_KIND_SERVICE: &str = "svc";

/// Destination reference kind for a pod (headless service targets)
pub const REF_KIND_POD: &str = "pod";

/// Destination reference kind the tracer uses for unresolved addresses
pub const REF_KIND_RAW: &str = "raw";

/// Classification of graph nodes for layout, hit testing and colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// One pod, or every pod of one controller
    Workload,
    /// Cluster service or other named Kubernetes resource
    Service,
    /// Address outside the cluster
    External,
}

impl NodeKind {
    /// Hit-test and drawing radius in surface units
    pub fn radius(&self) -> f64 {
        match self {
            Self::Workload => 5.0,
            Self::Service | Self::External => 4.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Workload => "workload",
            Self::Service => "service",
            Self::External => "external",
        }
    }
}

/// Where an event came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub pod: String,
    pub namespace: String,
    pub owner: Option<Owner>,
}

impl SourceDescriptor {
    /// Node id: pods of one controller share a single workload node
    pub fn node_id(&self) -> String {
        match &self.owner {
            Some(owner) => format!("workload:{}/{}/{}", self.namespace, owner.kind, owner.name),
            None => format!("pod:{}/{}", self.namespace, self.pod),
        }
    }

    /// Two-line display label
    pub fn label(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{} {}\n{}", owner.name, owner.kind, self.namespace),
            None => format!("{}\n{}", self.pod, self.namespace),
        }
    }
}

/// Where an event went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationDescriptor {
    pub label: String,
    pub kind: NodeKind,
    /// Pod name for workload-pod destinations, folded into the node's members
    pub member: Option<String>,
}

impl DestinationDescriptor {
    pub fn node_id(&self) -> String {
        format!("dst:{}", self.label)
    }
}

/// Classify one event into its source and destination descriptors
pub fn classify(event: &FlowEvent) -> (SourceDescriptor, DestinationDescriptor) {
    let source = SourceDescriptor {
        pod: event.source_pod.clone(),
        namespace: event.source_namespace.clone(),
        owner: event.source_owner.clone(),
    };

    // Accepted connections report the server's ephemeral port, which means
    // nothing to the caller
    let hide_port = event.event_type == EventType::Accept;

    (source, classify_destination(&event.destination, hide_port))
}

/// Classify a destination, first match wins:
/// 1. named service reference
/// 2. named pod reference
/// 3. any other named, non-raw reference
/// 4. bare address, typed by reference kind or address range
pub fn classify_destination(destination: &Destination, hide_port: bool) -> DestinationDescriptor {
    let port = destination.port;

    if let Some(reference) = &destination.reference {
        if let Some(name) = reference.name.as_deref() {
            match reference.kind.as_str() {
                REF_KIND_SERVICE => {
                    return DestinationDescriptor {
                        label: with_port(
                            format!("{}.{}.svc", name, reference.namespace),
                            port,
                            hide_port,
                        ),
                        kind: NodeKind::Service,
                        member: None,
                    };
                }
                REF_KIND_POD => {
                    return DestinationDescriptor {
                        label: with_port(
                            format!("{}.{}.pod", name, reference.namespace),
                            port,
                            hide_port,
                        ),
                        kind: NodeKind::Workload,
                        member: Some(name.to_string()),
                    };
                }
                REF_KIND_RAW => {}
                _ => {
                    return DestinationDescriptor {
                        label: with_port(
                            format!("{}.{}", name, reference.namespace),
                            port,
                            hide_port,
                        ),
                        kind: NodeKind::Service,
                        member: None,
                    };
                }
            }
        }
    }

    let is_raw = destination
        .reference
        .as_ref()
        .is_some_and(|r| r.kind == REF_KIND_RAW);

    let kind = if is_raw {
        NodeKind::External
    } else if is_cluster_address(&destination.address) {
        NodeKind::Service
    } else {
        NodeKind::External
    };

    DestinationDescriptor {
        label: with_port(destination.address.clone(), port, hide_port),
        kind,
        member: None,
    }
}

/// Addresses assumed to live inside the cluster network
///
/// Prefix test on the first octet only (10.x.x.x, 172.x.x.x), not a CIDR
/// match: 172.32.0.1 counts as in-cluster.
pub fn is_cluster_address(address: &str) -> bool {
    address.starts_with("10.") || address.starts_with("172.")
}

fn with_port(label: String, port: u16, hide_port: bool) -> String {
    if hide_port {
        label
    } else {
        format!("{}:{}", label, port)
    }
}
