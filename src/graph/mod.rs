// Flow graph model
//
// Incrementally folds batches of flow events into an aggregated node/edge
// model: one node per workload, service or external endpoint, one edge per
// ordered (from, to) pair. Edges unseen for ten minutes are evicted.
//
// Maps are insertion-ordered so hit testing and drawing see nodes in the
// order they first appeared.

use crate::flow::classify::{classify, NodeKind};
use crate::flow::{EventType, FlowEvent, UNKNOWN};
use crate::viewport::Point;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// Constants
// ============================================================================

/// Only the most recent events of a batch are folded into the model
pub const EVENT_WINDOW: usize = 100;

/// Edges not observed for longer than this are evicted (10 minutes)
pub const EDGE_STALE_AFTER_MS: u64 = 600_000;

/// Angular slots of the initial circular layout
///
/// Fixed regardless of node count: the eleventh node lands on the first
/// node's angle.
pub const LAYOUT_SLOTS: usize = 10;

/// Layout circle radius as a fraction of the smaller surface dimension
pub const LAYOUT_RADIUS_RATIO: f64 = 0.3;

/// Namespaces selected for display; empty means every namespace passes
pub type NamespaceFilter = BTreeSet<String>;

/// Per-event ingest failures; logged and skipped, never fatal to a batch
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("no drawing surface yet, cannot place new nodes")]
    SurfaceNotReady,

    #[error("unsupported event type '{0}'")]
    UnsupportedEventType(String),
}

// ============================================================================
// Model types
// ============================================================================

/// Size of the area nodes are initially laid out on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Surface {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable identity, e.g. `workload:ns/Deployment/api` or `dst:db.ns.svc:5432`
    pub id: String,
    /// Fixed at creation
    pub kind: NodeKind,
    /// One or two lines separated by `\n`
    pub label: String,
    /// Pod names folded into this node (workload nodes only)
    pub members: BTreeSet<String>,
    pub position: Point,
    /// Number of live edges touching this node
    pub degree: usize,
    /// Source namespace for nodes created as a flow's source
    pub namespace: Option<String>,
}

impl Node {
    /// Member count for workload nodes; `None` for services and externals
    pub fn member_count(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Workload => Some(self.members.len()),
            NodeKind::Service | NodeKind::External => None,
        }
    }

    /// Whether several pods are folded into this node
    pub fn is_group(&self) -> bool {
        self.member_count().is_some_and(|count| count > 1)
    }

    pub fn radius(&self) -> f64 {
        self.kind.radius()
    }

    pub fn contains(&self, canvas_point: Point) -> bool {
        self.position.distance_to(canvas_point) < self.radius()
    }
}

/// Edge identity: direction encodes who initiated the flow
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId {
    pub from: String,
    pub to: String,
}

impl EdgeId {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub occurrences: u64,
    /// Never exceeds `occurrences`
    pub error_occurrences: u64,
    /// Wall-clock milliseconds of the last ingest that touched this edge
    pub last_observed_at: u64,
    /// Type of the event that created the edge
    pub event_type: EventType,
    /// Source namespace of the event that created the edge
    pub namespace: String,
}

impl Edge {
    pub fn has_errors(&self) -> bool {
        self.error_occurrences > 0
    }

    pub fn is_stale(&self, now: u64) -> bool {
        now.saturating_sub(self.last_observed_at) > EDGE_STALE_AFTER_MS
    }
}

/// Summary counters for the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Sum of edge occurrence counts
    pub flows: u64,
    /// Sum of edge error counts
    pub errors: u64,
}

/// What one ingest call did, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub applied: usize,
    pub closes: usize,
    pub filtered: usize,
    pub failed: usize,
    pub evicted: usize,
}

// ============================================================================
// Graph model
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeId, Edge>,
    observed_namespaces: BTreeSet<String>,
    surface: Option<Surface>,
    /// Namespaces shown; hidden items keep aggregating
    view_filter: NamespaceFilter,
}

enum Outcome {
    Applied,
    Close,
    Filtered,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout surface; non-positive sizes clear it
    pub fn resize(&mut self, width: f64, height: f64) {
        self.surface = if width > 0.0 && height > 0.0 {
            Some(Surface { width, height })
        } else {
            None
        };
    }

    #[cfg(test)]
    pub fn surface(&self) -> Option<Surface> {
        self.surface
    }

    /// Restrict what the view iterators, hit testing and stats expose
    pub fn set_view_filter(&mut self, filter: NamespaceFilter) {
        self.view_filter = filter;
    }

    /// Drop every node, edge and observed namespace; the surface and view
    /// filter are kept
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.observed_namespaces.clear();
    }

    /// Fold the most recent EVENT_WINDOW events into the model, then evict
    /// stale edges
    ///
    /// A failing event is logged and skipped; the rest of the batch is
    /// still applied.
    pub fn ingest(&mut self, events: &[FlowEvent], now: u64, filter: &NamespaceFilter) -> IngestReport {
        let mut report = IngestReport::default();
        let start = events.len().saturating_sub(EVENT_WINDOW);

        for event in &events[start..] {
            match self.apply_event(event, now, filter) {
                Ok(Outcome::Applied) => report.applied += 1,
                Ok(Outcome::Close) => report.closes += 1,
                Ok(Outcome::Filtered) => report.filtered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        error = %e,
                        pod = %event.source_pod,
                        namespace = %event.source_namespace,
                        "Skipping flow event"
                    );
                }
            }
        }

        report.evicted = self.evict_stale(now);

        debug!(
            applied = report.applied,
            closes = report.closes,
            filtered = report.filtered,
            failed = report.failed,
            evicted = report.evicted,
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Ingested flow batch"
        );

        report
    }

    fn apply_event(
        &mut self,
        event: &FlowEvent,
        now: u64,
        filter: &NamespaceFilter,
    ) -> Result<Outcome, GraphError> {
        match &event.event_type {
            EventType::Close => return Ok(Outcome::Close),
            EventType::Other(name) => return Err(GraphError::UnsupportedEventType(name.clone())),
            EventType::Connect | EventType::Accept => {}
        }

        if event.source_namespace != UNKNOWN {
            self.observed_namespaces
                .insert(event.source_namespace.clone());
        }

        if !filter.is_empty() && !filter.contains(&event.source_namespace) {
            return Ok(Outcome::Filtered);
        }

        let (source, destination) = classify(event);
        let source_id = source.node_id();
        let destination_id = destination.node_id();

        // Nothing is touched unless both endpoints can be placed
        if self.surface.is_none()
            && !(self.nodes.contains_key(&source_id) && self.nodes.contains_key(&destination_id))
        {
            return Err(GraphError::SurfaceNotReady);
        }

        self.ensure_node(&source_id, NodeKind::Workload)?;
        if let Some(node) = self.nodes.get_mut(&source_id) {
            node.members.insert(source.pod.clone());
            node.label = source.label();
            node.namespace = Some(event.source_namespace.clone());
        }

        self.ensure_node(&destination_id, destination.kind)?;
        if let Some(node) = self.nodes.get_mut(&destination_id) {
            if node.label.is_empty() {
                node.label = destination.label.clone();
            }
            if let (NodeKind::Workload, Some(member)) = (node.kind, &destination.member) {
                node.members.insert(member.clone());
            }
        }

        // An accepted connection flows from the client into the traced pod
        let id = match event.event_type {
            EventType::Accept => EdgeId::new(destination_id, source_id),
            _ => EdgeId::new(source_id, destination_id),
        };

        let is_error = event.has_error();
        if let Some(edge) = self.edges.get_mut(&id) {
            edge.occurrences += 1;
            if is_error {
                edge.error_occurrences += 1;
            }
            edge.last_observed_at = edge.last_observed_at.max(now);
        } else {
            for endpoint in [&id.from, &id.to] {
                if let Some(node) = self.nodes.get_mut(endpoint) {
                    node.degree += 1;
                }
            }
            self.edges.insert(
                id.clone(),
                Edge {
                    id,
                    occurrences: 1,
                    error_occurrences: u64::from(is_error),
                    last_observed_at: now,
                    event_type: event.event_type.clone(),
                    namespace: event.source_namespace.clone(),
                },
            );
        }

        Ok(Outcome::Applied)
    }

    fn ensure_node(&mut self, id: &str, kind: NodeKind) -> Result<(), GraphError> {
        if self.nodes.contains_key(id) {
            return Ok(());
        }
        let position = self.initial_position()?;
        self.nodes.insert(
            id.to_string(),
            Node {
                id: id.to_string(),
                kind,
                label: String::new(),
                members: BTreeSet::new(),
                position,
                degree: 0,
                namespace: None,
            },
        );
        Ok(())
    }

    /// Circular placement for the next node to be created
    fn initial_position(&self) -> Result<Point, GraphError> {
        let surface = self.surface.ok_or(GraphError::SurfaceNotReady)?;
        Ok(layout_position(self.nodes.len(), surface))
    }

    /// Remove every edge not observed within EDGE_STALE_AFTER_MS of `now`
    ///
    /// Full scan over existing edges. Returns how many were removed.
    pub fn evict_stale(&mut self, now: u64) -> usize {
        let mut released = Vec::new();
        self.edges.retain(|id, edge| {
            if edge.is_stale(now) {
                released.push(id.clone());
                false
            } else {
                true
            }
        });

        for id in &released {
            for endpoint in [&id.from, &id.to] {
                if let Some(node) = self.nodes.get_mut(endpoint) {
                    node.degree = node.degree.saturating_sub(1);
                }
            }
        }

        released.len()
    }

    /// First visible node (in insertion order) whose radius contains
    /// `canvas_point`
    pub fn node_at(&self, canvas_point: Point) -> Option<&Node> {
        self.visible_nodes().find(|node| node.contains(canvas_point))
    }

    /// Move a node; returns false if it does not exist
    pub fn set_node_position(&mut self, id: &str, position: Point) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn is_edge_visible(&self, edge: &Edge) -> bool {
        self.view_filter.is_empty() || self.view_filter.contains(&edge.namespace)
    }

    /// A node shows when its own namespace is selected or a visible edge
    /// touches it
    pub fn is_node_visible(&self, node: &Node) -> bool {
        if self.view_filter.is_empty() {
            return true;
        }
        if node
            .namespace
            .as_ref()
            .is_some_and(|ns| self.view_filter.contains(ns))
        {
            return true;
        }
        self.edges_touching(&node.id)
            .any(|edge| self.is_edge_visible(edge))
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes().filter(|node| self.is_node_visible(node))
    }

    pub fn visible_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges().filter(|edge| self.is_edge_visible(edge))
    }

    /// Edges with `id` as either endpoint
    pub fn edges_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .values()
            .filter(move |edge| edge.id.from == id || edge.id.to == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Source namespaces seen since the last reset, sorted
    pub fn observed_namespaces(&self) -> &BTreeSet<String> {
        &self.observed_namespaces
    }

    /// Counters over what the view filter lets through
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.visible_nodes().count(),
            edges: self.visible_edges().count(),
            flows: self.visible_edges().map(|e| e.occurrences).sum(),
            errors: self.visible_edges().map(|e| e.error_occurrences).sum(),
        }
    }
}

/// Position of the node created when `existing` nodes are already placed
pub fn layout_position(existing: usize, surface: Surface) -> Point {
    let slot = (existing % LAYOUT_SLOTS) as f64;
    let angle = slot / LAYOUT_SLOTS as f64 * 2.0 * PI;
    let radius = surface.width.min(surface.height) * LAYOUT_RADIUS_RATIO;
    let center = surface.center();
    Point::new(
        center.x + angle.cos() * radius,
        center.y + angle.sin() * radius,
    )
}
