// Flow particle animation
//
// Side table of per-edge particle progress, kept apart from the graph so the
// model never sees frame-rate concerns. Only the render tick mutates it.

use crate::graph::{EdgeId, GraphModel};
use std::collections::HashMap;

/// Particles travelling along each edge
pub const PARTICLES_PER_EDGE: usize = 3;

/// Progress added per tick; an edge is traversed in 200 ticks
pub const PARTICLE_SPEED: f64 = 0.005;

#[derive(Debug, Clone, Default)]
pub struct FlowAnimation {
    progress: HashMap<EdgeId, [f64; PARTICLES_PER_EDGE]>,
}

impl FlowAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync with the live edge set, then advance every particle unless paused
    ///
    /// New edges start with evenly spaced particles; entries for evicted
    /// edges are dropped.
    pub fn tick(&mut self, graph: &GraphModel, paused: bool) {
        self.progress.retain(|id, _| graph.edge(id).is_some());

        for edge in graph.edges() {
            self.progress
                .entry(edge.id.clone())
                .or_insert_with(initial_progress);
        }

        if paused {
            return;
        }

        for particles in self.progress.values_mut() {
            for p in particles.iter_mut() {
                *p += PARTICLE_SPEED;
                if *p > 1.0 {
                    *p = 0.0;
                }
            }
        }
    }

    /// Particle positions along `id` as fractions in [0, 1]
    pub fn particles(&self, id: &EdgeId) -> &[f64] {
        match self.progress.get(id) {
            Some(particles) => particles.as_slice(),
            None => &[],
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.progress.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }

    pub fn clear(&mut self) {
        self.progress.clear();
    }
}

fn initial_progress() -> [f64; PARTICLES_PER_EDGE] {
    let mut progress = [0.0; PARTICLES_PER_EDGE];
    for (i, p) in progress.iter_mut().enumerate() {
        *p = i as f64 / PARTICLES_PER_EDGE as f64;
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Destination, EventType, FlowEvent};
    use crate::graph::{NamespaceFilter, EDGE_STALE_AFTER_MS};
    use proptest::prelude::*;

    fn graph_with_edge(now: u64) -> (GraphModel, EdgeId) {
        let mut graph = GraphModel::new();
        graph.resize(100.0, 100.0);
        let event = FlowEvent {
            event_type: EventType::Connect,
            source_pod: "a-1".to_string(),
            source_namespace: "ns".to_string(),
            source_address: "10.0.0.1".to_string(),
            source_port: 4000,
            source_owner: None,
            destination: Destination {
                address: "8.8.8.8".to_string(),
                port: 53,
                reference: None,
            },
            error_code: 0,
        };
        graph.ingest(&[event], now, &NamespaceFilter::new());
        (graph, EdgeId::new("pod:ns/a-1", "dst:8.8.8.8:53"))
    }

    #[test]
    fn test_new_edges_get_spaced_particles() {
        let (graph, id) = graph_with_edge(0);
        let mut animation = FlowAnimation::new();
        animation.tick(&graph, true);

        let particles = animation.particles(&id);
        assert_eq!(particles.len(), PARTICLES_PER_EDGE);
        assert_eq!(particles[0], 0.0);
        assert!((particles[1] - 1.0 / 3.0).abs() < 1e-12);
        assert!((particles[2] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_paused_freezes_progress() {
        let (graph, id) = graph_with_edge(0);
        let mut animation = FlowAnimation::new();
        animation.tick(&graph, false);
        let before = animation.particles(&id).to_vec();

        for _ in 0..10 {
            animation.tick(&graph, true);
        }
        assert_eq!(animation.particles(&id), before.as_slice());

        animation.tick(&graph, false);
        assert!((animation.particles(&id)[0] - before[0] - PARTICLE_SPEED).abs() < 1e-12);
    }

    #[test]
    fn test_particles_wrap() {
        let (graph, id) = graph_with_edge(0);
        let mut animation = FlowAnimation::new();
        for _ in 0..400 {
            animation.tick(&graph, false);
        }
        assert!(animation.particles(&id).iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_evicted_edges_are_pruned() {
        let (mut graph, id) = graph_with_edge(0);
        let mut animation = FlowAnimation::new();
        animation.tick(&graph, false);
        assert_eq!(animation.len(), 1);

        graph.evict_stale(EDGE_STALE_AFTER_MS + 1);
        animation.tick(&graph, false);
        assert!(animation.is_empty());
        assert!(animation.particles(&id).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Progress stays in [0, 1] for any tick/pause sequence
        #[test]
        fn prop_progress_bounded(pauses in proptest::collection::vec(any::<bool>(), 0..600)) {
            let (graph, id) = graph_with_edge(0);
            let mut animation = FlowAnimation::new();
            for paused in pauses {
                animation.tick(&graph, paused);
                for p in animation.particles(&id) {
                    prop_assert!((0.0..=1.0).contains(p));
                }
            }
        }
    }
}
