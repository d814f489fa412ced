// THEORY:
// The `tracker` module adds object permanence on top of the per-frame blobs. It
// owns every live `Centroid` and, once per frame, solves the data association
// problem: which blob belongs to which tracked object.
//
// Key architectural principles:
// 1.  **Arena Ownership**: Centroids live in a `BTreeMap` keyed by `CentroidId`.
//     Ids are handed out from a monotonically increasing counter, so iteration
//     order is creation order and every run over the same input is identical.
// 2.  **Greedy, Non-Exclusive Association**: Blobs are visited in extraction
//     order and tested against every tracked centroid. All centroids in range are
//     updated, so one blob can feed several centroids and one centroid can absorb
//     several blobs (the last one wins). A blob in range of nothing spawns a new
//     centroid, which later blobs of the same frame may then match.
//     `AssociationPolicy::Exclusive` is the stricter alternative: each blob goes to
//     its nearest unclaimed centroid only.
// 3.  **Lifecycle Management**:
//     - **Birth**: an unmatched blob spawns a centroid.
//     - **Tracking**: a matched centroid is updated and flagged for this frame.
//     - **Miss**: every unflagged centroid records a miss.
//     - **Death**: a centroid whose trailing inactivity window is all misses is
//       removed for good.

use crate::config::{AssociationPolicy, DetectorConfig};
use crate::core_modules::blob::Blob;
use crate::core_modules::centroid::{Centroid, CentroidId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// The outcome of associating one frame's blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Association {
    /// Pre-existing or same-frame centroids updated by at least one blob.
    pub matched: BTreeSet<CentroidId>,
    /// Centroids created this frame.
    pub spawned: Vec<CentroidId>,
    /// Centroids removed this frame.
    pub dropped: Vec<CentroidId>,
}

/// Manages the set of tracked centroids from one frame to the next.
#[derive(Debug, Clone)]
pub struct CentroidTracker {
    centroids: BTreeMap<CentroidId, Centroid>,
    next_id: u64,
    capture_radius: f64,
    max_inactivity: usize,
    min_activation_count: usize,
    policy: AssociationPolicy,
}

impl CentroidTracker {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            centroids: BTreeMap::new(),
            next_id: 0,
            capture_radius: config.capture_radius,
            max_inactivity: config.max_inactivity,
            min_activation_count: config.min_activation_count,
            policy: config.association,
        }
    }

    /// Associates this frame's blobs with the tracked centroids and advances every
    /// centroid's lifecycle by one frame.
    pub fn update(&mut self, blobs: &[Blob]) -> Association {
        let mut association = Association::default();

        for blob in blobs {
            // --- 1. Matching ---
            let found = match self.policy {
                AssociationPolicy::Greedy => self.match_greedy(blob, &mut association),
                AssociationPolicy::Exclusive => self.match_exclusive(blob, &mut association),
            };

            // --- 2. Birth ---
            if !found {
                let id = self.spawn(blob);
                association.spawned.push(id);
            }
        }

        // --- 3. Miss & Death ---
        let max_inactivity = self.max_inactivity;
        for (id, centroid) in self.centroids.iter_mut() {
            if association.matched.contains(id) || association.spawned.contains(id) {
                continue;
            }
            centroid.mark_missed();
            if centroid.is_stale(max_inactivity) {
                association.dropped.push(*id);
            }
        }
        for id in &association.dropped {
            self.centroids.remove(id);
            debug!(centroid = %id, "centroid expired");
        }

        association
    }

    fn match_greedy(&mut self, blob: &Blob, association: &mut Association) -> bool {
        let mut found = false;
        for (id, centroid) in self.centroids.iter_mut() {
            if centroid.near(blob.center, self.capture_radius) {
                trace!(centroid = %id, blob = blob.label, "blob matched");
                centroid.update(blob.bounding_box);
                association.matched.insert(*id);
                found = true;
            }
        }
        found
    }

    fn match_exclusive(&mut self, blob: &Blob, association: &mut Association) -> bool {
        let claimed = |id: &CentroidId| association.matched.contains(id) || association.spawned.contains(id);
        let nearest = self
            .centroids
            .iter()
            .filter(|(id, c)| !claimed(*id) && c.near(blob.center, self.capture_radius))
            .map(|(id, c)| (*id, c.center().distance_to(blob.center)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match nearest.and_then(|(id, _)| self.centroids.get_mut(&id)) {
            Some(centroid) => {
                trace!(centroid = %centroid.id(), blob = blob.label, "blob matched");
                centroid.update(blob.bounding_box);
                association.matched.insert(centroid.id());
                true
            }
            None => false,
        }
    }

    fn spawn(&mut self, blob: &Blob) -> CentroidId {
        let id = CentroidId(self.next_id);
        self.next_id += 1;
        debug!(centroid = %id, center = ?blob.center, "centroid spawned");
        self.centroids.insert(id, Centroid::new(id, blob.bounding_box));
        id
    }

    pub fn get(&self, id: CentroidId) -> Option<&Centroid> {
        self.centroids.get(&id)
    }

    /// Every tracked centroid, confirmed or not, in creation order.
    pub fn tracked(&self) -> impl Iterator<Item = &Centroid> {
        self.centroids.values()
    }

    /// Centroids with enough matches to be rendered.
    pub fn confirmed(&self) -> impl Iterator<Item = &Centroid> {
        let min = self.min_activation_count;
        self.centroids.values().filter(move |c| c.is_confirmed(min))
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}
