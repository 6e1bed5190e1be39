use crate::shared::bounding_box::Point;

use super::identity::IdentityId;
use super::tracking_store::TrackingStore;

/// Nearest-centroid association of a detection to a tracked identity.
pub struct FaceMatcher {
    distance_threshold: f64,
    max_stale_frames: usize,
}

impl FaceMatcher {
    pub fn new(distance_threshold: f64, max_stale_frames: usize) -> Self {
        Self {
            distance_threshold,
            max_stale_frames,
        }
    }

    /// Closest live identity strictly within the distance threshold.
    ///
    /// Stale identities are skipped but left in the store. Equal distances
    /// keep the earliest-created identity.
    pub fn match_identity(
        &self,
        center: Point,
        store: &TrackingStore,
        current_frame: usize,
    ) -> Option<IdentityId> {
        let mut best: Option<(IdentityId, f64)> = None;
        for identity in store.iter() {
            if identity.is_stale(current_frame, self.max_stale_frames) {
                continue;
            }
            let distance = center.distance(&identity.center());
            if distance >= self.distance_threshold {
                continue;
            }
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((identity.id(), distance));
            }
        }
        best.map(|(id, _)| id)
    }
}
