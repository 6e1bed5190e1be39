use std::collections::BTreeMap;

use crate::shared::bounding_box::Point;

use super::identity::{Identity, IdentityId};

/// Owns every identity tracked in a session.
///
/// Created when a session starts, borrowed by each processing call and
/// emptied by [`TrackingStore::clear`] on reset. Iteration follows creation
/// order, which keeps nearest-match tie-breaks deterministic.
#[derive(Debug)]
pub struct TrackingStore {
    identities: BTreeMap<IdentityId, Identity>,
    next_id: u64,
    window: usize,
    confidence_threshold: usize,
}

impl TrackingStore {
    pub fn new(window: usize, confidence_threshold: usize) -> Self {
        Self {
            identities: BTreeMap::new(),
            next_id: 1,
            window,
            confidence_threshold,
        }
    }

    /// Starts tracking a new face seen at `center` on `frame`.
    pub fn create(&mut self, center: Point, frame: usize) -> IdentityId {
        let id = IdentityId::new(self.next_id);
        self.next_id += 1;
        self.identities.insert(
            id,
            Identity::new(id, center, frame, self.window, self.confidence_threshold),
        );
        id
    }

    pub fn get(&self, id: IdentityId) -> Option<&Identity> {
        self.identities.get(&id)
    }

    pub fn get_mut(&mut self, id: IdentityId) -> Option<&mut Identity> {
        self.identities.get_mut(&id)
    }

    /// Identities in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Identity> + '_ {
        self.identities.values()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Ids of identities that are not stale at `current_frame`.
    pub fn active_ids(&self, current_frame: usize, max_stale_frames: usize) -> Vec<IdentityId> {
        self.iter()
            .filter(|i| !i.is_stale(current_frame, max_stale_frames))
            .map(Identity::id)
            .collect()
    }

    /// Removes stale identities and returns their ids.
    pub fn prune_stale(&mut self, current_frame: usize, max_stale_frames: usize) -> Vec<IdentityId> {
        let stale: Vec<IdentityId> = self
            .iter()
            .filter(|i| i.is_stale(current_frame, max_stale_frames))
            .map(Identity::id)
            .collect();
        for id in &stale {
            self.identities.remove(id);
        }
        stale
    }

    /// Drops every identity and restarts id numbering.
    pub fn clear(&mut self) {
        self.identities.clear();
        self.next_id = 1;
    }
}
