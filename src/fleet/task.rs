//! Pending tasks and resource claims.

use crate::core::{Point3, PosKey, RobotId, SlotId};
use crate::world::store::ParcelRecord;
use std::collections::HashMap;

/// A unit of pending work for one robot.
#[derive(Debug, Clone)]
pub enum Task {
    /// Pick up a parcel from an inbound position and shelve it.
    Store { parcel: ParcelRecord },

    /// Pull the parcel in a slot and carry it to a conveyor drop point.
    Ship {
        slot: SlotId,
        slot_position: Point3,
        drop: Point3,
    },
}

impl Task {
    /// Point used for nearest-robot assignment distance.
    pub fn reference_point(&self) -> Point3 {
        match self {
            Task::Store { parcel } => parcel.position,
            Task::Ship { slot_position, .. } => *slot_position,
        }
    }
}

/// Claim maps: the single source of truth for "is this resource already
/// assigned". A parcel is keyed by its quantized pickup position, a slot
/// by its id. Both claims for a robot clear together on task completion.
#[derive(Debug, Default)]
pub struct AssignmentMaps {
    parcels: HashMap<PosKey, RobotId>,
    slots: HashMap<SlotId, RobotId>,
}

impl AssignmentMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_parcel_claimed(&self, position: Point3) -> bool {
        self.parcels.contains_key(&PosKey::from(position))
    }

    pub fn is_slot_claimed(&self, slot: SlotId) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Claim a parcel pickup position. Returns false if already claimed.
    pub fn claim_parcel(&mut self, position: Point3, robot: RobotId) -> bool {
        let key = PosKey::from(position);
        if self.parcels.contains_key(&key) {
            return false;
        }
        self.parcels.insert(key, robot);
        true
    }

    /// Claim a shelf slot. Returns false if already claimed.
    pub fn claim_slot(&mut self, slot: SlotId, robot: RobotId) -> bool {
        if self.slots.contains_key(&slot) {
            return false;
        }
        self.slots.insert(slot, robot);
        true
    }

    /// Undo a single parcel claim (assignment rollback).
    pub fn release_parcel(&mut self, position: Point3) {
        self.parcels.remove(&PosKey::from(position));
    }

    /// Undo a single slot claim (assignment rollback).
    pub fn release_slot(&mut self, slot: SlotId) {
        self.slots.remove(&slot);
    }

    /// Drop every claim held by a robot.
    pub fn release_robot(&mut self, robot: RobotId) {
        self.parcels.retain(|_, r| *r != robot);
        self.slots.retain(|_, r| *r != robot);
    }

    pub fn claim_count(&self) -> usize {
        self.parcels.len() + self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_claim_is_rejected() {
        let mut maps = AssignmentMaps::new();
        let position = Point3::new(3.0, 0.0, 1.0);

        assert!(maps.claim_parcel(position, 0));
        assert!(!maps.claim_parcel(position, 1));
        assert!(maps.is_parcel_claimed(position));

        assert!(maps.claim_slot(7, 0));
        assert!(!maps.claim_slot(7, 1));
    }

    #[test]
    fn test_release_clears_both_maps() {
        let mut maps = AssignmentMaps::new();
        maps.claim_parcel(Point3::new(1.0, 0.0, 1.0), 0);
        maps.claim_slot(3, 0);
        maps.claim_slot(4, 1);

        maps.release_robot(0);

        assert!(!maps.is_parcel_claimed(Point3::new(1.0, 0.0, 1.0)));
        assert!(!maps.is_slot_claimed(3));
        assert!(maps.is_slot_claimed(4));
        assert_eq!(maps.claim_count(), 1);
    }

    #[test]
    fn test_nearby_positions_are_distinct_claims() {
        let mut maps = AssignmentMaps::new();
        assert!(maps.claim_parcel(Point3::new(1.0, 0.0, 1.0), 0));
        assert!(maps.claim_parcel(Point3::new(1.01, 0.0, 1.0), 1));
        assert_eq!(maps.claim_count(), 2);
    }
}
