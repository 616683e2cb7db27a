//! Persistent store interface and in-memory simulation backing.
//!
//! The real system keeps parcels, slots, landmarks and robot telemetry in a
//! graph database; the core only sees this narrow query surface. All calls
//! are fallible and callers treat failures as "no result this cycle".

use crate::core::{LandmarkId, ParcelId, Point3, RobotId, SlotId};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Store access failure.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// A parcel awaiting storage (or sitting in a slot).
#[derive(Debug, Clone)]
pub struct ParcelRecord {
    pub id: ParcelId,
    pub position: Point3,
    pub category: String,
    pub product: String,
}

/// A fixed shelf slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub id: SlotId,
    pub position: Point3,
    pub category: String,
    pub occupied: bool,
}

/// Robot state snapshot persisted each poll.
#[derive(Debug, Clone)]
pub struct RobotTelemetry {
    pub position: Point3,
    pub battery: f32,
    pub state: &'static str,
}

/// Identification payload decoded from a parcel tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagInfo {
    pub timestamp: u64,
    pub category: String,
    pub product: String,
}

/// Parse the fixed pipe-delimited tag format
/// `"{timestamp}|{category}|{productName}"`.
pub fn parse_tag(payload: &str) -> Result<TagInfo, StoreError> {
    let mut parts = payload.splitn(3, '|');

    let timestamp = parts
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| StoreError::Malformed(format!("bad tag timestamp in {:?}", payload)))?;

    let category = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StoreError::Malformed(format!("missing tag category in {:?}", payload)))?;

    let product = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StoreError::Malformed(format!("missing tag product in {:?}", payload)))?;

    Ok(TagInfo {
        timestamp,
        category: category.to_string(),
        product: product.to_string(),
    })
}

/// Narrow query interface over the warehouse backing store.
pub trait WarehouseStore {
    /// Parcels waiting to be stored (at inbound positions).
    fn pending_parcels(&self) -> Result<Vec<ParcelRecord>, StoreError>;

    /// Slots whose parcel has been ordered for shipping.
    fn pending_orders(&self) -> Result<Vec<SlotRecord>, StoreError>;

    /// Known position of a landmark.
    fn landmark_position(&self, id: LandmarkId) -> Result<Point3, StoreError>;

    /// First free slot matching a category, if any.
    fn find_free_slot(&self, category: &str) -> Result<Option<SlotRecord>, StoreError>;

    /// Parcel currently sitting in a slot, if any.
    fn parcel_at_slot(&self, slot: SlotId) -> Result<Option<ParcelId>, StoreError>;

    /// Raw tag payload readable at a position (decoded elsewhere).
    fn read_tag(&self, position: Point3) -> Result<String, StoreError>;

    /// Persist a parcel's new location and mark the slot occupied.
    fn store_parcel(&mut self, parcel: ParcelId, slot: SlotId) -> Result<(), StoreError>;

    /// Mark a slot's parcel as shipped and the slot as free.
    fn ship_parcel(&mut self, slot: SlotId) -> Result<(), StoreError>;

    /// Persist a robot state snapshot.
    fn write_telemetry(&mut self, robot: RobotId, telemetry: &RobotTelemetry)
        -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct ParcelEntry {
    record: ParcelRecord,
    stored_in: Option<SlotId>,
    shipped: bool,
}

/// In-memory store used by the simulation and the tests.
///
/// Supports deterministic fault injection: [`MemoryStore::fail_next`] makes
/// the next N calls return [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    parcels: Vec<ParcelEntry>,
    slots: Vec<SlotRecord>,
    landmarks: HashMap<LandmarkId, Point3>,
    orders: Vec<SlotId>,
    telemetry: HashMap<RobotId, RobotTelemetry>,
    fail_budget: u32,
    tag_clock: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parcel(&mut self, id: ParcelId, position: Point3, category: &str, product: &str) {
        self.parcels.push(ParcelEntry {
            record: ParcelRecord {
                id,
                position,
                category: category.to_string(),
                product: product.to_string(),
            },
            stored_in: None,
            shipped: false,
        });
    }

    pub fn add_slot(&mut self, id: SlotId, position: Point3, category: &str) {
        self.slots.push(SlotRecord {
            id,
            position,
            category: category.to_string(),
            occupied: false,
        });
    }

    pub fn add_landmark(&mut self, id: LandmarkId, position: Point3) {
        self.landmarks.insert(id, position);
    }

    /// Queue a shipping order for the parcel in `slot`.
    pub fn add_order(&mut self, slot: SlotId) {
        self.orders.push(slot);
    }

    /// Place a parcel directly into a slot (test/scenario setup).
    pub fn preload_slot(&mut self, parcel: ParcelId, slot: SlotId) {
        if let Some(s) = self.slots.iter_mut().find(|s| s.id == slot) {
            s.occupied = true;
            let position = s.position;
            if let Some(p) = self.parcels.iter_mut().find(|p| p.record.id == parcel) {
                p.stored_in = Some(slot);
                p.record.position = position;
            }
        }
    }

    /// Make the next `n` store calls fail with `Unavailable`.
    pub fn fail_next(&mut self, n: u32) {
        self.fail_budget = n;
    }

    pub fn telemetry(&self, robot: RobotId) -> Option<&RobotTelemetry> {
        self.telemetry.get(&robot)
    }

    /// Count of parcels neither stored nor shipped.
    pub fn unstored_count(&self) -> usize {
        self.parcels
            .iter()
            .filter(|p| p.stored_in.is_none() && !p.shipped)
            .count()
    }

    pub fn open_order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn shipped_count(&self) -> usize {
        self.parcels.iter().filter(|p| p.shipped).count()
    }

    pub fn slot(&self, id: SlotId) -> Option<&SlotRecord> {
        self.slots.iter().find(|s| s.id == id)
    }

    fn check_fault(&mut self) -> Result<(), StoreError> {
        if self.fail_budget > 0 {
            self.fail_budget -= 1;
            return Err(StoreError::Unavailable("injected fault".to_string()));
        }
        Ok(())
    }
}

impl WarehouseStore for MemoryStore {
    fn pending_parcels(&self) -> Result<Vec<ParcelRecord>, StoreError> {
        Ok(self
            .parcels
            .iter()
            .filter(|p| p.stored_in.is_none() && !p.shipped)
            .map(|p| p.record.clone())
            .collect())
    }

    fn pending_orders(&self) -> Result<Vec<SlotRecord>, StoreError> {
        let mut records = Vec::with_capacity(self.orders.len());
        for slot_id in &self.orders {
            match self.slots.iter().find(|s| s.id == *slot_id) {
                Some(slot) => records.push(slot.clone()),
                None => {
                    return Err(StoreError::NotFound(format!("order slot {}", slot_id)));
                }
            }
        }
        Ok(records)
    }

    fn landmark_position(&self, id: LandmarkId) -> Result<Point3, StoreError> {
        self.landmarks
            .get(&id)
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("landmark {}", id)))
    }

    fn find_free_slot(&self, category: &str) -> Result<Option<SlotRecord>, StoreError> {
        Ok(self
            .slots
            .iter()
            .find(|s| !s.occupied && s.category == category)
            .cloned())
    }

    fn parcel_at_slot(&self, slot: SlotId) -> Result<Option<ParcelId>, StoreError> {
        Ok(self
            .parcels
            .iter()
            .find(|p| p.stored_in == Some(slot) && !p.shipped)
            .map(|p| p.record.id))
    }

    fn read_tag(&self, position: Point3) -> Result<String, StoreError> {
        let parcel = self
            .parcels
            .iter()
            .filter(|p| !p.shipped)
            .min_by(|a, b| {
                let da = a.record.position.distance_xz(&position);
                let db = b.record.position.distance_xz(&position);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .filter(|p| p.record.position.distance_xz(&position) < 1.5)
            .ok_or_else(|| StoreError::NotFound("no parcel in tag range".to_string()))?;

        Ok(format!(
            "{}|{}|{}",
            self.tag_clock, parcel.record.category, parcel.record.product
        ))
    }

    fn store_parcel(&mut self, parcel: ParcelId, slot: SlotId) -> Result<(), StoreError> {
        self.check_fault()?;

        let slot_position = {
            let record = self
                .slots
                .iter_mut()
                .find(|s| s.id == slot)
                .ok_or_else(|| StoreError::NotFound(format!("slot {}", slot)))?;
            record.occupied = true;
            record.position
        };

        let entry = self
            .parcels
            .iter_mut()
            .find(|p| p.record.id == parcel)
            .ok_or_else(|| StoreError::NotFound(format!("parcel {}", parcel)))?;
        entry.stored_in = Some(slot);
        entry.record.position = slot_position;

        debug!(parcel, slot, "parcel location persisted");
        Ok(())
    }

    fn ship_parcel(&mut self, slot: SlotId) -> Result<(), StoreError> {
        self.check_fault()?;

        let entry = self
            .parcels
            .iter_mut()
            .find(|p| p.stored_in == Some(slot) && !p.shipped)
            .ok_or_else(|| StoreError::NotFound(format!("no parcel in slot {}", slot)))?;
        entry.shipped = true;
        entry.stored_in = None;

        if let Some(record) = self.slots.iter_mut().find(|s| s.id == slot) {
            record.occupied = false;
        }
        self.orders.retain(|s| *s != slot);

        debug!(slot, "parcel shipped, slot released");
        Ok(())
    }

    fn write_telemetry(
        &mut self,
        robot: RobotId,
        telemetry: &RobotTelemetry,
    ) -> Result<(), StoreError> {
        self.check_fault()?;
        self.telemetry.insert(robot, telemetry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_valid() {
        let info = parse_tag("1724931000|electronics|router").unwrap();
        assert_eq!(info.timestamp, 1724931000);
        assert_eq!(info.category, "electronics");
        assert_eq!(info.product, "router");
    }

    #[test]
    fn test_parse_tag_product_may_contain_pipe() {
        let info = parse_tag("7|food|beans|canned").unwrap();
        assert_eq!(info.product, "beans|canned");
    }

    #[test]
    fn test_parse_tag_malformed() {
        assert!(matches!(parse_tag("x|a|b"), Err(StoreError::Malformed(_))));
        assert!(matches!(parse_tag("12|"), Err(StoreError::Malformed(_))));
        assert!(matches!(parse_tag(""), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_store_parcel_marks_slot_occupied() {
        let mut store = MemoryStore::new();
        store.add_slot(1, Point3::new(2.0, 1.0, 3.0), "food");
        store.add_parcel(10, Point3::ZERO, "food", "rice");

        store.store_parcel(10, 1).unwrap();

        assert!(store.slot(1).unwrap().occupied);
        assert!(store.pending_parcels().unwrap().is_empty());
        assert_eq!(store.find_free_slot("food").unwrap(), None);
        assert_eq!(store.parcel_at_slot(1).unwrap(), Some(10));
    }

    #[test]
    fn test_ship_parcel_frees_slot_and_order() {
        let mut store = MemoryStore::new();
        store.add_slot(1, Point3::new(2.0, 1.0, 3.0), "food");
        store.add_parcel(10, Point3::ZERO, "food", "rice");
        store.preload_slot(10, 1);
        store.add_order(1);

        assert_eq!(store.open_order_count(), 1);
        store.ship_parcel(1).unwrap();

        assert!(!store.slot(1).unwrap().occupied);
        assert_eq!(store.open_order_count(), 0);
        assert_eq!(store.shipped_count(), 1);
    }

    #[test]
    fn test_fault_injection() {
        let mut store = MemoryStore::new();
        store.add_slot(1, Point3::ZERO, "food");
        store.add_parcel(10, Point3::ZERO, "food", "rice");
        store.fail_next(1);

        assert!(matches!(
            store.store_parcel(10, 1),
            Err(StoreError::Unavailable(_))
        ));
        // Next call succeeds
        store.store_parcel(10, 1).unwrap();
    }

    #[test]
    fn test_find_free_slot_first_fit() {
        let mut store = MemoryStore::new();
        store.add_slot(1, Point3::new(1.0, 0.0, 0.0), "food");
        store.add_slot(2, Point3::new(2.0, 0.0, 0.0), "food");

        let slot = store.find_free_slot("food").unwrap().unwrap();
        assert_eq!(slot.id, 1);
        assert_eq!(store.find_free_slot("tools").unwrap(), None);
    }
}
