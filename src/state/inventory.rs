use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ItemId;

pub const DEFAULT_CAPACITY: usize = 20;

/// Slot-based item container: each distinct item occupies one slot and
/// stacks without limit, so capacity pressure comes from item variety.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: BTreeMap<ItemId, u32>,
    capacity: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: BTreeMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.slots.len())
    }

    pub fn fraction_used(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.slots.len() as f64 / self.capacity as f64
    }

    pub fn is_full(&self) -> bool {
        self.free_slots() == 0
    }

    pub fn count(&self, item: &ItemId) -> u32 {
        self.slots.get(item).copied().unwrap_or(0)
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.slots.contains_key(item)
    }

    pub fn add(&mut self, item: &ItemId, qty: u32) -> Result<(), InventoryError> {
        if qty == 0 {
            return Ok(());
        }
        if !self.slots.contains_key(item) && self.is_full() {
            return Err(InventoryError::Full {
                item: item.clone(),
            });
        }
        let count = self.slots.entry(item.clone()).or_insert(0);
        *count = count.saturating_add(qty);
        Ok(())
    }

    pub fn remove(&mut self, item: &ItemId, qty: u32) -> Result<(), InventoryError> {
        let available = self.count(item);
        if available < qty {
            return Err(InventoryError::Insufficient {
                item: item.clone(),
                available,
                requested: qty,
            });
        }
        if available == qty {
            self.slots.remove(item);
        } else if let Some(count) = self.slots.get_mut(item) {
            *count -= qty;
        }
        Ok(())
    }

    /// Drop the whole stack, returning how many were held.
    pub fn remove_all(&mut self, item: &ItemId) -> u32 {
        self.slots.remove(item).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, u32)> + '_ {
        self.slots.iter().map(|(item, count)| (item, *count))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory full, no slot for {item}")]
    Full { item: ItemId },
    #[error("insufficient {item}: have {available}, need {requested}")]
    Insufficient {
        item: ItemId,
        available: u32,
        requested: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stacking_uses_one_slot() {
        let mut inventory = Inventory::new(2);
        inventory.add(&ItemId::new("t:log"), 5).unwrap();
        inventory.add(&ItemId::new("t:log"), 5).unwrap();
        assert_eq!(inventory.used_slots(), 1);
        assert_eq!(inventory.count(&ItemId::new("t:log")), 10);
    }

    #[test]
    fn test_full_rejects_new_item_only() {
        let mut inventory = Inventory::new(1);
        inventory.add(&ItemId::new("t:log"), 1).unwrap();
        assert!(inventory.add(&ItemId::new("t:ore"), 1).is_err());
        // Existing stacks keep growing.
        inventory.add(&ItemId::new("t:log"), 99).unwrap();
    }

    #[test]
    fn test_remove_clears_slot_at_zero() {
        let mut inventory = Inventory::new(2);
        inventory.add(&ItemId::new("t:log"), 3).unwrap();
        inventory.remove(&ItemId::new("t:log"), 3).unwrap();
        assert!(!inventory.contains(&ItemId::new("t:log")));
        assert_eq!(inventory.free_slots(), 2);
    }

    #[test]
    fn test_remove_more_than_held_fails() {
        let mut inventory = Inventory::new(2);
        inventory.add(&ItemId::new("t:log"), 3).unwrap();
        assert!(inventory.remove(&ItemId::new("t:log"), 4).is_err());
        assert_eq!(inventory.count(&ItemId::new("t:log")), 3);
    }
}
