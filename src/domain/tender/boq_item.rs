//! BOQ line items and the links between them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{BoqItemId, LinkId, PositionId, Timestamp};

/// A priced line item owned by a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoqItem {
    pub id: BoqItemId,
    pub position_id: PositionId,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub cost_category: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Item this one was copied from, if any.
    #[serde(default)]
    pub copied_from: Option<BoqItemId>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl BoqItem {
    pub fn new(position_id: PositionId, name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        let now = Timestamp::now();
        Self {
            id: BoqItemId::new(),
            position_id,
            name: name.into(),
            unit: None,
            quantity,
            unit_price,
            cost_category: None,
            note: None,
            copied_from: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copies every business field onto a fresh item owned by `position_id`.
    ///
    /// Identity and timestamps are not carried over; the copy remembers
    /// where it came from.
    pub fn duplicate_for(&self, position_id: PositionId) -> Self {
        let now = Timestamp::now();
        Self {
            id: BoqItemId::new(),
            position_id,
            name: self.name.clone(),
            unit: self.unit.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            cost_category: self.cost_category.clone(),
            note: self.note.clone(),
            copied_from: Some(self.id),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// A link between two BOQ items of a position (e.g. work and its material).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLink {
    pub id: LinkId,
    pub position_id: PositionId,
    pub source_item_id: BoqItemId,
    pub target_item_id: BoqItemId,
    #[serde(default = "default_coefficient")]
    pub coefficient: f64,
    /// Link this one was copied from, if any.
    #[serde(default)]
    pub copied_from: Option<LinkId>,
    #[serde(default)]
    pub created_at: Timestamp,
}

fn default_coefficient() -> f64 {
    1.0
}

impl ItemLink {
    pub fn new(position_id: PositionId, source: BoqItemId, target: BoqItemId, coefficient: f64) -> Self {
        Self {
            id: LinkId::new(),
            position_id,
            source_item_id: source,
            target_item_id: target,
            coefficient,
            copied_from: None,
            created_at: Timestamp::now(),
        }
    }
}

/// Old-item-id to new-item-id table built while copying one position.
#[derive(Debug, Clone, PartialEq)]
pub struct IdTranslation {
    new_position_id: PositionId,
    items: HashMap<BoqItemId, BoqItemId>,
}

impl IdTranslation {
    pub fn new(new_position_id: PositionId) -> Self {
        Self {
            new_position_id,
            items: HashMap::new(),
        }
    }

    /// Seeds the table from items an earlier, interrupted run already
    /// copied into the new position.
    pub fn resume(new_position_id: PositionId, existing: &[BoqItem]) -> Self {
        let mut table = Self::new(new_position_id);
        for item in existing {
            if let Some(source) = item.copied_from {
                table.record(source, item.id);
            }
        }
        table
    }

    pub fn new_position_id(&self) -> PositionId {
        self.new_position_id
    }

    pub fn record(&mut self, old: BoqItemId, new: BoqItemId) {
        self.items.insert(old, new);
    }

    pub fn get(&self, old: &BoqItemId) -> Option<BoqItemId> {
        self.items.get(old).copied()
    }

    pub fn contains(&self, old: &BoqItemId) -> bool {
        self.items.contains_key(old)
    }

    /// Re-targets a link onto the new position.
    ///
    /// Returns `None` unless both endpoints were copied; a half-translated
    /// link is never produced.
    pub fn translate_link(&self, link: &ItemLink) -> Option<ItemLink> {
        let source = self.get(&link.source_item_id)?;
        let target = self.get(&link.target_item_id)?;
        Some(ItemLink {
            id: LinkId::new(),
            position_id: self.new_position_id,
            source_item_id: source,
            target_item_id: target,
            coefficient: link.coefficient,
            copied_from: Some(link.id),
            created_at: Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keeps_fields_but_not_identity() {
        let old_position = PositionId::new();
        let new_position = PositionId::new();
        let mut item = BoqItem::new(old_position, "Бетон B25", 12.5, 4200.0);
        item.unit = Some("м3".to_string());
        item.cost_category = Some("materials".to_string());
        item.note = Some("с доставкой".to_string());

        let copy = item.duplicate_for(new_position);

        assert_ne!(copy.id, item.id);
        assert_eq!(copy.position_id, new_position);
        assert_eq!(copy.name, item.name);
        assert_eq!(copy.unit, item.unit);
        assert_eq!(copy.quantity, item.quantity);
        assert_eq!(copy.unit_price, item.unit_price);
        assert_eq!(copy.cost_category, item.cost_category);
        assert_eq!(copy.note, item.note);
        assert_eq!(copy.copied_from, Some(item.id));
        assert_eq!(item.copied_from, None);
    }

    #[test]
    fn translate_link_maps_both_endpoints() {
        let old_position = PositionId::new();
        let new_position = PositionId::new();
        let (a, b) = (BoqItemId::new(), BoqItemId::new());
        let (a2, b2) = (BoqItemId::new(), BoqItemId::new());
        let mut table = IdTranslation::new(new_position);
        table.record(a, a2);
        table.record(b, b2);

        let link = ItemLink::new(old_position, a, b, 1.05);
        let copied = table.translate_link(&link).unwrap();

        assert_eq!(copied.position_id, new_position);
        assert_eq!(copied.source_item_id, a2);
        assert_eq!(copied.target_item_id, b2);
        assert_eq!(copied.coefficient, 1.05);
        assert_ne!(copied.id, link.id);
        assert_eq!(copied.copied_from, Some(link.id));
    }

    #[test]
    fn resume_picks_up_earlier_copies_only() {
        let old_position = PositionId::new();
        let new_position = PositionId::new();
        let concrete = BoqItem::new(old_position, "Бетон B25", 10.0, 5400.0);
        let rebar = BoqItem::new(old_position, "Арматура A500", 1.2, 72000.0);
        let copied = concrete.duplicate_for(new_position);
        let typed_in = BoqItem::new(new_position, "Опалубка", 40.0, 350.0);

        let table = IdTranslation::resume(new_position, &[copied.clone(), typed_in]);

        assert!(table.contains(&concrete.id));
        assert_eq!(table.get(&concrete.id), Some(copied.id));
        assert!(!table.contains(&rebar.id));
        assert_eq!(table.new_position_id(), new_position);
    }

    #[test]
    fn translate_link_drops_link_with_missing_endpoint() {
        let (a, b) = (BoqItemId::new(), BoqItemId::new());
        let mut table = IdTranslation::new(PositionId::new());
        table.record(a, BoqItemId::new());

        let link = ItemLink::new(PositionId::new(), a, b, 1.0);
        assert!(table.translate_link(&link).is_none());
    }
}
