//! JSON tender fixtures for seeding the in-memory store.
//!
//! ```json
//! {
//!   "old": { "positions": [
//!     { "number": "1", "name": "Фундамент", "volume": 10,
//!       "items": [{ "name": "Бетон", "quantity": 10, "unit_price": 5400 },
//!                 { "name": "Арматура", "quantity": 1.2, "unit_price": 72000 }],
//!       "links": [{ "source": 0, "target": 1, "coefficient": 0.12 }] }
//!   ] },
//!   "new": { "positions": [ { "number": "1", "name": "Фундамент", "volume": 12 } ] }
//! }
//! ```
//!
//! Link endpoints are indexes into the owning position's `items` list.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::InMemoryStore;
use crate::domain::foundation::{PositionId, TenderId};
use crate::domain::tender::{BoqItem, ItemLink, Position, PositionDraft};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Position '{position}' links item #{index}, but has only {items} items")]
    BadLink {
        position: String,
        index: usize,
        items: usize,
    },
}

/// An old and a new version of one tender.
#[derive(Debug, Clone, Deserialize)]
pub struct TenderFixture {
    pub old: VersionFixture,
    pub new: VersionFixture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionFixture {
    /// Fixed id; a random one is generated when absent.
    #[serde(default)]
    pub tender_id: Option<TenderId>,
    pub positions: Vec<PositionFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionFixture {
    #[serde(flatten)]
    pub draft: PositionDraft,
    #[serde(default)]
    pub items: Vec<ItemFixture>,
    #[serde(default)]
    pub links: Vec<LinkFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemFixture {
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
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkFixture {
    pub source: usize,
    pub target: usize,
    #[serde(default = "default_coefficient")]
    pub coefficient: f64,
}

fn default_coefficient() -> f64 {
    1.0
}

/// Tender ids assigned while seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededTenders {
    pub old: TenderId,
    pub new: TenderId,
}

impl TenderFixture {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Writes both versions into `store`.
    pub async fn seed(&self, store: &InMemoryStore) -> Result<SeededTenders, FixtureError> {
        let old = self.old.seed(store).await?;
        let new = self.new.seed(store).await?;
        Ok(SeededTenders { old, new })
    }
}

impl VersionFixture {
    async fn seed(&self, store: &InMemoryStore) -> Result<TenderId, FixtureError> {
        let tender_id = self.tender_id.unwrap_or_default();
        for fixture in &self.positions {
            let position = Position::from_draft(PositionId::new(), tender_id, fixture.draft.clone());
            let items = fixture.build_items(position.id);
            let links = fixture.build_links(position.id, &items)?;

            store.positions.insert(position).await;
            for item in items {
                store.items.insert(item).await;
            }
            for link in links {
                store.links.insert(link).await;
            }
        }
        Ok(tender_id)
    }
}

impl PositionFixture {
    fn build_items(&self, position_id: PositionId) -> Vec<BoqItem> {
        self.items
            .iter()
            .map(|f| {
                let mut item = BoqItem::new(position_id, f.name.clone(), f.quantity, f.unit_price);
                item.unit = f.unit.clone();
                item.cost_category = f.cost_category.clone();
                item.note = f.note.clone();
                item
            })
            .collect()
    }

    fn build_links(&self, position_id: PositionId, items: &[BoqItem]) -> Result<Vec<ItemLink>, FixtureError> {
        let item_at = |index: usize| {
            items.get(index).map(|i| i.id).ok_or_else(|| FixtureError::BadLink {
                position: self.draft.name.clone(),
                index,
                items: items.len(),
            })
        };
        self.links
            .iter()
            .map(|l| {
                Ok(ItemLink::new(
                    position_id,
                    item_at(l.source)?,
                    item_at(l.target)?,
                    l.coefficient,
                ))
            })
            .collect()
    }
}
