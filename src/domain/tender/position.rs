//! Position - a line item of a tender's customer-facing structure.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{PositionId, TenderId, ValidationError};

/// Structural/executable type tag of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    /// Section header grouping other positions.
    Structural,
    /// Position that carries priced work.
    Executable,
}

impl fmt::Display for PositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionKind::Structural => "structural",
            PositionKind::Executable => "executable",
        };
        write!(f, "{}", s)
    }
}

/// A line item of one tender version.
///
/// `number` is either a plain integer ("12") or a dotted hierarchical
/// number ("2.3.1"). Additional ("DOP") positions sit outside the formal
/// numbering and are never matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub tender_id: TenderId,
    #[serde(default)]
    pub number: Option<String>,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub kind: Option<PositionKind>,
    #[serde(default)]
    pub is_additional: bool,
}

impl Position {
    /// Materializes a draft as a position of the given tender.
    pub fn from_draft(id: PositionId, tender_id: TenderId, draft: PositionDraft) -> Self {
        Self {
            id,
            tender_id,
            number: draft.number,
            name: draft.name,
            unit: draft.unit,
            volume: draft.volume,
            note: draft.note,
            kind: draft.kind,
            is_additional: draft.is_additional,
        }
    }

    /// Checks that the position can take part in matching.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the name is blank
    /// - `InvalidFormat` if the volume is negative or not finite
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if let Some(volume) = self.volume {
            if !volume.is_finite() {
                return Err(ValidationError::invalid_format("volume", "must be a finite number"));
            }
            if volume < 0.0 {
                return Err(ValidationError::invalid_format("volume", "must not be negative"));
            }
        }
        Ok(())
    }

    /// Returns the display copy stored inside a mapping.
    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            id: self.id,
            number: self.number.clone(),
            name: self.name.clone(),
            unit: self.unit.clone(),
            volume: self.volume,
            kind: self.kind,
        }
    }
}

/// Payload for creating a position in a tender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionDraft {
    #[serde(default)]
    pub number: Option<String>,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub kind: Option<PositionKind>,
    #[serde(default)]
    pub is_additional: bool,
}

impl PositionDraft {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: Some(number.into()),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_kind(mut self, kind: PositionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn additional(mut self) -> Self {
        self.is_additional = true;
        self
    }
}

/// Display fields of a position, frozen into a mapping at match time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub id: PositionId,
    pub number: Option<String>,
    pub name: String,
    pub unit: Option<String>,
    pub volume: Option<f64>,
    pub kind: Option<PositionKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(name: &str, volume: Option<f64>) -> Position {
        let mut draft = PositionDraft::new("1", name);
        draft.volume = volume;
        Position::from_draft(PositionId::new(), TenderId::new(), draft)
    }

    #[test]
    fn valid_position_passes_validation() {
        assert!(position("Фундамент", Some(10.0)).validate().is_ok());
        assert!(position("Фундамент", None).validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            position("   ", Some(1.0)).validate(),
            Err(ValidationError::empty_field("name"))
        );
    }

    #[test]
    fn negative_or_nan_volume_is_rejected() {
        assert!(position("Стены", Some(-1.0)).validate().is_err());
        assert!(position("Стены", Some(f64::NAN)).validate().is_err());
    }

    #[test]
    fn snapshot_copies_display_fields() {
        let mut p = position("Крыша", Some(5.0));
        p.unit = Some("м2".to_string());
        p.kind = Some(PositionKind::Executable);

        let snap = p.snapshot();

        assert_eq!(snap.id, p.id);
        assert_eq!(snap.number.as_deref(), Some("1"));
        assert_eq!(snap.name, "Крыша");
        assert_eq!(snap.unit.as_deref(), Some("м2"));
        assert_eq!(snap.volume, Some(5.0));
        assert_eq!(snap.kind, Some(PositionKind::Executable));
    }

    #[test]
    fn kind_serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&PositionKind::Structural).unwrap(),
            "\"structural\""
        );
    }
}
