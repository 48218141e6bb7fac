use std::collections::HashMap;

use crate::error::RankingError;

/// An eligible student: current, and assigned to a house.
///
/// Filtering on eligibility happens upstream. Everything that reaches the
/// engine is ranked.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    /// Opaque unique ID (a UUID in the hosted database).
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Selects which of the two independently ranked groups the student is in.
    pub is_male: bool,
    /// House the student belongs to. Display only, never used for ranking.
    pub house_id: i64,
}

impl Participant {
    /// `"<first_name> <last_name>"`, the string used for alphabetical tie-breaks.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn partition(&self) -> Partition {
        Partition::from_is_male(self.is_male)
    }
}

/// One student's attendance at one logged event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventParticipation {
    /// Student this record credits. May reference a student that is not eligible.
    pub student_id: String,
    /// Points of the event type. `None` when the event type link is missing.
    pub base_points: Option<f64>,
    /// Free-form JSON attached to the event log. A numeric `customPoints`
    /// field in it replaces `base_points` for this record.
    pub event_details: Option<String>,
}

/// A participant with their total and their rank inside their partition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedEntry {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub total_points: f64,
    /// 1-based competition rank (1, 2, 2, 4), computed per partition.
    pub rank: usize,
    pub is_male: bool,
    pub house_id: i64,
}

impl RankedEntry {
    pub fn partition(&self) -> Partition {
        Partition::from_is_male(self.is_male)
    }
}

/// The two disjoint groups that are ranked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Partition {
    Male,
    Female,
}

impl Partition {
    /// Output order of the combined leaderboard.
    pub const ORDER: [Partition; 2] = [Partition::Male, Partition::Female];

    pub fn from_is_male(is_male: bool) -> Self {
        if is_male { Partition::Male } else { Partition::Female }
    }

    pub fn is_male(self) -> bool {
        matches!(self, Partition::Male)
    }
}

/// Participant with an accumulated total, before sorting and ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredParticipant {
    pub participant: Participant,
    pub total_points: f64,
}

/// Maps caller-provided string IDs to internal 0..N indices.
///
/// Built once per invocation so point accumulation is a plain `Vec<f64>`
/// seeded with a zero for every eligible participant.
#[derive(Debug)]
pub(crate) struct ParticipantIndex {
    id_to_idx: HashMap<String, usize>,
}

impl ParticipantIndex {
    pub fn from_participants(participants: &[Participant]) -> Result<Self, RankingError> {
        let mut id_to_idx = HashMap::with_capacity(participants.len());
        for (idx, p) in participants.iter().enumerate() {
            if id_to_idx.insert(p.id.clone(), idx).is_some() {
                return Err(RankingError::DuplicateParticipant(p.id.clone()));
            }
        }
        Ok(ParticipantIndex { id_to_idx })
    }

    pub fn len(&self) -> usize {
        self.id_to_idx.len()
    }

    /// `None` for orphan references.
    pub fn to_idx(&self, id: &str) -> Option<usize> {
        self.id_to_idx.get(id).copied()
    }
}
