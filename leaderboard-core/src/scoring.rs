/// Point aggregation.
///
/// Pure function: every eligible participant starts at zero, every
/// participation record adds its resolved points to its student.
use tracing::debug;

use crate::error::RankingError;
use crate::overrides::resolve;
use crate::types::{EventParticipation, Participant, ParticipantIndex, ScoredParticipant};

/// Totals for one run, plus counts of the records that were degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct PointTotals {
    /// One entry per participant, in the same order as the input.
    pub scored: Vec<ScoredParticipant>,
    /// Records whose override payload was unusable (base points were used).
    pub malformed_overrides: usize,
    /// Records that credit a student outside the eligible set.
    pub orphaned_records: usize,
}

/// Sum resolved points per participant.
///
/// `participations` is `None` when the upstream fetch failed; every total is
/// then zero.
pub(crate) fn aggregate_indexed(
    index: &ParticipantIndex,
    participants: &[Participant],
    participations: Option<&[EventParticipation]>,
) -> PointTotals {
    let mut totals = vec![0.0_f64; index.len()];
    let mut malformed_overrides = 0;
    let mut orphaned_records = 0;

    for record in participations.unwrap_or_default() {
        let Some(idx) = index.to_idx(&record.student_id) else {
            orphaned_records += 1;
            continue;
        };

        let resolved = resolve(record);
        if resolved.malformed_override {
            malformed_overrides += 1;
        }
        totals[idx] += resolved.points;
    }

    if orphaned_records > 0 {
        debug!("Skipped {orphaned_records} participation records for ineligible students");
    }

    let scored = participants
        .iter()
        .zip(totals)
        .map(|(p, total_points)| ScoredParticipant { participant: p.clone(), total_points })
        .collect();

    PointTotals { scored, malformed_overrides, orphaned_records }
}

/// Sum resolved points per participant.
///
/// Errors only on duplicate participant IDs. An empty participant list yields
/// empty totals here; the "no data" decision belongs to the engine.
pub fn aggregate_points(
    participants: &[Participant],
    participations: Option<&[EventParticipation]>,
) -> Result<PointTotals, RankingError> {
    let index = ParticipantIndex::from_participants(participants)?;
    Ok(aggregate_indexed(&index, participants, participations))
}
