/// Ranking engine orchestrator.
///
/// Pure computation: no async, no HTTP, no IO. The caller fetches students
/// and participation records, the engine turns them into the leaderboard.
use tracing::warn;

use crate::error::RankingError;
use crate::ranking::rank_partition;
use crate::scoring::{PointTotals, aggregate_indexed};
use crate::types::{EventParticipation, Participant, ParticipantIndex, Partition, RankedEntry};

/// A validated set of eligible participants, ready to be ranked.
pub struct RankingEngine<'a> {
    participants: &'a [Participant],
    index: ParticipantIndex,
}

impl<'a> RankingEngine<'a> {
    /// Fails with `NoData` on an empty set and `DuplicateParticipant` when
    /// two participants share an ID.
    pub fn new(participants: &'a [Participant]) -> Result<Self, RankingError> {
        if participants.is_empty() {
            return Err(RankingError::NoData);
        }
        let index = ParticipantIndex::from_participants(participants)?;
        Ok(RankingEngine { participants, index })
    }

    /// Number of participants being ranked.
    pub fn num_participants(&self) -> usize {
        self.index.len()
    }

    /// Totals per participant, in input order.
    pub fn totals(&self, participations: Option<&[EventParticipation]>) -> PointTotals {
        aggregate_indexed(&self.index, self.participants, participations)
    }

    /// Full leaderboard: the male partition ranked, then the female partition.
    pub fn rank(&self, participations: Option<&[EventParticipation]>) -> Vec<RankedEntry> {
        let totals = self.totals(participations);
        if totals.malformed_overrides > 0 {
            warn!(
                "{} participation records had unusable custom points, base points used",
                totals.malformed_overrides
            );
        }

        let mut rankings = Vec::with_capacity(totals.scored.len());
        for partition in Partition::ORDER {
            let group: Vec<_> = totals
                .scored
                .iter()
                .filter(|s| s.participant.partition() == partition)
                .cloned()
                .collect();
            rankings.extend(rank_partition(&group));
        }
        rankings
    }
}

/// Compute the leaderboard in one call.
///
/// `participations` is `None` when the participation source was unavailable;
/// ranking still proceeds with every total at zero.
pub fn compute_rankings(
    participants: &[Participant],
    participations: Option<&[EventParticipation]>,
) -> Result<Vec<RankedEntry>, RankingError> {
    Ok(RankingEngine::new(participants)?.rank(participations))
}

/// Entries of one partition, in leaderboard order.
pub fn partition_entries(rankings: &[RankedEntry], partition: Partition) -> Vec<&RankedEntry> {
    rankings.iter().filter(|e| e.partition() == partition).collect()
}
