/// Sorting and competition ranking within one partition.
use crate::collate::NameKey;
use crate::constants::FIRST_RANK;
use crate::types::{RankedEntry, ScoredParticipant};

/// Sort one group and assign competition ranks (1, 2, 2, 4).
///
/// Order is points descending, then full name alphabetically. The sort is
/// stable, so entries equal on points and name keep their input order. Each
/// rank is `position + 1` unless the points match the previous entry, in
/// which case the previous rank is reused.
pub fn rank_partition(group: &[ScoredParticipant]) -> Vec<RankedEntry> {
    let mut sorted: Vec<(NameKey, &ScoredParticipant)> = group
        .iter()
        .map(|scored| (NameKey::new(&scored.participant.full_name()), scored))
        .collect();
    sorted.sort_by(|(a_name, a), (b_name, b)| {
        b.total_points
            .total_cmp(&a.total_points)
            .then_with(|| a_name.cmp(b_name))
    });

    let mut ranked: Vec<RankedEntry> = Vec::with_capacity(sorted.len());
    for (i, (_, scored)) in sorted.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev) if prev.total_points == scored.total_points => prev.rank,
            _ => i + FIRST_RANK,
        };
        ranked.push(to_entry(scored, rank));
    }
    ranked
}

fn to_entry(scored: &ScoredParticipant, rank: usize) -> RankedEntry {
    let p = &scored.participant;
    RankedEntry {
        id: p.id.clone(),
        first_name: p.first_name.clone(),
        last_name: p.last_name.clone(),
        total_points: scored.total_points,
        rank,
        is_male: p.is_male,
        house_id: p.house_id,
    }
}
