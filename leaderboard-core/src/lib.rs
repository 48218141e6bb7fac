/// leaderboard-core: Pure-computation student leaderboard.
///
/// Event participations → per-student point totals → two independently ranked
/// lists (one per partition) with competition-style ties. No IO, no HTTP, no
/// database. The caller fetches the rows, this crate ranks them.
///
/// # Quick start
///
/// ```rust
/// use leaderboard_core::{compute_rankings, EventParticipation, Participant};
///
/// let students = vec![
///     Participant { id: "a".into(), first_name: "Ann".into(), last_name: "Zed".into(), is_male: false, house_id: 1 },
///     Participant { id: "b".into(), first_name: "Bea".into(), last_name: "Able".into(), is_male: false, house_id: 2 },
/// ];
///
/// let events = vec![
///     EventParticipation { student_id: "a".into(), base_points: Some(10.0), event_details: None },
///     EventParticipation {
///         student_id: "b".into(),
///         base_points: Some(10.0),
///         event_details: Some(r#"{"customPoints": 25}"#.into()),
///     },
/// ];
///
/// let rankings = compute_rankings(&students, Some(&events[..])).unwrap();
///
/// for r in &rankings {
///     println!("#{} {} {}: {}", r.rank, r.first_name, r.last_name, r.total_points);
/// }
/// assert_eq!(rankings[0].first_name, "Bea");
/// ```

pub mod collate;
pub mod constants;
pub mod engine;
pub mod error;
pub mod overrides;
pub mod ranking;
pub mod scoring;
pub mod types;

// Re-export primary public API at crate root.
pub use engine::{RankingEngine, compute_rankings, partition_entries};
pub use error::{OverrideError, RankingError};
pub use overrides::{custom_points, resolve_points};
pub use ranking::rank_partition;
pub use scoring::{PointTotals, aggregate_points};
pub use types::{EventParticipation, Participant, Partition, RankedEntry, ScoredParticipant};
