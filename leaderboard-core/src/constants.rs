/// Field inside an event's details JSON that overrides the event type's points.
pub const CUSTOM_POINTS_FIELD: &str = "customPoints";

/// Points credited when a participation has no event type linked.
pub const DEFAULT_BASE_POINTS: f64 = 0.0;

/// Rank given to the leader of each partition.
pub const FIRST_RANK: usize = 1;
