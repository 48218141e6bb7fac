/// Output formatting: terminal table, JSON, and the HTTP response bodies.
use leaderboard_core::{Partition, RankedEntry, partition_entries};
use serde::{Serialize, Serializer};

/// Largest integer an f64 (and a JavaScript number) holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Serialize)]
pub struct JsonRankedEntry {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(serialize_with = "serialize_points")]
    pub total_points: f64,
    pub rank: usize,
    pub is_male: bool,
    pub house_id: i64,
}

impl From<&RankedEntry> for JsonRankedEntry {
    fn from(e: &RankedEntry) -> Self {
        JsonRankedEntry {
            id: e.id.clone(),
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            total_points: e.total_points,
            rank: e.rank,
            is_male: e.is_male,
            house_id: e.house_id,
        }
    }
}

/// `{"success": true, "data": [...]}`
#[derive(Serialize)]
pub struct RankingsBody {
    success: bool,
    pub data: Vec<JsonRankedEntry>,
}

impl RankingsBody {
    pub fn new(rankings: &[RankedEntry]) -> Self {
        RankingsBody {
            success: true,
            data: rankings.iter().map(JsonRankedEntry::from).collect(),
        }
    }
}

/// `{"success": false, "error": "..."}`
#[derive(Serialize)]
pub struct ErrorBody {
    success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody { success: false, error: error.into() }
    }
}

/// Whole numbers go out as integers (`120`, not `120.0`), like the web client expects.
fn serialize_points<S: Serializer>(points: &f64, s: S) -> Result<S::Ok, S::Error> {
    if points.fract() == 0.0 && points.abs() <= MAX_SAFE_INTEGER {
        s.serialize_i64(*points as i64)
    } else {
        s.serialize_f64(*points)
    }
}

/// Points for display: no decimals when whole, otherwise up to two.
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        let s = format!("{points:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn partition_title(partition: Partition) -> &'static str {
    match partition {
        Partition::Male => "Dikrao Leaderboard",
        Partition::Female => "Dikrio Leaderboard",
    }
}

/// Print each requested partition as a formatted terminal table.
pub fn print_table(rankings: &[RankedEntry], partitions: &[Partition]) {
    // Find the widest name for padding
    let name_width = rankings
        .iter()
        .map(|e| e.first_name.chars().count() + 1 + e.last_name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4); // at least "Name"

    for (i, &partition) in partitions.iter().enumerate() {
        let entries = partition_entries(rankings, partition);
        if i > 0 {
            println!();
        }
        println!("{} ({})", partition_title(partition), entries.len());
        println!("   # | {:<name_width$} | House |  Points", "Name");
        println!("-----|-{}-|-------|--------", "-".repeat(name_width));

        for e in entries {
            let name = format!("{} {}", e.first_name, e.last_name);
            println!(
                "{:>4} | {:<name_width$} | {:>5} | {:>7}",
                e.rank,
                name,
                e.house_id,
                format_points(e.total_points),
            );
        }
    }
}

/// Render rankings as the same JSON envelope the HTTP endpoint returns.
pub fn to_json(rankings: &[RankedEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&RankingsBody::new(rankings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(points: f64) -> RankedEntry {
        RankedEntry {
            id: "u1".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Zed".to_string(),
            total_points: points,
            rank: 1,
            is_male: false,
            house_id: 4,
        }
    }

    #[test]
    fn test_whole_points_serialize_as_integers() {
        let json = serde_json::to_value(RankingsBody::new(&[entry(120.0)])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "data": [{
                    "id": "u1",
                    "first_name": "Ann",
                    "last_name": "Zed",
                    "total_points": 120,
                    "rank": 1,
                    "is_male": false,
                    "house_id": 4
                }]
            })
        );
    }

    #[test]
    fn test_fractional_points_serialize_as_floats() {
        let json = serde_json::to_value(JsonRankedEntry::from(&entry(2.75))).unwrap();
        assert_eq!(json["total_points"], serde_json::json!(2.75));
    }

    #[test]
    fn test_error_body_shape() {
        let json = serde_json::to_value(ErrorBody::new("No active students found")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "No active students found"}));
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(40.0), "40");
        assert_eq!(format_points(2.5), "2.5");
        assert_eq!(format_points(2.75), "2.75");
        assert_eq!(format_points(-3.0), "-3");
    }

    #[test]
    fn test_board_titles() {
        assert_eq!(partition_title(Partition::Male), "Dikrao Leaderboard");
        assert_eq!(partition_title(Partition::Female), "Dikrio Leaderboard");
    }
}
