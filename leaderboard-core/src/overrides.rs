/// Custom-point overrides embedded in event details.
///
/// An event log may carry a JSON blob such as `{"customPoints": 25}`. When it
/// does, that number replaces the event type's points for the record. A
/// broken blob only costs the record its override, never the whole run.
use serde_json::Value;
use tracing::warn;

use crate::constants::{CUSTOM_POINTS_FIELD, DEFAULT_BASE_POINTS};
use crate::error::OverrideError;
use crate::types::EventParticipation;

/// Try to read the override from an event details payload.
///
/// `Ok(None)` when the payload is valid JSON without a `customPoints` field
/// (or is not an object at all). Errors when the JSON is broken or the field
/// holds something other than a number.
pub fn custom_points(details: &str) -> Result<Option<f64>, OverrideError> {
    let value: Value =
        serde_json::from_str(details).map_err(|e| OverrideError::InvalidJson(e.to_string()))?;

    match value.get(CUSTOM_POINTS_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(OverrideError::NonNumeric),
        Some(_) => Err(OverrideError::NonNumeric),
    }
}

/// Outcome of resolving one record's points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoints {
    pub points: f64,
    /// The payload was present but unusable, so base points were used.
    pub malformed_override: bool,
}

/// Points this participation record is worth.
///
/// Base points (0 when no event type is linked), replaced wholesale by a
/// valid override. Malformed overrides are logged and ignored.
pub fn resolve(record: &EventParticipation) -> ResolvedPoints {
    let base = record.base_points.unwrap_or(DEFAULT_BASE_POINTS);

    let details = match record.event_details.as_deref() {
        Some(d) if !d.trim().is_empty() => d,
        _ => return ResolvedPoints { points: base, malformed_override: false },
    };

    match custom_points(details) {
        Ok(Some(points)) => ResolvedPoints { points, malformed_override: false },
        Ok(None) => ResolvedPoints { points: base, malformed_override: false },
        Err(e) => {
            warn!(student_id = %record.student_id, "Ignoring custom points override: {e}");
            ResolvedPoints { points: base, malformed_override: true }
        }
    }
}

/// Shorthand for [`resolve`] when the diagnostic flag is not needed.
pub fn resolve_points(record: &EventParticipation) -> f64 {
    resolve(record).points
}
