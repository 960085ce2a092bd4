//! Request payloads of the admin API.

use serde::Serialize;

use crate::model::TriageStatus;

/// Records that are new to the canonical catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NewStatusPayload {
    /// Ids of the classified records.
    pub record_ids: Vec<String>,
    /// Triage statuses, parallel to `record_ids`.
    pub triage_statuses: Vec<TriageStatus>,
}

/// Records matched against a single canonical object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExistingStatusPayload {
    /// Ids of the classified records.
    pub record_ids: Vec<String>,
    /// Matched PGCs, parallel to `record_ids`.
    pub pgcs: Vec<i64>,
    /// Triage statuses, parallel to `record_ids`.
    pub triage_statuses: Vec<TriageStatus>,
}

/// Records that collide with several candidate objects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollidedStatusPayload {
    /// Ids of the classified records.
    pub record_ids: Vec<String>,
    /// Sorted candidate PGC lists, parallel to `record_ids`.
    pub possible_matches: Vec<Vec<i64>>,
    /// Triage statuses, parallel to `record_ids`.
    pub triage_statuses: Vec<TriageStatus>,
}

/// The per-status groups of one `set_crossmatch_results` call. Absent
/// groups are omitted from the request body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusesPayload {
    /// Records new to the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<NewStatusPayload>,
    /// Records matched to an existing object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<ExistingStatusPayload>,
    /// Records colliding with several objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collided: Option<CollidedStatusPayload>,
}

/// Body of the `set_crossmatch_results` admin call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SetCrossmatchResultsRequest {
    /// Verdicts grouped by status.
    pub statuses: StatusesPayload,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn absent_groups_are_not_serialized() {
        let request = SetCrossmatchResultsRequest {
            statuses: StatusesPayload {
                existing: Some(ExistingStatusPayload {
                    record_ids: vec!["rec-1".to_string()],
                    pgcs: vec![42],
                    triage_statuses: vec![TriageStatus::Pending],
                }),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "statuses": {
                    "existing": {
                        "record_ids": ["rec-1"],
                        "pgcs": [42],
                        "triage_statuses": ["pending"],
                    }
                }
            })
        );
    }
}
