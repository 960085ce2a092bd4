//! Write-back of a page's verdicts to the admin API.

use crate::{
    api::{
        models::{CollidedStatusPayload, ExistingStatusPayload, NewStatusPayload, SetCrossmatchResultsRequest,
            StatusesPayload},
        AdminApiClient, AdminApiError,
    },
    model::{CrossmatchResult, CrossmatchStatus},
};

/// Groups a page's verdicts by status into the admin API payload.
///
/// Returns `None` when the page produced nothing to write, so callers can
/// skip the call entirely.
pub(crate) fn build_statuses(results: &[CrossmatchResult]) -> Option<StatusesPayload> {
    let mut new = NewStatusPayload::default();
    let mut existing = ExistingStatusPayload::default();
    let mut collided = CollidedStatusPayload::default();

    for result in results {
        match result.status {
            CrossmatchStatus::New => {
                new.record_ids.push(result.record_id.clone());
                new.triage_statuses.push(result.triage_status);
            }
            CrossmatchStatus::Existing => {
                if let Some(pgc) = result.matched_pgc {
                    existing.record_ids.push(result.record_id.clone());
                    existing.pgcs.push(pgc);
                    existing.triage_statuses.push(result.triage_status);
                }
            }
            CrossmatchStatus::Colliding => {
                if let Some(pgcs) = &result.colliding_pgcs {
                    let mut matches = pgcs.clone();
                    matches.sort_unstable();
                    collided.record_ids.push(result.record_id.clone());
                    collided.possible_matches.push(matches);
                    collided.triage_statuses.push(result.triage_status);
                }
            }
        }
    }

    let statuses = StatusesPayload {
        new: (!new.record_ids.is_empty()).then_some(new),
        existing: (!existing.record_ids.is_empty()).then_some(existing),
        collided: (!collided.record_ids.is_empty()).then_some(collided),
    };
    (statuses.new.is_some() || statuses.existing.is_some() || statuses.collided.is_some()).then_some(statuses)
}

/// Sends a page of verdicts to the admin API, skipping empty pages.
pub(crate) async fn write_results(api: &AdminApiClient, results: &[CrossmatchResult]) -> Result<(), AdminApiError> {
    if let Some(statuses) = build_statuses(results) {
        api.set_crossmatch_results(&SetCrossmatchResultsRequest { statuses }).await?;
    }
    Ok(())
}
