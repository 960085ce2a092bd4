//! The evidence-driven crossmatch pipeline.
//!
//! [`CrossmatchWorker`] walks a raw ingested table in batches, joins every
//! page against the canonical catalog by spherical proximity, enriches it
//! with identity evidence, and hands each record to the configured
//! [`Resolver`]. Verdicts are tallied per `(status, triage, reason)` and,
//! when writing is enabled, forwarded page by page to the admin API.

pub mod geometry;
mod report;
pub mod resolver;
mod sink;

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::{
    api::AdminApiClient,
    db::{CrossmatchPage, LedaDb},
    model::{CrossmatchResult, CrossmatchStatus, InvariantViolation, Neighbor, PendingReason, RecordEvidence,
        TriageStatus},
};

pub use self::resolver::{ConfigError, IdentityResolver, Resolver, TwoRadiiResolver, DEFAULT_REDSHIFT_TOLERANCE};

/// The default amount of rows fetched per page.
pub const DEFAULT_BATCH_SIZE: i64 = 10_000;

/// Errors that can abort a crossmatch run.
#[derive(Debug, thiserror::Error)]
pub enum CrossmatchError {
    /// The raw table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),
    /// The store failed while fetching a page or enrichment data.
    #[error(transparent)]
    Db(#[from] crate::db::DbError),
    /// The admin API rejected a page of verdicts.
    #[error(transparent)]
    Api(#[from] crate::api::AdminApiError),
    /// A resolver produced a structurally invalid verdict.
    #[error("resolver produced an invalid verdict: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Settings of a single crossmatch invocation.
#[derive(Clone, Debug)]
pub struct CrossmatchConfig {
    /// Name of the raw table to walk.
    pub table_name: String,
    /// Rows per page.
    pub batch_size: i64,
    /// Print every pending verdict to stdout.
    pub print_pending: bool,
    /// Write verdicts back through the admin API.
    pub write: bool,
}

type TallyKey = (CrossmatchStatus, TriageStatus, Option<PendingReason>);

/// Cross-identifies a raw table against the canonical catalog.
pub struct CrossmatchWorker<R> {
    db: LedaDb,
    api: AdminApiClient,
    resolver: R,
    config: CrossmatchConfig,
}

struct PageEnrichment {
    record_pgc_by_id: HashMap<String, i64>,
    existing_pgcs: HashSet<i64>,
    design_to_pgcs: HashMap<String, BTreeSet<i64>>,
}

impl<R: Resolver> CrossmatchWorker<R> {
    /// Creates a worker over the given store and admin API client.
    pub fn new(db: &LedaDb, api: &AdminApiClient, resolver: R, config: CrossmatchConfig) -> Self {
        Self {
            db: db.clone(),
            api: api.clone(),
            resolver,
            config,
        }
    }

    /// Runs the crossmatch to completion and prints the summary table.
    ///
    /// The cursor is not persisted; a failed or cancelled run is recovered
    /// by re-running from scratch, which re-asserts the same verdicts.
    pub async fn run(&self) -> Result<(), CrossmatchError> {
        let table_id = self
            .db
            .table_id(&self.config.table_name)
            .await?
            .ok_or_else(|| CrossmatchError::TableNotFound(self.config.table_name.clone()))?;
        info!("crossmatching table `{}` (id {})", self.config.table_name, table_id);

        let mut counts = HashMap::<TallyKey, u64>::new();
        let mut total = 0u64;
        let mut last_id = String::new();

        loop {
            let page = self
                .db
                .fetch_crossmatch_page(table_id, &last_id, self.config.batch_size, self.resolver.search_radius_deg())
                .await?;
            if page.records.is_empty() {
                break;
            }

            let enrichment = self.enrich(&page).await?;
            let results = self.resolve_page(&page, &enrichment);

            for result in &results {
                result.check_invariants()?;
                *counts
                    .entry((result.status, result.triage_status, result.pending_reason))
                    .or_default() += 1;
                total += 1;
                if self.config.print_pending && result.triage_status == TriageStatus::Pending {
                    println!("{}", pending_line(result));
                }
            }

            if self.config.write && !results.is_empty() {
                sink::write_results(&self.api, &results).await?;
            }

            debug!(rows = page.records.len(), last_id = %page.last_id, total, "processed batch");
            last_id = page.last_id;
        }

        report::print_summary(&counts, total);
        Ok(())
    }

    /// Attaches identity evidence to a page: claimed PGCs from the raw
    /// table, their existence in the canonical catalog, and the global
    /// designation index. Missing rows degrade to absent signals.
    async fn enrich(&self, page: &CrossmatchPage) -> Result<PageEnrichment, CrossmatchError> {
        let record_pgc_by_id = match self.resolver.pgc_column() {
            Some(column) => {
                let ids = page.records.keys().cloned().collect::<Vec<_>>();
                self.db.claimed_pgcs(&self.config.table_name, column, &ids).await?
            }
            None => HashMap::new(),
        };

        let claimed = record_pgc_by_id.values().copied().collect::<HashSet<_>>();
        let existing_pgcs = if claimed.is_empty() {
            HashSet::new()
        } else {
            self.db.existing_pgcs(&claimed.into_iter().collect::<Vec<_>>()).await?
        };

        let designs = page
            .records
            .values()
            .filter_map(|record| record.design.clone())
            .collect::<HashSet<_>>();
        let design_to_pgcs = if designs.is_empty() {
            HashMap::new()
        } else {
            self.db
                .pgcs_by_designation(&designs.into_iter().collect::<Vec<_>>())
                .await?
        };

        Ok(PageEnrichment {
            record_pgc_by_id,
            existing_pgcs,
            design_to_pgcs,
        })
    }

    /// Builds evidence for each record of the page and resolves it.
    ///
    /// Candidates are post-filtered by the accurate angular distance and
    /// deduplicated by PGC; records without coordinates keep an empty
    /// neighbor list and fall through to the identity signals.
    fn resolve_page(&self, page: &CrossmatchPage, enrichment: &PageEnrichment) -> Vec<CrossmatchResult> {
        let radius_deg = self.resolver.search_radius_deg();
        let mut results = Vec::with_capacity(page.records.len());
        for (record_id, record) in &page.records {
            let mut neighbors = Vec::new();
            if let (Some(ra), Some(dec)) = (record.ra, record.dec) {
                let mut seen = HashSet::new();
                for candidate in &record.candidates {
                    let distance_deg = geometry::angular_distance_deg(ra, dec, candidate.ra, candidate.dec);
                    if distance_deg <= radius_deg && seen.insert(candidate.pgc) {
                        neighbors.push(Neighbor {
                            pgc: candidate.pgc,
                            ra: candidate.ra,
                            dec: candidate.dec,
                            distance_deg,
                            design: candidate.design.clone(),
                            redshift: candidate.redshift,
                        });
                    }
                }
            }
            let record_pgc = enrichment.record_pgc_by_id.get(record_id).copied();
            let evidence = RecordEvidence {
                record_id: record_id.clone(),
                neighbors,
                record_designation: record.design.clone(),
                global_pgcs_with_same_design: record
                    .design
                    .as_ref()
                    .and_then(|design| enrichment.design_to_pgcs.get(design))
                    .filter(|pgcs| !pgcs.is_empty())
                    .cloned(),
                record_pgc,
                claimed_pgc_exists_in_layer2: record_pgc.is_some_and(|pgc| enrichment.existing_pgcs.contains(&pgc)),
                record_redshift: record.redshift,
            };
            results.push(self.resolver.resolve(&evidence));
        }
        results
    }
}

/// One line per pending verdict, e.g. `rec-1 PGC_MISMATCH pgc: 42`.
fn pending_line(result: &CrossmatchResult) -> String {
    let mut line = result.record_id.clone();
    if let Some(reason) = result.pending_reason {
        line.push(' ');
        line.push_str(reason.as_str());
    }
    if let Some(pgcs) = result.colliding_pgcs.as_ref().filter(|pgcs| !pgcs.is_empty()) {
        let mut sorted = pgcs.clone();
        sorted.sort_unstable();
        line.push_str(" pgcs: ");
        line.push_str(
            &sorted
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        );
    } else if let Some(pgc) = result.matched_pgc {
        line.push_str(&format!(" pgc: {pgc}"));
    }
    line
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        api::AdminApiConfig,
        db::{CandidateRow, PageRecord},
        model::PendingReason,
    };

    #[test]
    fn pending_line_formats_matches_and_collisions() {
        let matched = CrossmatchResult::pending_existing("rec-1".to_string(), 42, PendingReason::PgcMismatch);
        assert_eq!(pending_line(&matched), "rec-1 PGC_MISMATCH pgc: 42");

        let collided = CrossmatchResult::pending_collision(
            "rec-2".to_string(),
            vec![7, 2, 5],
            PendingReason::MultipleObjectsMatched,
        );
        assert_eq!(pending_line(&collided), "rec-2 MULTIPLE_OBJECTS_MATCHED pgcs: 2,5,7");
    }

    fn worker(resolver: IdentityResolver) -> CrossmatchWorker<IdentityResolver> {
        let _guard = tokio::runtime::Runtime::new().unwrap();
        let _enter = _guard.enter();
        CrossmatchWorker {
            db: LedaDb::disconnected(),
            api: AdminApiClient::new(AdminApiConfig::default()).unwrap(),
            resolver,
            config: CrossmatchConfig {
                table_name: "sdss_dr12".to_string(),
                batch_size: DEFAULT_BATCH_SIZE,
                print_pending: false,
                write: false,
            },
        }
    }

    fn empty_enrichment() -> PageEnrichment {
        PageEnrichment {
            record_pgc_by_id: HashMap::new(),
            existing_pgcs: HashSet::new(),
            design_to_pgcs: HashMap::new(),
        }
    }

    #[test]
    fn resolve_page_post_filters_and_dedupes_candidates() {
        let resolver = IdentityResolver::new(0.01, None).unwrap();
        let mut page = CrossmatchPage::default();
        page.records.insert(
            "rec-1".to_string(),
            PageRecord {
                ra: Some(10.0),
                dec: Some(20.0),
                candidates: vec![
                    // Within the radius, kept.
                    CandidateRow {
                        pgc: 1,
                        ra: 10.001,
                        dec: 20.001,
                        design: None,
                        redshift: None,
                    },
                    // Same PGC through a second designation row, dropped.
                    CandidateRow {
                        pgc: 1,
                        ra: 10.001,
                        dec: 20.001,
                        design: Some("NGC 1".to_string()),
                        redshift: None,
                    },
                    // Overselected by the store-side pre-filter, dropped.
                    CandidateRow {
                        pgc: 2,
                        ra: 11.0,
                        dec: 21.0,
                        design: None,
                        redshift: None,
                    },
                ],
                ..Default::default()
            },
        );

        let results = worker(resolver).resolve_page(&page, &empty_enrichment());
        assert_eq!(results, vec![CrossmatchResult::resolved_existing("rec-1".to_string(), 1)]);
    }

    #[test]
    fn resolve_page_without_coordinates_keeps_identity_signals() {
        let resolver = IdentityResolver::new(0.01, Some("pgc".to_string())).unwrap();
        let mut page = CrossmatchPage::default();
        page.records.insert(
            "rec-1".to_string(),
            PageRecord {
                design: Some("NGC 123".to_string()),
                ..Default::default()
            },
        );

        let enrichment = PageEnrichment {
            record_pgc_by_id: HashMap::new(),
            existing_pgcs: HashSet::new(),
            design_to_pgcs: [("NGC 123".to_string(), BTreeSet::from([100]))].into(),
        };
        let results = worker(resolver).resolve_page(&page, &enrichment);
        assert_eq!(
            results,
            vec![CrossmatchResult::pending_existing(
                "rec-1".to_string(),
                100,
                PendingReason::MatchedNameOutsideCircle
            )]
        );
    }

    #[test]
    fn resolve_page_visits_records_in_id_order() {
        let resolver = IdentityResolver::new(0.01, None).unwrap();
        let mut page = CrossmatchPage::default();
        page.records.insert("rec-2".to_string(), PageRecord::default());
        page.records.insert("rec-1".to_string(), PageRecord::default());

        let results = worker(resolver).resolve_page(&page, &empty_enrichment());
        assert_eq!(
            results.iter().map(|r| r.record_id.as_str()).collect::<Vec<_>>(),
            vec!["rec-1", "rec-2"]
        );
    }
}
