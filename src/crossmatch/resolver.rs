//! The decision procedures that turn per-record evidence into verdicts.
//!
//! Two variants share the [`Resolver`] interface: [`IdentityResolver`]
//! weighs PGC and designation identity signals within a single search
//! radius, while [`TwoRadiiResolver`] splits neighbors into an inner circle
//! and an outer annulus and optionally refines the coordinate verdict with
//! redshift measurements.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::{CrossmatchResult, CrossmatchStatus, Neighbor, PendingReason, RecordEvidence};

/// Default tolerance on `|z_record - z_neighbor|` for treating two redshifts
/// as the same object.
pub const DEFAULT_REDSHIFT_TOLERANCE: f64 = 3e-4;

/// Errors produced while constructing a resolver from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A search radius was zero or negative.
    #[error("search radius must be positive, got {0} deg")]
    NonPositiveRadius(f64),
    /// The inner radius exceeds the outer one.
    #[error("inner radius ({r1} deg) must not exceed outer radius ({r2} deg)")]
    RadiusOrder {
        /// Inner radius in degrees.
        r1: f64,
        /// Outer radius in degrees.
        r2: f64,
    },
    /// The redshift tolerance was zero or negative.
    #[error("redshift tolerance must be positive, got {0}")]
    NonPositiveRedshiftTolerance(f64),
}

/// The decision procedure the batch driver runs over each record's evidence.
///
/// The driver needs the search radius up front to size the store-side
/// spatial pre-filter, and the optional claimed-PGC column to know whether
/// to run the claimed-PGC enrichment queries.
pub trait Resolver: Send + Sync {
    /// Radius of the search circle, in degrees.
    fn search_radius_deg(&self) -> f64;

    /// Column of the raw table carrying the claimed PGC, when configured.
    fn pgc_column(&self) -> Option<&str> {
        None
    }

    /// Produces the verdict for one record. Pure: equal evidence yields
    /// equal verdicts.
    fn resolve(&self, evidence: &RecordEvidence) -> CrossmatchResult;
}

/// Normalized designation equality: both sides trimmed of surrounding
/// whitespace and upcased; a missing designation is never equal to anything.
fn designs_equal(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().to_uppercase() == b.trim().to_uppercase(),
        _ => false,
    }
}

/// A neighbor is preferred when the record's claimed PGC equals its PGC or
/// the record's designation equals its designation under normalized equality.
fn is_preferred(neighbor: &Neighbor, evidence: &RecordEvidence) -> bool {
    evidence.record_pgc == Some(neighbor.pgc)
        || designs_equal(evidence.record_designation.as_deref(), neighbor.design.as_deref())
}

/// Single-radius resolver driven by PGC and designation identity signals.
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    radius_deg: f64,
    pgc_column: Option<String>,
}

impl IdentityResolver {
    /// Creates an identity resolver with the given search radius in degrees
    /// and the optional name of the raw table column carrying the claimed
    /// PGC. When the column is absent, PGC-based signals are disabled.
    pub fn new(radius_deg: f64, pgc_column: Option<String>) -> Result<Self, ConfigError> {
        if radius_deg <= 0.0 {
            return Err(ConfigError::NonPositiveRadius(radius_deg));
        }
        Ok(Self { radius_deg, pgc_column })
    }
}

impl Resolver for IdentityResolver {
    fn search_radius_deg(&self) -> f64 {
        self.radius_deg
    }

    fn pgc_column(&self) -> Option<&str> {
        self.pgc_column.as_deref()
    }

    fn resolve(&self, evidence: &RecordEvidence) -> CrossmatchResult {
        match evidence.neighbors.as_slice() {
            [] => resolve_outside_circle(evidence),
            [single] => resolve_single_neighbor(evidence, single),
            neighbors => resolve_multiple_neighbors(evidence, neighbors),
        }
    }
}

fn resolve_single_neighbor(evidence: &RecordEvidence, neighbor: &Neighbor) -> CrossmatchResult {
    if let Some(claimed) = evidence.record_pgc {
        if claimed != neighbor.pgc {
            return CrossmatchResult::pending_existing(
                evidence.record_id.clone(),
                neighbor.pgc,
                PendingReason::PgcMismatch,
            );
        }
    }
    if is_preferred(neighbor, evidence) || evidence.record_pgc.is_none() {
        return CrossmatchResult::resolved_existing(evidence.record_id.clone(), neighbor.pgc);
    }
    CrossmatchResult::pending_existing(
        evidence.record_id.clone(),
        neighbor.pgc,
        PendingReason::SingleNeighborNoIdentityMatch,
    )
}

fn resolve_multiple_neighbors(evidence: &RecordEvidence, neighbors: &[Neighbor]) -> CrossmatchResult {
    let preferred = neighbors
        .iter()
        .filter(|n| is_preferred(n, evidence))
        .collect::<Vec<_>>();
    if let [preferred] = preferred.as_slice() {
        return match evidence.record_pgc {
            Some(claimed) if claimed != preferred.pgc => CrossmatchResult::pending_existing(
                evidence.record_id.clone(),
                preferred.pgc,
                PendingReason::PgcMismatch,
            ),
            _ => CrossmatchResult::resolved_existing(evidence.record_id.clone(), preferred.pgc),
        };
    }
    CrossmatchResult::pending_collision(
        evidence.record_id.clone(),
        neighbors.iter().map(|n| n.pgc).collect(),
        PendingReason::MultipleObjectsMatched,
    )
}

/// Zero neighbors: the record may still match by designation or by its
/// claimed PGC, both pointing outside the search circle.
fn resolve_outside_circle(evidence: &RecordEvidence) -> CrossmatchResult {
    let mut pgcs_elsewhere: BTreeSet<i64> = evidence.global_pgcs_with_same_design.clone().unwrap_or_default();
    if evidence.claimed_pgc_exists_in_layer2 {
        if let Some(claimed) = evidence.record_pgc {
            pgcs_elsewhere.insert(claimed);
        }
    }
    let mut pgcs = pgcs_elsewhere.iter();
    if let (Some(&only), None) = (pgcs.next(), pgcs.next()) {
        let reason = if evidence
            .global_pgcs_with_same_design
            .as_ref()
            .is_some_and(|set| set.contains(&only))
        {
            PendingReason::MatchedNameOutsideCircle
        } else {
            PendingReason::MatchedPgcOutsideCircle
        };
        return CrossmatchResult::pending_existing(evidence.record_id.clone(), only, reason);
    }
    CrossmatchResult::resolved_new(evidence.record_id.clone())
}

/// Two-radii coordinate resolver with optional redshift refinement.
///
/// Identity signals are not consulted; the verdict is a function of where
/// neighbors fall relative to the inner radius `r1` and the outer radius
/// `r2`, refined by redshift closeness when the record has a measurement.
#[derive(Clone, Debug)]
pub struct TwoRadiiResolver {
    r1_deg: f64,
    r2_deg: f64,
    redshift_tolerance: f64,
}

impl TwoRadiiResolver {
    /// Creates a two-radii resolver with radii in degrees, `0 < r1 <= r2`.
    pub fn new(r1_deg: f64, r2_deg: f64, redshift_tolerance: f64) -> Result<Self, ConfigError> {
        if r1_deg <= 0.0 {
            return Err(ConfigError::NonPositiveRadius(r1_deg));
        }
        if r1_deg > r2_deg {
            return Err(ConfigError::RadiusOrder { r1: r1_deg, r2: r2_deg });
        }
        if redshift_tolerance <= 0.0 {
            return Err(ConfigError::NonPositiveRedshiftTolerance(redshift_tolerance));
        }
        Ok(Self {
            r1_deg,
            r2_deg,
            redshift_tolerance,
        })
    }

    fn close(&self, record_z: f64, neighbor_z: f64) -> bool {
        (record_z - neighbor_z).abs() < self.redshift_tolerance
    }

    fn coordinate_verdict(&self, evidence: &RecordEvidence) -> CrossmatchResult {
        let record_id = evidence.record_id.clone();
        let inner = evidence
            .neighbors
            .iter()
            .filter(|n| n.distance_deg <= self.r1_deg)
            .collect::<Vec<_>>();
        let outer = evidence
            .neighbors
            .iter()
            .filter(|n| n.distance_deg > self.r1_deg && n.distance_deg <= self.r2_deg)
            .collect::<Vec<_>>();
        match (inner.as_slice(), outer.as_slice()) {
            ([], []) => CrossmatchResult::resolved_new(record_id),
            ([only], []) => CrossmatchResult::resolved_existing(record_id, only.pgc),
            ([], [only]) => {
                CrossmatchResult::pending_existing(record_id, only.pgc, PendingReason::SingleInOuterRadiusOnly)
            }
            ([], outer) => CrossmatchResult::pending_collision(
                record_id,
                outer.iter().map(|n| n.pgc).collect(),
                PendingReason::MultipleInOuterRadius,
            ),
            // The inner candidate leads the collision list so it stays
            // identifiable to reviewers and to the redshift refinement.
            ([single], outer) => CrossmatchResult::pending_collision(
                record_id,
                std::iter::once(single.pgc).chain(outer.iter().map(|n| n.pgc)).collect(),
                PendingReason::SingleInInnerWithOuterNeighbors,
            ),
            (inner, _) => CrossmatchResult::pending_collision(
                record_id,
                inner.iter().map(|n| n.pgc).collect(),
                PendingReason::MultipleInInnerRadius,
            ),
        }
    }

    /// Refines a coordinate verdict with the record's redshift, when present.
    ///
    /// An existing verdict is confirmed or contested against the matched
    /// neighbor's redshift; a collision is demoted to a resolved match when
    /// exactly one involved neighbor is close in redshift. Applying the
    /// refinement twice yields the same verdict as applying it once.
    fn refine_with_redshift(&self, evidence: &RecordEvidence, verdict: CrossmatchResult) -> CrossmatchResult {
        let Some(record_z) = evidence.record_redshift else {
            return verdict;
        };
        match verdict.status {
            CrossmatchStatus::New => verdict,
            CrossmatchStatus::Existing => {
                let Some(matched) = verdict.matched_pgc else {
                    return verdict;
                };
                let Some(neighbor_z) = evidence
                    .neighbors
                    .iter()
                    .find(|n| n.pgc == matched)
                    .and_then(|n| n.redshift)
                else {
                    return verdict;
                };
                if self.close(record_z, neighbor_z) {
                    CrossmatchResult::resolved_existing(verdict.record_id, matched)
                } else {
                    CrossmatchResult::pending_existing(verdict.record_id, matched, PendingReason::RedshiftMismatch)
                }
            }
            CrossmatchStatus::Colliding => {
                let Some(involved) = verdict.colliding_pgcs.as_ref() else {
                    return verdict;
                };
                let redshifts = involved
                    .iter()
                    .filter_map(|pgc| evidence.neighbors.iter().find(|n| n.pgc == *pgc))
                    .map(|n| (n.pgc, n.redshift))
                    .collect::<Vec<_>>();
                if redshifts.iter().any(|(_, z)| z.is_none()) {
                    return verdict;
                }
                let close = redshifts
                    .iter()
                    .filter(|(_, z)| z.is_some_and(|z| self.close(record_z, z)))
                    .map(|(pgc, _)| *pgc)
                    .collect::<Vec<_>>();
                if let [only] = close.as_slice() {
                    CrossmatchResult::resolved_existing(verdict.record_id, *only)
                } else {
                    verdict
                }
            }
        }
    }
}

impl Resolver for TwoRadiiResolver {
    fn search_radius_deg(&self) -> f64 {
        self.r2_deg
    }

    fn resolve(&self, evidence: &RecordEvidence) -> CrossmatchResult {
        let verdict = self.coordinate_verdict(evidence);
        self.refine_with_redshift(evidence, verdict)
    }
}
