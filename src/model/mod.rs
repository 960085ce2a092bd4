//! Value types of the crossmatch pipeline: the per-record evidence fed to the
//! resolvers and the verdicts they produce.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A candidate match from the canonical catalog, found within the search
/// circle of a probed record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Neighbor {
    /// Stable numeric identifier (PGC) of the canonical object.
    pub pgc: i64,
    /// Right ascension in degrees.
    pub ra: f64,
    /// Declination in degrees.
    pub dec: f64,
    /// Angular distance to the probed record, in degrees.
    pub distance_deg: f64,
    /// Canonical designation, if the object carries one.
    pub design: Option<String>,
    /// Canonical redshift, if measured. Only consulted by the two-radii
    /// resolver.
    pub redshift: Option<f64>,
}

/// Everything known about a single raw record at resolution time.
///
/// Built once per record within a batch and never mutated afterwards; the
/// resolvers are pure functions over this value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordEvidence {
    /// Opaque identifier of the raw record.
    pub record_id: String,
    /// Canonical objects within the search circle, deduplicated by PGC, in
    /// encounter order.
    pub neighbors: Vec<Neighbor>,
    /// The record's designation, already normalized upstream.
    pub record_designation: Option<String>,
    /// PGCs known globally to carry the same designation, regardless of
    /// position on the sky.
    pub global_pgcs_with_same_design: Option<BTreeSet<i64>>,
    /// PGC asserted by the raw row itself, if the table carries one.
    pub record_pgc: Option<i64>,
    /// Whether the claimed PGC actually exists in the canonical catalog.
    pub claimed_pgc_exists_in_layer2: bool,
    /// The record's redshift, if measured.
    pub record_redshift: Option<f64>,
}

/// Classification of a record against the canonical catalog.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossmatchStatus {
    /// The record is not present in the canonical catalog.
    New,
    /// The record matches exactly one canonical object.
    Existing,
    /// The record collides with several candidate objects.
    Colliding,
}

impl CrossmatchStatus {
    /// The wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Existing => "existing",
            Self::Colliding => "colliding",
        }
    }
}

impl fmt::Display for CrossmatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a verdict is safe to persist automatically or must be reviewed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageStatus {
    /// The evidence identifies the record unambiguously.
    Resolved,
    /// A human should confirm the verdict.
    Pending,
}

impl TriageStatus {
    /// The wire name of the triage status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for TriageStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a verdict was left to a human reviewer.
///
/// A closed enumeration: resolvers can only emit reasons listed here, so
/// tallies stay comparable across runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PendingReason {
    // Identity resolver
    /// The raw row claims a PGC that differs from the matched object.
    PgcMismatch,
    /// Several canonical objects are plausible matches.
    MultipleObjectsMatched,
    /// The designation points to an object outside the search circle.
    MatchedNameOutsideCircle,
    /// The claimed PGC points to an object outside the search circle.
    MatchedPgcOutsideCircle,
    /// A single neighbor was found but neither PGC nor designation confirms it.
    SingleNeighborNoIdentityMatch,

    // Two-radii resolver
    /// More than one canonical object within the inner radius.
    MultipleInInnerRadius,
    /// More than one canonical object within the outer radius, none inner.
    MultipleInOuterRadius,
    /// One inner match, but further candidates in the outer annulus.
    SingleInInnerWithOuterNeighbors,
    /// The only candidate sits in the outer annulus.
    SingleInOuterRadiusOnly,
    /// The matched object's redshift contradicts the record's.
    RedshiftMismatch,
}

impl PendingReason {
    /// The wire name of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PgcMismatch => "PGC_MISMATCH",
            Self::MultipleObjectsMatched => "MULTIPLE_OBJECTS_MATCHED",
            Self::MatchedNameOutsideCircle => "MATCHED_NAME_OUTSIDE_CIRCLE",
            Self::MatchedPgcOutsideCircle => "MATCHED_PGC_OUTSIDE_CIRCLE",
            Self::SingleNeighborNoIdentityMatch => "SINGLE_NEIGHBOR_NO_IDENTITY_MATCH",
            Self::MultipleInInnerRadius => "MULTIPLE_IN_INNER_RADIUS",
            Self::MultipleInOuterRadius => "MULTIPLE_IN_OUTER_RADIUS",
            Self::SingleInInnerWithOuterNeighbors => "SINGLE_IN_INNER_WITH_OUTER_NEIGHBORS",
            Self::SingleInOuterRadiusOnly => "SINGLE_IN_OUTER_RADIUS_ONLY",
            Self::RedshiftMismatch => "REDSHIFT_MISMATCH",
        }
    }
}

impl fmt::Display for PendingReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict a resolver produced for one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossmatchResult {
    /// Opaque identifier of the raw record.
    pub record_id: String,
    /// Classification of the record.
    pub status: CrossmatchStatus,
    /// Whether the verdict may be persisted without review.
    pub triage_status: TriageStatus,
    /// The matched PGC; present iff `status` is `Existing`.
    pub matched_pgc: Option<i64>,
    /// All colliding PGCs in encounter order; non-empty iff `status` is
    /// `Colliding`.
    pub colliding_pgcs: Option<Vec<i64>>,
    /// Why the verdict needs review; present iff `triage_status` is `Pending`.
    pub pending_reason: Option<PendingReason>,
}

impl CrossmatchResult {
    /// A resolved verdict for a record unknown to the canonical catalog.
    pub fn resolved_new(record_id: String) -> Self {
        Self {
            record_id,
            status: CrossmatchStatus::New,
            triage_status: TriageStatus::Resolved,
            matched_pgc: None,
            colliding_pgcs: None,
            pending_reason: None,
        }
    }

    /// A resolved match against a single canonical object.
    pub fn resolved_existing(record_id: String, pgc: i64) -> Self {
        Self {
            record_id,
            status: CrossmatchStatus::Existing,
            triage_status: TriageStatus::Resolved,
            matched_pgc: Some(pgc),
            colliding_pgcs: None,
            pending_reason: None,
        }
    }

    /// A match against a single canonical object that a human must confirm.
    pub fn pending_existing(record_id: String, pgc: i64, reason: PendingReason) -> Self {
        Self {
            record_id,
            status: CrossmatchStatus::Existing,
            triage_status: TriageStatus::Pending,
            matched_pgc: Some(pgc),
            colliding_pgcs: None,
            pending_reason: Some(reason),
        }
    }

    /// A collision between several candidate objects.
    pub fn pending_collision(record_id: String, pgcs: Vec<i64>, reason: PendingReason) -> Self {
        Self {
            record_id,
            status: CrossmatchStatus::Colliding,
            triage_status: TriageStatus::Pending,
            matched_pgc: None,
            colliding_pgcs: Some(pgcs),
            pending_reason: Some(reason),
        }
    }

    /// Checks the structural invariants every verdict must satisfy.
    ///
    /// A violation indicates a resolver defect and is fatal to the run.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        match self.status {
            CrossmatchStatus::New => {
                if self.matched_pgc.is_some() || self.colliding_pgcs.is_some() {
                    return Err(InvariantViolation::NewWithCandidates(self.record_id.clone()));
                }
            }
            CrossmatchStatus::Existing => {
                if self.matched_pgc.is_none() {
                    return Err(InvariantViolation::ExistingWithoutMatch(self.record_id.clone()));
                }
                if self.colliding_pgcs.is_some() {
                    return Err(InvariantViolation::ExistingWithCollisions(self.record_id.clone()));
                }
            }
            CrossmatchStatus::Colliding => {
                if self.matched_pgc.is_some() {
                    return Err(InvariantViolation::CollidingWithMatch(self.record_id.clone()));
                }
                if !self.colliding_pgcs.as_ref().is_some_and(|pgcs| !pgcs.is_empty()) {
                    return Err(InvariantViolation::CollidingWithoutCandidates(self.record_id.clone()));
                }
            }
        }
        match self.triage_status {
            TriageStatus::Resolved if self.pending_reason.is_some() => {
                Err(InvariantViolation::ResolvedWithReason(self.record_id.clone()))
            }
            TriageStatus::Pending if self.pending_reason.is_none() => {
                Err(InvariantViolation::PendingWithoutReason(self.record_id.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// A verdict that violates the structural invariants of the model.
#[derive(Debug, Error)]
pub enum InvariantViolation {
    /// A `new` verdict carries a matched PGC or a collision list.
    #[error("verdict for `{0}` is `new` but carries candidate PGCs")]
    NewWithCandidates(String),
    /// An `existing` verdict has no matched PGC.
    #[error("verdict for `{0}` is `existing` but has no matched PGC")]
    ExistingWithoutMatch(String),
    /// An `existing` verdict carries a collision list.
    #[error("verdict for `{0}` is `existing` but carries a collision list")]
    ExistingWithCollisions(String),
    /// A `colliding` verdict carries a matched PGC.
    #[error("verdict for `{0}` is `colliding` but carries a matched PGC")]
    CollidingWithMatch(String),
    /// A `colliding` verdict has no colliding PGCs.
    #[error("verdict for `{0}` is `colliding` but lists no colliding PGCs")]
    CollidingWithoutCandidates(String),
    /// A resolved verdict carries a pending reason.
    #[error("verdict for `{0}` is resolved but carries a pending reason")]
    ResolvedWithReason(String),
    /// A pending verdict has no pending reason.
    #[error("verdict for `{0}` is pending but has no pending reason")]
    PendingWithoutReason(String),
}
