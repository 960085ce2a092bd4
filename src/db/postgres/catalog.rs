//! Queries against the canonical (layer 2) catalog.

use std::collections::{BTreeSet, HashMap, HashSet};

use futures::TryStreamExt;
use sqlx::Row;
use tracing::instrument;

use super::{DbError, LedaDb};

const EXISTING_PGCS_QUERY: &str = "SELECT pgc::bigint AS pgc FROM layer2.icrs WHERE pgc = ANY($1)";

const PGCS_BY_DESIGNATION_QUERY: &str =
    "SELECT design, pgc::bigint AS pgc FROM layer2.designation WHERE design = ANY($1)";

/// Queries on the canonical catalog.
impl LedaDb {
    /// The subset of `pgcs` that exists in the canonical catalog.
    #[instrument(skip_all, err, level = "trace")]
    pub async fn existing_pgcs(&self, pgcs: &[i64]) -> Result<HashSet<i64>, DbError> {
        let mut existing = HashSet::new();
        let mut rows = sqlx::query(EXISTING_PGCS_QUERY).bind(pgcs).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            existing.insert(row.try_get("pgc")?);
        }
        Ok(existing)
    }

    /// Expands designations into the sets of PGCs that carry them.
    /// Designations without a canonical counterpart are absent from the map.
    #[instrument(skip_all, err, level = "trace")]
    pub async fn pgcs_by_designation(&self, designs: &[String]) -> Result<HashMap<String, BTreeSet<i64>>, DbError> {
        let mut by_design = HashMap::<String, BTreeSet<i64>>::new();
        let mut rows = sqlx::query(PGCS_BY_DESIGNATION_QUERY).bind(designs).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            let design: String = row.try_get("design")?;
            by_design.entry(design).or_default().insert(row.try_get("pgc")?);
        }
        Ok(by_design)
    }
}
