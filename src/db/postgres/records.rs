//! Queries against the raw (layer 0) side of the store.

use std::collections::{BTreeMap, HashMap};

use futures::TryStreamExt;
use sqlx::Row;
use tracing::instrument;

use super::{DbError, LedaDb};

const TABLE_ID_QUERY: &str = "SELECT id::bigint AS id FROM layer0.tables WHERE table_name = $1";

// One page of raw records joined against canonical points within the
// store-side spatial pre-filter. The pre-filter radius is inflated by the
// cosine of the declination (floored at 0.01 to survive the poles) and
// overselects; the accurate angular distance is applied in-process.
const BATCH_QUERY: &str = r#"
    WITH batch AS (
        SELECT rec.id
        FROM layer0.records rec
        WHERE rec.table_id = $1 AND rec.id > $2
        ORDER BY rec.id ASC
        LIMIT $3
    )
    SELECT
        b.id AS record_id,
        nc.ra::float8 AS record_ra,
        nc.dec::float8 AS record_dec,
        rec_desig.design AS record_design,
        rz.z::float8 AS record_z,
        l2.pgc::bigint AS candidate_pgc,
        l2.ra::float8 AS candidate_ra,
        l2.dec::float8 AS candidate_dec,
        l2_desig.design AS candidate_design,
        l2z.z::float8 AS candidate_z
    FROM batch b
    LEFT JOIN icrs.data nc ON b.id = nc.record_id
    LEFT JOIN designation.data rec_desig ON b.id = rec_desig.record_id
    LEFT JOIN redshift.data rz ON b.id = rz.record_id
    LEFT JOIN layer2.icrs l2
        ON nc.record_id IS NOT NULL
        AND ST_DWithin(
            ST_MakePoint(nc.dec, nc.ra - 180),
            ST_MakePoint(l2.dec, l2.ra - 180),
            $4 / GREATEST(COS(RADIANS(nc.dec)), 0.01)
        )
    LEFT JOIN layer2.designation l2_desig ON l2.pgc = l2_desig.pgc
    LEFT JOIN layer2.redshift l2z ON l2.pgc = l2z.pgc
    ORDER BY b.id ASC
"#;

/// One page of raw records with their spatially pre-filtered candidates.
#[derive(Clone, Debug, Default)]
pub struct CrossmatchPage {
    /// Records keyed by id, in ascending id order.
    pub records: BTreeMap<String, PageRecord>,
    /// Id of the last record of the page, the next cursor position.
    pub last_id: String,
}

/// Raw-side attributes of one record plus its candidate matches.
#[derive(Clone, Debug, Default)]
#[allow(missing_docs)]
pub struct PageRecord {
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub design: Option<String>,
    pub redshift: Option<f64>,
    /// Canonical points within the pre-filter distance, in row order.
    pub candidates: Vec<CandidateRow>,
}

/// A canonical catalog point returned by the spatial pre-filter.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct CandidateRow {
    pub pgc: i64,
    pub ra: f64,
    pub dec: f64,
    pub design: Option<String>,
    pub redshift: Option<f64>,
}

/// Queries on the raw ingested tables.
impl LedaDb {
    /// Internal numeric id of a raw table, if the table exists.
    #[instrument(skip(self), err, level = "trace")]
    pub async fn table_id(&self, table_name: &str) -> Result<Option<i64>, DbError> {
        let row = sqlx::query(TABLE_ID_QUERY)
            .bind(table_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(row) => Some(row.try_get("id")?),
            None => None,
        })
    }

    /// Fetches one page of records with their candidates, ordered by record
    /// id ascending, starting after `last_id`.
    #[instrument(skip(self), err, level = "trace")]
    pub async fn fetch_crossmatch_page(
        &self,
        table_id: i64,
        last_id: &str,
        batch_size: i64,
        radius_deg: f64,
    ) -> Result<CrossmatchPage, DbError> {
        let mut page = CrossmatchPage::default();
        let mut rows = sqlx::query(BATCH_QUERY)
            .bind(table_id)
            .bind(last_id)
            .bind(batch_size)
            .bind(radius_deg)
            .fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            let record_id: String = row.try_get("record_id")?;
            page.last_id.clone_from(&record_id);
            let record = page.records.entry(record_id).or_default();
            if let (Some(ra), Some(dec)) = (
                row.try_get::<Option<f64>, _>("record_ra")?,
                row.try_get::<Option<f64>, _>("record_dec")?,
            ) {
                record.ra = Some(ra);
                record.dec = Some(dec);
            }
            if let Some(design) = row.try_get::<Option<String>, _>("record_design")? {
                record.design = Some(design);
            }
            if let Some(z) = row.try_get::<Option<f64>, _>("record_z")? {
                record.redshift = Some(z);
            }
            if let Some(pgc) = row.try_get::<Option<i64>, _>("candidate_pgc")? {
                if let (Some(ra), Some(dec)) = (
                    row.try_get::<Option<f64>, _>("candidate_ra")?,
                    row.try_get::<Option<f64>, _>("candidate_dec")?,
                ) {
                    record.candidates.push(CandidateRow {
                        pgc,
                        ra,
                        dec,
                        design: row.try_get("candidate_design")?,
                        redshift: row.try_get("candidate_z")?,
                    });
                }
            }
        }
        Ok(page)
    }

    /// Claimed PGCs asserted by the raw rows themselves, keyed by record id.
    /// Rows without a value are absent from the map.
    #[instrument(skip_all, err, level = "trace")]
    pub async fn claimed_pgcs(
        &self,
        table_name: &str,
        pgc_column: &str,
        record_ids: &[String],
    ) -> Result<HashMap<String, i64>, DbError> {
        let query = format!(
            "SELECT hyperleda_internal_id::text AS record_id, {column}::bigint AS claimed_pgc \
             FROM rawdata.{table} WHERE hyperleda_internal_id::text = ANY($1)",
            column = quote_ident(pgc_column),
            table = quote_ident(table_name),
        );
        let mut claimed = HashMap::new();
        let mut rows = sqlx::query(&query).bind(record_ids).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            if let Some(pgc) = row.try_get::<Option<i64>, _>("claimed_pgc")? {
                claimed.insert(row.try_get("record_id")?, pgc);
            }
        }
        Ok(claimed)
    }
}

/// Quotes a dynamic identifier for interpolation into a query. Bind
/// parameters cannot stand in for identifiers, so the raw table and the
/// claimed-PGC column go through this instead.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("pgc"), "\"pgc\"");
        assert_eq!(quote_ident("weird\"name"), "\"weird\"\"name\"");
    }
}
