use crate::cell::Cell;
use crate::config::TableJob;
use crate::connection::ConnectionProvider;
use crate::error::FerryError;
use crate::pipeline::sql;
use tracing::debug;

/// Column names plus row values read from one source table.
///
/// Column order follows the source schema; every row has one cell per
/// column. The set lives only for the duration of one table job.
pub struct ExtractedRowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Reads bounded row samples from the source database.
pub struct Extractor<'a> {
    provider: &'a ConnectionProvider,
    schema: String,
}

impl<'a> Extractor<'a> {
    pub fn new(provider: &'a ConnectionProvider, schema: impl Into<String>) -> Self {
        Self {
            provider,
            schema: schema.into(),
        }
    }

    /// Read up to `row_limit` rows of the job's source table.
    ///
    /// Column names come from the prepared statement's result metadata, so
    /// any table works without a configured column list, including when it
    /// holds no rows. The connection is scoped to this call and dropped on
    /// every exit path.
    pub async fn extract(&self, job: &TableJob) -> Result<ExtractedRowSet, FerryError> {
        let client = self.provider.open_source().await?;

        let query = format!(
            "SELECT * FROM {} LIMIT $1",
            sql::qualify(&self.schema, &job.source_table)?
        );
        let statement = client.prepare(&query).await.map_err(|e| {
            FerryError::extraction(format!(
                "Failed to prepare read of table {}: {}",
                job.source_table, e
            ))
        })?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let fetched = client
            .query(&statement, &[&i64::from(job.row_limit)])
            .await
            .map_err(|e| {
                FerryError::extraction(format!("Failed to read table {}: {}", job.source_table, e))
            })?;

        let mut rows = Vec::with_capacity(fetched.len());
        for row in &fetched {
            let cells = (0..row.len())
                .map(|idx| Cell::from_row(row, idx))
                .collect::<Result<Vec<Cell>, FerryError>>()?;
            rows.push(cells);
        }

        debug!(
            "Extracted {} rows x {} columns from {}",
            rows.len(),
            columns.len(),
            job.source_table
        );

        Ok(ExtractedRowSet { columns, rows })
    }
}
