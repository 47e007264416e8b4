use crate::cell::Cell;
use crate::connection::ConnectionProvider;
use crate::error::FerryError;
use crate::pipeline::sql;
use tokio_postgres::types::ToSql;
use tracing::debug;

/// Batch-inserts rows into the target database.
pub struct Loader<'a> {
    provider: &'a ConnectionProvider,
}

impl<'a> Loader<'a> {
    pub fn new(provider: &'a ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Insert all rows into `table` as one parameterized batch.
    ///
    /// The statement's column list and placeholder grid are built from the
    /// runtime column set; values are bound as parameters, never spliced
    /// into the SQL text. The batch executes inside a single transaction:
    /// either every row commits or none does. Dropping the transaction on
    /// an error path rolls it back, and the connection is scoped to this
    /// call either way.
    pub async fn load(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Cell>],
    ) -> Result<u64, FerryError> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(FerryError::load(format!(
                    "Row {} has {} values but the column list has {}",
                    idx,
                    row.len(),
                    columns.len()
                )));
            }
        }

        let statement_text = sql::build_insert(table, columns, rows.len())?;

        let mut client = self.provider.open_target().await?;
        let transaction = client
            .transaction()
            .await
            .map_err(|e| FerryError::load(format!("Failed to begin transaction: {e}")))?;

        let statement = transaction.prepare(&statement_text).await.map_err(|e| {
            FerryError::load(format!("Failed to prepare insert into {table}: {e}"))
        })?;

        let parameters: Vec<&(dyn ToSql + Sync)> = rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|cell| cell as &(dyn ToSql + Sync))
            .collect();

        let rows_written = transaction
            .execute(&statement, &parameters)
            .await
            .map_err(|e| FerryError::load(format!("Failed to insert into {table}: {e}")))?;

        transaction
            .commit()
            .await
            .map_err(|e| FerryError::load(format!("Failed to commit insert into {table}: {e}")))?;

        debug!("Committed {} rows into {}", rows_written, table);
        Ok(rows_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionDescriptor;

    fn offline_provider() -> ConnectionProvider {
        let descriptor = ConnectionDescriptor {
            host: "localhost".into(),
            port: 5432,
            user: "ferry".into(),
            password: "ferry".into(),
            database: "ferry".into(),
        };
        ConnectionProvider::new(descriptor.clone(), descriptor)
    }

    #[tokio::test]
    async fn test_arity_mismatch_fails_before_connecting() {
        let provider = offline_provider();
        let loader = Loader::new(&provider);

        let columns = vec!["id".to_string(), "value".to_string()];
        let rows = vec![vec![Cell::I32(1)]];

        let err = loader.load("t", &columns, &rows).await.unwrap_err();
        assert!(matches!(err, FerryError::Load { .. }));
        assert!(err.to_string().contains("1 values"));
    }

    #[tokio::test]
    async fn test_empty_column_list_fails_before_connecting() {
        let provider = offline_provider();
        let loader = Loader::new(&provider);

        let err = loader.load("t", &[], &[vec![]]).await.unwrap_err();
        assert!(matches!(err, FerryError::Load { .. }));
    }
}
