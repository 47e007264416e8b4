use crate::config::{SyncSettings, TableJob};
use crate::connection::{ConnectionProvider, ServerVersion};
use crate::error::FerryError;
use crate::pipeline::extractor::{ExtractedRowSet, Extractor};
use crate::pipeline::loader::Loader;
use crate::pipeline::sink::CsvSink;
use crate::pipeline::transformer;
use tracing::{error, info, warn};

/// Terminal state of one table job.
#[derive(Debug)]
pub enum JobOutcome {
    /// Source table had no rows; no artifacts were produced.
    Empty,
    /// Rows were committed to the target table. The CSV mirror may still
    /// have failed on its own; the two side effects are independent.
    Loaded {
        rows_written: u64,
        sink_error: Option<FerryError>,
    },
    /// The job failed; nothing was committed to the target.
    Failed { error: FerryError },
}

/// One processed job and how it ended.
#[derive(Debug)]
pub struct JobReport {
    pub job: TableJob,
    pub outcome: JobOutcome,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub server_version: ServerVersion,
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    pub fn loaded_count(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Loaded { .. }))
    }

    pub fn empty_count(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Empty))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Failed { .. }))
    }

    pub fn is_successful(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} tables loaded, {} empty, {} failed",
            self.loaded_count(),
            self.jobs.len(),
            self.empty_count(),
            self.failed_count()
        )
    }

    fn count(&self, predicate: impl Fn(&JobOutcome) -> bool) -> usize {
        self.jobs.iter().filter(|j| predicate(&j.outcome)).count()
    }
}

/// Drives the run: one connectivity probe, then the configured jobs in
/// order, each isolated from the others' failures.
pub struct Orchestrator {
    provider: ConnectionProvider,
    settings: SyncSettings,
}

impl Orchestrator {
    pub fn new(settings: SyncSettings) -> Self {
        let provider = ConnectionProvider::new(settings.source.clone(), settings.target.clone());
        Self { provider, settings }
    }

    /// Run every configured job to completion.
    ///
    /// Returns `Err` only when the startup probe fails, before any table
    /// is touched. Per-job failures are caught at the job boundary,
    /// logged with the job identifier, and recorded in the report; the
    /// loop always reaches the remaining jobs.
    pub async fn run(&self) -> Result<RunReport, FerryError> {
        let server_version = self.provider.probe_source().await?;
        info!("Database connectivity confirmed: {}", server_version);

        let extractor = Extractor::new(&self.provider, self.settings.schema.clone());
        let loader = Loader::new(&self.provider);
        let sink = CsvSink::new(self.settings.output_dir.clone());

        let mut jobs = Vec::with_capacity(self.settings.jobs.len());
        for job in &self.settings.jobs {
            info!("Processing table: {}", job.source_table);
            let outcome = match self.process_job(&extractor, &loader, &sink, job).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    error!("Failed to process table {}: {}", job.source_table, error);
                    JobOutcome::Failed { error }
                }
            };
            jobs.push(JobReport {
                job: job.clone(),
                outcome,
            });
        }

        let report = RunReport {
            server_version,
            jobs,
        };
        if report.is_successful() {
            info!("Run finished: {}", report.summary());
        } else {
            warn!("Run finished with failures: {}", report.summary());
        }
        Ok(report)
    }

    async fn process_job(
        &self,
        extractor: &Extractor<'_>,
        loader: &Loader<'_>,
        sink: &CsvSink,
        job: &TableJob,
    ) -> Result<JobOutcome, FerryError> {
        let ExtractedRowSet { columns, rows } = extractor.extract(job).await?;

        if rows.is_empty() {
            warn!("Table {} returned no rows, skipping", job.source_table);
            return Ok(JobOutcome::Empty);
        }

        // The CSV mirrors what was extracted, not what gets loaded, and its
        // failure does not stop the load.
        let sink_error = match sink.write(&job.source_table, &columns, &rows) {
            Ok(path) => {
                info!("Wrote {} rows to {}", rows.len(), path.display());
                None
            }
            Err(e) => {
                error!("Failed to write CSV for table {}: {}", job.source_table, e);
                Some(e)
            }
        };

        let (load_columns, load_rows) = if self.settings.apply_transform {
            // Transformed rows keep only the first two fields, so the
            // column list handed to the loader shrinks to match.
            let transformed = transformer::increment_second_field(&rows)?;
            let load_columns: Vec<String> = columns.iter().take(2).cloned().collect();
            (load_columns, transformed)
        } else {
            (columns, rows)
        };

        let rows_written = loader
            .load(&job.target_table, &load_columns, &load_rows)
            .await?;
        info!(
            "Wrote {} rows into target table {}",
            rows_written, job.target_table
        );

        Ok(JobOutcome::Loaded {
            rows_written,
            sink_error,
        })
    }
}
