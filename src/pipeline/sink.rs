use crate::cell::Cell;
use crate::error::FerryError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// UTF-8 byte order mark; Excel needs it to detect the encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Mirrors extracted rows to one CSV artifact per table.
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write `<output_dir>/<table>.csv`: header record first, then data
    /// rows in input order.
    pub fn write(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Cell>],
    ) -> Result<PathBuf, FerryError> {
        let path = self.output_dir.join(format!("{table}.csv"));
        write_csv(&path, columns, rows)?;
        debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }
}

fn write_csv(path: &Path, columns: &[String], rows: &[Vec<Cell>]) -> Result<(), FerryError> {
    let mut file = File::create(path)
        .map_err(|e| FerryError::sink(format!("Failed to create {}: {}", path.display(), e)))?;
    file.write_all(UTF8_BOM)
        .map_err(|e| FerryError::sink(format!("Failed to write {}: {}", path.display(), e)))?;

    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(columns)
        .map_err(|e| FerryError::sink(format!("Failed to write {}: {}", path.display(), e)))?;
    for row in rows {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(|e| FerryError::sink(format!("Failed to write {}: {}", path.display(), e)))?;
    }
    writer
        .flush()
        .map_err(|e| FerryError::sink(format!("Failed to flush {}: {}", path.display(), e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_artifact_starts_with_bom() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::new(dir.path());

        let path = sink.write("t", &columns(&["id"]), &[vec![Cell::I32(1)]]).unwrap();

        let bytes = fs::read(path).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);
    }

    #[test]
    fn test_header_then_rows_in_order() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::new(dir.path());

        let rows = vec![
            vec![Cell::I32(1), Cell::I32(10)],
            vec![Cell::I32(2), Cell::I32(20)],
        ];
        let path = sink.write("activity_day", &columns(&["id", "value"]), &rows).unwrap();

        assert!(path.ends_with("activity_day.csv"));
        let content = fs::read_to_string(&path).unwrap();
        let content = content.trim_start_matches('\u{feff}');
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["id,value", "1,10", "2,20"]);
    }

    #[test]
    fn test_non_ascii_round_trips() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::new(dir.path());

        let rows = vec![vec![Cell::String("高雄".into()), Cell::String("café".into())]];
        let path = sink.write("places", &columns(&["city", "venue"]), &rows).unwrap();

        let bytes = fs::read(&path).unwrap();
        let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "高雄");
        assert_eq!(&record[1], "café");
    }

    #[test]
    fn test_null_renders_empty() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::new(dir.path());

        let rows = vec![vec![Cell::I32(1), Cell::Null]];
        let path = sink.write("t", &columns(&["id", "note"]), &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("1,\n") || content.ends_with("1,"));
    }

    #[test]
    fn test_missing_directory_is_sink_error() {
        let sink = CsvSink::new("/nonexistent/dbferry-test");
        let err = sink.write("t", &columns(&["id"]), &[]).unwrap_err();
        assert!(matches!(err, FerryError::Sink { .. }));
    }
}
