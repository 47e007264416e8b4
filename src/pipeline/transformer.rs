use crate::cell::Cell;
use crate::error::FerryError;

/// Reference per-row transform: keep the first field as the identifier,
/// replace the second with its numeric value incremented by one, drop the
/// rest.
///
/// Pure and total over well-formed input: empty input yields empty output,
/// and the row count is always preserved. A row with fewer than two fields,
/// a non-numeric second field, or an increment that would overflow fails
/// the whole transform with no partial output.
pub fn increment_second_field(rows: &[Vec<Cell>]) -> Result<Vec<Vec<Cell>>, FerryError> {
    let mut transformed = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        if row.len() < 2 {
            return Err(FerryError::transform(format!(
                "Row {} has {} fields, transform requires at least 2",
                idx,
                row.len()
            )));
        }

        let incremented = match &row[1] {
            Cell::I16(v) => v.checked_add(1).map(Cell::I16),
            Cell::I32(v) => v.checked_add(1).map(Cell::I32),
            Cell::I64(v) => v.checked_add(1).map(Cell::I64),
            Cell::F32(v) => Some(Cell::F32(v + 1.0)),
            Cell::F64(v) => Some(Cell::F64(v + 1.0)),
            other => {
                return Err(FerryError::transform(format!(
                    "Row {idx} has a non-numeric second field: {other:?}"
                )))
            }
        };

        let incremented = incremented.ok_or_else(|| {
            FerryError::transform(format!("Row {idx} overflows when incremented"))
        })?;

        transformed.push(vec![row[0].clone(), incremented]);
    }

    Ok(transformed)
}
