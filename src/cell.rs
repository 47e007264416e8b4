use crate::error::FerryError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type};
use tokio_postgres::Row;
use uuid::Uuid;

/// A single dynamically-typed column value.
///
/// Rows are discovered from result metadata at runtime, so values are
/// carried as a closed enum over the supported PostgreSQL types rather
/// than as statically-typed tuples.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    TimeStamp(NaiveDateTime),
    TimeStampTz(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl Cell {
    /// Decode one column of a fetched row, dispatching on the column's
    /// wire type from the result metadata.
    ///
    /// A column type outside the supported set fails extraction outright;
    /// silently coercing unknown types would corrupt the copy.
    pub fn from_row(row: &Row, idx: usize) -> Result<Cell, FerryError> {
        let column = &row.columns()[idx];
        let ty = column.type_();

        let cell = match *ty {
            Type::BOOL => decode::<bool>(row, idx)?.map_or(Cell::Null, Cell::Bool),
            Type::INT2 => decode::<i16>(row, idx)?.map_or(Cell::Null, Cell::I16),
            Type::INT4 => decode::<i32>(row, idx)?.map_or(Cell::Null, Cell::I32),
            Type::INT8 => decode::<i64>(row, idx)?.map_or(Cell::Null, Cell::I64),
            Type::FLOAT4 => decode::<f32>(row, idx)?.map_or(Cell::Null, Cell::F32),
            Type::FLOAT8 => decode::<f64>(row, idx)?.map_or(Cell::Null, Cell::F64),
            Type::BPCHAR | Type::VARCHAR | Type::NAME | Type::TEXT => {
                decode::<String>(row, idx)?.map_or(Cell::Null, Cell::String)
            }
            Type::DATE => decode::<NaiveDate>(row, idx)?.map_or(Cell::Null, Cell::Date),
            Type::TIME => decode::<NaiveTime>(row, idx)?.map_or(Cell::Null, Cell::Time),
            Type::TIMESTAMP => decode::<NaiveDateTime>(row, idx)?.map_or(Cell::Null, Cell::TimeStamp),
            Type::TIMESTAMPTZ => {
                decode::<DateTime<Utc>>(row, idx)?.map_or(Cell::Null, Cell::TimeStampTz)
            }
            Type::UUID => decode::<Uuid>(row, idx)?.map_or(Cell::Null, Cell::Uuid),
            Type::JSON | Type::JSONB => {
                decode::<serde_json::Value>(row, idx)?.map_or(Cell::Null, Cell::Json)
            }
            Type::BYTEA => decode::<Vec<u8>>(row, idx)?.map_or(Cell::Null, Cell::Bytes),
            _ => {
                return Err(FerryError::extraction(format!(
                    "Unsupported column type {} for column {}",
                    ty,
                    column.name()
                )))
            }
        };

        Ok(cell)
    }
}

fn decode<'a, T>(row: &'a Row, idx: usize) -> Result<Option<T>, FerryError>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx).map_err(|e| {
        FerryError::extraction(format!(
            "Failed to decode column {}: {}",
            row.columns()[idx].name(),
            e
        ))
    })
}

impl ToSql for Cell {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Cell::Null => Ok(IsNull::Yes),
            Cell::Bool(v) => v.to_sql(ty, out),
            Cell::I16(v) => v.to_sql(ty, out),
            Cell::I32(v) => v.to_sql(ty, out),
            Cell::I64(v) => v.to_sql(ty, out),
            Cell::F32(v) => v.to_sql(ty, out),
            Cell::F64(v) => v.to_sql(ty, out),
            Cell::String(v) => v.to_sql(ty, out),
            Cell::Date(v) => v.to_sql(ty, out),
            Cell::Time(v) => v.to_sql(ty, out),
            Cell::TimeStamp(v) => v.to_sql(ty, out),
            Cell::TimeStampTz(v) => v.to_sql(ty, out),
            Cell::Uuid(v) => v.to_sql(ty, out),
            Cell::Json(v) => v.to_sql(ty, out),
            Cell::Bytes(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The target column type is whatever the source column was; each
        // inner value enforces its own wire format on execution.
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(v) => write!(f, "{v}"),
            Cell::I16(v) => write!(f, "{v}"),
            Cell::I32(v) => write!(f, "{v}"),
            Cell::I64(v) => write!(f, "{v}"),
            Cell::F32(v) => write!(f, "{v}"),
            Cell::F64(v) => write!(f, "{v}"),
            Cell::String(v) => f.write_str(v),
            Cell::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Cell::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            Cell::TimeStamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Cell::TimeStampTz(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f%:z")),
            Cell::Uuid(v) => write!(f, "{v}"),
            Cell::Json(v) => write!(f, "{v}"),
            Cell::Bytes(v) => {
                write!(f, "\\x")?;
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_null_is_empty() {
        assert_eq!(Cell::Null.to_string(), "");
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(Cell::Bool(true).to_string(), "true");
        assert_eq!(Cell::I32(42).to_string(), "42");
        assert_eq!(Cell::I64(-7).to_string(), "-7");
        assert_eq!(Cell::F64(2.5).to_string(), "2.5");
        assert_eq!(Cell::String("héllo".into()).to_string(), "héllo");
    }

    #[test]
    fn test_display_temporal() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Cell::Date(date).to_string(), "2024-03-09");

        let ts = date.and_hms_opt(13, 5, 0).unwrap();
        assert_eq!(Cell::TimeStamp(ts).to_string(), "2024-03-09 13:05:00");
    }

    #[test]
    fn test_display_bytes_hex() {
        assert_eq!(Cell::Bytes(vec![0x00, 0xAB, 0xFF]).to_string(), "\\x00abff");
    }

    #[test]
    fn test_display_json() {
        let value = serde_json::json!({"k": 1});
        assert_eq!(Cell::Json(value).to_string(), "{\"k\":1}");
    }
}
