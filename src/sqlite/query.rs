use rusqlite::types::Value;

use crate::driver::Statement;
use crate::driver::cursor::RemoteCursor;
use crate::error::SqlPassthroughError;

/// Executed `SQLite` statement, stepped on the connection's worker thread.
#[derive(Debug)]
pub struct SqliteStatement {
    cursor: RemoteCursor<Vec<Value>>,
}

impl SqliteStatement {
    pub(crate) fn new(cursor: RemoteCursor<Vec<Value>>) -> Self {
        Self { cursor }
    }

    fn value(&self, ordinal: u16) -> Result<&Value, SqlPassthroughError> {
        let (row, idx) = self.cursor.current(ordinal)?;
        row.get(idx)
            .ok_or_else(|| SqlPassthroughError::conversion(ordinal, "short row"))
    }
}

impl Statement for SqliteStatement {
    fn column_count(&self) -> Result<u16, SqlPassthroughError> {
        self.cursor.column_count()
    }

    fn column_name(&self, ordinal: u16) -> Result<String, SqlPassthroughError> {
        self.cursor.column_name(ordinal)
    }

    fn fetch(&mut self) -> Result<bool, SqlPassthroughError> {
        self.cursor.advance()
    }

    fn get_i64(&self, ordinal: u16) -> Result<Option<i64>, SqlPassthroughError> {
        sqlite_value_to_i64(self.value(ordinal)?, ordinal)
    }

    fn get_text(&self, ordinal: u16) -> Result<Option<String>, SqlPassthroughError> {
        sqlite_value_to_text(self.value(ordinal)?, ordinal)
    }

    fn get_binary(&self, ordinal: u16) -> Result<Option<Vec<u8>>, SqlPassthroughError> {
        sqlite_value_to_binary(self.value(ordinal)?, ordinal)
    }
}

/// Integer view of a `SQLite` value: REAL is truncated, TEXT must parse as an integer.
///
/// # Errors
/// Returns `SqlPassthroughError::ConversionError` for BLOBs, non-numeric text, and reals outside
/// the `i64` range.
pub fn sqlite_value_to_i64(value: &Value, ordinal: u16) -> Result<Option<i64>, SqlPassthroughError> {
    match value {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(*i)),
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        Value::Real(f) => {
            if f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Ok(Some(f.trunc() as i64))
            } else {
                Err(SqlPassthroughError::conversion(
                    ordinal,
                    format!("real {f} out of integer range"),
                ))
            }
        }
        Value::Text(s) => s.trim().parse::<i64>().map(Some).map_err(|e| {
            SqlPassthroughError::conversion(ordinal, format!("text {s:?} is not an integer: {e}"))
        }),
        Value::Blob(_) => Err(SqlPassthroughError::conversion(
            ordinal,
            "blob cannot be read as integer",
        )),
    }
}

/// Text view of a `SQLite` value: numbers are rendered, BLOBs must be UTF-8.
///
/// # Errors
/// Returns `SqlPassthroughError::ConversionError` for BLOBs that are not valid UTF-8.
pub fn sqlite_value_to_text(value: &Value, ordinal: u16) -> Result<Option<String>, SqlPassthroughError> {
    match value {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(i.to_string())),
        Value::Real(f) => Ok(Some(f.to_string())),
        Value::Text(s) => Ok(Some(s.clone())),
        Value::Blob(b) => String::from_utf8(b.clone()).map(Some).map_err(|e| {
            SqlPassthroughError::conversion(ordinal, format!("blob is not UTF-8: {e}"))
        }),
    }
}

/// Byte view of a `SQLite` value: BLOB and TEXT only.
///
/// # Errors
/// Returns `SqlPassthroughError::ConversionError` for numeric values.
pub fn sqlite_value_to_binary(
    value: &Value,
    ordinal: u16,
) -> Result<Option<Vec<u8>>, SqlPassthroughError> {
    match value {
        Value::Null => Ok(None),
        Value::Blob(b) => Ok(Some(b.clone())),
        Value::Text(s) => Ok(Some(s.as_bytes().to_vec())),
        Value::Integer(_) | Value::Real(_) => Err(SqlPassthroughError::conversion(
            ordinal,
            "numeric value cannot be read as binary",
        )),
    }
}
