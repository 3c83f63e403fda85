use postgres::Row;
use postgres::types::{FromSql, Type};

use crate::driver::Statement;
use crate::driver::cursor::RemoteCursor;
use crate::error::SqlPassthroughError;

/// Executed Postgres statement, stepped on the connection's worker thread.
///
/// Value conversion follows the column type each row carries.
#[derive(Debug)]
pub struct PostgresStatement {
    cursor: RemoteCursor<Row>,
}

impl PostgresStatement {
    pub(crate) fn new(cursor: RemoteCursor<Row>) -> Self {
        Self { cursor }
    }

    fn cell(&self, ordinal: u16) -> Result<(&Row, usize, &Type), SqlPassthroughError> {
        let (row, idx) = self.cursor.current(ordinal)?;
        let ty = row
            .columns()
            .get(idx)
            .map(|col| col.type_())
            .ok_or_else(|| SqlPassthroughError::conversion(ordinal, "missing column type"))?;
        Ok((row, idx, ty))
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<Option<T>, SqlPassthroughError> {
    Ok(row.try_get::<_, Option<T>>(idx)?)
}

fn is_text(ty: &Type) -> bool {
    [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty)
}

fn unsupported(ordinal: u16, ty: &Type, target: &str) -> SqlPassthroughError {
    SqlPassthroughError::conversion(ordinal, format!("column type {ty} cannot be read as {target}"))
}

impl Statement for PostgresStatement {
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
        let (row, idx, ty) = self.cell(ordinal)?;
        if *ty == Type::INT2 {
            Ok(get::<i16>(row, idx)?.map(i64::from))
        } else if *ty == Type::INT4 {
            Ok(get::<i32>(row, idx)?.map(i64::from))
        } else if *ty == Type::INT8 {
            get::<i64>(row, idx)
        } else if *ty == Type::OID {
            Ok(get::<u32>(row, idx)?.map(i64::from))
        } else if *ty == Type::BOOL {
            Ok(get::<bool>(row, idx)?.map(i64::from))
        } else if is_text(ty) {
            match get::<String>(row, idx)? {
                None => Ok(None),
                Some(s) => s.trim().parse::<i64>().map(Some).map_err(|e| {
                    SqlPassthroughError::conversion(
                        ordinal,
                        format!("text {s:?} is not an integer: {e}"),
                    )
                }),
            }
        } else {
            Err(unsupported(ordinal, ty, "integer"))
        }
    }

    fn get_text(&self, ordinal: u16) -> Result<Option<String>, SqlPassthroughError> {
        let (row, idx, ty) = self.cell(ordinal)?;
        if is_text(ty) {
            get::<String>(row, idx)
        } else if *ty == Type::BOOL {
            Ok(get::<bool>(row, idx)?.map(|b| if b { "1" } else { "0" }.to_string()))
        } else if *ty == Type::FLOAT4 {
            Ok(get::<f32>(row, idx)?.map(|v| v.to_string()))
        } else if *ty == Type::FLOAT8 {
            Ok(get::<f64>(row, idx)?.map(|v| v.to_string()))
        } else if *ty == Type::BYTEA {
            match get::<Vec<u8>>(row, idx)? {
                None => Ok(None),
                Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                    SqlPassthroughError::conversion(ordinal, format!("bytea is not UTF-8: {e}"))
                }),
            }
        } else {
            self.get_i64(ordinal)
                .map(|v| v.map(|n| n.to_string()))
                .map_err(|_| unsupported(ordinal, ty, "text"))
        }
    }

    fn get_binary(&self, ordinal: u16) -> Result<Option<Vec<u8>>, SqlPassthroughError> {
        let (row, idx, ty) = self.cell(ordinal)?;
        if *ty == Type::BYTEA {
            get::<Vec<u8>>(row, idx)
        } else if is_text(ty) {
            Ok(get::<String>(row, idx)?.map(String::into_bytes))
        } else {
            Err(unsupported(ordinal, ty, "binary"))
        }
    }
}
