use std::io::Write;

use serde_json::{Map, Value};
use sql_passthrough::driver::Driver;
use sql_passthrough::{Connection, ResultRow};

/// One JSON object per row: column name to text value, NULL as `null`.
pub(crate) fn row_to_json<D: Driver>(row: &ResultRow<'_, D>) -> Value {
    let mut object = Map::new();
    for name in row.column_names() {
        let value = match row.try_get_string(name) {
            Ok(Some(text)) => Value::String(text),
            Ok(None) => Value::Null,
            Err(e) => {
                tracing::warn!("column {name}: {e}");
                Value::Null
            }
        };
        object.insert(name.clone(), value);
    }
    Value::Object(object)
}

/// Run `sql` and write every row as a JSON line; returns the number of rows written.
pub(crate) fn write_rows<D: Driver, W: Write>(
    conn: &Connection<D>,
    sql: &str,
    out: &mut W,
) -> Result<usize, String> {
    let Some(mut row) = conn.try_query(sql).map_err(|e| format!("{sql}: {e}"))? else {
        return Ok(0);
    };

    let mut count = 0;
    loop {
        writeln!(out, "{}", row_to_json(&row)).map_err(|e| e.to_string())?;
        count += 1;
        if !row.try_next().map_err(|e| format!("{sql}: {e}"))? {
            break;
        }
    }
    Ok(count)
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use sql_passthrough::ConnectionConfig;
    use sql_passthrough::sqlite::SqliteConnection;

    #[test]
    fn writes_json_lines() {
        let conn = SqliteConnection::open(&ConnectionConfig::builder(":memory:".into()).finish());
        assert!(conn.execute("CREATE TABLE `p` (`id` INTEGER, `name` TEXT)"));
        assert!(conn.execute("INSERT INTO `p` VALUES (1, 'O''Brien'), (2, NULL)"));

        let mut out = Vec::new();
        let count = write_rows(&conn, "SELECT `id`, `name` FROM `p` ORDER BY `id`", &mut out).unwrap();
        assert_eq!(count, 2);

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines[0], serde_json::json!({ "id": "1", "name": "O'Brien" }));
        assert_eq!(lines[1], serde_json::json!({ "id": "2", "name": null }));
    }

    #[test]
    fn empty_result_writes_nothing() {
        let conn = SqliteConnection::open(&ConnectionConfig::builder(":memory:".into()).finish());
        assert!(conn.execute("CREATE TABLE `p` (`id` INTEGER)"));
        let mut out = Vec::new();
        assert_eq!(write_rows(&conn, "SELECT `id` FROM `p`", &mut out).unwrap(), 0);
        assert!(out.is_empty());
        assert!(write_rows(&conn, "SELECT * FROM `missing`", &mut out).is_err());
    }
}
