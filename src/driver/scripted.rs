use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::cursor::{column_count, column_index};
use super::{Driver, Statement};
use crate::config::ConnectionConfig;
use crate::error::SqlPassthroughError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Null,
    /// A row holding this cell fails to fetch.
    FetchError,
}

/// Counters shared between a test and the statements it scripted.
#[derive(Debug, Clone, Default)]
pub(crate) struct Probe {
    pub(crate) fetches: Arc<AtomicUsize>,
    pub(crate) gets: Arc<AtomicUsize>,
    pub(crate) executed: Arc<Mutex<Vec<String>>>,
    pub(crate) statements_dropped: Arc<AtomicUsize>,
}

impl Probe {
    pub(crate) fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn statements_dropped(&self) -> usize {
        self.statements_dropped.load(Ordering::SeqCst)
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Driver answering fixed SQL texts with fixed results.
///
/// Any text containing `FAIL` is rejected; text containing `BROKEN_METADATA` yields a statement
/// whose column metadata cannot be read. Unknown queries return a cursor with no rows.
#[derive(Debug, Default)]
pub(crate) struct ScriptedDriver {
    results: HashMap<String, (Vec<String>, Vec<Vec<Cell>>)>,
    pub(crate) probe: Probe,
}

impl ScriptedDriver {
    pub(crate) fn with_result(mut self, sql: &str, columns: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        let columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.results.insert(sql.to_string(), (columns, rows));
        self
    }

    fn record(&self, sql: &str) {
        self.probe
            .executed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(sql.to_string());
    }
}

impl Driver for ScriptedDriver {
    type Statement = ScriptedStatement;

    fn connect(config: &ConnectionConfig) -> Result<Self, SqlPassthroughError> {
        if config.data_source == "unreachable" {
            return Err(SqlPassthroughError::ConnectionError(
                "scripted connect refused".to_string(),
            ));
        }
        Ok(Self::default())
    }

    fn exec_direct(&mut self, sql: &str) -> Result<(), SqlPassthroughError> {
        self.record(sql);
        if sql.contains("FAIL") {
            return Err(SqlPassthroughError::ExecutionError("scripted failure".to_string()));
        }
        Ok(())
    }

    fn open_cursor(&mut self, sql: &str) -> Result<ScriptedStatement, SqlPassthroughError> {
        self.record(sql);
        if sql.contains("FAIL") {
            return Err(SqlPassthroughError::ExecutionError("scripted failure".to_string()));
        }
        let (columns, rows) = self.results.get(sql).cloned().unwrap_or_default();
        Ok(ScriptedStatement {
            columns,
            pending: rows.into(),
            current: None,
            broken_metadata: sql.contains("BROKEN_METADATA"),
            probe: self.probe.clone(),
        })
    }

    fn last_insert_id(&self) -> u64 {
        42
    }

    fn client_version(&self) -> String {
        "scripted".to_string()
    }

    fn disconnect(self) -> Result<(), SqlPassthroughError> {
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedStatement {
    columns: Vec<String>,
    pending: VecDeque<Vec<Cell>>,
    current: Option<Vec<Cell>>,
    broken_metadata: bool,
    probe: Probe,
}

impl ScriptedStatement {
    fn cell(&self, ordinal: u16) -> Result<Cell, SqlPassthroughError> {
        self.probe.gets.fetch_add(1, Ordering::SeqCst);
        let idx = column_index(ordinal, self.columns.len())?;
        let row = self
            .current
            .as_ref()
            .ok_or(SqlPassthroughError::NoCurrentRow)?;
        row.get(idx)
            .cloned()
            .ok_or_else(|| SqlPassthroughError::conversion(ordinal, "short row"))
    }
}

impl Statement for ScriptedStatement {
    fn column_count(&self) -> Result<u16, SqlPassthroughError> {
        if self.broken_metadata {
            return Err(SqlPassthroughError::ExecutionError(
                "scripted metadata failure".to_string(),
            ));
        }
        column_count(&self.columns)
    }

    fn column_name(&self, ordinal: u16) -> Result<String, SqlPassthroughError> {
        let idx = column_index(ordinal, self.columns.len())?;
        Ok(self.columns[idx].clone())
    }

    fn fetch(&mut self) -> Result<bool, SqlPassthroughError> {
        self.probe.fetches.fetch_add(1, Ordering::SeqCst);
        self.current = self.pending.pop_front();
        let failed = self
            .current
            .as_ref()
            .is_some_and(|row| row.contains(&Cell::FetchError));
        if failed {
            self.current = None;
            self.pending.clear();
            return Err(SqlPassthroughError::ExecutionError(
                "scripted fetch failure".to_string(),
            ));
        }
        Ok(self.current.is_some())
    }

    fn get_i64(&self, ordinal: u16) -> Result<Option<i64>, SqlPassthroughError> {
        match self.cell(ordinal)? {
            Cell::Int(v) => Ok(Some(v)),
            Cell::Null => Ok(None),
            Cell::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| SqlPassthroughError::conversion(ordinal, format!("{e}"))),
            Cell::Bytes(_) | Cell::FetchError => {
                Err(SqlPassthroughError::conversion(ordinal, "binary to integer"))
            }
        }
    }

    fn get_text(&self, ordinal: u16) -> Result<Option<String>, SqlPassthroughError> {
        match self.cell(ordinal)? {
            Cell::Int(v) => Ok(Some(v.to_string())),
            Cell::Text(s) => Ok(Some(s)),
            Cell::Null => Ok(None),
            Cell::Bytes(_) | Cell::FetchError => {
                Err(SqlPassthroughError::conversion(ordinal, "binary to text"))
            }
        }
    }

    fn get_binary(&self, ordinal: u16) -> Result<Option<Vec<u8>>, SqlPassthroughError> {
        match self.cell(ordinal)? {
            Cell::Bytes(b) => Ok(Some(b)),
            Cell::Text(s) => Ok(Some(s.into_bytes())),
            Cell::Null => Ok(None),
            Cell::Int(_) | Cell::FetchError => {
                Err(SqlPassthroughError::conversion(ordinal, "integer to binary"))
            }
        }
    }
}

impl Drop for ScriptedStatement {
    fn drop(&mut self) {
        self.probe.statements_dropped.fetch_add(1, Ordering::SeqCst);
    }
}
