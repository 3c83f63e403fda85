use std::sync::mpsc::{Receiver, Sender};

use crate::error::SqlPassthroughError;

/// One fetch answer from the thread that owns the live statement.
pub(crate) type RowReply<R> = Result<Option<R>, SqlPassthroughError>;

/// 0-based index of a 1-based `ordinal` among `width` columns.
pub(crate) fn column_index(ordinal: u16, width: usize) -> Result<usize, SqlPassthroughError> {
    let idx = usize::from(ordinal);
    if idx == 0 || idx > width {
        return Err(SqlPassthroughError::conversion(
            ordinal,
            format!("ordinal out of range 1..={width}"),
        ));
    }
    Ok(idx - 1)
}

pub(crate) fn column_count(columns: &[String]) -> Result<u16, SqlPassthroughError> {
    u16::try_from(columns.len()).map_err(|_| {
        SqlPassthroughError::ExecutionError(format!("too many result columns: {}", columns.len()))
    })
}

/// Caller side of a statement that stays open on a worker thread.
///
/// Each [`advance`](Self::advance) asks the worker to step the statement once and holds only that
/// row. Dropping the cursor hangs up the request channel, which is the worker's signal to finalize
/// the statement.
#[derive(Debug)]
pub(crate) struct RemoteCursor<R> {
    columns: Vec<String>,
    requests: Sender<()>,
    replies: Receiver<RowReply<R>>,
    current: Option<R>,
    finished: bool,
}

impl<R> RemoteCursor<R> {
    pub(crate) fn new(columns: Vec<String>, requests: Sender<()>, replies: Receiver<RowReply<R>>) -> Self {
        Self {
            columns,
            requests,
            replies,
            current: None,
            finished: false,
        }
    }

    pub(crate) fn column_count(&self) -> Result<u16, SqlPassthroughError> {
        column_count(&self.columns)
    }

    pub(crate) fn column_name(&self, ordinal: u16) -> Result<String, SqlPassthroughError> {
        let idx = column_index(ordinal, self.columns.len())?;
        Ok(self.columns[idx].clone())
    }

    /// Step to the next row. Once the end or an error has been reported the cursor stays finished.
    pub(crate) fn advance(&mut self) -> Result<bool, SqlPassthroughError> {
        self.current = None;
        if self.finished {
            return Ok(false);
        }

        let reply = self
            .requests
            .send(())
            .ok()
            .and_then(|()| self.replies.recv().ok());
        match reply {
            Some(Ok(Some(row))) => {
                self.current = Some(row);
                Ok(true)
            }
            Some(Ok(None)) => {
                self.finished = true;
                Ok(false)
            }
            Some(Err(e)) => {
                self.finished = true;
                Err(e)
            }
            None => {
                self.finished = true;
                Err(SqlPassthroughError::ConnectionError(
                    "worker stopped while fetching".to_string(),
                ))
            }
        }
    }

    /// The current row and the 0-based index for `ordinal`.
    pub(crate) fn current(&self, ordinal: u16) -> Result<(&R, usize), SqlPassthroughError> {
        let idx = column_index(ordinal, self.columns.len())?;
        let row = self
            .current
            .as_ref()
            .ok_or(SqlPassthroughError::NoCurrentRow)?;
        Ok((row, idx))
    }
}

/// Worker side of a [`RemoteCursor`].
pub(crate) struct CursorTask<R> {
    pub(crate) opened: Sender<Result<Vec<String>, SqlPassthroughError>>,
    pub(crate) requests: Receiver<()>,
    pub(crate) replies: Sender<RowReply<R>>,
}

impl<R> CursorTask<R> {
    /// Report that the statement could not be prepared or started.
    pub(crate) fn fail(self, err: SqlPassthroughError) {
        let _ = self.opened.send(Err(err));
    }

    /// Announce the columns, then answer each fetch request with one `step` until the statement
    /// ends, fails, or the caller drops its cursor.
    pub(crate) fn serve(self, columns: Vec<String>, mut step: impl FnMut() -> RowReply<R>) {
        if self.opened.send(Ok(columns)).is_err() {
            return;
        }
        while self.requests.recv().is_ok() {
            let reply = step();
            let more = matches!(reply, Ok(Some(_)));
            if self.replies.send(reply).is_err() || !more {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    fn spawn_cursor(steps: Vec<RowReply<i64>>) -> RemoteCursor<i64> {
        let (opened_tx, opened_rx) = mpsc::channel();
        let (request_tx, request_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        let task = CursorTask {
            opened: opened_tx,
            requests: request_rx,
            replies: reply_tx,
        };
        thread::spawn(move || {
            let mut steps = steps.into_iter();
            task.serve(vec!["id".to_string()], || steps.next().unwrap_or(Ok(None)));
        });
        let columns = opened_rx.recv().unwrap().unwrap();
        RemoteCursor::new(columns, request_tx, reply_rx)
    }

    #[test]
    fn walks_rows_in_order() {
        let mut cursor = spawn_cursor(vec![Ok(Some(10)), Ok(Some(20))]);
        assert!(matches!(cursor.current(1), Err(SqlPassthroughError::NoCurrentRow)));
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.current(1).unwrap(), (&10, 0));
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.current(1).unwrap(), (&20, 0));
        assert!(!cursor.advance().unwrap());
        assert!(cursor.current(1).is_err());
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn error_on_later_row_keeps_earlier_rows() {
        let mut cursor = spawn_cursor(vec![
            Ok(Some(1)),
            Err(SqlPassthroughError::ExecutionError("overflow".to_string())),
            Ok(Some(3)),
        ]);
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.current(1).unwrap().0, &1);
        assert!(matches!(
            cursor.advance(),
            Err(SqlPassthroughError::ExecutionError(_))
        ));
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn ordinals_are_one_based() {
        let cursor = spawn_cursor(Vec::new());
        assert_eq!(cursor.column_count().unwrap(), 1);
        assert_eq!(cursor.column_name(1).unwrap(), "id");
        assert!(cursor.column_name(0).is_err());
        assert!(cursor.column_name(2).is_err());
    }
}
