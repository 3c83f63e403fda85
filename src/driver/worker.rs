use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::cursor::{CursorTask, RemoteCursor};
use crate::error::SqlPassthroughError;

/// A native client connection driven from its own thread.
///
/// Live statements borrow the native connection, so they are kept on the worker's stack while
/// the caller steps them through a [`RemoteCursor`].
pub(crate) trait Session: Send + 'static {
    type Row: Send + 'static;

    fn execute(&mut self, sql: &str) -> Result<(), SqlPassthroughError>;

    /// Prepare `sql` and serve its rows through `cursor` until the caller hangs up.
    fn stream(&mut self, sql: &str, cursor: CursorTask<Self::Row>);

    fn last_insert_id(&self) -> u64 {
        0
    }

    fn close(self) -> Result<(), SqlPassthroughError>;
}

enum Command<R> {
    Execute {
        sql: String,
        respond_to: Sender<Result<(), SqlPassthroughError>>,
    },
    Query {
        sql: String,
        cursor: CursorTask<R>,
    },
    LastInsertId {
        respond_to: Sender<u64>,
    },
    Close {
        respond_to: Sender<Result<(), SqlPassthroughError>>,
    },
}

/// Handle to the thread owning one [`Session`].
///
/// Dropping the handle without [`close`](Self::close) hangs up the command channel; the worker
/// then drops its session.
#[derive(Debug)]
pub(crate) struct Worker<R> {
    sender: Sender<Command<R>>,
    handle: JoinHandle<()>,
}

impl<R> std::fmt::Debug for Command<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Execute { sql, .. } => write!(f, "Execute({sql})"),
            Command::Query { sql, .. } => write!(f, "Query({sql})"),
            Command::LastInsertId { .. } => f.write_str("LastInsertId"),
            Command::Close { .. } => f.write_str("Close"),
        }
    }
}

impl<R: Send + 'static> Worker<R> {
    pub(crate) fn spawn<S>(name: &str, session: S) -> Result<Self, SqlPassthroughError>
    where
        S: Session<Row = R>,
    {
        let (sender, receiver) = mpsc::channel::<Command<R>>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_worker(session, &receiver))
            .map_err(|err| {
                SqlPassthroughError::ConnectionError(format!(
                    "failed to spawn worker thread {name}: {err}"
                ))
            })?;
        Ok(Self { sender, handle })
    }

    fn send_command(&self, command: Command<R>) -> Result<(), SqlPassthroughError> {
        self.sender
            .send(command)
            .map_err(|_| SqlPassthroughError::ConnectionError("worker closed".into()))
    }

    fn dropped(during: &str) -> SqlPassthroughError {
        SqlPassthroughError::ConnectionError(format!("worker dropped while {during}"))
    }

    pub(crate) fn execute(&self, sql: &str) -> Result<(), SqlPassthroughError> {
        let (tx, rx) = mpsc::channel();
        self.send_command(Command::Execute {
            sql: sql.to_string(),
            respond_to: tx,
        })?;
        rx.recv().map_err(|_| Self::dropped("executing"))?
    }

    /// Start `sql` on the worker; the returned cursor is positioned before the first row.
    pub(crate) fn query(&self, sql: &str) -> Result<RemoteCursor<R>, SqlPassthroughError> {
        let (opened_tx, opened_rx) = mpsc::channel();
        let (request_tx, request_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send_command(Command::Query {
            sql: sql.to_string(),
            cursor: CursorTask {
                opened: opened_tx,
                requests: request_rx,
                replies: reply_tx,
            },
        })?;
        let columns = opened_rx.recv().map_err(|_| Self::dropped("opening a cursor"))??;
        Ok(RemoteCursor::new(columns, request_tx, reply_rx))
    }

    pub(crate) fn last_insert_id(&self) -> u64 {
        let (tx, rx) = mpsc::channel();
        if self
            .send_command(Command::LastInsertId { respond_to: tx })
            .is_err()
        {
            return 0;
        }
        rx.recv().unwrap_or_default()
    }

    /// Close the session and wait for the worker thread to exit.
    pub(crate) fn close(self) -> Result<(), SqlPassthroughError> {
        let (tx, rx) = mpsc::channel();
        self.send_command(Command::Close { respond_to: tx })?;
        let outcome = rx.recv().map_err(|_| Self::dropped("closing"))?;
        if self.handle.join().is_err() {
            tracing::warn!("worker thread panicked while closing");
        }
        outcome
    }
}

fn run_worker<S: Session>(mut session: S, receiver: &Receiver<Command<S::Row>>) {
    while let Ok(command) = receiver.recv() {
        tracing::trace!("worker command {command:?}");
        match command {
            Command::Execute { sql, respond_to } => {
                let _ = respond_to.send(session.execute(&sql));
            }
            Command::Query { sql, cursor } => session.stream(&sql, cursor),
            Command::LastInsertId { respond_to } => {
                let _ = respond_to.send(session.last_insert_id());
            }
            Command::Close { respond_to } => {
                let _ = respond_to.send(session.close());
                return;
            }
        }
    }
}
