mod args;
mod render;

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use sql_passthrough::Connection;
use sql_passthrough::driver::Driver;
use tracing::Level;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use crate::args::{Args, BackendKind, ShellPlan};
use crate::render::write_rows;

/// Logs go to stderr, and also to `path` when given; stdout carries only rows.
fn log_writer(path: Option<&Path>) -> io::Result<BoxMakeWriter> {
    Ok(match path {
        Some(path) => BoxMakeWriter::new(io::stderr.and(Mutex::new(File::create(path)?))),
        None => BoxMakeWriter::new(io::stderr),
    })
}

fn main() {
    let args = Args::parse();
    let writer = log_writer(args.log.as_deref()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let plan = ShellPlan::from_args(args).unwrap_or_else(|err| {
        tracing::error!("{err}");
        std::process::exit(2);
    });
    let plan_json = serde_json::to_string(&plan).unwrap_or_else(|_| "{}".to_string());
    tracing::debug!("plan: {}", plan_json);

    let result = match plan.backend {
        BackendKind::Sqlite => run_sqlite(&plan),
        BackendKind::Postgres => run_postgres(&plan),
    };
    if let Err(err) = result {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(feature = "sqlite")]
fn run_sqlite(plan: &ShellPlan) -> Result<(), String> {
    run::<sql_passthrough::sqlite::SqliteDriver>(plan)
}

#[cfg(not(feature = "sqlite"))]
fn run_sqlite(_plan: &ShellPlan) -> Result<(), String> {
    Err("built without the sqlite feature".to_string())
}

#[cfg(feature = "postgres")]
fn run_postgres(plan: &ShellPlan) -> Result<(), String> {
    run::<sql_passthrough::postgres::PostgresDriver>(plan)
}

#[cfg(not(feature = "postgres"))]
fn run_postgres(_plan: &ShellPlan) -> Result<(), String> {
    Err("built without the postgres feature".to_string())
}

fn run<D: Driver>(plan: &ShellPlan) -> Result<(), String> {
    let conn = Connection::<D>::try_open(&plan.config).map_err(|e| e.to_string())?;
    tracing::info!("connected ({})", conn.client_version());

    for sql in &plan.exec {
        conn.try_execute(sql).map_err(|e| format!("{sql}: {e}"))?;
        tracing::info!("executed: {sql}");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for sql in &plan.queries {
        let rows = write_rows(&conn, sql, &mut out)?;
        tracing::info!("{rows} row(s): {sql}");
    }

    conn.close().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[test]
    fn log_file_receives_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.log");
        let writer = log_writer(Some(&path)).unwrap();
        writer.make_writer().write_all(b"connected\n").unwrap();
        writer.make_writer().write_all(b"1 row(s)\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "connected\n1 row(s)\n");
    }
}
