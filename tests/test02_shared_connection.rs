#![cfg(feature = "sqlite")]
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use sql_passthrough::prelude::*;

fn shared_connection() -> Arc<SqliteConnection> {
    let config = ConnectionConfig::builder(":memory:".to_string()).finish();
    let conn = SqliteConnection::open(&config);
    assert!(conn.execute("CREATE TABLE `events` (`id` INTEGER PRIMARY KEY, `worker` INTEGER, `note` TEXT)"));
    Arc::new(conn)
}

#[test]
fn concurrent_executes_are_serialized() {
    let conn = shared_connection();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let conn = Arc::clone(&conn);
            thread::spawn(move || {
                for i in 0..25 {
                    let note = conn.escape_string(&format!("worker {worker}'s event {i}"));
                    assert!(conn.execute(&format!(
                        "INSERT INTO `events` (`worker`, `note`) VALUES ({worker}, {note})"
                    )));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    let row = conn
        .query("SELECT COUNT(*) AS `n`, COUNT(DISTINCT `worker`) AS `w` FROM `events`")
        .expect("count row");
    assert_eq!(row.get_integer("n"), 100);
    assert_eq!(row.get_integer("w"), 4);
}

#[test]
fn live_result_row_holds_the_connection() {
    let conn = shared_connection();
    assert!(conn.execute("INSERT INTO `events` (`worker`, `note`) VALUES (0, 'seed')"));

    let order = Arc::new(Mutex::new(Vec::new()));
    let (row_open_tx, row_open_rx) = mpsc::channel();

    let reader = {
        let conn = Arc::clone(&conn);
        let order = Arc::clone(&order);
        thread::spawn(move || {
            let row = conn.query("SELECT `note` FROM `events`").expect("seed row");
            row_open_tx.send(()).expect("writer waiting");
            thread::sleep(Duration::from_millis(100));
            assert_eq!(row.get_string("note"), "seed");
            order.lock().unwrap().push("reader done");
            drop(row);
        })
    };

    let writer = {
        let conn = Arc::clone(&conn);
        let order = Arc::clone(&order);
        thread::spawn(move || {
            row_open_rx.recv().expect("reader opened row");
            assert!(conn.execute("INSERT INTO `events` (`worker`, `note`) VALUES (1, 'late')"));
            order.lock().unwrap().push("writer done");
        })
    };

    reader.join().expect("reader panicked");
    writer.join().expect("writer panicked");
    assert_eq!(*order.lock().unwrap(), vec!["reader done", "writer done"]);
}

#[test]
fn panicking_caller_does_not_disable_connection() {
    let conn = shared_connection();
    let clone = Arc::clone(&conn);
    let result = thread::spawn(move || {
        let _row = clone.query("SELECT 1 AS `one`").expect("one row");
        panic!("caller panics while holding a row");
    })
    .join();
    assert!(result.is_err());

    assert!(conn.is_connected());
    assert!(conn.execute("INSERT INTO `events` (`worker`, `note`) VALUES (9, 'after panic')"));
}
