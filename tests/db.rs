//! End-to-end tests against the public [`pagetree::Db`] facade, exercising
//! the whole stack (pager, page codec, B+ tree) through a real file on disk.

use pagetree::{Config, Db};
use tempdir::TempDir;

fn init_logging() {
    let _ = env_logger::try_init();
}

#[test]
fn put_get_delete_round_trip() {
    init_logging();
    let dir = TempDir::new("pagetree-db").unwrap();
    let db: Db<u64, String> = Db::open(dir.path().join("data.db"), Config::default()).unwrap();

    db.put(1, &"alpha".to_string()).unwrap();
    db.put(2, &"beta".to_string()).unwrap();
    assert_eq!(db.get(&1).unwrap(), Some("alpha".to_string()));
    assert!(db.contains(&2).unwrap());

    db.delete(&1).unwrap();
    assert_eq!(db.get(&1).unwrap(), None);
    assert!(!db.contains(&1).unwrap());
    assert_eq!(db.get(&2).unwrap(), Some("beta".to_string()));
}

#[test]
fn scan_returns_ascending_pairs() {
    init_logging();
    let dir = TempDir::new("pagetree-db").unwrap();
    let db: Db<u64, u64> = Db::open(dir.path().join("data.db"), Config::new().order(4)).unwrap();

    for k in [30u64, 10, 50, 20, 40] {
        db.put(k, &(k * 2)).unwrap();
    }
    let scanned = db.scan().unwrap();
    assert_eq!(
        scanned,
        vec![(10, 20), (20, 40), (30, 60), (40, 80), (50, 100)]
    );
}

#[test]
fn data_survives_close_and_reopen() {
    init_logging();
    let dir = TempDir::new("pagetree-db").unwrap();
    let path = dir.path().join("data.db");

    let db: Db<u64, String> = Db::open(&path, Config::new().order(4)).unwrap();
    for k in 0..40u64 {
        db.put(k, &format!("value-{k}")).unwrap();
    }
    db.close().unwrap();

    let db: Db<u64, String> = Db::open(&path, Config::new().order(4)).unwrap();
    for k in 0..40u64 {
        assert_eq!(db.get(&k).unwrap(), Some(format!("value-{k}")));
    }
}

#[test]
fn missing_key_lookups_are_not_errors() {
    init_logging();
    let dir = TempDir::new("pagetree-db").unwrap();
    let db: Db<u64, String> = Db::open(dir.path().join("data.db"), Config::default()).unwrap();

    assert_eq!(db.get(&123).unwrap(), None);
    db.delete(&123).unwrap();
}

#[test]
fn oversized_values_round_trip_through_overflow_chain() {
    init_logging();
    let dir = TempDir::new("pagetree-db").unwrap();
    let db: Db<u64, Vec<u8>> = Db::open(dir.path().join("data.db"), Config::new().order(4)).unwrap();

    let big = vec![0x42u8; 20_000];
    db.put(1, &big).unwrap();
    assert_eq!(db.get(&1).unwrap(), Some(big));
}
