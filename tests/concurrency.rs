//! Exercises [`pagetree::Db`] shared across threads, proving the
//! `lock::RwLock`-guarded facade serializes concurrent mutation safely.

use std::sync::Arc;
use std::thread;

use pagetree::{Config, Db};
use tempdir::TempDir;

#[test]
fn concurrent_writers_all_land() {
    let _ = env_logger::try_init();
    let dir = TempDir::new("pagetree-concurrency").unwrap();
    let db: Arc<Db<u64, u64>> =
        Arc::new(Db::open(dir.path().join("data.db"), Config::new().order(4)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..25u64 {
                    let key = t * 25 + i;
                    db.put(key, &key).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    for key in 0..200u64 {
        assert_eq!(db.get(&key).unwrap(), Some(key));
    }
}
