use std::fs;

use ledger_core::{Block, Ledger};
use ledger_storage::sled_store::SledStore;
use tempfile::{tempdir, TempDir};

pub const TEST_DIFFICULTY: u32 = 2;

pub fn create_temp_store() -> (TempDir, SledStore) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().to_path_buf();
    (
        temp_dir,
        SledStore::open(&db_path).expect("Failed to open SledStore"),
    )
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    assert!(!db_path.exists(), "Database directory should be removed");
}

/// Genesis plus `n` mined transfers from Alice to Bob, mined by Carol.
pub fn mined_ledger(n: u64) -> Ledger {
    let mut ledger = Ledger::new(TEST_DIFFICULTY);
    for i in 0..n {
        ledger
            .add_block(Block::new("Alice", "Bob", 10 + i, 1, "Carol"))
            .expect("mining at test difficulty");
    }
    ledger
}
