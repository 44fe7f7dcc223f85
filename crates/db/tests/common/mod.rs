#![allow(dead_code)]

use poseaxis_db::models::file::CreateSourceFile;
use poseaxis_db::repositories::{FileRepo, FrameRepo};
use poseaxis_db::schema::Schema;
use poseaxis_db::{Store, StoreOptions};
use sqlx::SqliteConnection;
use tempfile::TempDir;

/// Open a fresh store in a temporary directory.
pub async fn fresh_store(schema: &'static Schema) -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("pose.db"), schema, StoreOptions::default())
        .await
        .unwrap();
    (dir, store)
}

/// A 64-byte stand-in digest unique per `seed`.
pub fn fake_hash(seed: &str) -> Vec<u8> {
    let mut hash = vec![0u8; 64];
    for (i, b) in seed.bytes().enumerate().take(64) {
        hash[i] = b;
    }
    hash[63] = seed.len() as u8;
    hash
}

/// Insert a source file and one frame for it, returning the frame id.
pub async fn seed_frame(conn: &mut SqliteConnection, path: &str) -> i64 {
    let file = match FileRepo::find_by_path(conn, path).await.unwrap() {
        Some(file) => file,
        None => FileRepo::create(
            conn,
            &CreateSourceFile {
                path: path.to_string(),
                size: 1024,
                timestamp: 1_700_000_000,
                hash: fake_hash(path),
            },
        )
        .await
        .unwrap(),
    };
    let existing = FrameRepo::list_by_file(conn, file.id).await.unwrap().len() as i64;
    FrameRepo::create(conn, file.id, existing).await.unwrap().id
}

pub async fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(conn)
        .await
        .unwrap()
}
