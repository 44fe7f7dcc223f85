mod common;

use assert_matches::assert_matches;
use poseaxis_core::codec;
use poseaxis_core::direction::{SegmentKind, Tier, TorsoOrientation, UnitVector};
use poseaxis_core::error::CoreError;
use poseaxis_core::reliability::RegionReliability;
use poseaxis_core::types::{DbId, Side};
use poseaxis_db::models::direction::{NewSideDirection, NewTorsoDirection};
use poseaxis_db::models::similarity::{SegmentVector, SimilarityQuery};
use poseaxis_db::repositories::{DirectionRepo, FileRepo, ReliabilityRepo, SimilarityRepo, TagRepo};
use poseaxis_db::schema::FULL_SCHEMA;
use poseaxis_db::vector_index::{self, segment_key, CRUS_DIR, THIGH_DIR, TORSO_DIR};
use poseaxis_db::{Store, StoreError};
use sqlx::SqliteConnection;
use tempfile::TempDir;

use common::{count, fresh_store, seed_frame};

fn unit(x: f64, y: f64, z: f64) -> UnitVector {
    UnitVector::from_components(x, y, z).unwrap()
}

fn torso(frame_id: DbId, direction: UnitVector, score: f64) -> NewTorsoDirection {
    NewTorsoDirection {
        frame_id,
        direction,
        tier: Tier::FourPoint,
        score,
        orientation: TorsoOrientation::from_direction(&direction),
    }
}

fn reliability(frame_id: DbId, torso_half_min: f64) -> RegionReliability {
    RegionReliability {
        frame_id,
        torso_half_min,
        face_detect: 0.5,
    }
}

/// Three frames facing +z, between +z and +x, and +x.
async fn seeded() -> (TempDir, Store, [DbId; 3]) {
    let (dir, mut store) = fresh_store(&FULL_SCHEMA).await;
    let conn = store.conn().unwrap();
    let ids = [
        seed_frame(conn, "standing/a.jpg").await,
        seed_frame(conn, "walk/standing/b.jpg").await,
        seed_frame(conn, "sitting/c.jpg").await,
    ];
    let scores = [0.9, 0.5, 0.95];
    let directions = [unit(0.0, 0.0, 1.0), unit(0.6, 0.0, 0.8), unit(1.0, 0.0, 0.0)];

    let reliabilities: Vec<_> = ids
        .iter()
        .zip(scores)
        .map(|(&id, s)| reliability(id, s))
        .collect();
    ReliabilityRepo::replace_all(conn, &reliabilities).await.unwrap();

    let rows: Vec<_> = ids
        .iter()
        .zip(directions)
        .zip(scores)
        .map(|((&id, d), s)| torso(id, d, s))
        .collect();
    DirectionRepo::replace_torso(conn, &rows).await.unwrap();

    (dir, store, ids)
}

async fn thighs(conn: &mut SqliteConnection, frame_id: DbId) {
    let rows = [
        NewSideDirection {
            frame_id,
            side: Side::Left,
            direction: unit(0.0, -1.0, 0.0),
        },
        NewSideDirection {
            frame_id,
            side: Side::Right,
            direction: unit(0.0, -0.8, 0.6),
        },
    ];
    DirectionRepo::upsert_sided(conn, SegmentKind::Thigh, &rows)
        .await
        .unwrap();
}

// -- knn -------------------------------------------------------------------

#[tokio::test]
async fn knn_orders_by_distance() {
    let (_dir, mut store, [a, b, c]) = seeded().await;
    let conn = store.conn().unwrap();

    let hits = vector_index::knn(conn, &TORSO_DIR, &[0.0, 0.0, 1.0], 3).await.unwrap();
    let keys: Vec<_> = hits.iter().map(|n| n.key).collect();
    assert_eq!(keys, vec![a, b, c]);
    assert!(hits[0].distance < 1e-6);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

    let hits = vector_index::knn(conn, &TORSO_DIR, &[1.0, 0.0, 0.0], 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, c);
}

#[tokio::test]
async fn query_dimensions_are_checked() {
    let (_dir, mut store, _) = seeded().await;
    let err = vector_index::knn(store.conn().unwrap(), &TORSO_DIR, &[0.0, 1.0], 3)
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn stored_vectors_mirror_relational_rows() {
    let (_dir, mut store, [_, b, _]) = seeded().await;
    let conn = store.conn().unwrap();
    let stored = vector_index::fetch_vector(conn, &TORSO_DIR, b).await.unwrap().unwrap();
    assert_eq!(stored, vec![0.6f32, 0.0, 0.8]);

    let row = DirectionRepo::find_torso(conn, b).await.unwrap().unwrap();
    let relational = [row.x as f32, row.y as f32, row.z as f32];
    assert_eq!(stored, relational);
    assert_eq!(row.tier(), Some(Tier::FourPoint));
}

// -- similarity ------------------------------------------------------------

#[tokio::test]
async fn similarity_joins_frame_metadata() {
    let (_dir, mut store, [a, b, _]) = seeded().await;
    let query = SimilarityQuery::new(SegmentVector::Torso, vec![0.0, 0.0, 1.0], 2);
    let hits = SimilarityRepo::search(store.conn().unwrap(), &query).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].frame_id, a);
    assert_eq!(hits[0].path, "standing/a.jpg");
    assert_eq!(hits[0].score, Some(0.9));
    assert_eq!(hits[0].side(), None);
    assert_eq!(hits[1].frame_id, b);
    assert!((hits[1].x - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn min_score_filters_after_knn() {
    let (_dir, mut store, [a, _, c]) = seeded().await;
    let conn = store.conn().unwrap();

    let mut query = SimilarityQuery::new(SegmentVector::Torso, vec![0.0, 0.0, 1.0], 3);
    query.min_score = Some(0.8);
    let ids: Vec<_> = SimilarityRepo::search(conn, &query)
        .await
        .unwrap()
        .iter()
        .map(|h| h.frame_id)
        .collect();
    assert_eq!(ids, vec![a, c]);

    // only the nearest two are fetched, so c never reaches the filter
    query.k = 2;
    let ids: Vec<_> = SimilarityRepo::search(conn, &query)
        .await
        .unwrap()
        .iter()
        .map(|h| h.frame_id)
        .collect();
    assert_eq!(ids, vec![a]);
}

#[tokio::test]
async fn tag_filter_uses_keyword_assignment() {
    let (_dir, mut store, [a, b, c]) = seeded().await;
    let conn = store.conn().unwrap();

    let tag_id = TagRepo::ensure(conn, "upright").await.unwrap();
    assert_eq!(TagRepo::ensure(conn, "upright").await.unwrap(), tag_id);
    let assigned = TagRepo::assign_by_keyword(conn, tag_id, "standing").await.unwrap();
    assert_eq!(assigned, 2);
    // reassigning adds nothing
    assert_eq!(TagRepo::assign_by_keyword(conn, tag_id, "standing").await.unwrap(), 0);
    assert_eq!(TagRepo::names_for_frame(conn, c).await.unwrap(), Vec::<String>::new());

    let mut query = SimilarityQuery::new(SegmentVector::Torso, vec![1.0, 0.0, 0.0], 3);
    query.tag = Some("upright".into());
    let ids: Vec<_> = SimilarityRepo::search(conn, &query)
        .await
        .unwrap()
        .iter()
        .map(|h| h.frame_id)
        .collect();
    assert_eq!(ids, vec![b, a]);
}

#[tokio::test]
async fn predicate_sees_joined_aliases() {
    let (_dir, mut store, [_, _, c]) = seeded().await;
    let mut query = SimilarityQuery::new(SegmentVector::Torso, vec![0.0, 0.0, 1.0], 3);
    query.predicate = Some("file.path LIKE 'sitting/%'".into());
    let hits = SimilarityRepo::search(store.conn().unwrap(), &query).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].frame_id, c);
}

#[tokio::test]
async fn sided_results_carry_their_side() {
    let (_dir, mut store, [a, _, _]) = seeded().await;
    let conn = store.conn().unwrap();
    thighs(conn, a).await;

    let query = SimilarityQuery::new(SegmentVector::Thigh, vec![0.0, -1.0, 0.0], 2);
    let hits = SimilarityRepo::search(conn, &query).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.frame_id == a));
    assert_eq!(hits[0].side(), Some(Side::Left));
    assert_eq!(hits[1].side(), Some(Side::Right));
    assert!((hits[1].z - 0.6).abs() < 1e-9);
}

// -- sided upsert and cleanup ----------------------------------------------

#[tokio::test]
async fn sided_upsert_replaces_vector_rows() {
    let (_dir, mut store, [a, _, _]) = seeded().await;
    let conn = store.conn().unwrap();
    thighs(conn, a).await;
    thighs(conn, a).await;

    assert_eq!(count(conn, "ThighDirection").await, 2);
    assert_eq!(count(conn, "ThighVec").await, 2);
    let left = vector_index::fetch_vector(conn, &THIGH_DIR, segment_key(a, Side::Left))
        .await
        .unwrap();
    assert_eq!(left, Some(vec![0.0, -1.0, 0.0]));

    let err = DirectionRepo::upsert_sided(conn, SegmentKind::Torso, &[]).await.unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn orphan_vectors_are_purged() {
    let (_dir, mut store, [a, _, _]) = seeded().await;
    let conn = store.conn().unwrap();
    thighs(conn, a).await;
    sqlx::query("INSERT INTO CrusVec (segment_key, dir) VALUES (?, ?)")
        .bind(segment_key(999, Side::Right))
        .bind(codec::encode(&[0.0, -1.0, 0.0]))
        .execute(&mut *conn)
        .await
        .unwrap();

    assert_eq!(DirectionRepo::purge_orphan_vectors(conn, SegmentKind::Thigh).await.unwrap(), 0);
    assert_eq!(DirectionRepo::purge_orphan_vectors(conn, SegmentKind::Crus).await.unwrap(), 1);
    assert!(vector_index::fetch_vector(conn, &CRUS_DIR, segment_key(999, Side::Right))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn deleting_a_file_clears_its_vectors() {
    let (_dir, mut store, [a, b, _]) = seeded().await;
    let conn = store.conn().unwrap();
    thighs(conn, a).await;

    let file = FileRepo::find_by_path(conn, "standing/a.jpg").await.unwrap().unwrap();
    assert!(FileRepo::delete(conn, file.id).await.unwrap());

    assert_eq!(count(conn, "Frame").await, 2);
    assert_eq!(count(conn, "TorsoDirection").await, 2);
    assert_eq!(count(conn, "TorsoVec").await, 2);
    assert_eq!(count(conn, "ThighDirection").await, 0);
    assert_eq!(count(conn, "ThighVec").await, 0);
    assert_eq!(count(conn, "Reliability").await, 2);

    let hits = vector_index::knn(conn, &TORSO_DIR, &[0.0, 0.0, 1.0], 1).await.unwrap();
    assert_eq!(hits[0].key, b);
}
