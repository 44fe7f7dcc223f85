//! Nearest-orientation search joined back to relational metadata.
//!
//! The KNN lookup runs first inside a CTE; relational filters apply to its
//! `k` results, so a filtered query can return fewer than `k` rows.

use sqlx::SqliteConnection;

use crate::error::StoreError;
use crate::models::similarity::{SimilarFrame, SimilarityQuery};

pub struct SimilarityRepo;

impl SimilarityRepo {
    pub async fn search(
        conn: &mut SqliteConnection,
        query: &SimilarityQuery,
    ) -> Result<Vec<SimilarFrame>, StoreError> {
        let column = query.segment.column();
        let blob = column.encode_query(&query.vector)?;

        let (frame_of, side_of, side_join) = if column.sided {
            ("knn.key / 2", "knn.key % 2", " AND d.is_right = knn.key % 2")
        } else {
            ("knn.key", "NULL", "")
        };

        let mut filters = Vec::new();
        if query.min_score.is_some() {
            filters.push("r.torso_half_min >= ?".to_string());
        }
        if query.tag.is_some() {
            filters.push(
                "EXISTS (SELECT 1 FROM Tags AS t JOIN TagInfo AS ti ON ti.id = t.tag_id \
                 WHERE t.frame_id = f.id AND ti.name = ?)"
                    .to_string(),
            );
        }
        if let Some(predicate) = &query.predicate {
            filters.push(format!("({predicate})"));
        }
        let where_clause = if filters.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };

        let sql = format!(
            "WITH knn AS (
                SELECT {key} AS key, distance FROM {table}
                WHERE {col} MATCH ? AND k = ?
             )
             SELECT f.id AS frame_id, {side_of} AS is_right, knn.distance,
                    file.path, f.person_index, d.x, d.y, d.z,
                    r.torso_half_min AS score
             FROM knn
             JOIN Frame AS f ON f.id = {frame_of}
             JOIN File AS file ON file.id = f.file_id
             JOIN {source} AS d ON d.frame_id = f.id{side_join}
             LEFT JOIN Reliability AS r ON r.frame_id = f.id
             {where_clause}
             ORDER BY knn.distance",
            key = column.key,
            table = column.table,
            col = column.column,
            source = column.source,
        );

        let mut q = sqlx::query_as::<_, SimilarFrame>(&sql)
            .bind(blob)
            .bind(i64::from(query.k));
        if let Some(min_score) = query.min_score {
            q = q.bind(min_score);
        }
        if let Some(tag) = &query.tag {
            q = q.bind(tag.clone());
        }

        tracing::debug!(
            segment = ?query.segment,
            k = query.k,
            filtered = !filters.is_empty(),
            "Similarity search"
        );
        Ok(q.fetch_all(&mut *conn).await?)
    }
}
