//! Repository for `TagInfo` and `Tags`.

use poseaxis_core::types::DbId;
use sqlx::SqliteConnection;

use crate::models::tag::TagInfo;

/// Escape `LIKE` wildcards in `s` using `\`.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub struct TagRepo;

impl TagRepo {
    /// Id of the tag named `name`, registering it if new.
    pub async fn ensure(conn: &mut SqliteConnection, name: &str) -> Result<DbId, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO TagInfo (name) VALUES (?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        sqlx::query_scalar("SELECT id FROM TagInfo WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
    }

    /// Tag every frame whose source path has a `keyword` directory.
    ///
    /// Matches `.../<keyword>/...` and paths starting with `<keyword>/`.
    /// Returns the number of new assignments.
    pub async fn assign_by_keyword(
        conn: &mut SqliteConnection,
        tag_id: DbId,
        keyword: &str,
    ) -> Result<u64, sqlx::Error> {
        let escaped = escape_like(keyword);
        let result = sqlx::query(
            "INSERT OR IGNORE INTO Tags (frame_id, tag_id)
             SELECT f.id, ?
             FROM Frame AS f
             JOIN File AS file ON file.id = f.file_id
             WHERE file.path LIKE ? ESCAPE '\\' OR file.path LIKE ? ESCAPE '\\'",
        )
        .bind(tag_id)
        .bind(format!("%/{escaped}/%"))
        .bind(format!("{escaped}/%"))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<TagInfo>, sqlx::Error> {
        sqlx::query_as::<_, TagInfo>("SELECT id, name FROM TagInfo ORDER BY name")
            .fetch_all(&mut *conn)
            .await
    }

    /// Tag names assigned to a frame, sorted.
    pub async fn names_for_frame(
        conn: &mut SqliteConnection,
        frame_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT ti.name FROM Tags AS t
             JOIN TagInfo AS ti ON ti.id = t.tag_id
             WHERE t.frame_id = ?
             ORDER BY ti.name",
        )
        .bind(frame_id)
        .fetch_all(&mut *conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("run_50%"), "run\\_50\\%");
        assert_eq!(escape_like("plain"), "plain");
    }
}
