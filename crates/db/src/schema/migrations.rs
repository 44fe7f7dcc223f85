//! Schema versions, tracked in `PRAGMA user_version`.
//!
//! A version-0 file is unversioned (new, or created before versioning) and
//! is stamped without migrating.

/// Version written by this build.
pub const SCHEMA_VERSION: i64 = 3;

/// Statements that move a file from `from` to `from + 1`.
///
/// Dropped tables are recreated by open-time repair and repopulated by the
/// owning stage on its next run.
#[derive(Debug)]
pub struct Migration {
    pub from: i64,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

pub static MIGRATIONS: &[Migration] = &[
    Migration {
        from: 1,
        description: "torso direction gains yaw and pitch",
        statements: &[
            "DROP TABLE IF EXISTS TorsoVec",
            "DROP TABLE IF EXISTS TorsoDirection",
        ],
    },
    Migration {
        from: 2,
        description: "torso direction drops its packed copy of the vector",
        statements: &[
            "DROP TABLE IF EXISTS TorsoVec",
            "DROP TABLE IF EXISTS TorsoDirection",
        ],
    },
];

/// Migrations to run, in order, for a file at `version`.
pub fn pending(version: i64) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS
        .iter()
        .filter(move |m| version > 0 && m.from >= version && m.from < SCHEMA_VERSION)
}
