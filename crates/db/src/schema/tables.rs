//! Table definitions.
//!
//! Derived tables reference `Frame(id)` with `ON DELETE CASCADE`; vector
//! tables cannot carry foreign keys and are cleaned up explicitly.

use std::f64::consts::PI;

use poseaxis_core::direction::{Tier, UNIT_NORM_SQ_MAX, UNIT_NORM_SQ_MIN};
use poseaxis_core::landmark::Keypoint;

use super::ColumnType::{Blob, Integer, Real, Text};
use super::{TableDef, TableKind};

fn unit_check() -> String {
    format!("CHECK((x*x + y*y + z*z) BETWEEN {UNIT_NORM_SQ_MIN} AND {UNIT_NORM_SQ_MAX})")
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

pub const FILE: TableDef = TableDef {
    name: "File",
    kind: TableKind::Relational,
    create: || {
        "CREATE TABLE File (
            id          INTEGER PRIMARY KEY,
            path        TEXT NOT NULL UNIQUE,
            size        INTEGER NOT NULL CHECK(size > 0),
            timestamp   INTEGER NOT NULL CHECK(timestamp >= 0),
            hash        BLOB NOT NULL UNIQUE CHECK(length(hash) = 64)
        )"
        .into()
    },
    columns: Some(&[
        ("id", Integer),
        ("path", Text),
        ("size", Integer),
        ("timestamp", Integer),
        ("hash", Blob),
    ]),
    seed: None,
};

pub const FRAME: TableDef = TableDef {
    name: "Frame",
    kind: TableKind::Relational,
    create: || {
        "CREATE TABLE Frame (
            id            INTEGER PRIMARY KEY,
            file_id       INTEGER NOT NULL REFERENCES File(id) ON DELETE CASCADE,
            person_index  INTEGER NOT NULL CHECK(person_index >= 0),
            UNIQUE(file_id, person_index)
        )"
        .into()
    },
    columns: Some(&[
        ("id", Integer),
        ("file_id", Integer),
        ("person_index", Integer),
    ]),
    seed: None,
};

pub const FRAME_RECT: TableDef = TableDef {
    name: "FrameRect",
    kind: TableKind::Relational,
    create: || {
        "CREATE TABLE FrameRect (
            frame_id  INTEGER PRIMARY KEY REFERENCES Frame(id) ON DELETE CASCADE,
            x_min     REAL NOT NULL,
            x_max     REAL NOT NULL,
            y_min     REAL NOT NULL,
            y_max     REAL NOT NULL,
            CHECK(0 <= x_min AND x_min <= x_max AND x_max <= 1),
            CHECK(0 <= y_min AND y_min <= y_max AND y_max <= 1)
        )"
        .into()
    },
    columns: Some(&[
        ("frame_id", Integer),
        ("x_min", Real),
        ("x_max", Real),
        ("y_min", Real),
        ("y_max", Real),
    ]),
    seed: None,
};

pub const LANDMARK_NAME: TableDef = TableDef {
    name: "LandmarkName",
    kind: TableKind::Relational,
    create: || {
        "CREATE TABLE LandmarkName (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL UNIQUE
        )"
        .into()
    },
    columns: Some(&[("id", Integer), ("name", Text)]),
    seed: Some(|| {
        let values = Keypoint::ALL
            .iter()
            .map(|kp| format!("({}, '{}')", kp.index(), kp.name()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("INSERT INTO LandmarkName (id, name) VALUES {values}")
    }),
};

pub const LANDMARK: TableDef = TableDef {
    name: "Landmark",
    kind: TableKind::Relational,
    create: || {
        "CREATE TABLE Landmark (
            frame_id        INTEGER NOT NULL REFERENCES Frame(id) ON DELETE CASCADE,
            landmark_index  INTEGER NOT NULL REFERENCES LandmarkName(id),
            presence        REAL NOT NULL CHECK(presence BETWEEN 0 AND 1),
            confidence      REAL NOT NULL CHECK(confidence BETWEEN 0 AND 1),
            x               REAL NOT NULL,
            y               REAL NOT NULL,
            z               REAL NOT NULL,
            image_x         REAL NOT NULL,
            image_y         REAL NOT NULL,
            PRIMARY KEY(frame_id, landmark_index)
        )"
        .into()
    },
    columns: Some(&[
        ("frame_id", Integer),
        ("landmark_index", Integer),
        ("presence", Real),
        ("confidence", Real),
        ("x", Real),
        ("y", Real),
        ("z", Real),
        ("image_x", Real),
        ("image_y", Real),
    ]),
    seed: None,
};

// ---------------------------------------------------------------------------
// Reliability
// ---------------------------------------------------------------------------

pub const RELIABILITY: TableDef = TableDef {
    name: "Reliability",
    kind: TableKind::Relational,
    create: || {
        "CREATE TABLE Reliability (
            frame_id        INTEGER PRIMARY KEY REFERENCES Frame(id) ON DELETE CASCADE,
            torso_half_min  REAL NOT NULL CHECK(torso_half_min BETWEEN 0 AND 1),
            face_detect     REAL NOT NULL CHECK(face_detect BETWEEN 0 AND 1)
        )"
        .into()
    },
    columns: Some(&[
        ("frame_id", Integer),
        ("torso_half_min", Real),
        ("face_detect", Real),
    ]),
    seed: None,
};

// ---------------------------------------------------------------------------
// Torso and spine
// ---------------------------------------------------------------------------

pub const TORSO_DIRECTION: TableDef = TableDef {
    name: "TorsoDirection",
    kind: TableKind::Relational,
    create: || {
        let methods = Tier::torso_labels()
            .iter()
            .map(|l| format!("'{l}'"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE TorsoDirection (
                frame_id  INTEGER PRIMARY KEY REFERENCES Frame(id) ON DELETE CASCADE,
                x         REAL NOT NULL,
                y         REAL NOT NULL,
                z         REAL NOT NULL,
                method    TEXT NOT NULL CHECK(method IN ({methods})),
                score     REAL NOT NULL CHECK(score BETWEEN 0 AND 1),
                yaw_x     REAL NOT NULL,
                yaw_z     REAL NOT NULL,
                pitch     REAL NOT NULL CHECK(pitch BETWEEN -1 AND 1),
                {}
            )",
            unit_check()
        )
    },
    columns: Some(&[
        ("frame_id", Integer),
        ("x", Real),
        ("y", Real),
        ("z", Real),
        ("method", Text),
        ("score", Real),
        ("yaw_x", Real),
        ("yaw_z", Real),
        ("pitch", Real),
    ]),
    seed: None,
};

pub const TORSO_VEC: TableDef = TableDef {
    name: "TorsoVec",
    kind: TableKind::Vector,
    create: || {
        "CREATE VIRTUAL TABLE TorsoVec USING vec0(
            frame_id  integer primary key,
            dir       float[3],
            yaw       float[2]
        )"
        .into()
    },
    columns: None,
    seed: None,
};

pub const SPINE_DIRECTION: TableDef = TableDef {
    name: "SpineDirection",
    kind: TableKind::Relational,
    create: || {
        format!(
            "CREATE TABLE SpineDirection (
                frame_id  INTEGER PRIMARY KEY REFERENCES Frame(id) ON DELETE CASCADE,
                x         REAL NOT NULL,
                y         REAL NOT NULL,
                z         REAL NOT NULL,
                method    TEXT NOT NULL,
                {}
            )",
            unit_check()
        )
    },
    columns: Some(&[
        ("frame_id", Integer),
        ("x", Real),
        ("y", Real),
        ("z", Real),
        ("method", Text),
    ]),
    seed: None,
};

pub const SPINE_VEC: TableDef = TableDef {
    name: "SpineVec",
    kind: TableKind::Vector,
    create: || {
        "CREATE VIRTUAL TABLE SpineVec USING vec0(
            frame_id  integer primary key,
            dir       float[3]
        )"
        .into()
    },
    columns: None,
    seed: None,
};

// ---------------------------------------------------------------------------
// Thigh and crus
// ---------------------------------------------------------------------------

const SIDED_DIRECTION_COLUMNS: &[(&str, super::ColumnType)] = &[
    ("frame_id", Integer),
    ("is_right", Integer),
    ("x", Real),
    ("y", Real),
    ("z", Real),
];

fn sided_direction(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            frame_id  INTEGER NOT NULL REFERENCES Frame(id) ON DELETE CASCADE,
            is_right  INTEGER NOT NULL CHECK(is_right IN (0, 1)),
            x         REAL NOT NULL,
            y         REAL NOT NULL,
            z         REAL NOT NULL,
            PRIMARY KEY(frame_id, is_right),
            {}
        )",
        unit_check()
    )
}

/// Sided vector rows are keyed `frame_id * 2 + is_right`.
fn sided_vector(table: &str) -> String {
    format!(
        "CREATE VIRTUAL TABLE {table} USING vec0(
            segment_key  integer primary key,
            dir          float[3]
        )"
    )
}

pub const THIGH_DIRECTION: TableDef = TableDef {
    name: "ThighDirection",
    kind: TableKind::Relational,
    create: || sided_direction("ThighDirection"),
    columns: Some(SIDED_DIRECTION_COLUMNS),
    seed: None,
};

pub const THIGH_VEC: TableDef = TableDef {
    name: "ThighVec",
    kind: TableKind::Vector,
    create: || sided_vector("ThighVec"),
    columns: None,
    seed: None,
};

pub const CRUS_DIRECTION: TableDef = TableDef {
    name: "CrusDirection",
    kind: TableKind::Relational,
    create: || sided_direction("CrusDirection"),
    columns: Some(SIDED_DIRECTION_COLUMNS),
    seed: None,
};

pub const CRUS_VEC: TableDef = TableDef {
    name: "CrusVec",
    kind: TableKind::Vector,
    create: || sided_vector("CrusVec"),
    columns: None,
    seed: None,
};

// ---------------------------------------------------------------------------
// Flexion
// ---------------------------------------------------------------------------

pub const THIGH_FLEXION: TableDef = TableDef {
    name: "ThighFlexion",
    kind: TableKind::Relational,
    create: || {
        format!(
            "CREATE TABLE ThighFlexion (
                frame_id   INTEGER NOT NULL REFERENCES Frame(id) ON DELETE CASCADE,
                is_right   INTEGER NOT NULL CHECK(is_right IN (0, 1)),
                dot_body   REAL NOT NULL CHECK(dot_body BETWEEN -1 AND 1),
                angle_rad  REAL NOT NULL CHECK(angle_rad BETWEEN -{PI} AND {PI}),
                dot_spine  REAL NOT NULL CHECK(dot_spine BETWEEN -1 AND 1),
                PRIMARY KEY(frame_id, is_right)
            )"
        )
    },
    columns: Some(&[
        ("frame_id", Integer),
        ("is_right", Integer),
        ("dot_body", Real),
        ("angle_rad", Real),
        ("dot_spine", Real),
    ]),
    seed: None,
};

pub const CRUS_FLEXION: TableDef = TableDef {
    name: "CrusFlexion",
    kind: TableKind::Relational,
    create: || {
        format!(
            "CREATE TABLE CrusFlexion (
                frame_id   INTEGER NOT NULL REFERENCES Frame(id) ON DELETE CASCADE,
                is_right   INTEGER NOT NULL CHECK(is_right IN (0, 1)),
                angle_rad  REAL NOT NULL CHECK(angle_rad BETWEEN 0 AND {PI}),
                dot        REAL NOT NULL CHECK(dot BETWEEN -1 AND 1),
                PRIMARY KEY(frame_id, is_right)
            )"
        )
    },
    columns: Some(&[
        ("frame_id", Integer),
        ("is_right", Integer),
        ("angle_rad", Real),
        ("dot", Real),
    ]),
    seed: None,
};

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

pub const TAG_INFO: TableDef = TableDef {
    name: "TagInfo",
    kind: TableKind::Relational,
    create: || {
        "CREATE TABLE TagInfo (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL UNIQUE
        )"
        .into()
    },
    columns: Some(&[("id", Integer), ("name", Text)]),
    seed: None,
};

pub const TAGS: TableDef = TableDef {
    name: "Tags",
    kind: TableKind::Relational,
    create: || {
        "CREATE TABLE Tags (
            frame_id  INTEGER NOT NULL REFERENCES Frame(id) ON DELETE CASCADE,
            tag_id    INTEGER NOT NULL REFERENCES TagInfo(id) ON DELETE CASCADE,
            PRIMARY KEY(frame_id, tag_id)
        )"
        .into()
    },
    columns: Some(&[("frame_id", Integer), ("tag_id", Integer)]),
    seed: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pi_bounds_render_full_precision() {
        let sql = (CRUS_FLEXION.create)();
        assert!(sql.contains("BETWEEN 0 AND 3.141592653589793"));
        let sql = (THIGH_FLEXION.create)();
        assert!(sql.contains("BETWEEN -3.141592653589793 AND 3.141592653589793"));
    }

    #[test]
    fn torso_method_check_lists_every_tier() {
        let sql = (TORSO_DIRECTION.create)();
        for label in Tier::torso_labels() {
            assert!(sql.contains(&format!("'{label}'")));
        }
        assert!(!sql.contains("BLOB"));
    }

    #[test]
    fn landmark_name_seed_covers_vocabulary() {
        let seed = (LANDMARK_NAME.seed.unwrap())();
        assert!(seed.starts_with("INSERT INTO LandmarkName"));
        assert!(seed.contains("(0, 'nose')"));
        assert!(seed.contains("(16, 'right_ankle')"));
    }
}
