//! Declarative schema registry.
//!
//! Every table the store manages is a [`TableDef`]: its DDL, the column
//! type map the validator checks it against, and an optional seed. Each
//! pipeline stage owns one [`Schema`], a list of table definitions that are
//! created, validated, and repaired together.
//!
//! Vector tables (`vec0` virtual tables) carry no column map: they are only
//! checked for existence.

pub mod migrations;
pub mod tables;

pub use migrations::{Migration, MIGRATIONS, SCHEMA_VERSION};

use tables::*;

/// Storage class a column's values must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnType {
    /// Name returned by SQLite's `typeof()` for a conforming value.
    pub fn sqlite_type(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Blob => "blob",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Relational,
    /// A `vec0` virtual table mirroring a relational table.
    Vector,
}

#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub kind: TableKind,
    /// Single `CREATE` statement.
    pub create: fn() -> String,
    /// Declared columns in table order; `None` skips column and row checks.
    pub columns: Option<&'static [(&'static str, ColumnType)]>,
    /// Single `INSERT` run after the table is (re)created.
    pub seed: Option<fn() -> String>,
}

impl TableDef {
    pub fn column_names(&self) -> Option<Vec<&'static str>> {
        self.columns
            .map(|cols| cols.iter().map(|(name, _)| *name).collect())
    }
}

/// The tables one stage owns.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    /// In creation order; parents before children.
    pub tables: &'static [TableDef],
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn has_vectors(&self) -> bool {
        self.tables.iter().any(|t| t.kind == TableKind::Vector)
    }
}

// ---------------------------------------------------------------------------
// Stage schemas
// ---------------------------------------------------------------------------

pub static INGEST_SCHEMA: Schema = Schema {
    name: "ingest",
    tables: &[FILE, FRAME, FRAME_RECT, LANDMARK_NAME, LANDMARK],
};

pub static RELIABILITY_SCHEMA: Schema = Schema {
    name: "reliability",
    tables: &[RELIABILITY],
};

pub static TORSO_SCHEMA: Schema = Schema {
    name: "torso",
    tables: &[TORSO_DIRECTION, TORSO_VEC, SPINE_DIRECTION, SPINE_VEC],
};

pub static LIMB_SCHEMA: Schema = Schema {
    name: "limbs",
    tables: &[THIGH_DIRECTION, THIGH_VEC, CRUS_DIRECTION, CRUS_VEC],
};

pub static FLEXION_SCHEMA: Schema = Schema {
    name: "flexion",
    tables: &[THIGH_FLEXION, CRUS_FLEXION],
};

pub static TAG_SCHEMA: Schema = Schema {
    name: "tags",
    tables: &[TAG_INFO, TAGS],
};

/// Every table, for read-only consumers such as similarity queries.
pub static FULL_SCHEMA: Schema = Schema {
    name: "full",
    tables: &[
        FILE,
        FRAME,
        FRAME_RECT,
        LANDMARK_NAME,
        LANDMARK,
        RELIABILITY,
        TORSO_DIRECTION,
        TORSO_VEC,
        SPINE_DIRECTION,
        SPINE_VEC,
        THIGH_DIRECTION,
        THIGH_VEC,
        CRUS_DIRECTION,
        CRUS_VEC,
        THIGH_FLEXION,
        CRUS_FLEXION,
        TAG_INFO,
        TAGS,
    ],
};
