/// All store primary keys are SQLite INTEGER rowids.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Body side of a paired segment (thigh, crus) or limb region.
///
/// Discriminants match the `is_right` column stored alongside every
/// per-side row.
#[repr(i64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Resolve a stored `is_right` flag to a side.
    pub fn from_is_right(is_right: i64) -> Option<Self> {
        match is_right {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            _ => None,
        }
    }

    /// Value of the `is_right` column for this side.
    pub fn is_right(&self) -> i64 {
        *self as i64
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_is_right_roundtrip() {
        for side in Side::BOTH {
            assert_eq!(Side::from_is_right(side.is_right()), Some(side));
        }
        assert_eq!(Side::from_is_right(2), None);
    }
}
