//! Join kinds and per-join specifications.

use compact_str::CompactString;

use crate::expr::Predicate;
use crate::path::Path;

/// The kind of JOIN operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// One ordered join entry. Declaration order is translation-significant.
///
/// The relationship's key condition comes from the metamodel; `on` is ANDed
/// onto it when present, which for a LEFT JOIN gates only whether right-side
/// columns are populated.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub kind: JoinKind,
    /// Relation path being joined, e.g. `member.team`.
    pub path: Path,
    /// Alias the joined entity is addressed by.
    pub alias: CompactString,
    pub on: Option<Predicate>,
}
