//! Target query-language rendering rulesets.

use std::borrow::Cow;

/// How bind-parameter placeholders are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` (SQLite, MySQL).
    Positional,
    /// `$1`, `$2`, ... (PostgreSQL).
    Numbered,
}

impl PlaceholderStyle {
    /// Renders the placeholder for a 1-based parameter index.
    #[inline]
    pub fn render(self, index: usize) -> Cow<'static, str> {
        match self {
            PlaceholderStyle::Positional => Cow::Borrowed("?"),
            PlaceholderStyle::Numbered => Cow::Owned(format!("${index}")),
        }
    }
}

/// Rendering ruleset and capability flags the translator consults.
///
/// Capabilities are a closed mapping: a construct the dialect cannot render
/// is rejected with `UnsupportedConstruct`, never silently approximated.
#[derive(Debug, Clone)]
pub struct Dialect {
    pub placeholder: PlaceholderStyle,
    pub supports_right_join: bool,
    /// Whether `NULLS FIRST` / `NULLS LAST` can be emitted. When an
    /// `OrderSpec` leaves placement at its default, no clause is emitted
    /// regardless and the target's own convention applies.
    pub supports_null_ordering: bool,
    /// Targets whose grammar requires a LIMIT clause before OFFSET.
    pub requires_limit_with_offset: bool,
}

impl Dialect {
    /// Modern SQLite (3.39+: RIGHT JOIN and NULLS ordering available).
    pub const fn sqlite() -> Self {
        Dialect {
            placeholder: PlaceholderStyle::Positional,
            supports_right_join: true,
            supports_null_ordering: true,
            requires_limit_with_offset: true,
        }
    }

    pub const fn postgres() -> Self {
        Dialect {
            placeholder: PlaceholderStyle::Numbered,
            supports_right_join: true,
            supports_null_ordering: true,
            requires_limit_with_offset: false,
        }
    }

    /// Lowest-common-denominator target without RIGHT JOIN or explicit
    /// NULLS ordering.
    pub const fn ansi() -> Self {
        Dialect {
            placeholder: PlaceholderStyle::Positional,
            supports_right_join: false,
            supports_null_ordering: false,
            requires_limit_with_offset: false,
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::sqlite()
    }
}
