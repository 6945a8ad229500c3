//! SQL fragments: statement text interleaved with bind parameters.
//!
//! A [`Sql`] is a flat chunk list. Literal values never become text; they
//! stay [`SqlChunk::Param`] until [`Sql::render`] assigns placeholders and
//! collects them in emission order, which keeps statement shape independent
//! of bound values.

use core::fmt;

use compact_str::{CompactString, ToCompactString};
use smallvec::SmallVec;

use crate::dialect::Dialect;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlChunk {
    Text(CompactString),
    Param(Value),
}

/// A SQL statement or fragment under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    chunks: SmallVec<[SqlChunk; 4]>,
}

impl Sql {
    pub const fn empty() -> Self {
        Sql {
            chunks: SmallVec::new_const(),
        }
    }

    /// A fragment of literal SQL text (never a user value).
    pub fn raw(text: impl AsRef<str>) -> Self {
        let mut sql = Sql::empty();
        sql.push_raw(text);
        sql
    }

    /// A fragment holding one bind parameter.
    pub fn param(value: Value) -> Self {
        let mut sql = Sql::empty();
        sql.push_param(value);
        sql
    }

    pub fn push_raw(&mut self, text: impl AsRef<str>) {
        self.chunks
            .push(SqlChunk::Text(text.as_ref().to_compact_string()));
    }

    pub fn push_param(&mut self, value: Value) {
        self.chunks.push(SqlChunk::Param(value));
    }

    /// Appends another fragment, merging text and parameters.
    pub fn append(mut self, other: Sql) -> Self {
        self.chunks.extend(other.chunks);
        self
    }

    /// Joins fragments with a separator, skipping it at the edges.
    pub fn join(parts: impl IntoIterator<Item = Sql>, separator: &str) -> Sql {
        let mut out = Sql::empty();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push_raw(separator);
            }
            out = out.append(part);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Renders the final statement: placeholders per the dialect's style,
    /// parameters collected positionally in emission order.
    pub fn render(&self, dialect: &Dialect) -> Statement {
        let mut text = String::with_capacity(self.chunks.len() * 8);
        let mut params = Vec::new();
        for chunk in &self.chunks {
            match chunk {
                SqlChunk::Text(t) => text.push_str(t),
                SqlChunk::Param(value) => {
                    text.push_str(&dialect.placeholder.render(params.len() + 1));
                    params.push(value.clone());
                }
            }
        }
        Statement { text, params }
    }
}

/// A rendered statement plus its positional bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<Value>,
}

impl fmt::Display for Statement {
    /// Statement text only; parameter values stay out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
