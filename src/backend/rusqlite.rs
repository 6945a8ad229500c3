//! SQLite backend over an open [`::rusqlite::Connection`].
//!
//! Rows are read to completion inside [`Backend::run`]: a `rusqlite` row
//! handle borrows its prepared statement, so streaming them out would pin
//! the statement for the cursor's lifetime. Buffering keeps the cursor
//! self-contained at the cost of holding the full result set, which is
//! acceptable for the paginated reads this engine produces.

use std::collections::VecDeque;

use compact_str::ToCompactString;
use tracing::trace;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::executor::{Backend, RowCursor};
use crate::sql::Statement;
use crate::value::Value;

impl Backend for ::rusqlite::Connection {
    type Cursor<'c> = BufferedCursor;

    fn dialect(&self) -> Dialect {
        Dialect::sqlite()
    }

    fn run<'c>(&'c self, statement: &Statement) -> Result<Self::Cursor<'c>> {
        let mut stmt = self
            .prepare(&statement.text)
            .map_err(|err| backend_error(err, statement))?;
        for (index, value) in statement.params.iter().enumerate() {
            // SQLite parameter indices are 1-based.
            stmt.raw_bind_parameter(index + 1, to_sqlite(value))
                .map_err(|err| backend_error(err, statement))?;
        }

        let column_count = stmt.column_count();
        let mut buffered = VecDeque::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next().map_err(|err| backend_error(err, statement))? {
            let mut values = Vec::with_capacity(column_count);
            for column in 0..column_count {
                let value: ::rusqlite::types::Value = row
                    .get(column)
                    .map_err(|err| backend_error(err, statement))?;
                values.push(from_sqlite(value));
            }
            buffered.push_back(values);
        }
        trace!(rows = buffered.len(), statement = %statement.text, "ran statement");
        Ok(BufferedCursor { rows: buffered })
    }
}

/// Cursor over rows already read out of SQLite.
pub struct BufferedCursor {
    rows: VecDeque<Vec<Value>>,
}

impl RowCursor for BufferedCursor {
    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

fn to_sqlite(value: &Value) -> ::rusqlite::types::Value {
    use ::rusqlite::types::Value as Sqlite;
    match value {
        Value::Null => Sqlite::Null,
        // SQLite has no boolean affinity; 0/1 round-trips through the
        // declared-type coercion on the way back out.
        Value::Bool(b) => Sqlite::Integer(i64::from(*b)),
        Value::Int(i) => Sqlite::Integer(*i),
        Value::Float(f) => Sqlite::Real(*f),
        Value::Text(s) => Sqlite::Text(s.to_string()),
        Value::Bytes(b) => Sqlite::Blob(b.clone()),
    }
}

fn from_sqlite(value: ::rusqlite::types::Value) -> Value {
    use ::rusqlite::types::Value as Sqlite;
    match value {
        Sqlite::Null => Value::Null,
        Sqlite::Integer(i) => Value::Int(i),
        Sqlite::Real(f) => Value::Float(f),
        Sqlite::Text(s) => Value::Text(s.to_compact_string()),
        Sqlite::Blob(b) => Value::Bytes(b),
    }
}

fn backend_error(err: ::rusqlite::Error, statement: &Statement) -> Error {
    Error::Backend {
        message: err.to_string(),
        statement: statement.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_through_sqlite_types() {
        assert_eq!(from_sqlite(to_sqlite(&Value::Int(7))), Value::Int(7));
        assert_eq!(
            from_sqlite(to_sqlite(&Value::Text("abc".into()))),
            Value::Text("abc".into())
        );
        assert_eq!(from_sqlite(to_sqlite(&Value::Bool(true))), Value::Int(1));
        assert_eq!(from_sqlite(to_sqlite(&Value::Null)), Value::Null);
    }
}
