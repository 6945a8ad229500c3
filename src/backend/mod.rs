//! Driver adapters implementing [`crate::executor::Backend`].

#[cfg(feature = "rusqlite")]
pub mod rusqlite;
