/// Connection management and schema setup.
mod connection;

/// Reads and writes against the entry and mention tables.
mod queries;

pub use connection::Database;
