/// This module provides the CSV record reader and the book export writer.
pub mod csv;

/// This module provides a logger item writer, used by dry runs.
pub mod logger;

/// This module provides the catalog store and its item writer.
pub mod store;
