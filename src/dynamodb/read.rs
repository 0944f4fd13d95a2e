//! Read operations: single items by key, queries and full table scans.

/// Shared arguments and pagination for multiple-item reads.
pub mod common;

/// Get item operation for retrieving a single item by primary key.
pub mod get_item;

/// Query operation for retrieving items with a key condition.
pub mod query;

/// Scan operation for retrieving all items from a table.
pub mod scan;
