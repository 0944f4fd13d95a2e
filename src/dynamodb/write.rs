//! Write operations: put, update and delete of single items.

/// Delete item operation for removing an item by primary key.
pub mod delete_item;

/// Put item operation for creating or replacing an item.
pub mod put_item;

/// Update item operation for assigning attributes of an item.
pub mod update_item;
