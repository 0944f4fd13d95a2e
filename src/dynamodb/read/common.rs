use crate::{
    common::error::{Error, Result},
    dynamodb::attribute_value::{self, Item},
};

use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MultipleReadInput {
    pub(crate) index_name: Option<String>,
    /// Page size sent with each request.
    pub(crate) page_size: Option<i32>,
    /// Total number of items to return.
    pub(crate) limit: Option<usize>,
    pub(crate) table_name: String,
}

/// Arguments for multiple-item read operations (Query, Scan).
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct MultipleReadArgs {
    /// Secondary index to read instead of the base table.
    pub index_name: Option<String>,
    /// Maximum number of items to return across all pages.
    ///
    /// Paging stops as soon as this many items are held; `None` reads everything.
    pub limit: Option<i32>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl TryFrom<MultipleReadArgs> for MultipleReadInput {
    type Error = Error;

    fn try_from(multiple_read_args: MultipleReadArgs) -> Result<Self> {
        let limit = match multiple_read_args.limit {
            Some(limit) if limit > 0 => Some(limit),
            Some(limit) => return Err(Error::invalid(format!("limit must be positive, got {limit}"))),
            None => None,
        };
        Ok(Self {
            index_name: multiple_read_args.index_name,
            page_size: limit,
            limit: limit.map(|limit| limit as usize),
            table_name: multiple_read_args.table_name,
        })
    }
}

/// Decode every item to the tagged dict form.
pub(crate) fn decode_items(items: &[Item]) -> Result<Value> {
    items
        .iter()
        .map(attribute_value::decode_item)
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// apply common multiple read settings to a query or scan builder
#[macro_export]
#[doc(hidden)]
macro_rules! apply_multiple_read_operation {
    ($builder:expr, $multiple_read_operation:expr) => {
        $builder
            .set_index_name($multiple_read_operation.index_name.clone())
            .set_limit($multiple_read_operation.page_size)
            .table_name($multiple_read_operation.table_name.clone())
    };
}
