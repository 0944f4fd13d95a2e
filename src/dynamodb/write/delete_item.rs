use crate::{
    common::{
        args::Args,
        error::{Error, Result},
    },
    dynamodb::attribute_value,
};

use aws_sdk_dynamodb::Client;
use serde_json::Value;

/// delete item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct DeleteItemInput {
    keys: attribute_value::Item,
    table_name: String,
}

/// Delete item operation.
///
/// Deleting a key that does not exist succeeds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteItem {
    /// The primary key of the item, as a dict of typed values.
    pub keys: Value,
    /// The name of the table to delete from.
    pub table_name: String,
}

impl DeleteItem {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            keys: args.dict(1, "key_dict").cloned().map(Value::Object)?,
            table_name: args.string(0, "table")?,
        })
    }
}

impl TryFrom<DeleteItem> for DeleteItemInput {
    type Error = Error;

    fn try_from(delete_item: DeleteItem) -> Result<Self> {
        Ok(Self {
            keys: attribute_value::encode_item(&delete_item.keys)?,
            table_name: delete_item.table_name,
        })
    }
}

impl DeleteItem {
    /// Execute the delete item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.dynamodb.delete_item", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let delete_item: DeleteItemInput = self.try_into()?;
        client
            .delete_item()
            .set_key(Some(delete_item.keys))
            .table_name(delete_item.table_name)
            .send()
            .await?;
        Ok(Value::Bool(true))
    }
}
