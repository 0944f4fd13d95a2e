use crate::{
    common::{
        args::Args,
        error::{Error, Result},
    },
    dynamodb::attribute_value,
};

use aws_sdk_dynamodb::Client;
use serde_json::Value;

/// put item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct PutItemInput {
    item: attribute_value::Item,
    table_name: String,
}

/// Put item operation.
///
/// ```rust,no_run
/// use aws_sdk_bindings::dynamodb::write;
/// use aws_sdk_dynamodb::Client;
/// use serde_json::json;
///
/// # async fn example(client: &Client) -> aws_sdk_bindings::Result<()> {
/// let put_item = write::put_item::PutItem {
///     item: json!({
///         "id": ["S", "1"],
///         "profile": ["M", ["name", ["S", "Alice"], "age", ["N", "30"]]],
///     }),
///     table_name: "users".to_string(),
/// };
/// put_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutItem {
    /// The item to write, as a dict of typed values.
    pub item: Value,
    /// The name of the table to write to.
    pub table_name: String,
}

impl PutItem {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            item: args.dict(1, "item_dict").cloned().map(Value::Object)?,
            table_name: args.string(0, "table")?,
        })
    }
}

impl TryFrom<PutItem> for PutItemInput {
    type Error = Error;

    fn try_from(put_item: PutItem) -> Result<Self> {
        Ok(Self {
            item: attribute_value::encode_item(&put_item.item)?,
            table_name: put_item.table_name,
        })
    }
}

impl PutItem {
    /// Execute the put item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.dynamodb.put_item", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let put_item: PutItemInput = self.try_into()?;
        client
            .put_item()
            .set_item(Some(put_item.item))
            .table_name(put_item.table_name)
            .send()
            .await?;
        Ok(Value::Bool(true))
    }
}
