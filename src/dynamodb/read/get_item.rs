use crate::{
    common::{
        args::Args,
        error::{Error, Result},
    },
    dynamodb::{attribute_value, expression},
};

use aws_sdk_dynamodb::Client;
use serde_json::{Map, Value};
use std::collections;

/// get item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct GetItemInput {
    expression_attribute_names: Option<collections::HashMap<String, String>>,
    keys: attribute_value::Item,
    projection_expression: Option<String>,
    table_name: String,
}

/// Get item operation.
///
/// ```rust,no_run
/// use aws_sdk_bindings::dynamodb::read;
/// use aws_sdk_dynamodb::Client;
/// use serde_json::json;
///
/// # async fn example(client: &Client) -> aws_sdk_bindings::Result<()> {
/// let get_item = read::get_item::GetItem {
///     keys: json!({"id": ["S", "1"]}),
///     projection: Some(vec!["name".to_string()]),
///     table_name: "users".to_string(),
/// };
/// let item = get_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItem {
    /// The primary key of the item, as a dict of typed values.
    pub keys: Value,
    /// Top-level attributes to return; `None` returns the whole item.
    pub projection: Option<Vec<String>>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl GetItem {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        let projection = match args.value(2) {
            Some(_) => Some(args.string_list(2, "projection_list")?),
            None => None,
        };
        Ok(Self {
            keys: args.dict(1, "key_dict").cloned().map(Value::Object)?,
            projection,
            table_name: args.string(0, "table")?,
        })
    }
}

impl TryFrom<GetItem> for GetItemInput {
    type Error = Error;

    fn try_from(get_item: GetItem) -> Result<Self> {
        let keys = attribute_value::encode_item(&get_item.keys)?;
        let (expression_attribute_names, projection_expression) = match get_item.projection {
            Some(attributes) if !attributes.is_empty() => {
                let projection = expression::projection(&attributes);
                (
                    Some(projection.expression_attribute_names),
                    Some(projection.expression),
                )
            }
            _ => (None, None),
        };
        Ok(Self {
            expression_attribute_names,
            keys,
            projection_expression,
            table_name: get_item.table_name,
        })
    }
}

impl GetItem {
    /// Execute the get item operation.
    ///
    /// Returns the typed item dict, empty when no item matches the key.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.dynamodb.get_item", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let get_item: GetItemInput = self.try_into()?;
        let output = client
            .get_item()
            .set_expression_attribute_names(get_item.expression_attribute_names)
            .set_key(Some(get_item.keys))
            .set_projection_expression(get_item.projection_expression)
            .table_name(get_item.table_name)
            .send()
            .await?;
        match output.item() {
            Some(item) => attribute_value::decode_item(item),
            None => Ok(Value::Object(Map::new())),
        }
    }
}
