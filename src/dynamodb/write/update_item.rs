use crate::{
    common::{
        args::Args,
        error::{Error, Result},
    },
    dynamodb::{attribute_value, expression},
};

use aws_sdk_dynamodb::{Client, types};
use serde_json::Value;
use std::collections;

/// update item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct UpdateItemInput {
    expression_attribute_names: Option<collections::HashMap<String, String>>,
    expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    keys: attribute_value::Item,
    table_name: String,
    update_expression: String,
}

/// Update item operation, assigning every attribute of `updates`.
///
/// ```rust,no_run
/// use aws_sdk_bindings::dynamodb::write;
/// use aws_sdk_dynamodb::Client;
/// use serde_json::json;
///
/// # async fn example(client: &Client) -> aws_sdk_bindings::Result<()> {
/// let update_item = write::update_item::UpdateItem {
///     keys: json!({"id": ["S", "1"]}),
///     table_name: "users".to_string(),
///     updates: json!({"name": ["S", "Jane"], "age": ["N", "31"]}),
/// };
/// // SET #n0 = :v0, #n1 = :v1
/// update_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateItem {
    /// The primary key of the item, as a dict of typed values.
    pub keys: Value,
    /// The name of the table to write to.
    pub table_name: String,
    /// Attributes to assign, as a dict of typed values.
    pub updates: Value,
}

impl UpdateItem {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            keys: args.dict(1, "key_dict").cloned().map(Value::Object)?,
            table_name: args.string(0, "table")?,
            updates: args.dict(2, "update_dict").cloned().map(Value::Object)?,
        })
    }
}

impl TryFrom<UpdateItem> for UpdateItemInput {
    type Error = Error;

    fn try_from(update_item: UpdateItem) -> Result<Self> {
        let updates = attribute_value::encode_item(&update_item.updates)?;
        if updates.is_empty() {
            return Err(Error::invalid("update_dict must name at least one attribute"));
        }
        let mut operation = Self {
            keys: attribute_value::encode_item(&update_item.keys)?,
            table_name: update_item.table_name,
            ..Default::default()
        };
        operation.update_expression = expression::set(updates).merge_into(
            &mut operation.expression_attribute_names,
            &mut operation.expression_attribute_values,
        );
        Ok(operation)
    }
}

impl UpdateItem {
    /// Execute the update item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.dynamodb.update_item", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let update_item: UpdateItemInput = self.try_into()?;
        client
            .update_item()
            .set_expression_attribute_names(update_item.expression_attribute_names)
            .set_expression_attribute_values(update_item.expression_attribute_values)
            .set_key(Some(update_item.keys))
            .table_name(update_item.table_name)
            .update_expression(update_item.update_expression)
            .send()
            .await?;
        Ok(Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::single(
        UpdateItem {
            keys: json!({"a": ["S", "b"]}),
            table_name: "c".to_string(),
            updates: json!({"d": ["N", "1"]}),
        },
        UpdateItemInput {
            expression_attribute_names: Some(
                collections::HashMap::from(
                    [
                        ("#n0".to_string(), "d".to_string()),
                    ]
                )
            ),
            expression_attribute_values: Some(
                collections::HashMap::from(
                    [
                        (
                            ":v0".to_string(),
                            types::AttributeValue::N(
                                "1".to_string()
                            )
                        ),
                    ]
                )
            ),
            keys: collections::HashMap::from(
                [(
                    "a".to_string(),
                    types::AttributeValue::S(
                        "b".to_string()
                    ),
                )]
            ),
            table_name: "c".to_string(),
            update_expression: "SET #n0 = :v0".to_string(),
        }
    )]
    #[case::reserved_and_nested(
        UpdateItem {
            keys: json!({"a": ["S", "b"]}),
            table_name: "c".to_string(),
            updates: json!({"status": ["S", "active"], "data": ["M", ["e", ["BOOL", false]]]}),
        },
        UpdateItemInput {
            expression_attribute_names: Some(
                collections::HashMap::from(
                    [
                        ("#n0".to_string(), "data".to_string()),
                        ("#n1".to_string(), "status".to_string()),
                    ]
                )
            ),
            expression_attribute_values: Some(
                collections::HashMap::from(
                    [
                        (
                            ":v0".to_string(),
                            types::AttributeValue::M(
                                collections::HashMap::from(
                                    [(
                                        "e".to_string(),
                                        types::AttributeValue::Bool(false)
                                    )]
                                )
                            )
                        ),
                        (
                            ":v1".to_string(),
                            types::AttributeValue::S(
                                "active".to_string()
                            )
                        ),
                    ]
                )
            ),
            keys: collections::HashMap::from(
                [(
                    "a".to_string(),
                    types::AttributeValue::S(
                        "b".to_string()
                    ),
                )]
            ),
            table_name: "c".to_string(),
            update_expression: "SET #n0 = :v0, #n1 = :v1".to_string(),
        }
    )]
    fn test_update_item(#[case] args: UpdateItem, #[case] expected: UpdateItemInput) {
        let actual: UpdateItemInput = args.try_into().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_update_item_rejects_empty_updates() {
        let update_item = UpdateItem {
            keys: json!({"a": ["S", "b"]}),
            table_name: "c".to_string(),
            updates: json!({}),
        };
        let actual: Result<UpdateItemInput> = update_item.try_into();
        assert!(matches!(actual, Err(Error::InvalidArgument(_))));
    }
}
