use crate::{
    common::{
        args::Args,
        error::{Error, Result},
        pagination::{self, Page},
    },
    dynamodb::{attribute_value, read},
};

use aws_sdk_dynamodb::Client;
use serde_json::Value;

/// query operation
#[derive(Clone, Debug, Default, PartialEq)]
struct QueryInput {
    expression_attribute_values: Option<attribute_value::Item>,
    key_condition_expression: String,
    multiple_read_operation: read::common::MultipleReadInput,
}

/// Query operation.
///
/// ```rust,no_run
/// use aws_sdk_bindings::dynamodb::read;
/// use aws_sdk_dynamodb::Client;
/// use serde_json::json;
///
/// # async fn example(client: &Client) -> aws_sdk_bindings::Result<()> {
/// let query = read::query::Query {
///     key_condition_expression: "id = :id".to_string(),
///     values: json!({":id": ["S", "1"]}),
///     multiple_read_args: read::common::MultipleReadArgs {
///         table_name: "users".to_string(),
///         ..Default::default()
///     },
/// };
/// let items = query.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Key condition, e.g. `pk = :pk AND begins_with(sk, :prefix)`.
    pub key_condition_expression: String,
    /// Additional read arguments (table name, index, limit).
    pub multiple_read_args: read::common::MultipleReadArgs,
    /// Dict of value placeholders to typed values.
    pub values: Value,
}

impl Query {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            key_condition_expression: args.string(1, "key_condition_expression")?,
            multiple_read_args: read::common::MultipleReadArgs {
                index_name: args.optional_string(4, "index_name")?,
                limit: args.optional_int(3, "limit")?,
                table_name: args.string(0, "table")?,
            },
            values: args.dict(2, "values_dict").cloned().map(Value::Object)?,
        })
    }
}

impl TryFrom<Query> for QueryInput {
    type Error = Error;

    fn try_from(query: Query) -> Result<Self> {
        let values = attribute_value::encode_item(&query.values)?;
        Ok(Self {
            expression_attribute_values: (!values.is_empty()).then_some(values),
            key_condition_expression: query.key_condition_expression,
            multiple_read_operation: query.multiple_read_args.try_into()?,
        })
    }
}

impl Query {
    /// Execute the query, following `LastEvaluatedKey` until done or the limit is reached.
    ///
    /// Returns the matching items as typed dicts, in server order.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.dynamodb.query_items", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let query: QueryInput = self.try_into()?;
        let operation = &query.multiple_read_operation;
        let items = pagination::drain(
            |exclusive_start_key| {
                let request = crate::apply_multiple_read_operation!(client.query(), operation)
                    .key_condition_expression(query.key_condition_expression.clone())
                    .set_expression_attribute_values(query.expression_attribute_values.clone())
                    .set_exclusive_start_key(exclusive_start_key);
                async move {
                    let output = request.send().await?;
                    Ok::<_, Error>(Page::new(
                        output.items().to_vec(),
                        output.last_evaluated_key().cloned(),
                    ))
                }
            },
            operation.limit,
        )
        .await?;
        read::common::decode_items(&items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::replay;
    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use serde_json::json;
    use std::collections;

    #[rstest]
    #[case::no_values(
        Query {
            key_condition_expression: "a = b".to_string(),
            multiple_read_args: read::common::MultipleReadArgs {
                table_name: "c".to_string(),
                ..Default::default()
            },
            values: json!({}),
        },
        QueryInput {
            key_condition_expression: "a = b".to_string(),
            multiple_read_operation: read::common::MultipleReadInput {
                table_name: "c".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    )]
    #[case::full(
        Query {
            key_condition_expression: "pk = :pk AND sk > :sk".to_string(),
            multiple_read_args: read::common::MultipleReadArgs {
                index_name: Some("d".to_string()),
                limit: Some(5),
                table_name: "c".to_string(),
            },
            values: json!({":pk": ["S", "a"], ":sk": ["N", "10"]}),
        },
        QueryInput {
            expression_attribute_values: Some(
                collections::HashMap::from(
                    [
                        (
                            ":pk".to_string(),
                            types::AttributeValue::S(
                                "a".to_string()
                            )
                        ),
                        (
                            ":sk".to_string(),
                            types::AttributeValue::N(
                                "10".to_string()
                            )
                        ),
                    ]
                )
            ),
            key_condition_expression: "pk = :pk AND sk > :sk".to_string(),
            multiple_read_operation: read::common::MultipleReadInput {
                index_name: Some("d".to_string()),
                page_size: Some(5),
                limit: Some(5),
                table_name: "c".to_string(),
            },
        }
    )]
    fn test_query(#[case] args: Query, #[case] expected: QueryInput) {
        let actual: QueryInput = args.try_into().unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::required_only(
        vec![json!("t"), json!("pk = :pk"), json!({":pk": ["S", "1"]})],
        None,
        None
    )]
    #[case::limit(
        vec![json!("t"), json!("pk = :pk"), json!({":pk": ["S", "1"]}), json!("10")],
        Some(10),
        None
    )]
    #[case::limit_and_index(
        vec![json!("t"), json!("pk = :pk"), json!({":pk": ["S", "1"]}), json!(3), json!("by_date")],
        Some(3),
        Some("by_date")
    )]
    fn test_query_from_args(
        #[case] values: Vec<Value>,
        #[case] limit: Option<i32>,
        #[case] index_name: Option<&str>,
    ) {
        let args = Args::new(&values, (3, 5), "query_items").unwrap();
        let actual = Query::from_args(&args).unwrap();
        assert_eq!(actual.multiple_read_args.limit, limit);
        assert_eq!(actual.multiple_read_args.index_name.as_deref(), index_name);
        assert_eq!(actual.multiple_read_args.table_name, "t");
        assert_eq!(actual.key_condition_expression, "pk = :pk");
    }

    #[rstest]
    #[case::all_pages(None, json!([{"id": ["S", "1"]}, {"id": ["S", "2"]}]), 2)]
    #[case::limit_stops_paging(Some(1), json!([{"id": ["S", "1"]}]), 1)]
    #[tokio::test]
    async fn test_query_follows_last_evaluated_key(
        #[case] limit: Option<i32>,
        #[case] expected: Value,
        #[case] request_count: usize,
    ) {
        let http_client = replay::replay_client(&[
            r#"{"Items":[{"id":{"S":"1"}}],"Count":1,"ScannedCount":1,"LastEvaluatedKey":{"id":{"S":"1"}}}"#,
            r#"{"Items":[{"id":{"S":"2"}}],"Count":1,"ScannedCount":1}"#,
        ]);
        let client = Client::new(&replay::sdk_config(http_client.clone()));
        let query = Query {
            key_condition_expression: "id = :id".to_string(),
            multiple_read_args: read::common::MultipleReadArgs {
                limit,
                table_name: "users".to_string(),
                ..Default::default()
            },
            values: json!({":id": ["S", "1"]}),
        };
        assert_eq!(query.send(&client).await.unwrap(), expected);

        let requests = replay::requests(&http_client);
        assert_eq!(requests.len(), request_count);
        assert!(requests[0].0.starts_with(replay::ENDPOINT));
        assert!(!requests[0].1.contains("ExclusiveStartKey"));
        if let Some((_, body)) = requests.get(1) {
            assert!(body.contains(r#""ExclusiveStartKey":{"id":{"S":"1"}}"#));
        }
    }

    #[test]
    fn test_query_from_args_rejects_non_dict_values() {
        let values = [json!("t"), json!("pk = :pk"), json!(["S", "1"])];
        let args = Args::new(&values, (3, 5), "query_items").unwrap();
        assert!(matches!(
            Query::from_args(&args),
            Err(Error::InvalidArgument(message)) if message == "error reading values_dict"
        ));
    }
}
