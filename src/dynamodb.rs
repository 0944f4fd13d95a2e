//! DynamoDB bindings.
//!
//! Items cross the boundary as dicts of typed `[tag, payload]` pairs, see
//! [`attribute_value`]. Every method returns typed values except
//! `typed_item_to_simple`, which flattens an item to plain host values.

/// Typed attribute value marshaling.
pub mod attribute_value;

pub(crate) mod expression;

/// Read operations (GetItem, Query, Scan).
pub mod read;

/// Table management operations (CreateTable, DeleteTable, ListTables).
pub mod table;

/// Write operations (PutItem, UpdateItem, DeleteItem).
pub mod write;

use crate::common::{
    args::Args,
    bindings::Service,
    config::ClientConfig,
    error::{Error, Result},
};

use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;
use serde_json::Value;

/// The DynamoDB service.
#[derive(Clone, Copy, Debug, Default)]
pub struct DynamoDb;

crate::method_set! {
    /// Methods of a DynamoDB handle.
    pub enum Method: "Usage ddbClient <method> <args>, where method can be:\n" {
        Destroy => "destroy" ("destroy", 0..=0),
        PutItem => "put_item" ("put_item table item_dict", 2..=2),
        GetItem => "get_item" ("get_item table key_dict ?projection_list?", 2..=3),
        UpdateItem => "update_item" ("update_item table key_dict update_dict", 3..=3),
        DeleteItem => "delete_item" ("delete_item table key_dict", 2..=2),
        QueryItems => "query_items" (
            "query_items table key_condition_expression values_dict ?limit? ?index_name?",
            3..=5
        ),
        Scan => "scan" ("scan table ?limit?", 1..=2),
        CreateTable => "create_table" ("create_table table key_schema_dict attribute_types_dict", 3..=3),
        DeleteTable => "delete_table" ("delete_table table", 1..=1),
        ListTables => "list_tables" ("list_tables", 0..=0),
        TypedItemToSimple => "typed_item_to_simple" ("typed_item_to_simple typed_item_dict", 1..=1),
    }
}

impl Service for DynamoDb {
    const PREFIX: &'static str = "DDB";
    const USAGE: &'static str = Method::USAGE;

    type Client = Client;
    type Method = Method;

    fn client(sdk_config: &SdkConfig, _config: &ClientConfig) -> Client {
        Client::new(sdk_config)
    }

    async fn dispatch(client: &Client, method: Method, args: &[Value]) -> Result<Value> {
        let args = Args::of(method, args)?;
        match method {
            Method::Destroy => Err(Error::invalid("destroy is handled by the bindings")),
            Method::PutItem => write::put_item::PutItem::from_args(&args)?.send(client).await,
            Method::GetItem => read::get_item::GetItem::from_args(&args)?.send(client).await,
            Method::UpdateItem => {
                write::update_item::UpdateItem::from_args(&args)?
                    .send(client)
                    .await
            }
            Method::DeleteItem => {
                write::delete_item::DeleteItem::from_args(&args)?
                    .send(client)
                    .await
            }
            Method::QueryItems => read::query::Query::from_args(&args)?.send(client).await,
            Method::Scan => read::scan::Scan::from_args(&args)?.send(client).await,
            Method::CreateTable => table::CreateTable::from_args(&args)?.send(client).await,
            Method::DeleteTable => table::DeleteTable::from_args(&args)?.send(client).await,
            Method::ListTables => table::list_tables(client).await,
            Method::TypedItemToSimple => typed_item_to_simple(&args),
        }
    }
}

fn typed_item_to_simple(args: &Args) -> Result<Value> {
    let typed_item = args.dict(0, "typed_item_dict")?;
    let item = attribute_value::encode_map(&Value::Object(typed_item.clone()))?;
    attribute_value::simplify(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::bindings::{Bindings, parse_method};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::destroy("destroy", Method::Destroy)]
    #[case::put_item("put_item", Method::PutItem)]
    #[case::query_items("query_items", Method::QueryItems)]
    #[case::typed_item_to_simple("typed_item_to_simple", Method::TypedItemToSimple)]
    fn test_method_from_str(#[case] name: &str, #[case] expected: Method) {
        assert_eq!(name.parse::<Method>().unwrap(), expected);
    }

    #[rstest]
    #[case::unknown("batch_write_item", vec![], "Unknown method")]
    #[case::case_sensitive("PUT_ITEM", vec![], "Unknown method")]
    #[case::put_item_missing_item(
        "put_item",
        vec![json!("t")],
        "wrong # args: should be \"put_item table item_dict\""
    )]
    #[case::scan_too_many(
        "scan",
        vec![json!("t"), json!(1), json!(2)],
        "wrong # args: should be \"scan table ?limit?\""
    )]
    #[case::list_tables_with_args(
        "list_tables",
        vec![json!("t")],
        "wrong # args: should be \"list_tables\""
    )]
    fn test_parse_method_rejects(#[case] name: &str, #[case] args: Vec<Value>, #[case] expected: &str) {
        let actual = parse_method::<Method>(name, &args).unwrap_err();
        assert_eq!(actual.to_string(), expected);
    }

    #[test]
    fn test_typed_item_to_simple_needs_no_network() {
        let bindings = Bindings::<DynamoDb>::new().unwrap();
        let simple = bindings
            .with_client(
                &json!({"region": "us-east-1", "endpoint": "http://localhost:8000"}),
                |handle| {
                    assert!(handle.starts_with("_AWS_DDB_"));
                    bindings.call(
                        handle,
                        "typed_item_to_simple",
                        &[json!({
                            "name": ["S", "Alice"],
                            "age": ["N", "30"],
                            "tags": ["L", [["S", "a"], ["BOOL", true]]],
                        })],
                    )
                },
            )
            .unwrap();
        assert_eq!(
            simple,
            json!({"age": 30, "name": "Alice", "tags": ["a", true]})
        );
        assert!(bindings.registry().is_empty());
    }

    #[test]
    fn test_arguments_are_checked_before_any_request() {
        let bindings = Bindings::<DynamoDb>::new().unwrap();
        let handle = bindings
            .create(&json!({"region": "us-east-1", "endpoint": "http://127.0.0.1:9"}))
            .unwrap();
        let actual = bindings
            .call(handle.as_str(), "put_item", &[json!("t"), json!({"id": ["X", "1"]})])
            .unwrap_err();
        assert_eq!(actual.to_string(), "unknown attribute type \"X\"");
        bindings.destroy(handle.as_str()).unwrap();
    }
}
