//! Table management: create, delete and list tables.

use crate::common::{
    args::{self, Args},
    error::{Error, Result},
    pagination::{self, Page},
};

use aws_sdk_dynamodb::{Client, types};
use serde_json::Value;
use std::collections;

/// create table operation
#[derive(Clone, Debug, Default, PartialEq)]
struct CreateTableInput {
    attribute_definitions: Vec<types::AttributeDefinition>,
    key_schema: Vec<types::KeySchemaElement>,
    table_name: String,
}

fn key_type(value: &Value, attribute: &str) -> Result<types::KeyType> {
    match args::scalar_text(value, attribute)?.to_ascii_uppercase().as_str() {
        "HASH" => Ok(types::KeyType::Hash),
        "RANGE" => Ok(types::KeyType::Range),
        other => Err(Error::invalid(format!(
            "key type of {attribute} must be HASH or RANGE, got \"{other}\""
        ))),
    }
}

fn scalar_attribute_type(value: &Value, attribute: &str) -> Result<types::ScalarAttributeType> {
    match args::scalar_text(value, attribute)?.to_ascii_uppercase().as_str() {
        "S" => Ok(types::ScalarAttributeType::S),
        "N" => Ok(types::ScalarAttributeType::N),
        "B" => Ok(types::ScalarAttributeType::B),
        other => Err(Error::invalid(format!(
            "attribute type of {attribute} must be S, N or B, got \"{other}\""
        ))),
    }
}

/// Create table operation, billed on demand.
///
/// ```rust,no_run
/// use aws_sdk_bindings::dynamodb::table;
/// use aws_sdk_dynamodb::Client;
/// use serde_json::json;
///
/// # async fn example(client: &Client) -> aws_sdk_bindings::Result<()> {
/// let create_table = table::CreateTable {
///     attribute_types: json!({"id": "S", "created": "N"}),
///     key_schema: json!({"id": "HASH", "created": "RANGE"}),
///     table_name: "events".to_string(),
/// };
/// let status = create_table.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateTable {
    /// Dict of key attribute name to scalar type (`S`, `N` or `B`).
    pub attribute_types: Value,
    /// Dict of key attribute name to key type (`HASH` or `RANGE`).
    pub key_schema: Value,
    /// The name of the table to create.
    pub table_name: String,
}

impl CreateTable {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            attribute_types: args.dict(2, "attribute_types_dict").cloned().map(Value::Object)?,
            key_schema: args.dict(1, "key_schema_dict").cloned().map(Value::Object)?,
            table_name: args.string(0, "table")?,
        })
    }
}

fn entries<'a>(value: &'a Value, name: &str) -> Result<collections::BTreeMap<&'a String, &'a Value>> {
    match value {
        Value::Object(map) if !map.is_empty() => Ok(map.iter().collect()),
        _ => Err(Error::invalid(format!("{name} must be a non-empty dict"))),
    }
}

impl TryFrom<CreateTable> for CreateTableInput {
    type Error = Error;

    fn try_from(create_table: CreateTable) -> Result<Self> {
        let mut key_types = entries(&create_table.key_schema, "key_schema_dict")?
            .into_iter()
            .map(|(attribute, value)| -> Result<_> { Ok((attribute, key_type(value, attribute)?)) })
            .collect::<Result<Vec<_>>>()?;
        // the partition key comes first
        key_types.sort_by_key(|(_, key_type)| *key_type != types::KeyType::Hash);
        let key_schema = key_types
            .into_iter()
            .map(|(attribute, key_type)| -> Result<_> {
                let element = types::KeySchemaElement::builder()
                    .attribute_name(attribute)
                    .key_type(key_type)
                    .build()?;
                Ok(element)
            })
            .collect::<Result<_>>()?;
        let attribute_definitions = entries(&create_table.attribute_types, "attribute_types_dict")?
            .into_iter()
            .map(|(attribute, value)| -> Result<_> {
                let definition = types::AttributeDefinition::builder()
                    .attribute_name(attribute)
                    .attribute_type(scalar_attribute_type(value, attribute)?)
                    .build()?;
                Ok(definition)
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            attribute_definitions,
            key_schema,
            table_name: create_table.table_name,
        })
    }
}

impl CreateTable {
    /// Execute the create table operation, returning the table status.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.dynamodb.create_table", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let create_table: CreateTableInput = self.try_into()?;
        let output = client
            .create_table()
            .billing_mode(types::BillingMode::PayPerRequest)
            .set_attribute_definitions(Some(create_table.attribute_definitions))
            .set_key_schema(Some(create_table.key_schema))
            .table_name(create_table.table_name)
            .send()
            .await?;
        let status = output
            .table_description()
            .and_then(|description| description.table_status())
            .map(|status| status.as_str().to_string());
        Ok(status.map_or(Value::Null, Value::String))
    }
}

/// Delete table operation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeleteTable {
    /// The name of the table to delete.
    pub table_name: String,
}

impl DeleteTable {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            table_name: args.string(0, "table")?,
        })
    }

    /// Execute the delete table operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.dynamodb.delete_table", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        client
            .delete_table()
            .table_name(self.table_name)
            .send()
            .await?;
        Ok(Value::Bool(true))
    }
}

/// List every table name, following `LastEvaluatedTableName`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.dynamodb.list_tables", skip(client), err)
)]
pub async fn list_tables(client: &Client) -> Result<Value> {
    let names = pagination::drain(
        |exclusive_start_table_name| {
            let request = client
                .list_tables()
                .set_exclusive_start_table_name(exclusive_start_table_name);
            async move {
                let output = request.send().await?;
                Ok::<_, Error>(Page::new(
                    output.table_names().to_vec(),
                    output.last_evaluated_table_name().map(str::to_string),
                ))
            }
        },
        None,
    )
    .await?;
    Ok(Value::Array(names.into_iter().map(Value::String).collect()))
}
