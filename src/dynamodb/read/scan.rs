use crate::{
    common::{
        args::Args,
        error::{Error, Result},
        pagination::{self, Page},
    },
    dynamodb::read,
};

use aws_sdk_dynamodb::Client;
use serde_json::Value;

/// Scan operation.
///
/// ```rust,no_run
/// use aws_sdk_bindings::dynamodb::read;
/// use aws_sdk_dynamodb::Client;
///
/// # async fn example(client: &Client) -> aws_sdk_bindings::Result<()> {
/// let scan = read::scan::Scan {
///     multiple_read_args: read::common::MultipleReadArgs {
///         limit: Some(100),
///         table_name: "users".to_string(),
///         ..Default::default()
///     },
/// };
/// let items = scan.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Read arguments (table name, index, limit).
    pub multiple_read_args: read::common::MultipleReadArgs,
}

impl Scan {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            multiple_read_args: read::common::MultipleReadArgs {
                limit: args.optional_int(1, "limit")?,
                table_name: args.string(0, "table")?,
                ..Default::default()
            },
        })
    }

    /// Execute the scan, following `LastEvaluatedKey` until done or the limit is reached.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.dynamodb.scan", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let operation: read::common::MultipleReadInput = self.multiple_read_args.try_into()?;
        let items = pagination::drain(
            |exclusive_start_key| {
                let request = crate::apply_multiple_read_operation!(client.scan(), &operation)
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

    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::table_only(vec![json!("users")], None)]
    #[case::limit(vec![json!("users"), json!(50)], Some(50))]
    fn test_scan_from_args(#[case] values: Vec<Value>, #[case] limit: Option<i32>) {
        let args = Args::new(&values, (1, 2), "scan table ?limit?").unwrap();
        let actual = Scan::from_args(&args).unwrap();
        assert_eq!(
            actual,
            Scan {
                multiple_read_args: read::common::MultipleReadArgs {
                    limit,
                    table_name: "users".to_string(),
                    ..Default::default()
                },
            }
        );
    }

    #[test]
    fn test_scan_from_args_rejects_bad_limit() {
        let values = [json!("users"), json!("all")];
        let args = Args::new(&values, (1, 2), "scan table ?limit?").unwrap();
        assert!(matches!(Scan::from_args(&args), Err(Error::InvalidArgument(_))));
    }
}
