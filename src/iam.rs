use crate::common::{
    args::Args,
    bindings::Service,
    config::ClientConfig,
    error::{Error, Result},
    pagination::{self, Page},
};

use aws_config::SdkConfig;
use aws_sdk_iam::{Client, types};
use serde_json::{Value, json};

/// The IAM service.
#[derive(Clone, Copy, Debug, Default)]
pub struct Iam;

crate::method_set! {
    /// Methods of an IAM handle.
    pub enum Method: "Usage iamClient <method> <args>, where method can be:\n" {
        Destroy => "destroy" ("destroy", 0..=0),
        CreateRole => "create_role" ("create_role role_name assume_role_policy_document", 2..=2),
        DeleteRole => "delete_role" ("delete_role role_name", 1..=1),
        ListPolicies => "list_policies" ("list_policies", 0..=0),
    }
}

impl Service for Iam {
    const PREFIX: &'static str = "IAM";
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
            Method::CreateRole => CreateRole::from_args(&args)?.send(client).await,
            Method::DeleteRole => delete_role(client, args.string(0, "role_name")?).await,
            Method::ListPolicies => list_policies(client).await,
        }
    }
}

/// Create role operation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CreateRole {
    /// Trust policy JSON document.
    pub assume_role_policy_document: String,
    /// The name of the role.
    pub role_name: String,
}

impl CreateRole {
    fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            assume_role_policy_document: args.string(1, "assume_role_policy_document")?,
            role_name: args.string(0, "role_name")?,
        })
    }

    /// Execute the create role operation, returning `{role_name, role_id, arn, path}`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.iam.create_role", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let output = client
            .create_role()
            .role_name(self.role_name)
            .assume_role_policy_document(self.assume_role_policy_document)
            .send()
            .await?;
        Ok(output.role().map_or(Value::Null, role_record))
    }
}

fn role_record(role: &types::Role) -> Value {
    json!({
        "role_name": role.role_name(),
        "role_id": role.role_id(),
        "arn": role.arn(),
        "path": role.path(),
    })
}

/// Delete a role.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.iam.delete_role", skip(client), err)
)]
pub async fn delete_role(client: &Client, role_name: String) -> Result<Value> {
    client.delete_role().role_name(role_name).send().await?;
    Ok(Value::Bool(true))
}

/// List every managed policy, following `Marker` while the listing is truncated.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.iam.list_policies", skip(client), err)
)]
pub async fn list_policies(client: &Client) -> Result<Value> {
    let policies = pagination::drain(
        |marker| {
            let request = client.list_policies().set_marker(marker);
            async move {
                let output = request.send().await?;
                let next = output
                    .is_truncated()
                    .then(|| output.marker().map(str::to_string))
                    .flatten();
                Ok::<_, Error>(Page::new(
                    output.policies().iter().map(policy_record).collect(),
                    next,
                ))
            }
        },
        None,
    )
    .await?;
    Ok(Value::Array(policies))
}

/// Dates are epoch seconds.
fn policy_record(policy: &types::Policy) -> Value {
    json!({
        "policy_name": policy.policy_name(),
        "policy_id": policy.policy_id(),
        "arn": policy.arn(),
        "path": policy.path(),
        "default_version_id": policy.default_version_id(),
        "attachment_count": policy.attachment_count(),
        "is_attachable": policy.is_attachable(),
        "description": policy.description(),
        "create_date": policy.create_date().map(|date| date.secs()),
        "update_date": policy.update_date().map(|date| date.secs()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::{bindings::parse_method, replay};
    use aws_sdk_iam::primitives::DateTime;
    use rstest::rstest;

    #[rstest]
    #[case::create_role("create_role", vec![json!("r"), json!("{}")], Method::CreateRole)]
    #[case::list_policies("list_policies", vec![], Method::ListPolicies)]
    fn test_parse_method(#[case] name: &str, #[case] args: Vec<Value>, #[case] expected: Method) {
        assert_eq!(parse_method::<Method>(name, &args).unwrap(), expected);
    }

    #[rstest]
    #[case::create_role_without_policy(
        "create_role",
        vec![json!("r")],
        "wrong # args: should be \"create_role role_name assume_role_policy_document\""
    )]
    #[case::list_roles("list_roles", vec![], "Unknown method")]
    fn test_parse_method_rejects(#[case] name: &str, #[case] args: Vec<Value>, #[case] expected: &str) {
        let actual = parse_method::<Method>(name, &args).unwrap_err();
        assert_eq!(actual.to_string(), expected);
    }

    #[tokio::test]
    async fn test_list_policies_follows_marker_while_truncated() {
        let page = |truncated: bool, marker: &str, name: &str| {
            format!(
                concat!(
                    r#"<ListPoliciesResponse xmlns="https://iam.amazonaws.com/doc/2010-05-08/">"#,
                    "<ListPoliciesResult><IsTruncated>{}</IsTruncated>{}<Policies><member>",
                    "<PolicyName>{}</PolicyName><Arn>arn:aws:iam::aws:policy/{}</Arn>",
                    "<AttachmentCount>0</AttachmentCount><IsAttachable>true</IsAttachable>",
                    "</member></Policies></ListPoliciesResult>",
                    "<ResponseMetadata><RequestId>1</RequestId></ResponseMetadata>",
                    "</ListPoliciesResponse>",
                ),
                truncated, marker, name, name
            )
        };
        let first = page(true, "<Marker>m1</Marker>", "ReadOnly");
        let second = page(false, "", "Admin");
        let http_client = replay::replay_client(&[first.as_str(), second.as_str()]);
        let client = Client::new(&replay::sdk_config(http_client.clone()));

        let actual = list_policies(&client).await.unwrap();
        let names: Vec<_> = actual
            .as_array()
            .unwrap()
            .iter()
            .map(|policy| (policy["policy_name"].clone(), policy["arn"].clone()))
            .collect();
        assert_eq!(
            names,
            [
                (json!("ReadOnly"), json!("arn:aws:iam::aws:policy/ReadOnly")),
                (json!("Admin"), json!("arn:aws:iam::aws:policy/Admin")),
            ]
        );

        let requests = replay::requests(&http_client);
        assert_eq!(requests.len(), 2);
        assert!(requests[0].0.starts_with(replay::ENDPOINT));
        assert!(requests[0].1.contains("Action=ListPolicies"));
        assert!(!requests[0].1.contains("Marker="));
        assert!(requests[1].1.contains("Marker=m1"));
    }

    #[test]
    fn test_policy_record() {
        let policy = types::Policy::builder()
            .policy_name("ReadOnly")
            .policy_id("ANPA1")
            .arn("arn:aws:iam::aws:policy/ReadOnly")
            .path("/")
            .default_version_id("v3")
            .attachment_count(2)
            .is_attachable(true)
            .create_date(DateTime::from_secs(1_600_000_000))
            .build();
        assert_eq!(
            policy_record(&policy),
            json!({
                "policy_name": "ReadOnly",
                "policy_id": "ANPA1",
                "arn": "arn:aws:iam::aws:policy/ReadOnly",
                "path": "/",
                "default_version_id": "v3",
                "attachment_count": 2,
                "is_attachable": true,
                "description": null,
                "create_date": 1_600_000_000,
                "update_date": null,
            })
        );
    }
}
