//! SSM Parameter Store bindings.

use crate::common::{
    args::Args,
    bindings::Service,
    config::ClientConfig,
    error::{Error, Result},
};

use aws_config::SdkConfig;
use aws_sdk_ssm::{Client, types};
use serde_json::{Value, json};

/// The SSM service.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ssm;

crate::method_set! {
    /// Methods of an SSM handle.
    pub enum Method: "Usage ssmClient <method> <args>, where method can be:\n" {
        Destroy => "destroy" ("destroy", 0..=0),
        PutParameter => "put_parameter" ("put_parameter name value ?type?", 2..=3),
        GetParameter => "get_parameter" ("get_parameter name ?with_decryption?", 1..=2),
        DeleteParameter => "delete_parameter" ("delete_parameter name", 1..=1),
    }
}

impl Service for Ssm {
    const PREFIX: &'static str = "SSM";
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
            Method::PutParameter => PutParameter::from_args(&args)?.send(client).await,
            Method::GetParameter => {
                let with_decryption = args.optional_bool(1, "with_decryption")?.unwrap_or(false);
                get_parameter(client, args.string(0, "name")?, with_decryption).await
            }
            Method::DeleteParameter => delete_parameter(client, args.string(0, "name")?).await,
        }
    }
}

fn parameter_type(name: &str) -> Result<types::ParameterType> {
    match name {
        "String" => Ok(types::ParameterType::String),
        "StringList" => Ok(types::ParameterType::StringList),
        "SecureString" => Ok(types::ParameterType::SecureString),
        other => Err(Error::invalid(format!(
            "type must be String, StringList or SecureString, got \"{other}\""
        ))),
    }
}

/// Put parameter operation; an existing parameter is overwritten.
#[derive(Clone, Debug, PartialEq)]
pub struct PutParameter {
    /// The parameter name.
    pub name: String,
    /// `String` unless given.
    pub parameter_type: types::ParameterType,
    /// The parameter value.
    pub value: String,
}

impl PutParameter {
    fn from_args(args: &Args) -> Result<Self> {
        let parameter_type = args
            .optional_string(2, "type")?
            .map_or(Ok(types::ParameterType::String), |name| parameter_type(&name))?;
        Ok(Self {
            name: args.string(0, "name")?,
            parameter_type,
            value: args.string(1, "value")?,
        })
    }

    /// Execute the put parameter operation, returning the new version.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.ssm.put_parameter", skip(self, client), fields(name = %self.name), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let output = client
            .put_parameter()
            .name(self.name)
            .value(self.value)
            .r#type(self.parameter_type)
            .overwrite(true)
            .send()
            .await?;
        Ok(json!(output.version()))
    }
}

/// Fetch a parameter value, decrypting `SecureString`s when asked.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.ssm.get_parameter", skip(client), err)
)]
pub async fn get_parameter(client: &Client, name: String, with_decryption: bool) -> Result<Value> {
    let output = client
        .get_parameter()
        .name(name)
        .with_decryption(with_decryption)
        .send()
        .await?;
    Ok(json!(output.parameter().and_then(|parameter| parameter.value())))
}

/// Delete a parameter.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.ssm.delete_parameter", skip(client), err)
)]
pub async fn delete_parameter(client: &Client, name: String) -> Result<Value> {
    client.delete_parameter().name(name).send().await?;
    Ok(Value::Bool(true))
}
