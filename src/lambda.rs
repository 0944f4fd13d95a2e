//! Lambda bindings: function management and invocation.

use crate::common::{
    args::Args,
    bindings::Service,
    config::ClientConfig,
    error::{Error, Result},
    pagination::{self, Page},
};

use aws_config::SdkConfig;
use aws_sdk_lambda::{Client, primitives::Blob, types};
use serde_json::{Value, json};
use std::path::PathBuf;

/// The Lambda service.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lambda;

crate::method_set! {
    /// Methods of a Lambda handle.
    pub enum Method: "Usage lambdaClient <method> <args>, where method can be:\n" {
        Destroy => "destroy" ("destroy", 0..=0),
        ListFunctions => "list_functions" ("list_functions", 0..=0),
        GetFunction => "get_function" ("get_function function_name", 1..=1),
        CreateFunction => "create_function" (
            "create_function function_name zip_path handler runtime execution_role_arn ?timeout?",
            5..=6
        ),
        InvokeFunction => "invoke_function" (
            "invoke_function function_name payload_json ?invocation_type?",
            2..=3
        ),
        DeleteFunction => "delete_function" ("delete_function function_name", 1..=1),
    }
}

impl Service for Lambda {
    const PREFIX: &'static str = "LAMBDA";
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
            Method::ListFunctions => list_functions(client).await,
            Method::GetFunction => get_function(client, args.string(0, "function_name")?).await,
            Method::CreateFunction => CreateFunction::from_args(&args)?.send(client).await,
            Method::InvokeFunction => InvokeFunction::from_args(&args)?.send(client).await,
            Method::DeleteFunction => {
                delete_function(client, args.string(0, "function_name")?).await
            }
        }
    }
}

/// List every function configuration, following `NextMarker`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.lambda.list_functions", skip(client), err)
)]
pub async fn list_functions(client: &Client) -> Result<Value> {
    let functions = pagination::drain(
        |marker| {
            let request = client.list_functions().set_marker(marker);
            async move {
                let output = request.send().await?;
                Ok::<_, Error>(Page::new(
                    output.functions().iter().map(function_record).collect(),
                    output.next_marker().map(str::to_string),
                ))
            }
        },
        None,
    )
    .await?;
    Ok(Value::Array(functions))
}

/// Fetch a function as `{configuration, code, tags}`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.lambda.get_function", skip(client), err)
)]
pub async fn get_function(client: &Client, function_name: String) -> Result<Value> {
    let output = client
        .get_function()
        .function_name(function_name)
        .send()
        .await?;
    let code = output.code().map(|code| {
        json!({
            "repository_type": code.repository_type(),
            "location": code.location(),
            "image_uri": code.image_uri(),
            "resolved_image_uri": code.resolved_image_uri(),
        })
    });
    Ok(json!({
        "configuration": output.configuration().map(function_record),
        "code": code,
        "tags": output.tags(),
    }))
}

fn function_record(function: &types::FunctionConfiguration) -> Value {
    let vpc_config = function.vpc_config().map(|vpc_config| {
        json!({
            "subnet_ids": vpc_config.subnet_ids(),
            "security_group_ids": vpc_config.security_group_ids(),
            "vpc_id": vpc_config.vpc_id(),
        })
    });
    let file_system_configs: Vec<_> = function
        .file_system_configs()
        .iter()
        .map(|config| json!({"arn": config.arn(), "local_mount_path": config.local_mount_path()}))
        .collect();
    let layers: Vec<_> = function
        .layers()
        .iter()
        .map(|layer| json!({"arn": layer.arn(), "code_size": layer.code_size()}))
        .collect();
    let architectures: Vec<_> = function
        .architectures()
        .iter()
        .map(|architecture| architecture.as_str())
        .collect();
    json!({
        "function_name": function.function_name(),
        "function_arn": function.function_arn(),
        "description": function.description(),
        "runtime": function.runtime().map(|runtime| runtime.as_str()),
        "role": function.role(),
        "handler": function.handler(),
        "code_size": function.code_size(),
        "timeout": function.timeout(),
        "memory_size": function.memory_size(),
        "last_modified": function.last_modified(),
        "code_sha256": function.code_sha256(),
        "kms_key_arn": function.kms_key_arn(),
        "package_type": function.package_type().map(|package_type| package_type.as_str()),
        "version": function.version(),
        "revision_id": function.revision_id(),
        "vpc_config": vpc_config,
        "environment": function.environment().and_then(|environment| environment.variables()),
        "tracing_mode": function
            .tracing_config()
            .and_then(|tracing_config| tracing_config.mode())
            .map(|mode| mode.as_str()),
        "architectures": architectures,
        "ephemeral_storage": function.ephemeral_storage().map(|storage| storage.size()),
        "file_system_configs": file_system_configs,
        "layers": layers,
    })
}

/// Create function operation from a zip archive on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateFunction {
    /// IAM role the function runs as.
    pub execution_role_arn: String,
    /// The name of the function.
    pub function_name: String,
    /// Entry point, e.g. `index.handler`.
    pub handler: String,
    /// Runtime identifier, e.g. `python3.12`.
    pub runtime: types::Runtime,
    /// Timeout in seconds; the service default when `None`.
    pub timeout: Option<i32>,
    /// Deployment package.
    pub zip_path: PathBuf,
}

impl CreateFunction {
    fn from_args(args: &Args) -> Result<Self> {
        let runtime = args.string(3, "runtime")?;
        if !types::Runtime::values().contains(&runtime.as_str()) {
            return Err(Error::invalid(format!("unknown runtime \"{runtime}\"")));
        }
        Ok(Self {
            execution_role_arn: args.string(4, "execution_role_arn")?,
            function_name: args.string(0, "function_name")?,
            handler: args.string(2, "handler")?,
            runtime: types::Runtime::from(runtime.as_str()),
            timeout: args.optional_int(5, "timeout")?,
            zip_path: args.string(1, "zip_path").map(PathBuf::from)?,
        })
    }

    /// Execute the create function operation, returning the function ARN.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.lambda.create_function", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let zip_file = tokio::fs::read(&self.zip_path).await?;
        let code = types::FunctionCode::builder()
            .zip_file(Blob::new(zip_file))
            .build();
        let output = client
            .create_function()
            .function_name(self.function_name)
            .role(self.execution_role_arn)
            .handler(self.handler)
            .runtime(self.runtime)
            .code(code)
            .set_timeout(self.timeout)
            .send()
            .await?;
        Ok(json!(output.function_arn()))
    }
}

/// Invoke function operation.
#[derive(Clone, Debug, PartialEq)]
pub struct InvokeFunction {
    /// The name of the function.
    pub function_name: String,
    /// `RequestResponse`, `Event` or `DryRun`.
    pub invocation_type: types::InvocationType,
    /// Event document sent to the function.
    pub payload: String,
}

impl InvokeFunction {
    fn from_args(args: &Args) -> Result<Self> {
        let invocation_type = args
            .optional_string(2, "invocation_type")?
            .unwrap_or_else(|| types::InvocationType::RequestResponse.as_str().to_string());
        if !types::InvocationType::values().contains(&invocation_type.as_str()) {
            return Err(Error::invalid(format!(
                "invocation_type must be RequestResponse, Event or DryRun, got \"{invocation_type}\""
            )));
        }
        // JSON documents given as host values are serialized as is
        let payload = match args.value(1) {
            Some(Value::String(text)) => text.clone(),
            Some(value) => value.to_string(),
            None => return Err(Error::invalid("payload_json is required")),
        };
        Ok(Self {
            function_name: args.string(0, "function_name")?,
            invocation_type: types::InvocationType::from(invocation_type.as_str()),
            payload,
        })
    }

    /// Execute the invocation, returning `{status_code, function_error, executed_version, payload}`.
    ///
    /// The response payload is returned as text.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.lambda.invoke_function", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let output = client
            .invoke()
            .function_name(self.function_name)
            .invocation_type(self.invocation_type)
            .payload(Blob::new(self.payload))
            .send()
            .await?;
        let payload = output
            .payload()
            .map(|payload| String::from_utf8_lossy(payload.as_ref()).into_owned());
        Ok(json!({
            "status_code": output.status_code(),
            "function_error": output.function_error(),
            "executed_version": output.executed_version(),
            "payload": payload,
        }))
    }
}

/// Delete a function.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.lambda.delete_function", skip(client), err)
)]
pub async fn delete_function(client: &Client, function_name: String) -> Result<Value> {
    client
        .delete_function()
        .function_name(function_name)
        .send()
        .await?;
    Ok(Value::Bool(true))
}
