//! S3 bindings: list, upload, download and delete objects.

use crate::common::{
    args::Args,
    bindings::Service,
    config::ClientConfig,
    error::{Error, Result},
    pagination::{self, Page},
};

use aws_config::SdkConfig;
use aws_sdk_s3::{Client, primitives::ByteStream, types};
use serde_json::{Value, json};
use std::{io, path};

/// The S3 service.
#[derive(Clone, Copy, Debug, Default)]
pub struct S3;

crate::method_set! {
    /// Methods of an S3 handle.
    pub enum Method: "Usage s3Client <method> <args>, where method can be:\n" {
        Destroy => "destroy" ("destroy", 0..=0),
        Ls => "ls" ("ls bucket ?prefix?", 1..=2),
        PutText => "put_text" ("put_text bucket key text", 3..=3),
        Put => "put" ("put bucket key input_file", 3..=3),
        Get => "get" ("get bucket key ?output_file?", 2..=3),
        Delete => "delete" ("delete bucket key", 2..=2),
        DeleteObjects => "delete_objects" ("delete_objects bucket keys_list", 2..=2),
    }
}

impl Service for S3 {
    const PREFIX: &'static str = "S3";
    const USAGE: &'static str = Method::USAGE;

    type Client = Client;
    type Method = Method;

    /// Endpoint overrides (emulators, MinIO) usually lack virtual-host buckets.
    fn client(sdk_config: &SdkConfig, config: &ClientConfig) -> Client {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();
        Client::from_conf(s3_config)
    }

    async fn dispatch(client: &Client, method: Method, args: &[Value]) -> Result<Value> {
        let args = Args::of(method, args)?;
        match method {
            Method::Destroy => Err(Error::invalid("destroy is handled by the bindings")),
            Method::Ls => ListObjects::from_args(&args)?.send(client).await,
            Method::PutText => {
                PutObject {
                    body: Body::Text(args.string(2, "text")?),
                    bucket: args.string(0, "bucket")?,
                    key: args.string(1, "key")?,
                }
                .send(client)
                .await
            }
            Method::Put => {
                PutObject {
                    body: Body::File(args.string(2, "input_file")?.into()),
                    bucket: args.string(0, "bucket")?,
                    key: args.string(1, "key")?,
                }
                .send(client)
                .await
            }
            Method::Get => GetObject::from_args(&args)?.send(client).await,
            Method::Delete => DeleteObject::from_args(&args)?.send(client).await,
            Method::DeleteObjects => DeleteObjects::from_args(&args)?.send(client).await,
        }
    }
}

/// List object keys in a bucket, following continuation tokens.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListObjects {
    /// Bucket to list.
    pub bucket: String,
    /// Only keys starting with this prefix.
    pub prefix: Option<String>,
}

impl ListObjects {
    fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            bucket: args.string(0, "bucket")?,
            prefix: args.optional_string(1, "prefix")?,
        })
    }

    /// Return every key, in listing order.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.s3.ls", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let keys = pagination::drain(
            |continuation_token| {
                let request = client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .set_prefix(self.prefix.clone())
                    .set_continuation_token(continuation_token);
                async move {
                    let output = request.send().await?;
                    let keys = output
                        .contents()
                        .iter()
                        .filter_map(|object| object.key().map(str::to_string))
                        .collect();
                    Ok::<_, Error>(Page::new(
                        keys,
                        output.next_continuation_token().map(str::to_string),
                    ))
                }
            },
            None,
        )
        .await?;
        Ok(json!(keys))
    }
}

/// Object content to upload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Body {
    /// Literal text.
    Text(String),
    /// Content of a local file.
    File(path::PathBuf),
}

/// Upload an object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PutObject {
    /// Content to upload.
    pub body: Body,
    /// Destination bucket.
    pub bucket: String,
    /// Destination key.
    pub key: String,
}

impl PutObject {
    /// Upload the object.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.s3.put", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let bytes = match self.body {
            Body::Text(text) => text.into_bytes(),
            Body::File(path) => tokio::fs::read(path).await?,
        };
        client
            .put_object()
            .bucket(self.bucket)
            .key(self.key)
            .body(ByteStream::from(bytes))
            .send()
            .await?;
        Ok(Value::Bool(true))
    }
}

/// Download an object.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GetObject {
    /// Source bucket.
    pub bucket: String,
    /// Source key.
    pub key: String,
    /// Write the content here instead of returning it.
    pub output_file: Option<path::PathBuf>,
}

impl GetObject {
    fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            bucket: args.string(0, "bucket")?,
            key: args.string(1, "key")?,
            output_file: args.optional_string(2, "output_file")?.map(Into::into),
        })
    }

    /// Download the object, returning its text or `true` once written to `output_file`.
    ///
    /// Invalid UTF-8 in the returned text is replaced.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.s3.get", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let output = client
            .get_object()
            .bucket(self.bucket)
            .key(self.key)
            .send()
            .await?;
        let bytes = output
            .body
            .collect()
            .await
            .map_err(io::Error::other)?
            .into_bytes();
        match self.output_file {
            Some(path) => {
                tokio::fs::write(path, &bytes).await?;
                Ok(Value::Bool(true))
            }
            None => Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        }
    }
}

/// Delete a single object.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeleteObject {
    /// Bucket holding the object.
    pub bucket: String,
    /// Key to delete.
    pub key: String,
}

impl DeleteObject {
    fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            bucket: args.string(0, "bucket")?,
            key: args.string(1, "key")?,
        })
    }

    /// Delete the object.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.s3.delete", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        client
            .delete_object()
            .bucket(self.bucket)
            .key(self.key)
            .send()
            .await?;
        Ok(Value::Bool(true))
    }
}

/// Delete several objects in one request, reporting the outcome per key.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeleteObjects {
    /// Bucket holding the objects.
    pub bucket: String,
    /// Keys to delete; S3 accepts at most 1000 per request.
    pub keys: Vec<String>,
}

impl DeleteObjects {
    fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            bucket: args.string(0, "bucket")?,
            keys: args.string_list(1, "keys_list")?,
        })
    }
}

impl TryFrom<DeleteObjects> for types::Delete {
    type Error = Error;

    fn try_from(delete_objects: DeleteObjects) -> Result<Self> {
        if delete_objects.keys.is_empty() {
            return Err(Error::invalid("keys_list must not be empty"));
        }
        let objects = delete_objects
            .keys
            .into_iter()
            .map(|key| types::ObjectIdentifier::builder().key(key).build())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let delete = types::Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()?;
        Ok(delete)
    }
}

impl DeleteObjects {
    /// Delete the objects, returning `{deleted: [key...], errors: [{key, code, message}...]}`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.s3.delete_objects", skip(client), err)
    )]
    pub async fn send(self, client: &Client) -> Result<Value> {
        let bucket = self.bucket.clone();
        let delete: types::Delete = self.try_into()?;
        let output = client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await?;
        let deleted: Vec<_> = output
            .deleted()
            .iter()
            .map(|deleted| json!(deleted.key()))
            .collect();
        let errors: Vec<_> = output
            .errors()
            .iter()
            .map(|error| {
                json!({
                    "key": error.key(),
                    "code": error.code(),
                    "message": error.message(),
                })
            })
            .collect();
        Ok(json!({"deleted": deleted, "errors": errors}))
    }
}
