//! SQS bindings: queues, messages and queue attributes.

use crate::common::{
    args::{self, Args},
    bindings::Service,
    config::ClientConfig,
    error::{Error, Result},
    pagination::{self, Page},
};

use aws_config::SdkConfig;
use aws_sdk_sqs::{Client, types};
use serde_json::{Map, Value, json};
use std::collections;

/// Largest page `ListQueues` accepts.
const LIST_QUEUES_PAGE_SIZE: i32 = 1000;

/// The SQS service.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sqs;

crate::method_set! {
    /// Methods of an SQS handle.
    pub enum Method: "Usage sqsClient <method> <args>, where method can be:\n" {
        Destroy => "destroy" ("destroy", 0..=0),
        CreateQueue => "create_queue" ("create_queue queue_name", 1..=1),
        DeleteQueue => "delete_queue" ("delete_queue queue_url", 1..=1),
        ListQueues => "list_queues" ("list_queues", 0..=0),
        SendMessage => "send_message" ("send_message queue_url message", 2..=2),
        ReceiveMessages => "receive_messages" ("receive_messages queue_url ?max_number_of_messages?", 1..=2),
        SetQueueAttributes => "set_queue_attributes" ("set_queue_attributes queue_url attributes_dict", 2..=2),
        ChangeMessageVisibility => "change_message_visibility" (
            "change_message_visibility queue_url receipt_handle visibility_timeout_seconds",
            3..=3
        ),
        DeleteMessage => "delete_message" ("delete_message queue_url receipt_handle", 2..=2),
        DeleteMessageBatch => "delete_message_batch" ("delete_message_batch queue_url receipt_handles_list", 2..=2),
        GetQueueAttributes => "get_queue_attributes" ("get_queue_attributes queue_url", 1..=1),
    }
}

impl Service for Sqs {
    const PREFIX: &'static str = "SQS";
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
            Method::CreateQueue => create_queue(client, args.string(0, "queue_name")?).await,
            Method::DeleteQueue => delete_queue(client, args.string(0, "queue_url")?).await,
            Method::ListQueues => list_queues(client).await,
            Method::SendMessage => {
                send_message(
                    client,
                    args.string(0, "queue_url")?,
                    args.string(1, "message")?,
                )
                .await
            }
            Method::ReceiveMessages => {
                let max_number_of_messages = args
                    .optional_int(1, "max_number_of_messages")?
                    .unwrap_or(1);
                receive_messages(client, args.string(0, "queue_url")?, max_number_of_messages).await
            }
            Method::SetQueueAttributes => {
                let attributes = queue_attributes(args.dict(1, "attributes_dict")?)?;
                set_queue_attributes(client, args.string(0, "queue_url")?, attributes).await
            }
            Method::ChangeMessageVisibility => {
                change_message_visibility(
                    client,
                    args.string(0, "queue_url")?,
                    args.string(1, "receipt_handle")?,
                    args.int(2, "visibility_timeout_seconds")?,
                )
                .await
            }
            Method::DeleteMessage => {
                delete_message(
                    client,
                    args.string(0, "queue_url")?,
                    args.string(1, "receipt_handle")?,
                )
                .await
            }
            Method::DeleteMessageBatch => {
                let batch = DeleteMessageBatch::new(args.string_list(1, "receipt_handles_list")?)?;
                batch.send(client, args.string(0, "queue_url")?).await
            }
            Method::GetQueueAttributes => {
                get_queue_attributes(client, args.string(0, "queue_url")?).await
            }
        }
    }
}

/// Create a queue, returning its URL.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.create_queue", skip(client), err)
)]
pub async fn create_queue(client: &Client, queue_name: String) -> Result<Value> {
    let output = client.create_queue().queue_name(queue_name).send().await?;
    Ok(json!(output.queue_url()))
}

/// Delete a queue.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.delete_queue", skip(client), err)
)]
pub async fn delete_queue(client: &Client, queue_url: String) -> Result<Value> {
    client.delete_queue().queue_url(queue_url).send().await?;
    Ok(Value::Bool(true))
}

/// List every queue URL, following `NextToken`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.list_queues", skip(client), err)
)]
pub async fn list_queues(client: &Client) -> Result<Value> {
    let urls = pagination::drain(
        |next_token| {
            let request = client
                .list_queues()
                .max_results(LIST_QUEUES_PAGE_SIZE)
                .set_next_token(next_token);
            async move {
                let output = request.send().await?;
                Ok::<_, Error>(Page::new(
                    output.queue_urls().to_vec(),
                    output.next_token().map(str::to_string),
                ))
            }
        },
        None,
    )
    .await?;
    Ok(json!(urls))
}

/// Send a message, returning its id.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.send_message", skip(client, message), err)
)]
pub async fn send_message(client: &Client, queue_url: String, message: String) -> Result<Value> {
    let output = client
        .send_message()
        .queue_url(queue_url)
        .message_body(message)
        .send()
        .await?;
    Ok(json!(output.message_id()))
}

/// Receive up to `max_number_of_messages` messages.
///
/// Each message is `{message_id, receipt_handle, body, md5_of_body}`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.receive_messages", skip(client), err)
)]
pub async fn receive_messages(
    client: &Client,
    queue_url: String,
    max_number_of_messages: i32,
) -> Result<Value> {
    let output = client
        .receive_message()
        .queue_url(queue_url)
        .max_number_of_messages(max_number_of_messages)
        .send()
        .await?;
    let messages: Vec<_> = output
        .messages()
        .iter()
        .map(|message| {
            json!({
                "message_id": message.message_id(),
                "receipt_handle": message.receipt_handle(),
                "body": message.body(),
                "md5_of_body": message.md5_of_body(),
            })
        })
        .collect();
    Ok(Value::Array(messages))
}

/// Attribute names `set_queue_attributes` accepts.
const SETTABLE_ATTRIBUTES: [types::QueueAttributeName; 6] = [
    types::QueueAttributeName::DelaySeconds,
    types::QueueAttributeName::MaximumMessageSize,
    types::QueueAttributeName::MessageRetentionPeriod,
    types::QueueAttributeName::Policy,
    types::QueueAttributeName::ReceiveMessageWaitTimeSeconds,
    types::QueueAttributeName::VisibilityTimeout,
];

/// Read an attributes dict, rejecting names outside the settable set.
fn queue_attributes(
    attributes: &Map<String, Value>,
) -> Result<collections::HashMap<types::QueueAttributeName, String>> {
    attributes
        .iter()
        .map(|(name, value)| -> Result<_> {
            let attribute = SETTABLE_ATTRIBUTES
                .iter()
                .find(|attribute| attribute.as_str() == name)
                .cloned()
                .ok_or_else(|| Error::invalid(format!("unsupported queue attribute \"{name}\"")))?;
            Ok((attribute, args::scalar_text(value, name)?))
        })
        .collect()
}

/// Set queue attributes.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.set_queue_attributes", skip(client), err)
)]
pub async fn set_queue_attributes(
    client: &Client,
    queue_url: String,
    attributes: collections::HashMap<types::QueueAttributeName, String>,
) -> Result<Value> {
    client
        .set_queue_attributes()
        .queue_url(queue_url)
        .set_attributes(Some(attributes))
        .send()
        .await?;
    Ok(Value::Bool(true))
}

/// Change how long a received message stays invisible.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.change_message_visibility", skip(client), err)
)]
pub async fn change_message_visibility(
    client: &Client,
    queue_url: String,
    receipt_handle: String,
    visibility_timeout: i32,
) -> Result<Value> {
    client
        .change_message_visibility()
        .queue_url(queue_url)
        .receipt_handle(receipt_handle)
        .visibility_timeout(visibility_timeout)
        .send()
        .await?;
    Ok(Value::Bool(true))
}

/// Delete a received message.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.delete_message", skip(client), err)
)]
pub async fn delete_message(client: &Client, queue_url: String, receipt_handle: String) -> Result<Value> {
    client
        .delete_message()
        .queue_url(queue_url)
        .receipt_handle(receipt_handle)
        .send()
        .await?;
    Ok(Value::Bool(true))
}

/// Batch of messages to delete; entry ids are `1..=n` in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteMessageBatch {
    entries: Vec<types::DeleteMessageBatchRequestEntry>,
    receipt_handles: collections::HashMap<String, String>,
}

impl DeleteMessageBatch {
    /// Number each receipt handle; SQS takes at most ten per batch.
    pub fn new(receipt_handles: Vec<String>) -> Result<Self> {
        if receipt_handles.is_empty() {
            return Err(Error::invalid("receipt_handles_list must not be empty"));
        }
        let mut batch = Self {
            entries: Vec::with_capacity(receipt_handles.len()),
            receipt_handles: collections::HashMap::with_capacity(receipt_handles.len()),
        };
        for (index, receipt_handle) in receipt_handles.into_iter().enumerate() {
            let id = (index + 1).to_string();
            let entry = types::DeleteMessageBatchRequestEntry::builder()
                .id(&id)
                .receipt_handle(&receipt_handle)
                .build()?;
            batch.entries.push(entry);
            batch.receipt_handles.insert(id, receipt_handle);
        }
        Ok(batch)
    }

    fn receipt_handle(&self, id: &Value) -> Value {
        json!(id.as_str().and_then(|id| self.receipt_handles.get(id)))
    }

    /// Delete the batch, returning `{successful: [receipt_handle...], failed: [{receipt_handle, code, message, sender_fault}...]}`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.sqs.delete_message_batch", skip(self, client), err)
    )]
    pub async fn send(self, client: &Client, queue_url: String) -> Result<Value> {
        let output = client
            .delete_message_batch()
            .queue_url(queue_url)
            .set_entries(Some(self.entries.clone()))
            .send()
            .await?;
        let successful: Vec<_> = output
            .successful()
            .iter()
            .map(|entry| self.receipt_handle(&json!(entry.id())))
            .collect();
        let failed: Vec<_> = output
            .failed()
            .iter()
            .map(|entry| {
                json!({
                    "receipt_handle": self.receipt_handle(&json!(entry.id())),
                    "code": entry.code(),
                    "message": entry.message(),
                    "sender_fault": entry.sender_fault(),
                })
            })
            .collect();
        Ok(json!({"successful": successful, "failed": failed}))
    }
}

/// Fetch every attribute of a queue as a dict keyed by attribute name.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.sqs.get_queue_attributes", skip(client), err)
)]
pub async fn get_queue_attributes(client: &Client, queue_url: String) -> Result<Value> {
    let output = client
        .get_queue_attributes()
        .queue_url(queue_url)
        .attribute_names(types::QueueAttributeName::All)
        .send()
        .await?;
    let attributes: collections::BTreeMap<_, _> = output
        .attributes()
        .into_iter()
        .flatten()
        .map(|(name, value)| (name.as_str().to_string(), Value::String(value.clone())))
        .collect();
    Ok(Value::Object(attributes.into_iter().collect()))
}
