//! KMS bindings: key lifecycle and cryptographic operations.
//!
//! Plaintext and ciphertext cross the boundary as standard base64 text.

use crate::common::{
    args::{self, Args},
    bindings::Service,
    config::ClientConfig,
    error::{Error, Result},
    pagination::{self, Page},
};

use aws_config::SdkConfig;
use aws_sdk_kms::{Client, primitives::Blob, types};
use serde_json::{Value, json};

/// Largest page `ListKeys` accepts.
const LIST_KEYS_PAGE_SIZE: i32 = 1000;

/// The KMS service.
#[derive(Clone, Copy, Debug, Default)]
pub struct Kms;

crate::method_set! {
    /// Methods of a KMS handle.
    pub enum Method: "Usage kmsClient <method> <args>, where method can be:\n" {
        Destroy => "destroy" ("destroy", 0..=0),
        ListKeys => "list_keys" ("list_keys", 0..=0),
        CreateKey => "create_key" ("create_key", 0..=0),
        DescribeKey => "describe_key" ("describe_key key_id", 1..=1),
        EnableKey => "enable_key" ("enable_key key_id", 1..=1),
        DisableKey => "disable_key" ("disable_key key_id", 1..=1),
        CancelKeyDeletion => "cancel_key_deletion" ("cancel_key_deletion key_id", 1..=1),
        ScheduleKeyDeletion => "schedule_key_deletion" (
            "schedule_key_deletion key_id ?pending_window_in_days?",
            1..=2
        ),
        Encrypt => "encrypt" ("encrypt key_id plain_data_base64", 2..=2),
        Decrypt => "decrypt" ("decrypt cipher_data_base64", 1..=1),
        GenerateDataKey => "generate_data_key" ("generate_data_key key_id number_of_bytes", 2..=2),
        GenerateRandom => "generate_random" ("generate_random number_of_bytes", 1..=1),
    }
}

impl Service for Kms {
    const PREFIX: &'static str = "KMS";
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
            Method::ListKeys => list_keys(client).await,
            Method::CreateKey => create_key(client).await,
            Method::DescribeKey => describe_key(client, args.string(0, "key_id")?).await,
            Method::EnableKey => enable_key(client, args.string(0, "key_id")?).await,
            Method::DisableKey => disable_key(client, args.string(0, "key_id")?).await,
            Method::CancelKeyDeletion => {
                cancel_key_deletion(client, args.string(0, "key_id")?).await
            }
            Method::ScheduleKeyDeletion => {
                schedule_key_deletion(
                    client,
                    args.string(0, "key_id")?,
                    args.optional_int(1, "pending_window_in_days")?,
                )
                .await
            }
            Method::Encrypt => {
                let plaintext = args.bytes(1, "plain_data_base64")?;
                encrypt(client, args.string(0, "key_id")?, plaintext).await
            }
            Method::Decrypt => decrypt(client, args.bytes(0, "cipher_data_base64")?).await,
            Method::GenerateDataKey => {
                let number_of_bytes = byte_count(&args, 1)?;
                generate_data_key(client, args.string(0, "key_id")?, number_of_bytes).await
            }
            Method::GenerateRandom => generate_random(client, byte_count(&args, 0)?).await,
        }
    }
}

/// KMS accepts between 1 and 1024 bytes.
fn byte_count(args: &Args, index: usize) -> Result<i32> {
    let number_of_bytes = args.int(index, "number_of_bytes")?;
    if !(1..=1024).contains(&number_of_bytes) {
        return Err(Error::invalid(format!(
            "number_of_bytes must be between 1 and 1024, got {number_of_bytes}"
        )));
    }
    Ok(number_of_bytes)
}

/// List every key as `{key_id, key_arn}`, following `NextMarker`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.list_keys", skip(client), err)
)]
pub async fn list_keys(client: &Client) -> Result<Value> {
    let keys = pagination::drain(
        |marker| {
            let request = client
                .list_keys()
                .limit(LIST_KEYS_PAGE_SIZE)
                .set_marker(marker);
            async move {
                let output = request.send().await?;
                let keys = output
                    .keys()
                    .iter()
                    .map(|key| json!({"key_id": key.key_id(), "key_arn": key.key_arn()}))
                    .collect();
                let next = output
                    .truncated()
                    .then(|| output.next_marker().map(str::to_string))
                    .flatten();
                Ok::<_, Error>(Page::new(keys, next))
            }
        },
        None,
    )
    .await?;
    Ok(Value::Array(keys))
}

/// Create a symmetric key, returning its ARN.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.create_key", skip(client), err)
)]
pub async fn create_key(client: &Client) -> Result<Value> {
    let output = client.create_key().send().await?;
    Ok(json!(output.key_metadata().and_then(|metadata| metadata.arn())))
}

/// Describe a key.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.describe_key", skip(client), err)
)]
pub async fn describe_key(client: &Client, key_id: String) -> Result<Value> {
    let output = client.describe_key().key_id(key_id).send().await?;
    Ok(output.key_metadata().map_or(Value::Null, key_metadata_record))
}

/// Enum fields are their wire names, dates epoch seconds.
fn key_metadata_record(metadata: &types::KeyMetadata) -> Value {
    json!({
        "key_id": metadata.key_id(),
        "arn": metadata.arn(),
        "aws_account_id": metadata.aws_account_id(),
        "description": metadata.description(),
        "enabled": metadata.enabled(),
        "key_state": metadata.key_state().map(|state| state.as_str()),
        "key_usage": metadata.key_usage().map(|usage| usage.as_str()),
        "key_spec": metadata.key_spec().map(|spec| spec.as_str()),
        "key_manager": metadata.key_manager().map(|manager| manager.as_str()),
        "origin": metadata.origin().map(|origin| origin.as_str()),
        "multi_region": metadata.multi_region(),
        "creation_date": metadata.creation_date().map(|date| date.secs()),
        "deletion_date": metadata.deletion_date().map(|date| date.secs()),
        "valid_to": metadata.valid_to().map(|date| date.secs()),
        "pending_deletion_window_in_days": metadata.pending_deletion_window_in_days(),
    })
}

/// Enable a key, returning its id.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.enable_key", skip(client), err)
)]
pub async fn enable_key(client: &Client, key_id: String) -> Result<Value> {
    client.enable_key().key_id(&key_id).send().await?;
    Ok(Value::String(key_id))
}

/// Disable a key, returning its id.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.disable_key", skip(client), err)
)]
pub async fn disable_key(client: &Client, key_id: String) -> Result<Value> {
    client.disable_key().key_id(&key_id).send().await?;
    Ok(Value::String(key_id))
}

/// Cancel a scheduled deletion, returning the key id.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.cancel_key_deletion", skip(client), err)
)]
pub async fn cancel_key_deletion(client: &Client, key_id: String) -> Result<Value> {
    let output = client.cancel_key_deletion().key_id(&key_id).send().await?;
    Ok(json!(output.key_id().unwrap_or(key_id.as_str())))
}

/// Schedule a key for deletion, returning the deletion date in epoch seconds.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.schedule_key_deletion", skip(client), err)
)]
pub async fn schedule_key_deletion(
    client: &Client,
    key_id: String,
    pending_window_in_days: Option<i32>,
) -> Result<Value> {
    let output = client
        .schedule_key_deletion()
        .key_id(key_id)
        .set_pending_window_in_days(pending_window_in_days)
        .send()
        .await?;
    Ok(json!(output.deletion_date().map(|date| date.secs())))
}

/// Encrypt plaintext bytes, returning base64 ciphertext.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.encrypt", skip(client, plaintext), err)
)]
pub async fn encrypt(client: &Client, key_id: String, plaintext: Vec<u8>) -> Result<Value> {
    let output = client
        .encrypt()
        .key_id(key_id)
        .plaintext(Blob::new(plaintext))
        .send()
        .await?;
    Ok(blob_base64(output.ciphertext_blob()))
}

/// Decrypt ciphertext bytes, returning base64 plaintext.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.decrypt", skip(client, ciphertext), err)
)]
pub async fn decrypt(client: &Client, ciphertext: Vec<u8>) -> Result<Value> {
    let output = client
        .decrypt()
        .ciphertext_blob(Blob::new(ciphertext))
        .send()
        .await?;
    Ok(blob_base64(output.plaintext()))
}

/// Generate a data key, returning `[plaintext_base64, ciphertext_base64]`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.generate_data_key", skip(client), err)
)]
pub async fn generate_data_key(client: &Client, key_id: String, number_of_bytes: i32) -> Result<Value> {
    let output = client
        .generate_data_key()
        .key_id(key_id)
        .number_of_bytes(number_of_bytes)
        .send()
        .await?;
    Ok(json!([
        blob_base64(output.plaintext()),
        blob_base64(output.ciphertext_blob()),
    ]))
}

/// Generate random bytes, returned as base64.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "aws_sdk_bindings.kms.generate_random", skip(client), err)
)]
pub async fn generate_random(client: &Client, number_of_bytes: i32) -> Result<Value> {
    let output = client
        .generate_random()
        .number_of_bytes(number_of_bytes)
        .send()
        .await?;
    Ok(blob_base64(output.plaintext()))
}

fn blob_base64(blob: Option<&Blob>) -> Value {
    blob.map_or(Value::Null, |blob| args::encode_base64(blob.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::{bindings::parse_method, replay};
    use aws_sdk_kms::primitives::DateTime;
    use rstest::rstest;

    #[tokio::test]
    async fn test_list_keys_follows_next_marker_while_truncated() {
        let http_client = replay::replay_client(&[
            r#"{"Keys":[{"KeyId":"k1","KeyArn":"arn:k1"}],"Truncated":true,"NextMarker":"m1"}"#,
            r#"{"Keys":[{"KeyId":"k2","KeyArn":"arn:k2"}],"Truncated":false,"NextMarker":"stale"}"#,
        ]);
        let client = Client::new(&replay::sdk_config(http_client.clone()));
        assert_eq!(
            list_keys(&client).await.unwrap(),
            json!([
                {"key_id": "k1", "key_arn": "arn:k1"},
                {"key_id": "k2", "key_arn": "arn:k2"},
            ])
        );

        let requests = replay::requests(&http_client);
        assert_eq!(requests.len(), 2);
        assert!(requests[0].0.starts_with(replay::ENDPOINT));
        assert!(requests[0].1.contains(r#""Limit":1000"#));
        assert!(!requests[0].1.contains("Marker"));
        assert!(requests[1].1.contains(r#""Marker":"m1""#));
    }

    #[rstest]
    #[case::create_key("create_key", vec![], Method::CreateKey)]
    #[case::schedule_default("schedule_key_deletion", vec![json!("k")], Method::ScheduleKeyDeletion)]
    #[case::schedule_window(
        "schedule_key_deletion",
        vec![json!("k"), json!(7)],
        Method::ScheduleKeyDeletion
    )]
    #[case::decrypt("decrypt", vec![json!("AAE=")], Method::Decrypt)]
    fn test_parse_method(#[case] name: &str, #[case] args: Vec<Value>, #[case] expected: Method) {
        assert_eq!(parse_method::<Method>(name, &args).unwrap(), expected);
    }

    #[rstest]
    #[case::encrypt_without_data(
        "encrypt",
        vec![json!("k")],
        "wrong # args: should be \"encrypt key_id plain_data_base64\""
    )]
    #[case::sign("sign", vec![json!("k")], "Unknown method")]
    fn test_parse_method_rejects(#[case] name: &str, #[case] args: Vec<Value>, #[case] expected: &str) {
        let actual = parse_method::<Method>(name, &args).unwrap_err();
        assert_eq!(actual.to_string(), expected);
    }

    #[rstest]
    #[case::smallest(json!(1), Some(1))]
    #[case::largest(json!("1024"), Some(1024))]
    #[case::zero(json!(0), None)]
    #[case::too_many(json!(1025), None)]
    #[case::not_a_number(json!("many"), None)]
    fn test_byte_count(#[case] value: Value, #[case] expected: Option<i32>) {
        let values = [value];
        let args = Args::new(&values, (1, 1), "generate_random number_of_bytes").unwrap();
        assert_eq!(byte_count(&args, 0).ok(), expected);
    }

    #[rstest]
    #[case::some(Some(Blob::new(vec![0u8, 1, 2])), json!("AAEC"))]
    #[case::none(None, Value::Null)]
    fn test_blob_base64(#[case] blob: Option<Blob>, #[case] expected: Value) {
        assert_eq!(blob_base64(blob.as_ref()), expected);
    }

    #[test]
    fn test_key_metadata_record() {
        let metadata = types::KeyMetadata::builder()
            .key_id("1234")
            .arn("arn:aws:kms:us-east-1:1:key/1234")
            .enabled(true)
            .key_state(types::KeyState::PendingDeletion)
            .deletion_date(DateTime::from_secs(1_700_000_000))
            .build()
            .unwrap();
        let record = key_metadata_record(&metadata);
        assert_eq!(record["key_id"], json!("1234"));
        assert_eq!(record["enabled"], json!(true));
        assert_eq!(record["key_state"], json!("PendingDeletion"));
        assert_eq!(record["deletion_date"], json!(1_700_000_000));
        assert_eq!(record["description"], Value::Null);
    }
}
