use crate::common::error::{Error, Result};

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use serde::Deserialize;
use serde_json::Value;

const STATIC_CREDENTIALS_PROVIDER: &str = "aws-sdk-bindings";

/// Client configuration record read from the host's config dict.
///
/// Every field is optional; the SDK defaults fill in whatever is missing.
///
/// ```rust
/// use aws_sdk_bindings::common::config::ClientConfig;
/// use serde_json::json;
///
/// let config = ClientConfig::from_value(&json!({
///     "region": "us-east-1",
///     "endpoint": "http://localhost:8000",
/// }))
/// .unwrap();
/// assert_eq!(config.region.as_deref(), Some("us-east-1"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ClientConfig {
    /// AWS region, e.g. `us-east-1`.
    pub region: Option<String>,
    /// Endpoint override for local or emulated services.
    pub endpoint: Option<String>,
    /// Shared config profile to read settings from.
    pub profile: Option<String>,
    /// Static access key id, paired with `aws_secret_access_key`.
    pub aws_access_key_id: Option<String>,
    /// Static secret access key, paired with `aws_access_key_id`.
    pub aws_secret_access_key: Option<String>,
    /// Optional session token for temporary static credentials.
    pub aws_session_token: Option<String>,
}

impl ClientConfig {
    /// Read the configuration from a host dict.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidConfig("expected a dict".to_string()));
        }
        let config = Self::deserialize(value).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.credentials()?;
        Ok(config)
    }

    /// Static credentials, if the record carries them.
    pub fn credentials(&self) -> Result<Option<Credentials>> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Some(Credentials::new(
                access_key_id,
                secret_access_key,
                self.aws_session_token.clone(),
                None,
                STATIC_CREDENTIALS_PROVIDER,
            ))),
            (None, None) => Ok(None),
            _ => Err(Error::InvalidConfig(
                "aws_access_key_id and aws_secret_access_key must be given together".to_string(),
            )),
        }
    }

    /// Resolve the shared SDK configuration.
    ///
    /// Without static credentials the SDK default credential chain is used.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.config.load", skip(self), fields(region = ?self.region, endpoint = ?self.endpoint))
    )]
    pub async fn load(&self) -> Result<SdkConfig> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(credentials) = self.credentials()? {
            loader = loader.credentials_provider(credentials);
        }
        Ok(loader.load().await)
    }
}
