#![deny(missing_docs)]
#![deny(warnings)]

//! # AWS SDK bindings
//!
//! Handle-based command bindings that expose AWS service clients to an embedding
//! scripting runtime.
//!
//! ## Overview
//!
//! A host creates a client from a config dict and gets back an opaque handle string
//! such as `_AWS_DDB_1`. Every later call names that handle, a method and a list of
//! positional arguments; the result is a host value (`serde_json::Value`) or an error
//! whose message is returned to the host verbatim. Destroying the handle drops the
//! client and invalidates the handle.
//!
//! Supported services: DynamoDB, S3, SQS, IAM, KMS, Lambda and SSM.
//!
//! ## Quick Example
//!
//! ```no_run
//! use aws_sdk_bindings::{Bindings, dynamodb::DynamoDb};
//! use serde_json::json;
//!
//! # fn example() -> aws_sdk_bindings::Result<()> {
//! let dynamodb = Bindings::<DynamoDb>::new()?;
//! let handle = dynamodb.create(&json!({
//!     "region": "us-east-1",
//!     "endpoint": "http://localhost:8000",
//! }))?;
//! dynamodb.call(
//!     handle.as_str(),
//!     "put_item",
//!     &[json!("users"), json!({"id": ["S", "1"], "age": ["N", "30"]})],
//! )?;
//! let item = dynamodb.call(handle.as_str(), "get_item", &[json!("users"), json!({"id": ["S", "1"]})])?;
//! let simple = dynamodb.call(handle.as_str(), "typed_item_to_simple", &[item])?;
//! assert_eq!(simple, json!({"age": 30, "id": "1"}));
//! dynamodb.destroy(handle.as_str())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Handles, dispatch, configuration and errors
//! - [`mod@dynamodb`], [`mod@s3`], [`mod@sqs`], [`mod@iam`], [`mod@kms`], [`mod@lambda`], [`mod@ssm`] - One binding per service

pub mod common;

pub mod dynamodb;

/// IAM bindings: roles and managed policies.
pub mod iam;

pub mod kms;

pub mod lambda;

pub mod s3;

pub mod sqs;

pub mod ssm;

pub use common::{
    bindings::{Bindings, MethodSet, ScopedClient, Service},
    config::ClientConfig,
    error::{Error, Result},
    handle::{Handle, Registry},
};
