//! Shared plumbing for every service binding.
//!
//! The handle registry, the method dispatch traits, client configuration,
//! argument decoding and the error type live here.

pub(crate) mod args;

/// Service trait, method tables and the synchronous [`Bindings`](bindings::Bindings) front end.
pub mod bindings;

/// Client configuration read from the host's config dict.
pub mod config;

/// Error type shared by every binding.
pub mod error;

/// Handle minting and the client registry.
pub mod handle;

pub(crate) mod pagination;

#[cfg(test)]
pub(crate) mod replay;
