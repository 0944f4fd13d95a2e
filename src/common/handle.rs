use crate::common::error::{Error, Result};

use std::{
    borrow, collections, fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque token naming a live client in a [`Registry`].
///
/// Handles look like `_AWS_DDB_1f` and are never reused within a process.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Handle(String);

impl Handle {
    /// Mint a fresh handle for the given service prefix.
    pub(crate) fn mint(prefix: &str) -> Self {
        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        Self(format!("_AWS_{prefix}_{id:x}"))
    }

    /// The handle text as handed to the host.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Handle {
    fn from(handle: &str) -> Self {
        Self(handle.to_string())
    }
}

impl From<String> for Handle {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

impl borrow::Borrow<str> for Handle {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Mapping from handles to live clients, guarded by a single mutex.
///
/// Clients are shared out as [`Arc`]s so a lookup never holds the lock across a call.
#[derive(Debug)]
pub struct Registry<C> {
    clients: Mutex<collections::HashMap<Handle, Arc<C>>>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self {
            clients: Mutex::new(collections::HashMap::new()),
        }
    }
}

impl<C> Registry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self) -> std::sync::MutexGuard<'_, collections::HashMap<Handle, Arc<C>>> {
        // the map holds no invariant a panicking holder could have broken
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `client` under `handle` unless the handle is already taken.
    ///
    /// Returns whether the insertion happened.
    pub fn register(&self, handle: Handle, client: C) -> bool {
        let mut clients = self.clients();
        let inserted = match clients.entry(handle) {
            collections::hash_map::Entry::Occupied(_) => false,
            collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Arc::new(client));
                true
            }
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(inserted, "register client");
        inserted
    }

    /// Fetch the client registered under `handle`.
    pub fn lookup(&self, handle: &str) -> Result<Arc<C>> {
        self.clients()
            .get(handle)
            .cloned()
            .ok_or(Error::HandleNotFound)
    }

    /// Remove `handle`, failing when it is not registered.
    pub fn unregister(&self, handle: &str) -> Result<Arc<C>> {
        let removed = self.clients().remove(handle);
        #[cfg(feature = "tracing")]
        tracing::debug!(handle, found = removed.is_some(), "unregister client");
        removed.ok_or(Error::HandleNotFound)
    }

    /// Number of live clients.
    pub fn len(&self) -> usize {
        self.clients().len()
    }

    /// Whether no client is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
