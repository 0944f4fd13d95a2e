use crate::common::{
    config::ClientConfig,
    error::{Error, Result},
    handle::{Handle, Registry},
};

use aws_config::SdkConfig;
use serde_json::Value;
use std::{future::Future, str::FromStr};

/// Fixed, compile-time set of methods a service answers to.
pub trait MethodSet: FromStr<Err = Error> + Copy {
    /// Whether this is the `destroy` method.
    fn is_destroy(self) -> bool;

    /// Usage line and accepted argument count range, excluding the method name.
    fn signature(self) -> (&'static str, (usize, usize));
}

/// One AWS service exposed through the handle/method protocol.
pub trait Service {
    /// Service tag embedded in handles (`_AWS_<PREFIX>_…`).
    const PREFIX: &'static str;
    /// Human readable list of methods and their arguments.
    const USAGE: &'static str;

    /// SDK client type held by the registry.
    type Client;
    /// Methods understood by [`Service::dispatch`].
    type Method: MethodSet;

    /// Build an SDK client from the resolved shared configuration.
    fn client(sdk_config: &SdkConfig, config: &ClientConfig) -> Self::Client;

    /// Run one method; `args` has already been checked against the method's arity.
    fn dispatch(
        client: &Self::Client,
        method: Self::Method,
        args: &[Value],
    ) -> impl Future<Output = Result<Value>>;
}

/// declare a service's method enum from a table of names, usages and arities
///
/// Generates the enum, its [`FromStr`] impl, its [`MethodSet`] impl and a `USAGE`
/// constant listing every usage line under `$header`.
#[macro_export]
#[doc(hidden)]
macro_rules! method_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $header:literal {
            $($variant:ident => $method:literal ($usage:literal, $min:literal..=$max:literal),)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        $vis enum $name {
            $(
                #[doc = concat!("`", $usage, "`")]
                $variant,
            )+
        }

        impl $name {
            /// Every method with its usage line, one per line.
            pub const USAGE: &'static str = concat!($header, $("   ", $usage, "\n",)+);

            /// The method name as invoked by the host.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $method,)+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::common::error::Error;

            fn from_str(method: &str) -> $crate::common::error::Result<Self> {
                match method {
                    $($method => Ok(Self::$variant),)+
                    _ => Err($crate::common::error::Error::UnknownMethod(method.to_string())),
                }
            }
        }

        impl $crate::common::bindings::MethodSet for $name {
            fn is_destroy(self) -> bool {
                self.name() == "destroy"
            }

            fn signature(self) -> (&'static str, (usize, usize)) {
                match self {
                    $(Self::$variant => ($usage, ($min, $max)),)+
                }
            }
        }
    };
}

/// Parse a method name and check the argument count for it.
pub fn parse_method<M: MethodSet>(method: &str, args: &[Value]) -> Result<M> {
    let method: M = method.parse()?;
    let (usage, (min, max)) = method.signature();
    if args.len() < min || args.len() > max {
        return Err(Error::Usage(usage));
    }
    Ok(method)
}

/// Synchronous front end for one service: creates, drives and destroys clients.
///
/// ```rust,no_run
/// use aws_sdk_bindings::{Bindings, dynamodb::DynamoDb};
/// use serde_json::json;
///
/// # fn example() -> aws_sdk_bindings::Result<()> {
/// let dynamodb = Bindings::<DynamoDb>::new()?;
/// let item = dynamodb.with_client(&json!({"region": "us-east-1"}), |handle| {
///     dynamodb.call(handle, "get_item", &[json!("users"), json!({"id": ["S", "1"]})])
/// })?;
/// # Ok(())
/// # }
/// ```
pub struct Bindings<S: Service> {
    registry: Registry<S::Client>,
    /// Always `Some` until the bindings drop.
    runtime: Option<tokio::runtime::Runtime>,
}

impl<S: Service> Bindings<S> {
    /// Start the bindings with their own runtime and an empty registry.
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            registry: Registry::new(),
            runtime: Some(runtime),
        })
    }

    /// Drive `future` to completion on the owned runtime.
    ///
    /// Blocking from inside another tokio runtime would panic, so it is refused;
    /// async callers use the operations' `send` directly.
    fn block_on<F: Future>(&self, future: F) -> Result<F::Output> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::Runtime(
                "blocking bindings cannot be called from inside an async runtime",
            ));
        }
        let runtime = self
            .runtime
            .as_ref()
            .ok_or(Error::Runtime("runtime is shut down"))?;
        Ok(runtime.block_on(future))
    }

    /// The registry backing this service's handles.
    pub fn registry(&self) -> &Registry<S::Client> {
        &self.registry
    }

    /// Build a client from a host config dict and return its handle.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.create", skip_all, fields(service = S::PREFIX), err)
    )]
    pub fn create(&self, config: &Value) -> Result<Handle> {
        let config = ClientConfig::from_value(config)?;
        let sdk_config = self.block_on(config.load())??;
        let client = S::client(&sdk_config, &config);
        Ok(self.insert(client))
    }

    /// Register an already built client.
    pub fn insert(&self, client: S::Client) -> Handle {
        let handle = Handle::mint(S::PREFIX);
        self.registry.register(handle.clone(), client);
        handle
    }

    /// Invalidate a handle, returning it as the result value.
    ///
    /// Destroying an unknown or already destroyed handle fails with "handle not found".
    pub fn destroy(&self, handle: &str) -> Result<Value> {
        self.registry.unregister(handle)?;
        Ok(Value::String(handle.to_string()))
    }

    /// Invoke `method` on the client behind `handle`, blocking until it completes.
    ///
    /// The handle is checked first, then the method name, then the argument count.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "aws_sdk_bindings.call", skip(self, args), fields(service = S::PREFIX), err)
    )]
    pub fn call(&self, handle: &str, method: &str, args: &[Value]) -> Result<Value> {
        let client = self.registry.lookup(handle)?;
        let method: S::Method = parse_method(method, args)?;
        if method.is_destroy() {
            return self.destroy(handle);
        }
        self.block_on(S::dispatch(&client, method, args))?
    }

    /// The usage text shown when a handle is invoked without a method.
    pub fn usage(&self) -> &'static str {
        S::USAGE
    }

    /// Create a client, hand its handle to `scope`, and destroy it on every exit path.
    pub fn with_client<T>(
        &self,
        config: &Value,
        scope: impl FnOnce(&str) -> Result<T>,
    ) -> Result<T> {
        let client = self.scoped(config)?;
        scope(client.handle().as_str())
    }

    /// Create a client whose handle is destroyed when the guard drops.
    pub fn scoped(&self, config: &Value) -> Result<ScopedClient<'_, S>> {
        let handle = self.create(config)?;
        Ok(ScopedClient {
            bindings: self,
            handle,
        })
    }
}

impl<S: Service> Drop for Bindings<S> {
    fn drop(&mut self) {
        // a blocking shutdown panics when the bindings drop inside an async context
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Guard owning a handle for the duration of a scope.
pub struct ScopedClient<'a, S: Service> {
    bindings: &'a Bindings<S>,
    handle: Handle,
}

impl<S: Service> ScopedClient<'_, S> {
    /// The guarded handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Invoke a method on the guarded client.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.bindings.call(self.handle.as_str(), method, args)
    }
}

impl<S: Service> Drop for ScopedClient<'_, S> {
    fn drop(&mut self) {
        // the scope may already have destroyed the handle through `call`
        let _ = self.bindings.registry.unregister(self.handle.as_str());
    }
}
