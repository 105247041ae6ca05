//! Transport kind → [`Transport`] resolution.
//!
//! Resolution order (first match wins), mirroring the reference system's
//! module-resolution steps but collapsed onto one `Transport` trait object
//! instead of duck-typed module shapes (see DESIGN.md):
//!
//! 1. an inline resolver function supplied by the host;
//! 2. an inline `kind -> Transport` map supplied by the host;
//! 3. a statically self-registered transport, discovered under the
//!    conventional name `transport-{kind}` (populated at process start by
//!    [`crate::register_transport!`], the static analog of dynamic module
//!    import).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use futures::future::BoxFuture;
use tracing::error;
use tracing::info;

use crate::error::RuntimeError;
use crate::executor::Transport;

type InlineResolverFn =
    Arc<dyn Fn(&str) -> BoxFuture<'static, Result<Arc<dyn Transport>, RuntimeError>> + Send + Sync>;

/// How the host supplies statically-known transports.
#[derive(Clone)]
pub enum TransportSource {
    /// `kind -> Transport`, resolved with a plain map lookup.
    Map(Arc<HashMap<String, Arc<dyn Transport>>>),
    /// An arbitrary resolver, e.g. backed by a config file or service
    /// discovery; may be asynchronous.
    Resolver(InlineResolverFn),
}

/// Resolves a transport kind to a [`Transport`] using the resolution order
/// documented on this module.
#[derive(Clone, Default)]
pub struct TransportRegistry {
    source: Option<TransportSource>,
}

impl TransportRegistry {
    pub fn new(source: Option<TransportSource>) -> Self {
        Self { source }
    }

    pub async fn get_factory(&self, kind: &str) -> Result<Arc<dyn Transport>, RuntimeError> {
        match &self.source {
            Some(TransportSource::Resolver(resolver)) => {
                info!(transport.kind = kind, "resolving transport via inline resolver");
                return resolver(kind).await;
            }
            Some(TransportSource::Map(map)) => {
                if let Some(transport) = map.get(kind) {
                    info!(transport.kind = kind, "resolved transport from inline map");
                    return Ok(transport.clone());
                }
            }
            None => {}
        }

        let conventional_name = conventional_module_name(kind);
        match STATIC_TRANSPORTS.get(kind) {
            Some(transport) => {
                info!(
                    transport.kind = kind,
                    transport.module = conventional_name.as_str(),
                    "resolved transport via static discovery"
                );
                Ok(transport)
            }
            None => {
                error!(
                    transport.kind = kind,
                    transport.module = conventional_name.as_str(),
                    "no transport could be resolved for this kind"
                );
                Err(RuntimeError::Configuration {
                    kind: kind.to_string(),
                    conventional_name,
                })
            }
        }
    }
}

fn conventional_module_name(kind: &str) -> String {
    format!("transport-{kind}")
}

struct StaticRegistry {
    inner: Mutex<Option<HashMap<&'static str, Arc<dyn Transport>>>>,
}

impl StaticRegistry {
    const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn register(&self, kind: &'static str, build: fn() -> Arc<dyn Transport>) {
        let mut guard = self.inner.lock().expect("transport registry lock poisoned");
        guard.get_or_insert_with(HashMap::new).insert(kind, build());
    }

    fn get(&self, kind: &str) -> Option<Arc<dyn Transport>> {
        let guard = self.inner.lock().expect("transport registry lock poisoned");
        guard.as_ref()?.get(kind).cloned()
    }
}

/// Global table of statically self-registered transports, populated by
/// [`crate::register_transport!`] at process start (via `ctor`), the way
/// the teacher's plugin system self-registers compiled-in plugins.
static STATIC_TRANSPORTS: StaticRegistry = StaticRegistry::new();

#[doc(hidden)]
pub mod reexport {
    pub use ctor;
}

#[doc(hidden)]
pub fn __register_static_transport(kind: &'static str, build: fn() -> Arc<dyn Transport>) {
    STATIC_TRANSPORTS.register(kind, build);
}

/// Registers a statically-linked [`Transport`] under a conventional kind
/// name, for discovery as resolution step 3.
///
/// ```ignore
/// register_transport!("http", HttpTransport::default);
/// ```
#[macro_export]
macro_rules! register_transport {
    ($kind:literal, $build:expr) => {
        const _: () = {
            #[$crate::transport::registry::reexport::ctor::ctor]
            fn register() {
                $crate::transport::registry::__register_static_transport($kind, $build);
            }
        };
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Executor;
    use crate::executor::SubgraphExecCtx;
    use async_trait::async_trait;
    use tower::BoxError;

    struct FakeTransport;

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get_subgraph_executor(
            &self,
            _ctx: SubgraphExecCtx,
        ) -> Result<Arc<dyn Executor>, BoxError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn inline_map_wins_over_static_discovery() {
        let mut map: HashMap<String, Arc<dyn Transport>> = HashMap::new();
        map.insert("http".to_string(), Arc::new(FakeTransport));
        let registry = TransportRegistry::new(Some(TransportSource::Map(Arc::new(map))));
        assert!(registry.get_factory("http").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_kind_names_kind_and_conventional_module_in_error() {
        let registry = TransportRegistry::default();
        let err = registry.get_factory("ghost").await.unwrap_err();
        match err {
            RuntimeError::Configuration {
                kind,
                conventional_name,
            } => {
                assert_eq!(kind, "ghost");
                assert_eq!(conventional_name, "transport-ghost");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
