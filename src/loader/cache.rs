//! Memoizing module loader.
//!
//! # Responsibilities
//! - Start a module fetch the first time its route is activated
//! - Hand every concurrent caller the same in-flight load
//! - Cache successful loads forever; forget failed ones so they retry
//!
//! # Design Decisions
//! - Cache keyed by route name (unique across the table)
//! - In-flight loads are `Shared` futures; the slot holds one clone
//! - Each new load is also driven by a detached task, so a caller that stops
//!   waiting (superseded navigation) does not cancel the fetch

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt, Shared};

use crate::error::{LoadFailure, ModuleLoadError};
use crate::loader::module::ViewModule;
use crate::observability::metrics;
use crate::routing::Route;

/// A pending or completed module load. Cloning it does not start another fetch.
pub type ModuleLoad = Shared<BoxFuture<'static, Result<Arc<ViewModule>, ModuleLoadError>>>;

enum Slot {
    Pending(ModuleLoad),
    Resolved(Arc<ViewModule>),
}

/// Lazy, deduplicating, caching loader for view modules.
#[derive(Clone, Default)]
pub struct ModuleLoader {
    slots: Arc<DashMap<String, Slot>>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the module behind `route`.
    ///
    /// Returns the cached module if resolved, the existing in-flight load if
    /// one is pending, or starts a new fetch otherwise.
    pub fn load(&self, route: &Route) -> ModuleLoad {
        let id = route.name().to_string();

        let load = match self.slots.entry(id.clone()) {
            Entry::Occupied(entry) => {
                return match entry.get() {
                    Slot::Resolved(module) => {
                        tracing::trace!(route = %id, "Module served from cache");
                        future::ready(Ok(Arc::clone(module))).boxed().shared()
                    }
                    Slot::Pending(load) => {
                        tracing::trace!(route = %id, "Joining in-flight module load");
                        load.clone()
                    }
                };
            }
            Entry::Vacant(entry) => {
                tracing::debug!(route = %id, path = %route.path(), "Starting module load");
                let fetch = route.source().fetch();
                let slots = Arc::clone(&self.slots);
                let load = async move {
                    let result = fetch.await;
                    settle(&slots, id, result)
                }
                .boxed()
                .shared();
                entry.insert(Slot::Pending(load.clone()));
                load
            }
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(load.clone().map(drop));
        }
        load
    }

    /// Whether a resolved module is cached for `route`.
    pub fn is_cached(&self, route: &str) -> bool {
        matches!(self.slots.get(route).as_deref(), Some(Slot::Resolved(_)))
    }

    /// Whether a load for `route` is currently in flight.
    pub fn is_pending(&self, route: &str) -> bool {
        matches!(self.slots.get(route).as_deref(), Some(Slot::Pending(_)))
    }

    /// Cached module for `route`, if any.
    pub fn cached(&self, route: &str) -> Option<Arc<ViewModule>> {
        match self.slots.get(route).as_deref() {
            Some(Slot::Resolved(module)) => Some(Arc::clone(module)),
            _ => None,
        }
    }
}

fn settle(
    slots: &DashMap<String, Slot>,
    route: String,
    result: Result<String, LoadFailure>,
) -> Result<Arc<ViewModule>, ModuleLoadError> {
    match result {
        Ok(source) => {
            let module = Arc::new(ViewModule {
                route: route.clone(),
                source: source.into(),
            });
            tracing::debug!(route = %route, "Module loaded");
            metrics::record_module_load(&route, "loaded");
            slots.insert(route, Slot::Resolved(Arc::clone(&module)));
            Ok(module)
        }
        Err(cause) => {
            tracing::warn!(route = %route, error = %cause, "Module load failed");
            metrics::record_module_load(&route, "failed");
            slots.remove(&route);
            Err(ModuleLoadError { route, cause })
        }
    }
}
