//! Navigation resolver.
//!
//! # Responsibilities
//! - Turn a navigation target (path or route name) into a location
//! - Resolve it against the route table and drive the module loader
//! - Commit history entries and publish `NavigationState`
//! - Re-run resolution on history pops (back/forward) without pushing
//!
//! # Design Decisions
//! - Every navigation takes a token; only the latest token may mutate state
//! - History is written only after the module is loaded
//! - Locks are never held across an await

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ModuleLoadError, NavigationError};
use crate::loader::{ModuleLoader, ViewModule};
use crate::routing::history::{BasePath, History};
use crate::routing::table::{Route, RouteMatch, RouteTable};

/// Where to navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// A base-relative path, optionally with a query string.
    Path(String),
    /// A route name; params are carried as the query string.
    Named {
        name: String,
        params: BTreeMap<String, String>,
    },
}

impl NavigationTarget {
    pub fn named(name: impl Into<String>) -> Self {
        NavigationTarget::Named {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let NavigationTarget::Named { params, .. } = &mut self {
            params.insert(key.into(), value.into());
        }
        self
    }
}

impl From<&str> for NavigationTarget {
    fn from(path: &str) -> Self {
        NavigationTarget::Path(path.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(path: String) -> Self {
        NavigationTarget::Path(path)
    }
}

/// How a completed navigation touches history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    Push,
    Replace,
    /// History already moved (back/forward); record nothing.
    Pop,
}

/// Load status of the current navigation.
#[derive(Debug, Clone)]
pub enum NavigationStatus {
    Idle,
    Pending { path: String },
    Ready { route: Route, module: Arc<ViewModule> },
    NotFound { path: String },
    Failed { route: Route, error: ModuleLoadError },
}

/// The currently resolved route, its load status and history position.
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub status: NavigationStatus,
    /// Base-relative location of the committed history entry.
    pub location: Option<String>,
    pub history_position: usize,
}

impl NavigationState {
    fn new(history_position: usize) -> Self {
        Self {
            status: NavigationStatus::Idle,
            location: None,
            history_position,
        }
    }

    /// Name of the route currently rendered, if any.
    pub fn route_name(&self) -> Option<&str> {
        match &self.status {
            NavigationStatus::Ready { route, .. } => Some(route.name()),
            _ => None,
        }
    }

    pub fn module(&self) -> Option<&Arc<ViewModule>> {
        match &self.status {
            NavigationStatus::Ready { module, .. } => Some(module),
            _ => None,
        }
    }
}

/// What a single navigation call ended up doing.
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    Rendered { route: String, module: Arc<ViewModule> },
    NotFound { path: String },
    Failed(ModuleLoadError),
    /// A later navigation started before this one finished; its result was discarded.
    Superseded,
}

/// Resolves navigations against a route table and keeps history in step.
pub struct NavigationResolver<H> {
    table: Arc<RouteTable>,
    loader: ModuleLoader,
    base: BasePath,
    history: Mutex<H>,
    state: Mutex<NavigationState>,
    latest: AtomicU64,
}

impl<H: History> NavigationResolver<H> {
    pub fn new(table: Arc<RouteTable>, loader: ModuleLoader, base: BasePath, history: H) -> Self {
        let position = history.position();
        Self {
            table,
            loader,
            base,
            history: Mutex::new(history),
            state: Mutex::new(NavigationState::new(position)),
            latest: AtomicU64::new(0),
        }
    }

    /// Snapshot of the navigation state.
    pub fn state(&self) -> NavigationState {
        self.lock_state().clone()
    }

    /// Run `f` against the history stack.
    pub fn with_history<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.lock_history())
    }

    pub fn base(&self) -> &BasePath {
        &self.base
    }

    /// Resolve whatever location history currently points at.
    pub async fn start(&self) -> NavigationOutcome {
        self.on_pop_state().await
    }

    /// Forward navigation; pushes a history entry on success.
    pub async fn navigate(
        &self,
        target: impl Into<NavigationTarget>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let location = self.location_for(target.into())?;
        Ok(self.run(location, HistoryMode::Push).await)
    }

    /// Corrective navigation; replaces the current history entry on success.
    pub async fn replace(
        &self,
        target: impl Into<NavigationTarget>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let location = self.location_for(target.into())?;
        Ok(self.run(location, HistoryMode::Replace).await)
    }

    pub async fn back(&self) -> Option<NavigationOutcome> {
        self.go(-1).await
    }

    pub async fn forward(&self) -> Option<NavigationOutcome> {
        self.go(1).await
    }

    /// Move through history like the browser buttons do, then handle the pop.
    /// Returns `None` if there is no entry at that offset.
    pub async fn go(&self, delta: isize) -> Option<NavigationOutcome> {
        if !self.lock_history().go(delta) {
            return None;
        }
        Some(self.on_pop_state().await)
    }

    /// Re-resolve the current history entry without writing history.
    pub async fn on_pop_state(&self) -> NavigationOutcome {
        let url = self.lock_history().location().to_string();
        let location = match self.base.strip(&url) {
            Some(path) => path.to_string(),
            None => {
                tracing::warn!(url = %url, base = %self.base.as_str(), "Location outside base path");
                url
            }
        };
        self.run(location, HistoryMode::Pop).await
    }

    fn location_for(&self, target: NavigationTarget) -> Result<String, NavigationError> {
        match target {
            NavigationTarget::Path(path) => Ok(path),
            NavigationTarget::Named { name, params } => {
                let route = self
                    .table
                    .by_name(&name)
                    .ok_or(NavigationError::UnknownRouteName(name))?;
                if params.is_empty() {
                    return Ok(route.path().to_string());
                }
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter())
                    .finish();
                Ok(format!("{}?{}", route.path(), query))
            }
        }
    }

    async fn run(&self, location: String, mode: HistoryMode) -> NavigationOutcome {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(location = %location, ?mode, token, "Navigation started");

        let route = match self.table.resolve(&location) {
            RouteMatch::Found(route) => route.clone(),
            RouteMatch::NotFound => {
                tracing::info!(location = %location, "No route matched");
                let status = NavigationStatus::NotFound {
                    path: location.clone(),
                };
                if !self.commit(token, mode, &location, status) {
                    return NavigationOutcome::Superseded;
                }
                return NavigationOutcome::NotFound { path: location };
            }
        };

        {
            let mut state = self.lock_state();
            if self.is_current(token) {
                state.status = NavigationStatus::Pending {
                    path: location.clone(),
                };
            }
        }

        let result = self.loader.load(&route).await;

        match result {
            Ok(module) => {
                let status = NavigationStatus::Ready {
                    route: route.clone(),
                    module: Arc::clone(&module),
                };
                if !self.commit(token, mode, &location, status) {
                    return NavigationOutcome::Superseded;
                }
                tracing::info!(route = %route.name(), location = %location, "Navigation complete");
                NavigationOutcome::Rendered {
                    route: route.name().to_string(),
                    module,
                }
            }
            Err(error) => {
                let mut state = self.lock_state();
                if !self.is_current(token) {
                    tracing::debug!(route = %route.name(), token, "Discarding stale load failure");
                    return NavigationOutcome::Superseded;
                }
                tracing::error!(route = %route.name(), error = %error, "Navigation failed");
                if mode == HistoryMode::Pop {
                    state.location = Some(location);
                    state.history_position = self.lock_history().position();
                }
                state.status = NavigationStatus::Failed {
                    route,
                    error: error.clone(),
                };
                NavigationOutcome::Failed(error)
            }
        }
    }

    /// Write history and state if `token` is still the latest navigation.
    fn commit(&self, token: u64, mode: HistoryMode, location: &str, status: NavigationStatus) -> bool {
        let mut state = self.lock_state();
        if !self.is_current(token) {
            tracing::debug!(location = %location, token, "Discarding stale navigation result");
            return false;
        }

        let mut history = self.lock_history();
        let url = self.base.join(location);
        match mode {
            HistoryMode::Push if history.location() == url => {
                tracing::trace!(url = %url, "Already at location, not pushing");
            }
            HistoryMode::Push => history.push(url),
            HistoryMode::Replace => history.replace(url),
            HistoryMode::Pop => {}
        }

        state.status = status;
        state.location = Some(location.to_string());
        state.history_position = history.position();
        true
    }

    fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }

    fn lock_state(&self) -> MutexGuard<'_, NavigationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_history(&self) -> MutexGuard<'_, H> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
