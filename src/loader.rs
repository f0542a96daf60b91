//! Paginated, newest-first view of the remote user collection.
//!
//! The database cannot page or sort, so every read fetches the whole
//! collection, sorts it by `createdAt` and slices it locally. `load_more`
//! therefore re-reads everything and appends the next page beyond what is
//! already held.
//!
//! Each `load_initial`/`refresh` starts a new generation. A read that
//! completes after its generation has been superseded is dropped, so a slow
//! `load_more` can never overwrite the result of a newer `refresh`.

use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use crate::config::{LIVE_REPLACE_THRESHOLD, LoaderOptions};
use crate::error::{LoaderError, StoreError};
use crate::store::DocumentStore;
use crate::user::{UserRecord, sort_newest_first};

/// Point-in-time copy of the loader's state, ready for rendering.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LoadState {
    /// Materialized records, newest first.
    pub users: Vec<UserRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub has_more: bool,
    /// Size of the remote collection at the last read, independent of how
    /// many records are materialized.
    pub total_count: Option<usize>,
}

#[derive(Debug)]
struct LoaderState {
    users: Vec<UserRecord>,
    loading: bool,
    error: Option<String>,
    has_more: bool,
    total_count: Option<usize>,
    generation: u64,
    /// Set once an initial load has succeeded in the current generation.
    initialised: bool,
}

impl Default for LoaderState {
    fn default() -> Self {
        LoaderState {
            users: Vec::new(),
            loading: false,
            error: None,
            has_more: true,
            total_count: None,
            generation: 0,
            initialised: false,
        }
    }
}

/// Loads the user collection from `S` page by page.
///
/// All methods take `&self`; the state sits behind a mutex that is never held
/// across a database read.
pub struct PaginatedUsers<S> {
    store: Result<Arc<S>, String>,
    options: LoaderOptions,
    state: Mutex<LoaderState>,
}

impl<S: DocumentStore> PaginatedUsers<S> {
    pub fn new(store: S, options: LoaderOptions) -> Self {
        Self::from_init(Ok(store), options)
    }

    /// Build from the outcome of opening the store. When opening failed,
    /// every load reports [`LoaderError::BackendUnavailable`].
    pub fn from_init(store: Result<S, StoreError>, options: LoaderOptions) -> Self {
        PaginatedUsers {
            store: store.map(Arc::new).map_err(|e| e.to_string()),
            options,
            state: Mutex::new(LoaderState::default()),
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> LoadState {
        let state = self.lock();
        LoadState {
            users: state.users.clone(),
            loading: state.loading,
            error: state.error.clone(),
            has_more: state.has_more,
            total_count: state.total_count,
        }
    }

    async fn fetch_sorted(&self, store: &S) -> Result<Vec<UserRecord>, LoaderError> {
        let timeout = self.options.read_timeout;
        let value = tokio::time::timeout(timeout, store.read(&self.options.collection_path))
            .await
            .map_err(|_| LoaderError::Timeout(timeout))??;

        let mut users = UserRecord::collection_from_value(value);
        sort_newest_first(&mut users);
        Ok(users)
    }

    /// Read the collection and keep the newest `initial_load_size` records.
    ///
    /// On failure the state is left empty with `error` set.
    pub async fn load_initial(&self) -> Result<(), LoaderError> {
        let store = match &self.store {
            Ok(store) => Arc::clone(store),
            Err(reason) => {
                let err = LoaderError::BackendUnavailable(reason.clone());
                error!("Cannot load users: {err}");
                let mut state = self.lock();
                state.users.clear();
                state.loading = false;
                state.has_more = false;
                state.error = Some(err.to_string());
                return Err(err);
            }
        };

        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.loading = true;
            state.error = None;
            state.generation
        };
        info!(
            "Loading users from '{}' (generation {generation})",
            self.options.collection_path
        );

        let result = self.fetch_sorted(&store).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!("Discarding initial load of superseded generation {generation}");
            return Ok(());
        }
        state.loading = false;

        match result {
            Ok(all) => {
                let total = all.len();
                let keep = self.options.initial_load_size;
                state.users = all.into_iter().take(keep).collect();
                state.has_more = total > keep;
                state.total_count = Some(total);
                state.initialised = true;
                info!("Loaded {} of {total} users", state.users.len());
                Ok(())
            }
            Err(err) => {
                error!("Error loading initial users: {err}");
                state.users.clear();
                state.has_more = false;
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Append the next `page_size` records.
    ///
    /// Does nothing while a load is in flight, when nothing more is
    /// available, or before the initial load has succeeded. On failure the
    /// records already held are kept.
    pub async fn load_more(&self) -> Result<(), LoaderError> {
        let Ok(store) = &self.store else {
            return Ok(());
        };

        let (generation, current) = {
            let mut state = self.lock();
            if state.loading || !state.has_more || !state.initialised {
                return Ok(());
            }
            state.loading = true;
            (state.generation, state.users.len())
        };
        debug!("Loading more users after {current}");

        let result = self.fetch_sorted(store).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!("Discarding load_more of superseded generation {generation}");
            return Ok(());
        }
        state.loading = false;

        match result {
            Ok(all) => {
                let total = all.len();
                state.total_count = Some(total);
                if current >= total {
                    state.has_more = false;
                    return Ok(());
                }
                let batch: Vec<UserRecord> = all
                    .into_iter()
                    .skip(current)
                    .take(self.options.page_size)
                    .collect();
                let appended = batch.len();
                state.users.extend(batch);
                state.has_more = current + appended < total;
                debug!(
                    "Appended {appended} users, {} of {total} loaded",
                    state.users.len()
                );
                Ok(())
            }
            Err(err) => {
                error!("Error loading more users: {err}");
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Keep calling [`load_more`](Self::load_more) until the collection is
    /// exhausted or a page fails.
    pub async fn load_all(&self) -> Result<(), LoaderError> {
        loop {
            let before = {
                let state = self.lock();
                if !state.has_more || !state.initialised {
                    return Ok(());
                }
                state.users.len()
            };
            self.load_more().await?;
            if self.lock().users.len() == before {
                return Ok(());
            }
        }
    }

    /// Drop everything held locally and load from scratch.
    pub async fn refresh(&self) -> Result<(), LoaderError> {
        {
            let mut state = self.lock();
            let generation = state.generation + 1;
            *state = LoaderState {
                generation,
                ..LoaderState::default()
            };
        }
        self.load_initial().await
    }

    /// Apply a value pushed by the live subscription.
    ///
    /// Below the replace threshold, before the initial load, and while a read
    /// is in flight, the snapshot is ignored so it cannot race manual
    /// pagination. Returns whether the local list was replaced.
    pub fn apply_live_snapshot(&self, value: Value) -> bool {
        let mut users = UserRecord::collection_from_value(value);
        let total = users.len();

        let mut state = self.lock();
        if !state.initialised {
            debug!("Ignoring live snapshot before initial load");
            return false;
        }
        state.total_count = Some(total);

        if state.loading {
            debug!("Ignoring live snapshot while a load is in flight");
            return false;
        }
        if (state.users.len() as f64) < total as f64 * LIVE_REPLACE_THRESHOLD {
            debug!(
                "Ignoring live snapshot: {} of {total} users materialized",
                state.users.len()
            );
            return false;
        }

        sort_newest_first(&mut users);
        state.users = users;
        state.has_more = false;
        true
    }

    fn record_live_error(&self, err: StoreError) {
        let err = LoaderError::from(err);
        error!("Realtime listener error: {err}");
        self.lock().error = Some(err.to_string());
    }

    /// Subscribe to the collection and feed every pushed value through
    /// [`apply_live_snapshot`](Self::apply_live_snapshot).
    ///
    /// Returns `None` when realtime updates are disabled. Must be called from
    /// within a tokio runtime; dropping the handle unsubscribes.
    pub fn spawn_live_updates(self: &Arc<Self>) -> Result<Option<LiveUpdates>, LoaderError> {
        if !self.options.enable_realtime {
            return Ok(None);
        }
        let store = self
            .store
            .as_ref()
            .map_err(|reason| LoaderError::BackendUnavailable(reason.clone()))?;
        let mut subscription = store.subscribe(&self.options.collection_path)?;

        let loader = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(update) = subscription.next().await {
                match update {
                    Ok(value) => {
                        if loader.apply_live_snapshot(value) {
                            debug!("Replaced users from live snapshot");
                        }
                    }
                    Err(err) => loader.record_live_error(err),
                }
            }
            debug!("Live subscription ended");
        });

        Ok(Some(LiveUpdates { task }))
    }
}

/// Running live subscription; aborted on drop.
pub struct LiveUpdates {
    task: JoinHandle<()>,
}

impl LiveUpdates {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LiveUpdates {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn options(initial: usize, page: usize) -> LoaderOptions {
        LoaderOptions {
            initial_load_size: initial,
            page_size: page,
            enable_realtime: false,
            ..LoaderOptions::default()
        }
    }

    fn store_with(count: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..count {
            store.set(
                &format!("users/u{i:03}"),
                json!({"createdAt": format!("2026-01-01T00:{:02}:{:02}Z", i / 60, i % 60)}),
            );
        }
        store
    }

    #[tokio::test]
    async fn load_more_before_initial_load_is_a_noop() {
        let loader = PaginatedUsers::new(store_with(3), options(1, 1));
        loader.load_more().await.unwrap();
        assert!(loader.snapshot().users.is_empty());
        assert_eq!(loader.snapshot().total_count, None);
    }

    #[tokio::test]
    async fn live_snapshot_threshold() {
        let loader = PaginatedUsers::new(store_with(10), options(9, 5));
        loader.load_initial().await.unwrap();
        assert_eq!(loader.snapshot().users.len(), 9);

        // 9 of 11 is below 90%: ignored, but the total is tracked.
        let mut bigger = store_with(11).read("users").await.unwrap();
        assert!(!loader.apply_live_snapshot(bigger.clone()));
        let state = loader.snapshot();
        assert_eq!(state.users.len(), 9);
        assert_eq!(state.total_count, Some(11));

        // 9 of 10 reaches the threshold: replaced wholesale, newest first.
        bigger.as_object_mut().unwrap().remove("u010");
        assert!(loader.apply_live_snapshot(bigger));
        let state = loader.snapshot();
        assert_eq!(state.users.len(), 10);
        assert_eq!(state.users[0].uid, "u009");
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn live_snapshot_before_initial_load_is_ignored() {
        let loader = PaginatedUsers::new(MemoryStore::new(), options(10, 10));
        assert!(!loader.apply_live_snapshot(json!({"a": {}})));
        assert_eq!(loader.snapshot().total_count, None);
    }
}
