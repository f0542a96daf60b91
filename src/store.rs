//! Access to the realtime document database holding user registrations.
//!
//! The database is a JSON tree addressed by `/`-separated paths. It offers no
//! queries: a client can read everything under a path, or subscribe to a
//! path and receive the full value again after every change.

use flate2::read::GzDecoder;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::StoreError;

/// Default interval at which [`JsonFileStore`] checks its file for changes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Minimal contract of the backing database.
pub trait DocumentStore: Send + Sync + 'static {
    /// Everything stored under `path`; `Value::Null` when nothing is.
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, StoreError>> + Send;

    /// Receive the value under `path` now and after every change.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes.
    fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;
}

impl<T: DocumentStore> DocumentStore for Arc<T> {
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, StoreError>> + Send {
        (**self).read(path)
    }

    fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        (**self).subscribe(path)
    }
}

/// Stream of values pushed by a store subscription.
pub struct Subscription {
    receiver: UnboundedReceiver<Result<Value, StoreError>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(receiver: UnboundedReceiver<Result<Value, StoreError>>) -> Self {
        Subscription {
            receiver,
            task: None,
        }
    }

    /// A subscription fed by a background task, aborted on drop.
    pub fn with_task(
        receiver: UnboundedReceiver<Result<Value, StoreError>>,
        task: JoinHandle<()>,
    ) -> Self {
        Subscription {
            receiver,
            task: Some(task),
        }
    }

    /// Next pushed value, or `None` once the store stops sending.
    pub async fn next(&mut self) -> Option<Result<Value, StoreError>> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Value under `path` in `root`, `Null` when any segment is missing.
pub fn value_at(root: &Value, path: &str) -> Value {
    let mut current = root;
    for segment in segments(path) {
        match current.get(segment) {
            Some(child) => current = child,
            None => return Value::Null,
        }
    }
    current.clone()
}

fn slot_mut<'a>(root: &'a mut Value, path: &str) -> &'a mut Value {
    let mut current = root;
    for segment in segments(path) {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            unreachable!("slot was just replaced by an object");
        };
        current = map.entry(segment.to_string()).or_insert(Value::Null);
    }
    current
}

#[derive(Default)]
struct MemoryInner {
    root: Value,
    subscribers: Vec<(String, UnboundedSender<Result<Value, StoreError>>)>,
}

/// In-process database, used for tests, demos and seeding.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: Value) -> Self {
        MemoryStore {
            inner: Mutex::new(MemoryInner {
                root,
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace whatever is stored under `path`.
    pub fn set(&self, path: &str, value: Value) {
        let mut inner = self.lock();
        *slot_mut(&mut inner.root, path) = value;
        Self::notify(&mut inner);
    }

    /// Add `value` under a freshly generated key below `path`; returns the key.
    pub fn push(&self, path: &str, value: Value) -> String {
        let key = Uuid::new_v4().simple().to_string();
        self.set(&format!("{path}/{key}"), value);
        key
    }

    /// Delete `path` and everything below it.
    pub fn remove(&self, path: &str) {
        let mut inner = self.lock();
        let parts: Vec<&str> = segments(path).collect();
        match parts.split_last() {
            None => inner.root = Value::Null,
            Some((last, parents)) => {
                let mut current = &mut inner.root;
                for segment in parents {
                    match current.get_mut(*segment) {
                        Some(child) => current = child,
                        None => return,
                    }
                }
                if let Value::Object(map) = current {
                    map.remove(*last);
                }
            }
        }
        Self::notify(&mut inner);
    }

    fn notify(inner: &mut MemoryInner) {
        let MemoryInner { root, subscribers } = inner;
        subscribers.retain(|(path, sender)| sender.send(Ok(value_at(root, path))).is_ok());
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, StoreError>> + Send {
        let value = value_at(&self.lock().root, path);
        async move { Ok(value) }
    }

    fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        sender
            .send(Ok(value_at(&inner.root, path)))
            .map_err(|e| StoreError::Closed(e.to_string()))?;
        inner.subscribers.push((path.to_string(), sender));
        Ok(Subscription::new(receiver))
    }
}

/// Database backed by a JSON export on disk (`.json`, or gzip `.json.gz`).
///
/// Subscriptions poll the file's modification time and push the value again
/// whenever it changes.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    file: PathBuf,
    poll_interval: Duration,
}

impl JsonFileStore {
    /// Fails when the file does not exist.
    pub fn open(file: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = file.as_ref().to_path_buf();
        if !file.is_file() {
            return Err(StoreError::NotFound(file.display().to_string()));
        }
        Ok(JsonFileStore {
            file,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.file
    }
}

fn is_gzip(file: &Path) -> bool {
    file.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

fn decode_dump(file: &Path, bytes: &[u8]) -> Result<Value, StoreError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Null);
    }

    if is_gzip(file) {
        let mut text = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut text)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        serde_json::from_slice(&text).map_err(|e| StoreError::Malformed(e.to_string()))
    } else {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

async fn read_file(file: &Path, path: &str) -> Result<Value, StoreError> {
    let bytes = tokio::fs::read(file).await?;
    let root = decode_dump(file, &bytes)?;
    Ok(value_at(&root, path))
}

async fn modified_at(file: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(file).await.ok()?.modified().ok()
}

impl DocumentStore for JsonFileStore {
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, StoreError>> + Send {
        let file = self.file.clone();
        let path = path.to_string();
        async move { read_file(&file, &path).await }
    }

    fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StoreError::Closed(format!("no async runtime: {e}")))?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let file = self.file.clone();
        let path = path.to_string();
        let interval = self.poll_interval;

        let task = runtime.spawn(async move {
            let mut last_seen: Option<SystemTime> = None;
            let mut first = true;
            loop {
                let modified = modified_at(&file).await;
                if first || modified != last_seen {
                    first = false;
                    last_seen = modified;
                    let update = read_file(&file, &path).await;
                    if let Err(err) = &update {
                        warn!("Polling {} failed: {err}", file.display());
                    }
                    if sender.send(update).is_err() {
                        debug!("Subscriber for {} went away", file.display());
                        break;
                    }
                }
                tokio::time::sleep(interval).await;
            }
        });

        Ok(Subscription::with_task(receiver, task))
    }
}
