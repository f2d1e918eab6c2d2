pub mod file_store;
pub mod runtime;
pub mod watcher;

pub use file_store::{document_id, FileStore};
pub use runtime::{forward_events, EditorRuntime, RuntimeError, RuntimeHandle, Snapshot};
pub use watcher::{coalesce, translate, FileWatcher, HostEvent, WatcherError, WatcherResult};
