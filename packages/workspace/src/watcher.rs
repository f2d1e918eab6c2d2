use crate::file_store::document_id;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use proptree_editor::DocumentId;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    CreateError(#[from] notify::Error),

    #[error("Cannot watch '{path}': {source}")]
    WatchError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type WatcherResult<T> = Result<T, WatcherError>;

/// Quiet period that ends a batch of filesystem events
pub const SETTLE: Duration = Duration::from_millis(50);

/// Notification from the host about a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Changed(DocumentId),
    Removed(DocumentId),
}

impl HostEvent {
    pub fn id(&self) -> &DocumentId {
        match self {
            HostEvent::Changed(id) | HostEvent::Removed(id) => id,
        }
    }
}

/// Filesystem watcher over a document root, reporting `.json` changes as
/// [`HostEvent`]s
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    root: PathBuf,
}

impl FileWatcher {
    pub fn new(root: PathBuf) -> WatcherResult<Self> {
        // Events carry canonical paths on some platforms
        let root = root.canonicalize().map_err(|source| WatcherError::WatchError {
            path: root.clone(),
            source,
        })?;
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::info!(root = %root.display(), "watching documents");

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Block until the next batch of document events.
    ///
    /// Events arriving within [`SETTLE`] of each other form one batch, so an
    /// atomic save that notify reports several times yields one event per
    /// document.
    pub fn next_events(&self) -> Option<Vec<HostEvent>> {
        loop {
            let first = match self.receiver.recv() {
                Ok(event) => event,
                Err(_) => return None,
            };
            let events = self.settle(first);
            if !events.is_empty() {
                return Some(events);
            }
        }
    }

    pub fn next_events_timeout(&self, timeout: Duration) -> Option<Vec<HostEvent>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(first) => Some(self.settle(first)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn settle(&self, first: notify::Result<Event>) -> Vec<HostEvent> {
        let mut events = Vec::new();
        let mut next = Some(first);
        while let Some(received) = next.take() {
            match received {
                Ok(event) => events.extend(translate(&self.root, &event)),
                Err(e) => tracing::warn!(error = %e, "watch error"),
            }
            next = self.receiver.recv_timeout(SETTLE).ok();
        }
        coalesce(events)
    }
}

/// Keep the last event per document, in the order of those last events
pub fn coalesce(events: Vec<HostEvent>) -> Vec<HostEvent> {
    let mut out: Vec<HostEvent> = Vec::with_capacity(events.len());
    for event in events {
        out.retain(|seen| seen.id() != event.id());
        out.push(event);
    }
    out
}

/// Map one filesystem event to document events under `root`
pub fn translate(root: &Path, event: &Event) -> Vec<HostEvent> {
    let ids = |paths: &[PathBuf]| -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = paths.iter().filter_map(|p| document_id(root, p)).collect();
        ids.dedup();
        ids
    };

    match &event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut events = Vec::new();
            if let Some(from) = event.paths.first().and_then(|p| document_id(root, p)) {
                events.push(HostEvent::Removed(from));
            }
            if let Some(to) = event.paths.get(1).and_then(|p| document_id(root, p)) {
                events.push(HostEvent::Changed(to));
            }
            events
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
            ids(&event.paths).into_iter().map(HostEvent::Removed).collect()
        }
        EventKind::Create(_) | EventKind::Modify(_) => {
            ids(&event.paths).into_iter().map(HostEvent::Changed).collect()
        }
        _ => Vec::new(),
    }
}
