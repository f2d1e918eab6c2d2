//! Async driver for an edit [`Session`].
//!
//! One task owns the session and multiplexes three sources with `select!`:
//! user commands, host notifications and the session's debounce deadline.
//! Commands are handled strictly in arrival order, so an edit never reads
//! the document before the previous edit's write has resolved.
//!
//! The current view is published on a `watch` channel.

use crate::watcher::{FileWatcher, HostEvent};
use proptree_editor::{DocumentId, DocumentStore, EditAction, EditOutcome, Session, View};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

const CHANNEL_CAPACITY: usize = 100;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Editor runtime has stopped")]
    Stopped,
}

/// What the runtime last published
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub view: View,
    /// Debounced refreshes run so far
    pub refreshes: u64,
}

enum Command {
    Select {
        id: Option<DocumentId>,
        reply: oneshot::Sender<View>,
    },
    Apply {
        action: EditAction,
        reply: oneshot::Sender<EditOutcome>,
    },
    Shutdown,
}

/// Cloneable handle for talking to a running [`EditorRuntime`]
#[derive(Clone)]
pub struct RuntimeHandle {
    commands: mpsc::Sender<Command>,
    events: mpsc::Sender<HostEvent>,
    snapshots: watch::Receiver<Snapshot>,
}

impl RuntimeHandle {
    /// Bind a document (or unbind with `None`) and return the new view
    pub async fn select(&self, id: Option<DocumentId>) -> Result<View, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Select { id, reply })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        rx.await.map_err(|_| RuntimeError::Stopped)
    }

    pub async fn apply(&self, action: EditAction) -> Result<EditOutcome, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Apply { action, reply })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        rx.await.map_err(|_| RuntimeError::Stopped)
    }

    /// Forward a host notification
    pub async fn notify(&self, event: HostEvent) -> Result<(), RuntimeError> {
        self.events.send(event).await.map_err(|_| RuntimeError::Stopped)
    }

    pub fn events(&self) -> mpsc::Sender<HostEvent> {
        self.events.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

pub struct EditorRuntime<S: DocumentStore> {
    session: Session<S>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::Receiver<HostEvent>,
    snapshots: watch::Sender<Snapshot>,
    refreshes: u64,
}

impl<S> EditorRuntime<S>
where
    S: DocumentStore + Send + 'static,
{
    /// Start the runtime task. The task returns the session on shutdown.
    pub fn spawn(session: Session<S>) -> (RuntimeHandle, JoinHandle<Session<S>>) {
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot {
            view: session.view().clone(),
            refreshes: 0,
        });

        let runtime = Self {
            session,
            commands: command_rx,
            events: event_rx,
            snapshots: snapshot_tx,
            refreshes: 0,
        };
        let task = tokio::spawn(runtime.run());

        let handle = RuntimeHandle {
            commands: command_tx,
            events: event_tx,
            snapshots: snapshot_rx,
        };
        (handle, task)
    }

    async fn run(mut self) -> Session<S> {
        loop {
            let deadline = self.session.next_deadline().map(Instant::from_std);

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.events.recv() => self.handle_event(event),
                _ = wait_for(deadline) => {
                    if self.session.poll(now()).is_some() {
                        self.refreshes += 1;
                    }
                }
            }

            self.publish();
        }

        tracing::info!("editor runtime stopped");
        self.session
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Select { id, reply } => {
                let view = self.session.select(id, now()).clone();
                let _ = reply.send(view);
            }
            Command::Apply { action, reply } => {
                let outcome = self.session.apply(action, now());
                let _ = reply.send(outcome);
            }
            Command::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Changed(id) => {
                let disposition = self.session.content_changed(&id, now());
                tracing::debug!(document = %id, ?disposition, "content changed");
            }
            HostEvent::Removed(id) => {
                self.session.document_removed(&id, now());
            }
        }
    }

    fn publish(&self) {
        let snapshot = Snapshot {
            view: self.session.view().clone(),
            refreshes: self.refreshes,
        };
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Forward watcher events into a runtime until either side goes away
pub fn forward_events(watcher: FileWatcher, events: mpsc::Sender<HostEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while let Some(batch) = watcher.next_events() {
            for event in batch {
                if events.blocking_send(event).is_err() {
                    return;
                }
            }
        }
    })
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptree_editor::{MemoryStore, SessionOptions};
    use serde_json::json;

    #[tokio::test]
    async fn test_select_publishes_view() {
        let store = MemoryStore::new().with_document("doc", json!({ "a": 1 }));
        let (handle, task) = EditorRuntime::spawn(Session::new(store, SessionOptions::default()));

        let view = handle.select(Some(DocumentId::from("doc"))).await.unwrap();
        assert!(matches!(view, View::Tree { .. }));
        assert_eq!(handle.snapshot().view, view);

        handle.shutdown().await;
        let session = task.await.unwrap();
        assert!(session.bound().is_some());
    }

    #[tokio::test]
    async fn test_stopped_runtime_reports_error() {
        let (handle, task) =
            EditorRuntime::spawn(Session::new(MemoryStore::new(), SessionOptions::default()));
        handle.shutdown().await;
        task.await.unwrap();

        assert!(matches!(
            handle.select(None).await,
            Err(RuntimeError::Stopped)
        ));
    }
}
