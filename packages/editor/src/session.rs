//! # Edit Session
//!
//! Binds one externally selected document to a renderer and keeps the two
//! in sync.
//!
//! ## State machine
//!
//! ```text
//! Unbound ──select(id)──▶ Bound(id) ──select(other)──▶ Bound(other)
//!    ▲                        │
//!    └──close / deletion──────┘
//! ```
//!
//! ## Change notifications
//!
//! - Not bound to the document: ignored
//! - Echo of one of our own writes: swallowed
//! - Within the refresh guard after a refresh or own write: swallowed
//! - Otherwise: the debounce timer (re)starts; when it fires the tree is
//!   rebuilt once and diffed against the previous one
//!
//! The session never sleeps. Callers pass the current instant in and ask
//! [`Session::next_deadline`] when to call [`Session::poll`] again.

use crate::debounce::{Debouncer, EchoSuppressor, RefreshGuard};
use crate::document::{DocumentId, DocumentStore, WriteOutcome};
use crate::errors::EditorError;
use crate::mutations::Mutation;
use crate::pipeline::{self, EditAction, Plan, PlanContext, RenderTarget};
use chrono::{Local, NaiveDate};
use proptree_common::{ContainerKind, PathKey, Value};
use proptree_renderer::{
    diff_trees, RenderError, RenderOptions, RenderPatch, Renderer, WidgetKind, WidgetPatch,
    WidgetTree,
};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Timing and rendering settings for a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub refresh_guard: Duration,
    pub suppression_window: Duration,
    pub render: RenderOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            refresh_guard: Duration::from_millis(100),
            suppression_window: Duration::from_millis(2000),
            render: RenderOptions::default(),
        }
    }
}

/// What the host should display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum View {
    /// Nothing selected
    Empty,
    /// The selected document does not exist
    Missing { id: DocumentId },
    Tree { id: DocumentId, tree: WidgetTree },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Bound(DocumentId),
}

/// How a content-changed notification was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDisposition {
    NotBound,
    Suppressed,
    Guarded,
    Scheduled(Instant),
}

/// Incremental update produced by a debounced refresh
#[derive(Debug, Clone, PartialEq)]
pub struct Refresh {
    pub patches: Vec<WidgetPatch>,
}

/// Result of an edit action. Errors are recovered, never propagated.
#[derive(Debug)]
pub enum EditOutcome {
    Applied {
        mutation: Mutation,
        type_changed: bool,
        patch: Option<RenderPatch>,
    },
    Unchanged,
    Folded {
        path: PathKey,
        collapsed: bool,
    },
    /// The document changed shape underneath the action; the affected
    /// subtree was re-rendered instead
    Refreshed {
        error: EditorError,
        patch: Option<RenderPatch>,
    },
    Rejected(EditorError),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied { .. })
    }
}

pub struct Session<S: DocumentStore> {
    store: S,
    options: SessionOptions,
    bound: Option<DocumentId>,
    view: View,
    renderer: Renderer,
    debounce: Debouncer,
    echoes: EchoSuppressor,
    guard: RefreshGuard,
    /// Shape of the rendered document root
    root_kind: Option<ContainerKind>,
    today: Option<NaiveDate>,
}

impl<S: DocumentStore> Session<S> {
    pub fn new(store: S, options: SessionOptions) -> Self {
        Self {
            renderer: Renderer::new(options.render.clone()),
            debounce: Debouncer::new(options.debounce),
            echoes: EchoSuppressor::new(options.suppression_window),
            guard: RefreshGuard::new(options.refresh_guard),
            store,
            options,
            bound: None,
            view: View::Empty,
            root_kind: None,
            today: None,
        }
    }

    /// Pin "today" for array defaults instead of the local date
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn tree(&self) -> Option<&WidgetTree> {
        match &self.view {
            View::Tree { tree, .. } => Some(tree),
            _ => None,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.bound {
            Some(id) => SessionState::Bound(id.clone()),
            None => SessionState::Unbound,
        }
    }

    pub fn bound(&self) -> Option<&DocumentId> {
        self.bound.as_ref()
    }

    /// Selection changed: drop any pending refresh and rebuild immediately
    pub fn select(&mut self, id: Option<DocumentId>, now: Instant) -> &View {
        self.debounce.cancel();

        match id {
            None => {
                if let Some(old) = self.bound.take() {
                    tracing::info!(document = %old, "session closed");
                }
                self.view = View::Empty;
                self.root_kind = None;
            }
            Some(id) => {
                if self.bound.as_ref() != Some(&id) {
                    // Fold state belongs to the previous document
                    self.renderer = Renderer::new(self.options.render.clone());
                    self.view = View::Empty;
                    tracing::info!(document = %id, "session bound");
                }
                self.bound = Some(id);
                self.rebuild(now);
            }
        }

        &self.view
    }

    pub fn close(&mut self, now: Instant) {
        self.select(None, now);
    }

    /// Content-changed notification from the host
    pub fn content_changed(&mut self, id: &DocumentId, now: Instant) -> ChangeDisposition {
        if self.bound.as_ref() != Some(id) {
            return ChangeDisposition::NotBound;
        }
        if self.echoes.consume(id, now) {
            tracing::debug!(document = %id, "suppressed self-originated change");
            return ChangeDisposition::Suppressed;
        }
        if self.guard.is_guarded(now) {
            tracing::debug!(document = %id, "change arrived within refresh guard");
            return ChangeDisposition::Guarded;
        }
        ChangeDisposition::Scheduled(self.debounce.schedule(now))
    }

    /// The host reports the document as deleted
    pub fn document_removed(&mut self, id: &DocumentId, now: Instant) -> bool {
        if self.bound.as_ref() != Some(id) {
            return false;
        }
        self.debounce.cancel();
        self.rebuild(now);
        true
    }

    /// When the pending debounced refresh is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Run the debounced refresh if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<Refresh> {
        if !self.debounce.fire(now) {
            return None;
        }
        let patches = self.rebuild(now);
        tracing::debug!(patches = patches.len(), "debounced refresh");
        Some(Refresh { patches })
    }

    /// Full rebuild from the live document, diffed against the current tree
    pub fn rebuild(&mut self, now: Instant) -> Vec<WidgetPatch> {
        let Some(id) = self.bound.clone() else {
            self.view = View::Empty;
            return Vec::new();
        };

        let Some(doc) = self.store.get_document(&id) else {
            self.lose(id);
            return Vec::new();
        };

        let fresh = self.renderer.render(&doc);
        let patches = match &self.view {
            View::Tree { tree, .. } => diff_trees(tree, &fresh),
            _ => diff_trees(&WidgetTree::default(), &fresh),
        };

        self.root_kind = doc.container_kind();
        self.view = View::Tree { id, tree: fresh };
        self.guard.refreshed(now);
        patches
    }

    /// Apply a widget action against the live document
    pub fn apply(&mut self, action: EditAction, now: Instant) -> EditOutcome {
        let Some(id) = self.bound.clone() else {
            return self.reject(&action, EditorError::NotBound);
        };

        if let EditAction::ToggleFold { path } = &action {
            return self.toggle_fold(path);
        }

        let Some(doc) = self.store.get_document(&id) else {
            self.lose(id.clone());
            return self.reject(&action, EditorError::DocumentMissing(id));
        };

        let ctx = self.plan_context(action.path());
        let plan = match pipeline::plan(&action, &doc, ctx) {
            Ok(Some(plan)) => plan,
            Ok(None) => return EditOutcome::Unchanged,
            Err(error) => return self.recover(&action, error),
        };

        if plan.coercion.as_ref().is_some_and(|c| c.unchanged) {
            return EditOutcome::Unchanged;
        }

        self.write(&id, &action, plan, now)
    }

    fn write(&mut self, id: &DocumentId, action: &EditAction, plan: Plan, now: Instant) -> EditOutcome {
        // Mark before writing: the store may notify before apply_edit returns
        self.echoes.mark(id, now);

        let mutation = plan.mutation;
        let result = self
            .store
            .apply_edit(id, &mut |doc: &mut Value| mutation.apply(doc).map(|_| ()));

        match result {
            Ok(WriteOutcome::Changed) => {
                // A host may echo one write more than once
                self.guard.refreshed(now);
                let type_changed = plan.coercion.as_ref().is_some_and(|c| c.type_changed);
                let patch = self.render_target(&plan.target, now);
                tracing::debug!(
                    action = action.name(),
                    path = %action.path(),
                    mutation = mutation.name(),
                    type_changed,
                    "applied edit"
                );
                EditOutcome::Applied {
                    mutation,
                    type_changed,
                    patch,
                }
            }
            Ok(WriteOutcome::Unchanged) => {
                self.echoes.unmark(id);
                EditOutcome::Unchanged
            }
            Err(error) => {
                self.echoes.unmark(id);
                self.recover(action, error.into())
            }
        }
    }

    fn toggle_fold(&mut self, path: &PathKey) -> EditOutcome {
        let View::Tree { tree, .. } = &mut self.view else {
            return EditOutcome::Rejected(EditorError::NotBound);
        };
        match self.renderer.toggle_fold(tree, path) {
            Ok(collapsed) => EditOutcome::Folded {
                path: path.clone(),
                collapsed,
            },
            Err(error) => {
                tracing::warn!(path = %path, %error, "cannot fold");
                EditOutcome::Rejected(error.into())
            }
        }
    }

    fn plan_context(&self, path: &PathKey) -> PlanContext {
        let widget = self.tree().and_then(|tree| tree.find(path));
        let rendered_parent = match path.parent() {
            Some(parent) if parent.is_root() => self.root_kind,
            Some(parent) => self
                .tree()
                .and_then(|tree| tree.find(&parent))
                .and_then(|w| match w.kind {
                    WidgetKind::List { .. } => Some(ContainerKind::List),
                    WidgetKind::Group { .. } => Some(ContainerKind::Record),
                    WidgetKind::Field { .. } => None,
                }),
            None => None,
        };

        PlanContext {
            declared: widget.map(|w| w.declared),
            rendered_parent,
            today: self.today.unwrap_or_else(|| Local::now().date_naive()),
        }
    }

    /// Update the view for a landed write, preferring a single-node patch
    fn render_target(&mut self, target: &RenderTarget, now: Instant) -> Option<RenderPatch> {
        let id = self.bound.clone()?;
        let Some(doc) = self.store.get_document(&id) else {
            self.lose(id);
            return None;
        };
        let View::Tree { tree, .. } = &mut self.view else {
            return None;
        };

        let result = match target {
            RenderTarget::Node(path) => self.renderer.patch_node(tree, &doc, path),
            RenderTarget::RemovedElement { list, index } => {
                self.renderer.forget_list_element(list, *index);
                self.renderer.rebuild_subtree(tree, &doc, list)
            }
            RenderTarget::Renamed { from, to } => {
                let widgets = self.renderer.rename(tree, from, to);
                Ok(RenderPatch::Renamed {
                    from: from.clone(),
                    to: to.clone(),
                    widgets,
                })
            }
        };

        match result {
            Ok(patch) => Some(patch),
            Err(RenderError::Hidden(path)) => {
                tracing::debug!(path = %path, "edited path is hidden");
                None
            }
            Err(error) => {
                tracing::debug!(%error, "patch not possible, rebuilding");
                self.rebuild(now);
                Some(RenderPatch::Rebuilt {
                    path: PathKey::root(),
                })
            }
        }
    }

    fn recover(&mut self, action: &EditAction, error: EditorError) -> EditOutcome {
        match error {
            EditorError::DocumentMissing(id) => {
                self.lose(id.clone());
                self.reject(action, EditorError::DocumentMissing(id))
            }
            error if error.is_structural_mismatch() || matches!(error, EditorError::NotInDocument(_)) => {
                tracing::warn!(action = action.name(), path = %action.path(), %error, "document changed shape, refreshing");
                let patch = self.refresh_around(action.path());
                EditOutcome::Refreshed { error, patch }
            }
            error => self.reject(action, error),
        }
    }

    fn reject(&self, action: &EditAction, error: EditorError) -> EditOutcome {
        tracing::warn!(action = action.name(), path = %action.path(), %error, "edit rejected");
        EditOutcome::Rejected(error)
    }

    /// Rebuild the closest rendered ancestor of `path` that still exists
    fn refresh_around(&mut self, path: &PathKey) -> Option<RenderPatch> {
        let id = self.bound.clone()?;
        let Some(doc) = self.store.get_document(&id) else {
            self.lose(id);
            return None;
        };
        let View::Tree { tree, .. } = &mut self.view else {
            return None;
        };

        let mut candidate = path.parent();
        while let Some(ancestor) = candidate {
            if ancestor.is_root() {
                break;
            }
            if ancestor.resolve(&doc).is_some() && tree.find(&ancestor).is_some() {
                return self.renderer.rebuild_subtree(tree, &doc, &ancestor).ok();
            }
            candidate = ancestor.parent();
        }

        *tree = self.renderer.render(&doc);
        self.root_kind = doc.container_kind();
        Some(RenderPatch::Rebuilt {
            path: PathKey::root(),
        })
    }

    /// The bound document disappeared
    fn lose(&mut self, id: DocumentId) {
        tracing::warn!(document = %id, "bound document is missing");
        self.debounce.cancel();
        self.echoes.clear();
        self.bound = None;
        self.root_kind = None;
        self.view = View::Missing { id };
    }
}
