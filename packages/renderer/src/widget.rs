use crate::elements::Editor;
use proptree_common::PathKey;
use proptree_inference::SemanticType;
use serde::Serialize;

pub type WidgetId = u64;

/// Rendered widget bound to one path of the document.
///
/// Widgets never own data. Every action re-reads the live value at `path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub id: WidgetId,

    pub path: PathKey,

    /// Record key, or the element index for list elements
    pub label: String,

    /// Nesting depth for layout (root children are 0)
    pub depth: usize,

    /// Type the widget was rendered with
    pub declared: SemanticType,

    /// Shown next to the value when type labels are enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_label: Option<String>,

    pub kind: WidgetKind,

    pub affordances: Vec<Affordance>,

    pub children: Vec<Widget>,
}

/// Widget variants, one per sub-renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WidgetKind {
    /// Primitive leaf with an editor
    Field { editor: Editor },

    /// List; `of_records` when every element is a record
    List { of_records: bool },

    /// Foldable record: a nested record or a record element of a list
    Group { collapsed: bool },
}

/// User actions a widget exposes to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Affordance {
    AddField,
    RemoveField,
    RenameField,
    ChangeType,
    ToggleFold,
    AddItem,
    RemoveItem,
}

impl Widget {
    pub fn is_collapsed(&self) -> bool {
        matches!(self.kind, WidgetKind::Group { collapsed: true })
    }

    pub fn editor(&self) -> Option<&Editor> {
        match &self.kind {
            WidgetKind::Field { editor } => Some(editor),
            _ => None,
        }
    }

    pub fn has(&self, affordance: Affordance) -> bool {
        self.affordances.contains(&affordance)
    }

    /// Depth-first search for the widget at `path`
    pub fn find(&self, path: &PathKey) -> Option<&Widget> {
        if &self.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Number of widgets in this subtree, including self
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Widget::count).sum::<usize>()
    }
}

/// The rendered view of one document snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WidgetTree {
    pub roots: Vec<Widget>,
}

impl WidgetTree {
    pub fn find(&self, path: &PathKey) -> Option<&Widget> {
        self.roots.iter().find_map(|w| w.find(path))
    }

    pub fn find_mut(&mut self, path: &PathKey) -> Option<&mut Widget> {
        fn descend<'a>(widgets: &'a mut [Widget], path: &PathKey) -> Option<&'a mut Widget> {
            let widget = widgets.iter_mut().find(|w| path.starts_with(&w.path))?;
            if &widget.path == path {
                Some(widget)
            } else {
                descend(&mut widget.children, path)
            }
        }
        descend(&mut self.roots, path)
    }

    /// Sibling list that holds (or would hold) the widget at `path`
    pub fn siblings_mut(&mut self, path: &PathKey) -> Option<&mut Vec<Widget>> {
        match path.parent() {
            Some(parent) if parent.is_root() => Some(&mut self.roots),
            Some(parent) => self.find_mut(&parent).map(|w| &mut w.children),
            None => None,
        }
    }

    /// Position of the widget at `path` among its siblings
    pub fn position(&self, path: &PathKey) -> Option<usize> {
        let siblings = match path.parent() {
            Some(parent) if parent.is_root() => &self.roots,
            Some(parent) => &self.find(&parent)?.children,
            None => return None,
        };
        siblings.iter().position(|w| &w.path == path)
    }

    /// Rewrite every widget path under `old` to live under `new`.
    /// The widget at `old` itself is relabelled with the new leaf key.
    pub fn rewrite_prefix(&mut self, old: &PathKey, new: &PathKey) -> usize {
        fn rewrite(widgets: &mut [Widget], old: &PathKey, new: &PathKey) -> usize {
            let mut count = 0;
            for widget in widgets {
                if let Some(path) = widget.path.with_prefix_replaced(old, new) {
                    if &widget.path == old {
                        if let Some(leaf) = new.leaf() {
                            widget.label = leaf.to_string();
                        }
                    }
                    widget.path = path;
                    count += 1;
                }
                count += rewrite(&mut widget.children, old, new);
            }
            count
        }
        rewrite(&mut self.roots, old, new)
    }

    pub fn len(&self) -> usize {
        self.roots.iter().map(Widget::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
