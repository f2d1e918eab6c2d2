pub mod edit;
pub mod list;
pub mod show;
pub mod watch;

pub use edit::{append, delete, rename, set, AppendArgs, DeleteArgs, RenameArgs, SetArgs};
pub use list::{list, ListArgs};
pub use show::{show, ShowArgs};
pub use watch::{watch, WatchArgs};

use crate::config::Config;
use anyhow::{anyhow, Result};
use proptree_editor::{DocumentId, Session, View};
use proptree_workspace::FileStore;
use std::sync::Arc;
use std::time::Instant;

/// Session over the configured documents directory
pub(crate) fn open_session(cwd: &str, types: bool) -> Result<(Config, Session<Arc<FileStore>>)> {
    let config = Config::load(cwd)?;
    let store = Arc::new(FileStore::new(config.get_documents_dir(cwd)));
    let mut options = config.session_options()?;
    options.render.show_type_labels |= types;
    let session = Session::new(store, options);
    Ok((config, session))
}

/// Bind the session to a document, failing when it does not exist
pub(crate) fn bind(session: &mut Session<Arc<FileStore>>, id: &DocumentId) -> Result<()> {
    match session.select(Some(id.clone()), Instant::now()) {
        View::Missing { id } => Err(anyhow!("Document not found: {}", id)),
        _ => Ok(()),
    }
}

/// Accept `notes` as shorthand for `notes.json`
pub(crate) fn document_id(doc: &str) -> DocumentId {
    if doc.ends_with(".json") {
        DocumentId::from(doc)
    } else {
        DocumentId::new(format!("{}.json", doc))
    }
}
