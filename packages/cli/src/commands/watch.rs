use super::show::print_view;
use super::{document_id, open_session};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use proptree_workspace::{forward_events, EditorRuntime, FileWatcher};

#[derive(Args, Debug)]
pub struct WatchArgs {
    pub doc: String,

    /// Show the inferred type of every value
    #[arg(long)]
    pub types: bool,
}

pub fn watch(args: WatchArgs, cwd: &str) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(args, cwd));
    // The watcher thread blocks on filesystem events; don't wait for it
    runtime.shutdown_background();
    result
}

async fn run(args: WatchArgs, cwd: &str) -> Result<()> {
    let (config, session) = open_session(cwd, args.types)?;
    let watcher = FileWatcher::new(config.get_documents_dir(cwd))?;

    let (handle, task) = EditorRuntime::spawn(session);
    let _forwarder = forward_events(watcher, handle.events());

    let view = handle.select(Some(document_id(&args.doc))).await?;
    print_view(&view);
    println!("\n{}", "👀 Watching for changes... (Ctrl-C to stop)".bright_blue());

    let mut snapshots = handle.subscribe();
    let _ = snapshots.borrow_and_update();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                println!();
                print_view(&snapshot.view);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    task.await?;
    Ok(())
}
