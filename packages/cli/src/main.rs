mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    append, delete, list, rename, set, show, watch, AppendArgs, DeleteArgs, ListArgs, RenameArgs,
    SetArgs, ShowArgs, WatchArgs,
};
use tracing_subscriber::EnvFilter;

/// proptree - edit JSON documents as typed property trees
#[derive(Parser, Debug)]
#[command(name = "proptree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List documents in the documents directory
    List(ListArgs),

    /// Render a document as a property tree
    Show(ShowArgs),

    /// Set the value at a path
    Set(SetArgs),

    /// Delete a record field or list element
    Delete(DeleteArgs),

    /// Rename a record field in place
    Rename(RenameArgs),

    /// Append a default element to a list
    Append(AppendArgs),

    /// Re-render a document whenever it changes on disk
    Watch(WatchArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::List(args) => list(args, &cwd),
        Command::Show(args) => show(args, &cwd),
        Command::Set(args) => set(args, &cwd),
        Command::Delete(args) => delete(args, &cwd),
        Command::Rename(args) => rename(args, &cwd),
        Command::Append(args) => append(args, &cwd),
        Command::Watch(args) => watch(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
