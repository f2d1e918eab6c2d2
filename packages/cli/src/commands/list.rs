use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use proptree_workspace::FileStore;

#[derive(Args, Debug)]
pub struct ListArgs {}

pub fn list(_args: ListArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let root = config.get_documents_dir(cwd);
    if !root.exists() {
        return Err(anyhow!("Documents directory does not exist: {:?}", root));
    }

    let ids = FileStore::new(root).list()?;
    if ids.is_empty() {
        println!("{}", "⚠️  No documents found".yellow());
        return Ok(());
    }

    for id in &ids {
        println!("  {}", id);
    }
    println!();
    println!("Found {} documents", ids.len());
    Ok(())
}
