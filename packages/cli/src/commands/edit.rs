use super::{bind, document_id, open_session};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use proptree_common::{PathKey, Value};
use proptree_editor::{DocumentStore, EditAction, EditOutcome, Mutation, WriteOutcome};
use proptree_inference::{infer_str, InferenceOptions, SemanticType};
use std::time::Instant;

#[derive(Args, Debug)]
pub struct SetArgs {
    pub doc: String,

    /// Dot-joined path, e.g. `authors.0.name`
    pub path: String,

    pub value: String,

    /// Store the value as this type instead of inferring it
    #[arg(short, long = "type")]
    pub ty: Option<SemanticType>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub doc: String,
    pub path: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    pub doc: String,
    pub path: String,
    pub new_key: String,
}

#[derive(Args, Debug)]
pub struct AppendArgs {
    pub doc: String,

    /// Path of the list to extend
    pub path: String,
}

pub fn set(args: SetArgs, cwd: &str) -> Result<()> {
    let (_, mut session) = open_session(cwd, false)?;
    let id = document_id(&args.doc);
    bind(&mut session, &id)?;
    let path = PathKey::parse(&args.path)?;

    let exists = session
        .store()
        .get_document(&id)
        .is_some_and(|doc| path.resolve(&doc).is_some());

    // Existing values are edited like a committed editor; anything else is
    // written directly so missing parents get created
    if exists && args.ty.is_none() {
        let outcome = session.apply(
            EditAction::CommitText {
                path,
                input: args.value,
            },
            Instant::now(),
        );
        return report(outcome);
    }

    let ty = args
        .ty
        .unwrap_or_else(|| infer_str(&args.value, &InferenceOptions::conversion()).ty);
    let mutation = Mutation::Set {
        path,
        value: Some(Value::from(args.value)),
        ty,
    };
    let written = session
        .store()
        .apply_edit(&id, &mut |doc| mutation.apply(doc).map(|_| ()))?;

    match written {
        WriteOutcome::Changed => println!("{} set {} ({})", "✓".green(), mutation.path(), ty),
        WriteOutcome::Unchanged => println!("{} no change", "•".dimmed()),
    }
    Ok(())
}

pub fn delete(args: DeleteArgs, cwd: &str) -> Result<()> {
    let (_, mut session) = open_session(cwd, false)?;
    bind(&mut session, &document_id(&args.doc))?;

    let path = PathKey::parse(&args.path)?;
    report(session.apply(EditAction::Remove { path }, Instant::now()))
}

pub fn rename(args: RenameArgs, cwd: &str) -> Result<()> {
    let (_, mut session) = open_session(cwd, false)?;
    bind(&mut session, &document_id(&args.doc))?;

    let path = PathKey::parse(&args.path)?;
    report(session.apply(
        EditAction::Rename {
            path,
            new_key: args.new_key,
        },
        Instant::now(),
    ))
}

pub fn append(args: AppendArgs, cwd: &str) -> Result<()> {
    let (_, mut session) = open_session(cwd, false)?;
    bind(&mut session, &document_id(&args.doc))?;

    let list = PathKey::parse(&args.path)?;
    report(session.apply(EditAction::AppendItem { list }, Instant::now()))
}

fn report(outcome: EditOutcome) -> Result<()> {
    match outcome {
        EditOutcome::Applied {
            mutation,
            type_changed,
            ..
        } => {
            println!("{} {} {}", "✓".green(), mutation.name(), mutation.path());
            if let Mutation::Set {
                value: Some(value),
                ty,
                ..
            } = &mutation
            {
                println!("   {} {}", value.to_display_string(), format!("({})", ty).dimmed());
            }
            if type_changed {
                println!("   {}", "type changed".yellow());
            }
            Ok(())
        }
        EditOutcome::Unchanged | EditOutcome::Folded { .. } => {
            println!("{} no change", "•".dimmed());
            Ok(())
        }
        EditOutcome::Refreshed { error, .. } | EditOutcome::Rejected(error) => Err(error.into()),
    }
}
