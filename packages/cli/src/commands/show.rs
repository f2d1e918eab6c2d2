use super::{bind, document_id, open_session};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use proptree_editor::View;
use proptree_renderer::{Editor, Widget, WidgetKind};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Document id, relative to the documents directory
    pub doc: String,

    /// Show the inferred type of every value
    #[arg(long)]
    pub types: bool,

    /// Print the rendered view as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let (_, mut session) = open_session(cwd, args.types)?;
    bind(&mut session, &document_id(&args.doc))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.view())?);
    } else {
        print_view(session.view());
    }
    Ok(())
}

pub(crate) fn print_view(view: &View) {
    match view {
        View::Empty => println!("{}", "No document selected".dimmed()),
        View::Missing { id } => println!("{} {}", "⚠️  Document not found:".yellow(), id),
        View::Tree { id, tree } => {
            println!("📄 {}", id.to_string().bold());
            if tree.is_empty() {
                println!("   {}", "(empty)".dimmed());
            }
            for widget in &tree.roots {
                print_widget(widget);
            }
        }
    }
}

fn print_widget(widget: &Widget) {
    let indent = "  ".repeat(widget.depth + 1);
    let type_label = widget
        .type_label
        .as_ref()
        .map(|t| format!(" ({})", t).dimmed().to_string())
        .unwrap_or_default();

    match &widget.kind {
        WidgetKind::Field { editor } => {
            println!(
                "{}{}: {}{}",
                indent,
                widget.label.bold(),
                format_editor(editor),
                type_label
            );
        }
        WidgetKind::List { .. } => {
            println!(
                "{}{} [{}]{}",
                indent,
                widget.label.bold(),
                widget.children.len(),
                type_label
            );
        }
        WidgetKind::Group { collapsed } => {
            let marker = if *collapsed { "▸" } else { "▾" };
            println!("{}{} {}{}", indent, marker, widget.label.bold(), type_label);
            if *collapsed {
                return;
            }
        }
    }

    for child in &widget.children {
        print_widget(child);
    }
}

fn format_editor(editor: &Editor) -> String {
    match editor {
        Editor::Text { value } => value.clone(),
        Editor::Number { value } => value.cyan().to_string(),
        Editor::Toggle { checked } => {
            if *checked {
                "true".green().to_string()
            } else {
                "false".red().to_string()
            }
        }
        Editor::Date { value, valid } => {
            if *valid {
                value.magenta().to_string()
            } else {
                format!("{} (not a calendar date)", value).red().to_string()
            }
        }
        Editor::Link { target } => format!("→ {}", target).blue().to_string(),
        Editor::ExternalLink { text, url } => format!("{} <{}>", text, url).blue().underline().to_string(),
        Editor::Formula { source } => format!("ƒ {}", source).yellow().to_string(),
    }
}
