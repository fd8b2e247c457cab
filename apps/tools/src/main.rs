use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use query_core::{project_flat, FieldCatalog, Resolver, SequentialIdGenerator};
use query_session::{load_config, BuilderConfig, QuerySession};
use serde::Serialize;
use shared::{
    domain::NodeId,
    protocol::{QueryChange, RawGroup},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod script;

#[derive(Parser, Debug)]
#[command(name = "query-tool")]
struct Cli {
    /// Builder config (TOML). Env overrides use the `QUERY_BUILDER__` prefix.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Mint `r-1`, `g-2`, ... instead of random ids.
    #[arg(long, global = true)]
    deterministic_ids: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replays a JSON script and prints every notification as a JSON line.
    Apply {
        #[arg(long)]
        tree: Option<PathBuf>,
        #[arg(long)]
        script: PathBuf,
    },
    /// Adopts a tree and prints its canonical, pruned form.
    Normalize { tree: PathBuf },
    /// Prints the flat view: every rule directly under the root.
    Flatten { tree: PathBuf },
    /// Prints the nesting level of a node, or `null` when it is absent.
    Level { tree: PathBuf, id: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Apply { tree, script } => {
            let raw = fs::read_to_string(&script)
                .with_context(|| format!("failed to read script '{}'", script.display()))?;
            let ops = script::parse_script(&raw)
                .with_context(|| format!("invalid script '{}'", script.display()))?;

            let changes = Rc::new(RefCell::new(Vec::<QueryChange>::new()));
            let sink = Rc::clone(&changes);
            let mut session = build_session(
                &config,
                tree.as_deref().map(read_tree).transpose()?,
                cli.deterministic_ids,
                move |change| sink.borrow_mut().push(change),
            );

            let reports = script::run_script(&mut session, ops);
            for change in changes.borrow().iter() {
                print_json(change)?;
            }
            let rejected = reports.iter().filter(|r| r.error.is_some()).count();
            for report in reports.iter().filter(|r| r.error.is_some()) {
                print_json(report)?;
            }
            info!(
                steps = reports.len(),
                rejected,
                notifications = changes.borrow().len(),
                "script applied"
            );
        }
        Command::Normalize { tree } => {
            let session = adopt_only(&config, &tree, cli.deterministic_ids)?;
            print_json(&*session.snapshot())?;
        }
        Command::Flatten { tree } => {
            let session = adopt_only(&config, &tree, cli.deterministic_ids)?;
            print_json(&*project_flat(&session.snapshot()))?;
        }
        Command::Level { tree, id } => {
            let session = adopt_only(&config, &tree, cli.deterministic_ids)?;
            print_json(&session.level_of(&NodeId::new(id)))?;
        }
    }

    Ok(())
}

fn build_session(
    config: &BuilderConfig,
    tree: Option<RawGroup>,
    deterministic_ids: bool,
    listener: impl FnMut(QueryChange) + 'static,
) -> QuerySession {
    let mut catalog = FieldCatalog::new(config.fields.clone());
    if let Some(default_field) = &config.default_field {
        catalog = catalog.with_default_field(default_field.clone());
    }
    let resolver = Resolver::new(catalog).with_operators(config.operators.clone());

    let mut builder = QuerySession::builder(config.fields.clone())
        .resolver(resolver)
        .settings(config.session.clone());
    if !config.combinators.is_empty() {
        builder = builder.combinators(config.combinators.clone());
    }
    if deterministic_ids {
        builder = builder.id_generator(SequentialIdGenerator::default());
    }
    if let Some(tree) = tree {
        builder = builder.query(tree);
    }
    builder.mount(listener)
}

fn adopt_only(
    config: &BuilderConfig,
    tree: &Path,
    deterministic_ids: bool,
) -> Result<QuerySession> {
    let tree = read_tree(tree)?;
    Ok(build_session(config, Some(tree), deterministic_ids, |_| {}))
}

fn read_tree(path: &Path) -> Result<RawGroup> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read tree '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid tree '{}'", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
