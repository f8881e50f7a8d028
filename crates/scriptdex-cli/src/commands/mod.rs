use std::path::Path;

use anyhow::{Context, Result};
use scriptdex_core::Scriptdex;
use scriptdex_core::providers::ProviderRegistry;
use serde::Serialize;

use crate::cli::{Commands, NameArg, QueryArgs, ScanArgs};

pub(crate) fn run_from_root(root: &Path, command: Commands) -> Result<()> {
    let mut app = Scriptdex::open(root).context("failed to open index root")?;

    match command {
        Commands::Init => {
            app.save()?;
            println!("initialized at {}", root.display());
        }
        Commands::Scan(args) => run_scan(&mut app, args)?,
        Commands::Query(args) => run_query(&app, args)?,
        Commands::Show(args) => run_show(&app, &args)?,
        Commands::Explain(args) => {
            let explanation = app.explain(&args.name)?;
            println!("{explanation}");
        }
        Commands::Providers => print_json(&ProviderRegistry::with_builtins().ids())?,
        Commands::Stats => print_json(&app.status())?,
    }
    Ok(())
}

fn run_scan(app: &mut Scriptdex, args: ScanArgs) -> Result<()> {
    let mut options = app.scan_defaults();
    options.recursive = args.recursive;
    options.include_hidden |= args.include_hidden;
    options.exclude.extend(args.exclude);

    let report = app.scan(Path::new(&args.directory), &options)?;
    print_json(&report)
}

fn run_query(app: &Scriptdex, args: QueryArgs) -> Result<()> {
    let mut outcome = app.query(&args.query, !args.no_ai);
    if let Some(note) = &outcome.semantic_failure {
        eprintln!("semantic search degraded: {note}");
    }
    if let Some(limit) = args.limit {
        outcome.hits.truncate(limit);
    }
    print_json(&outcome.hits)
}

fn run_show(app: &Scriptdex, args: &NameArg) -> Result<()> {
    match app.get(&args.name) {
        Some(record) => print_json(record),
        None => anyhow::bail!("command not found: {}", args.name),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
