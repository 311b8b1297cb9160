//! CLI entrypoint for `taglist`.
//!
//! Resolves the customer(s) and SmartNode group, prompting for whatever the
//! command line leaves out, fetches each customer's tag listing from
//! TECommander (or a captured listing file), and writes one sorted report per
//! customer to `<output>/<username>/<customer>/<customer>_taglist.csv`.
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::{LevelFilter, error, info, warn};
use rayon::prelude::*;
use taglist::{
    customer::{Customer, CustomerError, CustomerTable},
    engine::Engine,
    export::{ExportError, ensure_parent_dir, save_taglist},
    io::DEFAULT_MMAP_THRESHOLD_BYTES,
    paths::report_path,
    prompt::{prompt_node_group, select_customer},
    report::ReportParameters,
    source::{CapturedListing, DEFAULT_TECOMMANDER, SourceError, TagSource, TeCommander},
};

const EXIT_CONFIG: i32 = 2;
const EXIT_INPUT: i32 = 3;
const EXIT_OUTPUT_DIR: i32 = 4;
const EXIT_WRITE: i32 = 5;

#[derive(Parser, Debug)]
#[command(
    name = "taglist",
    version,
    about = "Write the asset tags of every node in a SmartNode group to a CSV file"
)]
struct Args {
    /// Customer name (in quotes if it contains spaces), or "all"
    #[arg(short = 'c', long = "customer")]
    customer: Option<String>,

    /// Username used as the output sub-directory
    #[arg(short = 'u', long = "username", env = "USERNAME")]
    username: Option<String>,

    /// SmartNode group name (in quotes if it contains spaces)
    #[arg(short = 'g', long = "node-group")]
    node_group: Option<String>,

    /// Customer table (CSV with name,auth_file columns)
    #[arg(long = "customers", env = "TAGLIST_CUSTOMERS", default_value = "customers.csv")]
    customers: PathBuf,

    /// Path to the TECommander executable
    #[arg(long = "tecommander", default_value = DEFAULT_TECOMMANDER)]
    tecommander: PathBuf,

    /// Read a captured avlistassettags listing instead of running TECommander
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Base output directory
    #[arg(short = 'o', long = "output", default_value = ".")]
    output: PathBuf,

    /// Date stamp for the report title (YYYY-MM-DD); defaults to today
    #[arg(long = "as-of")]
    as_of: Option<NaiveDate>,

    /// Override mmap threshold in bytes for --input. If zero, disable mmap.
    #[arg(long = "mmap-threshold", default_value_t = DEFAULT_MMAP_THRESHOLD_BYTES)]
    mmap_threshold: u64,

    /// Query customers concurrently when --customer all is given
    #[arg(long = "parallel")]
    parallel: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control color output (auto, always, never)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Suppress progress output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("no output obtained from TECommander: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl RunError {
    fn exit_code(&self) -> i32 {
        match self {
            RunError::Source(_) => EXIT_INPUT,
            RunError::Export(ExportError::CreateDir { .. }) => EXIT_OUTPUT_DIR,
            RunError::Export(ExportError::Write { .. }) => EXIT_WRITE,
        }
    }
}

/// Everything a single customer run needs besides the customer itself.
struct RunContext<'a> {
    source: &'a dyn TagSource,
    node_group: &'a str,
    username: &'a str,
    output: &'a Path,
    date: NaiveDate,
    quiet: bool,
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn resolve_customers<'t>(args: &Args, table: &'t CustomerTable) -> Result<Vec<&'t Customer>> {
    match args.customer.as_deref() {
        Some(name) if name.eq_ignore_ascii_case("all") => {
            if table.is_empty() {
                bail!(CustomerError::Empty);
            }
            Ok(table.all())
        }
        Some(name) => Ok(vec![table.get(name)?]),
        None => {
            let names = table.names();
            let chosen = select_customer(&names, io::stdin().lock(), io::stdout())?;
            Ok(vec![table.get(chosen)?])
        }
    }
}

fn resolve_node_group(args: &Args) -> Result<String> {
    match &args.node_group {
        Some(group) => Ok(group.trim_matches('"').to_string()),
        None => Ok(prompt_node_group(io::stdin().lock(), io::stdout())?),
    }
}

fn run_customer(ctx: &RunContext<'_>, customer: &Customer) -> Result<PathBuf, RunError> {
    let start = Instant::now();
    let mut engine = Engine::new();
    engine.load_from_source(ctx.source, customer, ctx.node_group)?;

    let outfile = report_path(ctx.output, ctx.username, &customer.name);
    ensure_parent_dir(&outfile)?;
    if !ctx.quiet {
        println!(
            "Sorting and writing results to {}.",
            outfile.display().to_string().bold()
        );
    }
    let params = ReportParameters::new(&customer.name, ctx.node_group, ctx.date);
    save_taglist(&engine.tags, &params, &outfile)?;

    if let Some(stats) = engine.parse_stats {
        if stats.unterminated > 0 || stats.orphans > 0 {
            warn!(
                "{}: listing had {} unterminated block(s) and {} line(s) outside any block",
                customer.name, stats.unterminated, stats.orphans
            );
        }
    }
    info!(
        "{}: {} node(s), {} tag(s) in {:.2}s",
        customer.name,
        engine.tags.len(),
        engine.tags.tag_count(),
        start.elapsed().as_secs_f64()
    );
    Ok(outfile)
}

fn main() {
    let start = Instant::now();
    let args = Args::parse();
    init_logger(args.verbose);
    match args.color {
        ColorChoice::Always => {
            colored::control::set_override(true);
        }
        ColorChoice::Never => {
            colored::control::set_override(false);
        }
        ColorChoice::Auto => {}
    }

    let table = match CustomerTable::from_path(&args.customers) {
        Ok(t) => t,
        Err(e) => {
            error!("{}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let customers = match resolve_customers(&args, &table) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let Some(username) = args.username.as_deref() else {
        error!("no username given (-u/--username or USERNAME)");
        std::process::exit(EXIT_CONFIG);
    };
    if args.input.is_some() && customers.len() > 1 {
        error!("--input replays a single listing and cannot be used with --customer all");
        std::process::exit(EXIT_CONFIG);
    }
    let node_group = match resolve_node_group(&args) {
        Ok(g) => g,
        Err(e) => {
            error!("{}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let source: Box<dyn TagSource> = match &args.input {
        Some(path) => {
            let threshold = if args.mmap_threshold == 0 {
                u64::MAX
            } else {
                args.mmap_threshold
            };
            Box::new(CapturedListing::with_threshold(path, threshold))
        }
        None => {
            if !args.quiet {
                println!(
                    "\nGetting list of tags for nodes in \"{}\"...",
                    node_group.cyan()
                );
                println!(
                    "{}",
                    "(Be patient, TECommander can take a bit of time to get the data you request.)"
                        .dimmed()
                );
            }
            Box::new(TeCommander::new(&args.tecommander))
        }
    };

    let ctx = RunContext {
        source: source.as_ref(),
        node_group: &node_group,
        username,
        output: &args.output,
        date: args
            .as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        quiet: args.quiet,
    };

    let results: Vec<(&Customer, Result<PathBuf, RunError>)> = if args.parallel {
        customers
            .par_iter()
            .map(|c| (*c, run_customer(&ctx, c)))
            .collect()
    } else {
        customers
            .iter()
            .map(|c| (*c, run_customer(&ctx, c)))
            .collect()
    };

    let mut exit_code = 0;
    for (customer, res) in &results {
        if let Err(e) = res {
            error!("{}: {}", customer.name, e);
            if exit_code == 0 {
                exit_code = e.exit_code();
            }
        }
    }

    if !args.quiet {
        println!(
            "Script run took {:.2} seconds.",
            start.elapsed().as_secs_f64()
        );
    }
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
