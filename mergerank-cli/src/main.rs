mod config;
mod items;
mod output;
mod parse;
mod prompt;
mod store;

use clap::Parser;
use mergerank_core::{Item, SortSession, Step};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::parse::{Answer, Side, parse_answer};
use crate::store::StateWriter;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "mergerank", version, about = "Rank items by answering pairwise choices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Rank a list of items interactively
    Rank(RankArgs),
    /// Create a default config file at ~/.config/mergerank/config.toml
    Init,
}

#[derive(Parser)]
struct RankArgs {
    /// File with one item per line, or a JSON array of titles / {id, title, imageUrl} objects
    #[arg(long)]
    items: Option<PathBuf>,

    /// Inline item (repeatable)
    #[arg(long = "item")]
    inline_items: Vec<String>,

    /// Save progress here after every answer and resume from it next time
    #[arg(long)]
    state: Option<PathBuf>,

    /// Ignore any existing state file and start over
    #[arg(long)]
    fresh: bool,

    /// Seed for the initial shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,

    /// Path to config file (default: ~/.config/mergerank/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank(args) => {
            init_logging(args.verbose);
            run_rank(args);
        }
        Commands::Init => {
            let path = config::create_default_config();
            println!("Created config at {}", path.display());
            println!("Edit it to set a default state file, seed, etc.");
        }
    }
}

fn open_session(args: &RankArgs, items: Vec<Item>, state_path: Option<PathBuf>, rng: &mut StdRng) -> SortSession<StateWriter> {

    let saved = match (&state_path, args.fresh) {
        (Some(path), false) => store::load(path),
        _ => None,
    };

    let Some(saved) = saved else {
        let session = SortSession::new(items, rng).unwrap_or_else(|e| bail(e));
        return session.with_observer(StateWriter::new(state_path, Vec::new()));
    };

    let removed: HashSet<_> = saved.removed.iter().copied().collect();
    let items: Vec<Item> = items.into_iter().filter(|item| !removed.contains(&item.id)).collect();
    tracing::info!(
        removed = saved.removed.len(),
        cached = saved.state.choices.len(),
        "resuming from saved state"
    );

    let session = SortSession::resume(items, &saved.state, rng).unwrap_or_else(|e| bail(e));
    session.with_observer(StateWriter::new(state_path, saved.removed))
}

fn run_rank(args: RankArgs) {
    // Load config file, merge with CLI args (CLI wins)
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let state_path = args.state.clone().or_else(|| cfg.state_file.map(PathBuf::from));
    let json = args.json || cfg.json.unwrap_or(false);
    let seed = args.seed.or(cfg.seed).unwrap_or_else(rand::random);
    tracing::debug!(seed, "shuffle seed");

    let loaded = items::load_items(args.items.as_deref(), &args.inline_items);
    let answers = items::answer_reader(loaded.from_stdin).unwrap_or_else(|e| bail(e));

    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = open_session(&args, loaded.items, state_path, &mut rng);

    if args.verbose {
        eprintln!(
            "Ranking {} items (at most {} placements to settle)",
            session.items().len(),
            session.total_battles(),
        );
    }

    let mut lines = answers.lines();
    let mut stderr = io::stderr();

    let mut step = session.step();
    loop {
        let request = match step {
            Step::Complete(order) => {
                if json {
                    output::print_json(&order, session.comparison_count());
                } else {
                    output::print_table(&order, session.comparison_count());
                }
                return;
            }
            Step::Compare(request) => request,
        };

        let _ = write!(stderr, "{}", prompt::build_prompt(&request, session.progress()));
        let _ = stderr.flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => bail(format!("Failed to read answer: {e}")),
            None => {
                eprintln!("\nInput closed after {} comparisons.", session.comparison_count());
                return;
            }
        };

        let side_id = |side: Side| match side {
            Side::Left => request.left.id,
            Side::Right => request.right.id,
        };

        step = match parse_answer(&line) {
            Some(Answer::Pick(side)) => session.resolve(side_id(side)).unwrap_or_else(|e| bail(e)),
            Some(Answer::Undo) => {
                if let Err(e) = session.undo() {
                    eprintln!("{e}");
                }
                session.step()
            }
            Some(Answer::Remove(side)) => {
                let id = side_id(side);
                session.observer_mut().removed.push(id);
                session.remove_item(id).unwrap_or_else(|e| bail(e));
                eprintln!("Removed \"{}\".", if side == Side::Left { &request.left.title } else { &request.right.title });
                session.step()
            }
            Some(Answer::Quit) => {
                eprintln!(
                    "Stopped after {} comparisons ({}%).",
                    session.comparison_count(),
                    session.percent_complete(),
                );
                return;
            }
            None => {
                eprintln!("{}", prompt::HELP);
                session.step()
            }
        };
    }
}
