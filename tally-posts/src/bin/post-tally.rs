#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

use std::error::Error as StdError;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tally::scheduler::{GreedyScheduler, RayonScheduler, Scheduler};
use tally::TOP_K;
use tally_posts::metrics::{dates, emoji, mentions};
use tally_posts::{DateRank, LineStats, Report, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Metric {
    Dates,
    Emojis,
    Mentions,
    All
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Pool {
    Greedy,
    Rayon
}

/// Ranks busiest dates, most used emoji and most mentioned users in line-delimited JSON posts
#[derive(Debug, Parser)]
#[command(name = "post-tally", version)]
struct Args {
    /// Statistic to compute
    #[arg(short, long, value_enum, default_value_t = Metric::All)]
    metric: Metric,

    /// Counter strategy: memory or time
    #[arg(short, long, default_value_t = Strategy::Memory)]
    strategy: Strategy,

    /// Worker pool implementation
    #[arg(long, value_enum, default_value_t = Pool::Greedy)]
    scheduler: Pool,

    /// Worker threads, defaults to one per CPU
    #[arg(short, long)]
    workers: Option<usize>,

    /// Entries per ranking
    #[arg(short = 'k', long, default_value_t = TOP_K)]
    top: usize,

    /// Print a JSON document instead of text
    #[arg(long)]
    json: bool,

    /// Input files, one JSON post per line
    #[arg(required = true)]
    files: Vec<PathBuf>
}

#[derive(Default, Serialize)]
struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    dates: Option<Report<DateRank>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emojis: Option<Report<(String, u64)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mentions: Option<Report<(String, u64)>>
}

fn compute<S: Scheduler>(s: &S, args: &Args) -> Result<Output, tally_posts::Error> {
    let wants = |m: Metric| args.metric == m || args.metric == Metric::All;
    let mut out = Output::default();
    if wants(Metric::Dates) {
        out.dates = Some(dates::top_dates(s, &args.files, args.strategy, args.top)?);
    }
    if wants(Metric::Emojis) {
        out.emojis = Some(emoji::top_emojis(s, &args.files, args.strategy, args.top)?);
    }
    if wants(Metric::Mentions) {
        out.mentions = Some(mentions::top_mentions(s, &args.files, args.strategy, args.top)?);
    }
    Ok(out)
}

fn log_lines(name: &str, lines: &LineStats) {
    info!("{}: {} lines, {} records, {} blank, {} malformed",
          name, lines.lines, lines.records, lines.blank, lines.malformed);
}

fn print_text(out: &Output) {
    if let Some(ref report) = out.dates {
        log_lines("dates", &report.lines);
        println!("# dates");
        for r in report.entries.iter() {
            println!("{}\t{}\t{}\t{}", r.date, r.top_user, r.posts, r.user_posts);
        }
    }
    for (name, report) in vec![("emojis", &out.emojis), ("mentions", &out.mentions)] {
        if let Some(report) = report {
            log_lines(name, &report.lines);
            println!("# {}", name);
            for (key, count) in report.entries.iter() {
                println!("{}\t{}", key, count);
            }
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn StdError>> {
    debug!("Arguments: {:?}", args);
    let out = match args.scheduler {
        Pool::Greedy => {
            let s = args.workers.map(GreedyScheduler::with_threads).unwrap_or_default();
            info!("Greedy scheduler, {} threads", s.threads());
            compute(&s, args)?
        },
        Pool::Rayon => {
            let s = args.workers.map(RayonScheduler::new).unwrap_or_default();
            info!("Rayon scheduler, {} threads", s.threads());
            compute(&s, args)?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_text(&out);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("post-tally: {}", e);
        process::exit(1);
    }
}
