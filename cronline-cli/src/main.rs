use clap::Parser;
use cronline::{CronError, CronOptions, CronSchedule};
use jiff::civil::DateTime;
use jiff::Zoned;
use std::process;
use tracing_subscriber::EnvFilter;

const MAX_OCCURRENCES: usize = 1000;

#[derive(Parser)]
#[command(name = "cronline", about = "Next and previous runs of a cron line", version)]
struct Cli {
    /// Cron expression (e.g., "*/15 9-17 * * mon-fri" or "@daily")
    expression: Option<String>,

    /// Number of occurrences to show
    #[arg(short, long, default_value = "1")]
    n: usize,

    /// Reference time (ISO 8601 civil or zoned datetime). Defaults to now.
    #[arg(long)]
    from: Option<String>,

    /// Show previous occurrences instead of upcoming ones
    #[arg(long)]
    last: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Validate expression without computing
    #[arg(long)]
    check: bool,

    /// Lowest year the year field may match
    #[arg(long)]
    min_year: Option<i16>,

    /// Highest year the year field may match
    #[arg(long)]
    max_year: Option<i16>,
}

/// The instant occurrences are searched from, keeping the zone if one was given.
enum Reference {
    Civil(DateTime),
    Zoned(Zoned),
}

impl Reference {
    fn parse(text: &str) -> Result<Self, String> {
        if let Ok(zoned) = text.parse::<Zoned>() {
            return Ok(Self::Zoned(zoned));
        }
        text.parse::<DateTime>()
            .map(Self::Civil)
            .map_err(|e| format!("invalid --from datetime: {e}"))
    }

    fn occurrences(
        &self,
        schedule: &CronSchedule,
        count: usize,
        backward: bool,
    ) -> Result<Vec<String>, CronError> {
        match (self, backward) {
            (Self::Civil(dt), false) => Ok(render(schedule.next_n(*dt, count)?)),
            (Self::Civil(dt), true) => Ok(render(schedule.last_n(*dt, count)?)),
            (Self::Zoned(z), false) => Ok(render(schedule.next_n_zoned(z, count)?)),
            (Self::Zoned(z), true) => Ok(render(schedule.last_n_zoned(z, count)?)),
        }
    }
}

fn render<T: ToString>(found: Vec<T>) -> Vec<String> {
    found.iter().map(ToString::to_string).collect()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let expression = match cli.expression {
        Some(ref expr) => expr.as_str(),
        None => {
            eprintln!("error: no expression provided");
            process::exit(2);
        }
    };

    let defaults = CronOptions::default();
    let options = defaults.with_years(
        cli.min_year.unwrap_or(defaults.min_year)..=cli.max_year.unwrap_or(defaults.max_year),
    );

    let schedule = match CronSchedule::with_options(expression, options) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e.display_rich());
            process::exit(1);
        }
    };

    if cli.check {
        println!("\u{2713} valid");
        process::exit(0);
    }

    let reference = match cli.from {
        Some(ref text) => match Reference::parse(text) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        },
        None => Reference::Zoned(Zoned::now()),
    };

    let mut n = cli.n;
    if n > MAX_OCCURRENCES {
        eprintln!("warning: capped at {MAX_OCCURRENCES} occurrences");
        n = MAX_OCCURRENCES;
    }
    tracing::debug!(expression = %schedule, count = n, last = cli.last, "computing occurrences");

    let results = match reference.occurrences(&schedule, n, cli.last) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e.display_rich());
            process::exit(1);
        }
    };

    if results.is_empty() {
        eprintln!("no occurrences");
        process::exit(0);
    }

    if cli.json {
        match serde_json::to_string(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
    } else {
        for occurrence in &results {
            println!("{occurrence}");
        }
    }
}
