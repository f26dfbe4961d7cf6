mod debug_report;

use chrono::NaiveDate;
use dctfinder::{Config, Context, DctFinder, Locale, Options, Page, Strategy};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use url::Url;

const LOG_ENV: &str = "DCTFINDER_LOG";

fn main() {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "dctfinder=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default.into());
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run(cli: &CliConfig) -> dctfinder::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let finder = DctFinder::new(config);

    let contents = cli
        .files
        .iter()
        .map(|path| std::fs::read(path).map_err(|e| dctfinder::Error::io(format!("reading {}", path.display()), e)))
        .collect::<dctfinder::Result<Vec<_>>>()?;
    let context = Context { reference: cli.reference, url: cli.url.clone(), locale: cli.locale.clone() };
    let pages: Vec<Page<'_>> = cli
        .files
        .iter()
        .zip(&contents)
        .map(|(path, bytes)| Page::new(path.display().to_string(), bytes).with_context(context.clone()))
        .collect();

    if cli.features {
        let mut stdout = io::stdout().lock();
        finder.write_features(&pages, &mut stdout)?;
        return Ok(());
    }

    let options = Options { strategy: cli.strategy, score_threshold: None };
    let infos = finder.page_infos(&pages, &options)?;
    for (page, info) in pages.iter().zip(&infos) {
        if cli.verbose {
            debug_report::print_page(&page.name, info, cli.color);
        } else {
            println!("{}\t{info}", page.name);
        }
    }
    Ok(())
}

struct CliConfig {
    files: Vec<PathBuf>,
    config: Option<PathBuf>,
    locale: Option<Locale>,
    url: Option<Url>,
    reference: Option<NaiveDate>,
    strategy: Option<Strategy>,
    features: bool,
    verbose: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut cli = CliConfig {
        files: Vec::new(),
        config: None,
        locale: None,
        url: None,
        reference: None,
        strategy: None,
        features: false,
        verbose: false,
        color: io::stdout().is_terminal(),
    };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            inline.clone().or_else(|| args.next()).ok_or_else(|| format!("error: {name} expects a value"))
        };

        match flag.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("dctfinder {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "-v" | "--verbose" => cli.verbose = true,
            "--color" => cli.color = true,
            "--no-color" => cli.color = false,
            "--features" => cli.features = true,
            "--config" => cli.config = Some(PathBuf::from(value("--config")?)),
            "--locale" => cli.locale = Some(Locale::new(value("--locale")?)),
            "--url" => {
                let raw = value("--url")?;
                cli.url = Some(Url::parse(&raw).map_err(|e| format!("error: invalid --url '{raw}': {e}"))?);
            }
            "--reference" => {
                let raw = value("--reference")?;
                cli.reference = Some(parse_reference(&raw)?);
            }
            "--strategy" => {
                let raw = value("--strategy")?;
                cli.strategy = Some(raw.parse().map_err(|e| format!("error: {e}"))?);
            }
            "--" => {
                cli.files.extend(args.by_ref().map(PathBuf::from));
                break;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => cli.files.push(PathBuf::from(arg)),
        }
    }

    if cli.files.is_empty() {
        return Err(format!("error: no input file\n\n{}", help_text()));
    }
    Ok(cli)
}

fn parse_reference(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("error: invalid --reference '{value}' (expected YYYY-MM-DD)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "dctfinder {version}

Finds the title and creation date of web pages.

Usage:
  dctfinder [OPTIONS] [--] <file.html>...

Options:
  --config <file>            YAML configuration. Default: built-in settings,
                             rule tables under ./data.
  --locale <tag>             Rule locale (en, en_US, en_GB, fr, ...). Generic
                             English is refined from --url. Default: en
  --url <url>                Source URL of the pages.
  --reference <date>         Download date in YYYY-MM-DD. Resolved dates never
                             come after it.
  --strategy <age|score>     Candidate resolution strategy.
  --features                 Print the feature table instead of labeling.
  -v, --verbose              Print a debug report per page.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}               Log filter, e.g. dctfinder=debug.

Output:
  One line per page: <file>\\t<YYYY-MM-DD>\\t<title>

Exit codes:
  0  Success.
  1  Pipeline error (configuration, labeler, I/O).
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV,
    )
}
