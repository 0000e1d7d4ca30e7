mod session;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Catalog, CatalogItem, LoaderConfig};
use rand::Rng;
use server::{MovieRecommendation, RecommendationOrchestrator};
use session::SessionContext;
use similarity::RecommendError;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Title suggestions shown when a lookup fails
const MAX_SUGGESTIONS: usize = 5;

/// CineMatch - "more like this" movie recommendations
#[derive(Parser)]
#[command(name = "cine-match")]
#[command(about = "Content-based movie recommendations from keywords, cast, director and genres", long_about = None)]
struct Cli {
    /// Path to the movie catalog (CSV with a header row)
    #[arg(short, long, default_value = "data/movies.csv")]
    data: PathBuf,

    /// Field delimiter of the catalog file (a single character, or "tab")
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Lowercase feature text and split it on punctuation before matching
    #[arg(long)]
    fold_terms: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movies similar to a given title
    Recommend {
        /// Exact catalog title (use `search` to find it)
        #[arg(long)]
        title: String,

        /// Number of recommendations to return
        #[arg(short, long, default_value = "5")]
        k: usize,

        /// Show why each movie was recommended
        #[arg(long)]
        explain: bool,

        /// Print the recommendations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search for movies by title
    Search {
        /// Case-insensitive substring of the title
        #[arg(long)]
        title: String,

        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show everything known about one movie
    Show {
        /// Exact catalog title
        #[arg(long)]
        title: String,
    },

    /// Most recent and popular movies of a genre
    Top {
        /// Genre name, as listed by `top --list`
        #[arg(long)]
        genre: Option<String>,

        /// Number of movies to show
        #[arg(long, default_value = "10")]
        limit: usize,

        /// List the genres of the catalog instead
        #[arg(long)]
        list: bool,
    },

    /// Walk from movie to movie through their recommendations
    Browse {
        /// Recommendations shown per movie
        #[arg(short, long, default_value = "5")]
        k: usize,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = LoaderConfig::new()
        .with_delimiter(cli.delimiter)
        .with_fold_terms(cli.fold_terms);

    eprintln!("Loading movie catalog from {}...", cli.data.display());
    let start = Instant::now();
    let catalog = Catalog::load_from_file(&cli.data, &config)
        .with_context(|| format!("Failed to load movie catalog from {}", cli.data.display()))?;
    eprintln!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        catalog.len(),
        start.elapsed()
    );

    let orchestrator = RecommendationOrchestrator::new(catalog);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            title,
            k,
            explain,
            json,
        } => handle_recommend(&orchestrator, &title, k, explain, json)?,
        Commands::Search { title, limit } => handle_search(&orchestrator.catalog(), &title, limit),
        Commands::Show { title } => handle_show(&orchestrator, &title)?,
        Commands::Top { genre, limit, list } => {
            handle_top(&orchestrator.catalog(), genre.as_deref(), limit, list)?
        }
        Commands::Browse { k } => {
            let stdin = io::stdin();
            run_browse(&orchestrator, k, stdin.lock(), io::stdout())?
        }
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(orchestrator, requests, concurrent).await?,
    }

    Ok(())
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!(
                "delimiter must be a single ASCII character, got '{}'",
                value
            )),
        },
    }
}

/// User-facing message for a failed query
fn describe_error(err: &anyhow::Error, catalog: &Catalog) -> String {
    match err.downcast_ref::<RecommendError>() {
        Some(RecommendError::TitleNotFound { title }) => {
            let suggestions: Vec<&str> = catalog
                .search_titles(title, MAX_SUGGESTIONS)
                .into_iter()
                .map(|item| item.title.as_str())
                .collect();
            if suggestions.is_empty() {
                format!("No movie titled '{}' in the catalog", title)
            } else {
                format!(
                    "No movie titled '{}' in the catalog. Did you mean: {}?",
                    title,
                    suggestions.join(", ")
                )
            }
        }
        Some(RecommendError::InsufficientData {
            requested,
            available,
        }) => format!(
            "Cannot recommend {} movies: the catalog only has {} other movies",
            requested, available
        ),
        Some(RecommendError::StaleIndex { .. }) => {
            "The feature index does not match the loaded catalog, reload and try again".to_string()
        }
        None => format!("{:#}", err),
    }
}

/// Handle the 'recommend' command
fn handle_recommend(
    orchestrator: &RecommendationOrchestrator,
    title: &str,
    k: usize,
    explain: bool,
    json: bool,
) -> Result<()> {
    let recommendations = orchestrator
        .get_recommendations(title, k)
        .map_err(|err| anyhow!(describe_error(&err, &orchestrator.catalog())))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
        return Ok(());
    }

    println!("{}", format!("Movies like '{}':", title).bold().blue());
    print_recommendations(&recommendations, explain);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(catalog: &Catalog, title: &str, limit: usize) {
    let matches = catalog.search_titles(title, limit);
    if matches.is_empty() {
        println!("No movies match '{}'", title);
        return;
    }

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    for item in matches {
        println!(
            "{}: {} ({}) [{}]",
            item.index,
            item.title,
            or_unknown(&item.release_date),
            item.genre_list().collect::<Vec<_>>().join(", ")
        );
    }
}

/// Handle the 'show' command
fn handle_show(orchestrator: &RecommendationOrchestrator, title: &str) -> Result<()> {
    let catalog = orchestrator.catalog();
    let index = orchestrator
        .resolve_title(title)
        .map_err(|err| anyhow!(describe_error(&err, &catalog)))?;
    let item = catalog
        .get_item(index)
        .ok_or_else(|| anyhow!("Movie #{} missing from the catalog", index))?;

    print_item_details(item);
    Ok(())
}

/// Handle the 'top' command
fn handle_top(catalog: &Catalog, genre: Option<&str>, limit: usize, list: bool) -> Result<()> {
    if list {
        println!("{}", "Genres:".bold().blue());
        for genre in catalog.genres() {
            println!(
                "  {} ({} movies)",
                genre,
                catalog.get_items_by_genre(genre).len()
            );
        }
        return Ok(());
    }

    let genre =
        genre.ok_or_else(|| anyhow!("Pass --genre <GENRE>, or --list to see the genres"))?;
    let top = catalog.top_by_genre(genre, limit);
    if top.is_empty() {
        bail!("No movies in genre '{}' (see `top --list`)", genre);
    }

    println!("{}", format!("Top {} movies:", genre).bold().blue());
    for (rank, item) in top.iter().enumerate() {
        println!(
            "{}. {} ({}) - popularity {}, rating {} ({} votes)",
            (rank + 1).to_string().green(),
            item.title,
            or_unknown(&item.release_date),
            or_dash(item.popularity),
            or_dash(item.rating_avg),
            or_dash(item.rating_vote)
        );
    }
    Ok(())
}

// ============================================================================
// Browse
// ============================================================================

/// Interactive loop over `input`.
///
/// A title selects a movie, a number follows one of the shown
/// recommendations, `back` returns to the previous movie, `quit` exits.
fn run_browse<R: BufRead, W: Write>(
    orchestrator: &RecommendationOrchestrator,
    k: usize,
    input: R,
    mut out: W,
) -> Result<()> {
    let mut session = SessionContext::new();
    writeln!(
        out,
        "Type a movie title, a result number to follow it, 'back', or 'quit'."
    )?;
    prompt(&mut out)?;

    for line in input.lines() {
        let line = line?;
        let command = line.trim();

        match command {
            "" => {
                prompt(&mut out)?;
                continue;
            }
            "quit" | "exit" | "q" => break,
            "back" => {
                if session.back().is_none() {
                    writeln!(out, "Nothing to go back to")?;
                    prompt(&mut out)?;
                    continue;
                }
            }
            _ => {
                // A result number wins; anything else, including titles that
                // are numbers ("1917"), is looked up as a title
                let picked = match command.parse::<usize>() {
                    Ok(number) => session.pick(number),
                    Err(_) => None,
                };
                if picked.is_none() {
                    match orchestrator.resolve_title(command) {
                        Ok(index) => session.select(index),
                        Err(err) => {
                            match command.parse::<usize>() {
                                Ok(number) if !session.last_results().is_empty() => {
                                    writeln!(out, "No result #{} to follow", number)?
                                }
                                _ => writeln!(
                                    out,
                                    "{}",
                                    describe_error(&err, &orchestrator.catalog())
                                )?,
                            }
                            prompt(&mut out)?;
                            continue;
                        }
                    }
                }
            }
        }

        show_selection(orchestrator, &mut session, k, &mut out)?;
        prompt(&mut out)?;
    }

    debug!("Browse session ended after {} steps", session.steps());
    Ok(())
}

fn prompt<W: Write>(out: &mut W) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

fn show_selection<W: Write>(
    orchestrator: &RecommendationOrchestrator,
    session: &mut SessionContext,
    k: usize,
    out: &mut W,
) -> Result<()> {
    let catalog = orchestrator.catalog();
    let Some(item) = session.selected().and_then(|index| catalog.get_item(index)) else {
        return Ok(());
    };

    writeln!(
        out,
        "[{}] {} ({})",
        session.steps(),
        item.title.bold(),
        or_unknown(&item.release_date)
    )?;
    if let Some(previous) = session.history().last().and_then(|&i| catalog.get_title(i)) {
        writeln!(out, "  ('back' returns to {})", previous)?;
    }
    match orchestrator.get_recommendations(&item.title, k) {
        Ok(results) => {
            for rec in &results {
                writeln!(out, "  {}. {} ({:.3})", rec.rank, rec.title, rec.similarity)?;
            }
            session.set_results(results);
        }
        Err(err) => writeln!(out, "{}", describe_error(&err, &catalog))?,
    }
    Ok(())
}

// ============================================================================
// Benchmark
// ============================================================================

/// Latency summary of a benchmark run
#[derive(Debug, Clone, Copy, PartialEq)]
struct LatencyStats {
    count: usize,
    mean: Duration,
    p50: Duration,
    p95: Duration,
    p99: Duration,
    max: Duration,
}

impl LatencyStats {
    fn from_timings(mut timings: Vec<Duration>) -> Option<Self> {
        if timings.is_empty() {
            return None;
        }
        timings.sort();

        let total: Duration = timings.iter().sum();
        Some(Self {
            count: timings.len(),
            mean: Duration::from_secs_f64(total.as_secs_f64() / timings.len() as f64),
            p50: percentile(&timings, 0.50),
            p95: percentile(&timings, 0.95),
            p99: percentile(&timings, 0.99),
            max: timings[timings.len() - 1],
        })
    }
}

/// Nearest-rank percentile of sorted, non-empty timings
fn percentile(sorted: &[Duration], quantile: f64) -> Duration {
    let position = ((sorted.len() - 1) as f64 * quantile).round() as usize;
    sorted[position.min(sorted.len() - 1)]
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    orchestrator: RecommendationOrchestrator,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let catalog = orchestrator.catalog();
    if catalog.len() < 2 {
        bail!("Benchmark needs at least two movies in the catalog");
    }
    if requests == 0 || concurrent == 0 {
        bail!("--requests and --concurrent must both be positive");
    }
    let k = orchestrator.default_k().min(catalog.len() - 1);

    // Random seed titles
    let titles: Vec<String> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|_| catalog.items()[rng.random_range(0..catalog.len())].title.clone())
            .collect()
    };

    // Build the feature index up front so it is not counted as query latency
    let warm_up = Instant::now();
    orchestrator.get_recommendations(&titles[0], k)?;
    info!("Feature index ready after {:.2?}", warm_up.elapsed());

    let semaphore = Arc::new(Semaphore::new(concurrent));
    let start = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for title in titles {
        let orchestrator = orchestrator.clone();
        let permit = semaphore.clone().acquire_owned().await?;
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let started = Instant::now();
            orchestrator.get_recommendations(&title, k)?;
            Ok::<_, anyhow::Error>(started.elapsed())
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await.context("Benchmark task panicked")??);
    }
    let wall_time = start.elapsed();

    let stats = LatencyStats::from_timings(timings)
        .ok_or_else(|| anyhow!("Benchmark produced no timings"))?;
    let throughput = stats.count as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent, k = {})", stats.count, concurrent, k);
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", stats.mean);
    println!("P50 latency: {:?}", stats.p50);
    println!("P95 latency: {:?}", stats.p95);
    println!("P99 latency: {:?}", stats.p99);
    println!("Max latency: {:?}", stats.max);
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

// ============================================================================
// Output helpers
// ============================================================================

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[MovieRecommendation], explain: bool) {
    for rec in recommendations {
        println!(
            "{}. {} ({}) [{}] - Similarity: {:.3}",
            rec.rank.to_string().green(),
            rec.title.bold(),
            or_unknown(&rec.release_date),
            rec.genres.join(", "),
            rec.similarity
        );
        if explain {
            println!("   {}", rec.explanation);
            if !rec.image_url.is_empty() {
                println!("   Poster: {}", rec.image_url);
            }
        }
    }
}

fn print_item_details(item: &CatalogItem) {
    println!("{}", item.title.bold().blue());

    let fields = [
        ("Released", item.release_date.as_str()),
        ("Genres", item.genres.as_str()),
        ("Director", item.director.as_str()),
        ("Cast", item.actors.as_str()),
        ("Keywords", item.keywords.as_str()),
        ("Tagline", item.tagline.as_str()),
        ("Overview", item.overview.as_str()),
        ("Poster", item.image_url.as_str()),
        ("Trailer", item.trailer_url.as_str()),
    ];
    for (label, value) in fields {
        if !value.trim().is_empty() {
            println!("{}{}: {}", "• ".green(), label, value);
        }
    }

    if let Some(runtime) = item.runtime {
        println!("{}Runtime: {} min", "• ".cyan(), runtime);
    }
    if item.rating_avg.is_some() || item.rating_vote.is_some() {
        println!(
            "{}Rating: {} ({} votes)",
            "• ".cyan(),
            or_dash(item.rating_avg),
            or_dash(item.rating_vote)
        );
    }
    if let Some(popularity) = item.popularity {
        println!("{}Popularity: {:.1}", "• ".cyan(), popularity);
    }
    for (column, value) in &item.extra {
        println!("{}{}: {}", "• ".dimmed(), column, value);
    }
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() { "?" } else { value }
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
