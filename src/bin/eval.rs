use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use moviechat::catalog::Catalog;
use moviechat::chat::{self, ChatService};
use moviechat::config::AppConfig;
use moviechat::models::ChatRequest;
use moviechat::normalize::MovieNormalizer;
use moviechat::tmdb::TmdbClient;

#[derive(Parser, Debug)]
#[command(name = "eval")]
#[command(about = "Replay a scripted conversation against the live movie catalog")]
struct Cli {
    #[arg(long, default_value = "eval/prompts.jsonl")]
    file: String,
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct EvalPrompt {
    id: String,
    message: String,
    /// Continue the previous reply's context instead of starting fresh.
    #[serde(default)]
    more: bool,
    #[serde(default)]
    expect_contains: Vec<String>,
    #[serde(default)]
    expect_min_movies: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let tmdb = TmdbClient::new(&config.tmdb)?;
    let normalizer = MovieNormalizer::new(
        config.tmdb.image_base_url.clone(),
        config.tmdb.site_base_url.clone(),
    );
    let service = ChatService::new(Catalog::new(Arc::new(tmdb), normalizer));

    let prompts = load_prompts(&cli.file)?;
    if prompts.is_empty() {
        anyhow::bail!("no prompts found in {}", cli.file);
    }

    let mut tallies: BTreeMap<&'static str, Tally> = BTreeMap::new();
    let mut last_context = None;

    for prompt in &prompts {
        let intent = chat::classify(&prompt.message, prompt.more).name();
        let request = if prompt.more {
            ChatRequest::more(prompt.message.clone(), last_context.clone())
        } else {
            ChatRequest::new(prompt.message.clone())
        };

        let reply = service.respond(request).await;
        if let Some(context) = &reply.context {
            last_context = Some(
                serde_json::to_value(context)
                    .with_context(|| format!("failed encoding context of {}", prompt.id))?,
            );
        }

        let response_lower = reply.response.to_lowercase();
        let contains_pass = prompt
            .expect_contains
            .iter()
            .all(|needle| response_lower.contains(&needle.to_lowercase()));
        let count_pass = prompt
            .expect_min_movies
            .map_or(true, |min| reply.movies.len() >= min);

        let tally = tallies.entry(intent).or_default();
        tally.prompts += 1;
        tally.passed += usize::from(contains_pass && count_pass);
        tally.with_movies += usize::from(!reply.movies.is_empty());

        if cli.verbose {
            println!("--- {} [{}] ---", prompt.id, intent);
            println!("Q: {}", prompt.message);
            println!("A: {}", reply.response.replace('\n', " | "));
            println!("Movies: {}", reply.movies.len());
            println!();
        }
    }

    let overall = tallies.values().fold(Tally::default(), |acc, t| Tally {
        prompts: acc.prompts + t.prompts,
        passed: acc.passed + t.passed,
        with_movies: acc.with_movies + t.with_movies,
    });

    println!("{:<20} {:>7} {:>8} {:>8}", "intent", "prompts", "pass", "movies");
    for (intent, tally) in &tallies {
        print_row(intent, tally);
    }
    print_row("overall", &overall);

    Ok(())
}

#[derive(Debug, Default)]
struct Tally {
    prompts: usize,
    passed: usize,
    with_movies: usize,
}

fn print_row(label: &str, tally: &Tally) {
    println!(
        "{:<20} {:>7} {:>7.1}% {:>7.1}%",
        label,
        tally.prompts,
        percent(tally.passed, tally.prompts),
        percent(tally.with_movies, tally.prompts)
    );
}

/// One JSON object per non-blank line.
fn load_prompts(path: &str) -> Result<Vec<EvalPrompt>> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed reading {path}"))?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<EvalPrompt>(line)
                .with_context(|| format!("prompt on {path}:{} is not valid JSON", idx + 1))
        })
        .collect()
}

fn percent(part: usize, whole: usize) -> f64 {
    match whole {
        0 => 0.0,
        _ => part as f64 * 100.0 / whole as f64,
    }
}
