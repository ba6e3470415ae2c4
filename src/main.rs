use anyhow::Context;
use clap::{Parser, Subcommand};
use lyricsync::config;
use lyricsync::lyrics::{Searcher, SyncedLyrics, available_providers};

#[derive(Debug, Parser)]
#[command(name = "lyricsync", version, about = "Find synced lyrics across lyrics providers")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Provider order for this run, e.g. `lrclib,netease`.
    #[arg(long, value_delimiter = ',')]
    providers: Option<Vec<String>>,

    /// Log provider decisions.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the first lyrics found.
    Search {
        track: String,
        artist: String,
        /// Accept plain-text lyrics when no synced lyrics exist.
        #[arg(long)]
        allow_plain: bool,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print lyrics from every provider that has them.
    All {
        track: String,
        artist: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the line being sung at a playback offset.
    At {
        track: String,
        artist: String,
        offset_ms: u64,
    },
    /// List available and configured providers.
    Providers,
    /// Save a new provider order to the config file.
    SetProviders {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let order = cli.providers.clone().unwrap_or_else(|| cfg.lyrics.providers.clone());
    let searcher = Searcher::from_names(&order, cfg.http.provider_settings());

    match cli.command {
        Command::Search {
            track,
            artist,
            allow_plain,
            json,
        } => {
            let synced_only = cfg.lyrics.synced_only && !allow_plain;
            let report = searcher
                .search_with_report(&track, &artist, synced_only)
                .await;
            match report.lyrics {
                Some(lyrics) if json => println!("{}", serde_json::to_string_pretty(&lyrics)?),
                Some(lyrics) => print_lyrics(&lyrics),
                None => {
                    for skip in &report.skipped {
                        eprintln!("{}: {}", skip.provider, skip.reason);
                    }
                    eprintln!("No lyrics found for {} - {}", artist, track);
                }
            }
        }
        Command::All {
            track,
            artist,
            json,
        } => {
            let all = searcher.search_all(&track, &artist).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                eprintln!("No lyrics found for {} - {}", artist, track);
            } else {
                for lyrics in &all {
                    print_lyrics(lyrics);
                    println!();
                }
            }
        }
        Command::At {
            track,
            artist,
            offset_ms,
        } => match searcher.search(&track, &artist, true).await {
            Some(lyrics) => match lyrics.line_at(offset_ms) {
                Some(line) => println!("{}", line),
                None => eprintln!("Nothing is sung before {} ms", offset_ms),
            },
            None => eprintln!("No synced lyrics found for {} - {}", artist, track),
        },
        Command::Providers => {
            println!("available:  {}", available_providers().join(", "));
            println!("configured: {}", searcher.provider_names().join(", "));
        }
        Command::SetProviders { names } => {
            // Unknown names are dropped (and logged) here
            searcher.set_providers(&names);

            let mut cfg = cfg;
            cfg.lyrics.providers = searcher.provider_names();
            config::save(&cfg, cli.config.as_deref()).context("save config")?;
            println!("Provider order: {}", cfg.lyrics.providers.join(", "));
        }
    }

    Ok(())
}

fn print_lyrics(lyrics: &SyncedLyrics) {
    println!(
        "# {} - {} (source: {})",
        lyrics.artist(),
        lyrics.track(),
        lyrics.source()
    );
    if lyrics.is_synced() {
        for line in lyrics.lines() {
            println!("{}", line);
        }
    } else {
        println!("{}", lyrics.to_lrc().trim_end());
    }
}
