use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use listen_audit::audit::{AuditOptions, AuditReport};
use listen_audit::config::AppConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "listen-audit", version, about = "Forensic integrity audit for ListenBrainz listen exports")]
struct Cli {
    /// Config file (defaults to the XDG config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit one or more export files (or directories of .json/.jsonl files)
    Audit {
        /// Export files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Enable near-duplicate detection with this window in seconds
        #[arg(long)]
        near_window: Option<u64>,

        /// Number of artists in the top-artists table
        #[arg(long)]
        top: Option<usize>,

        /// Drop podcast episodes before auditing
        #[arg(long)]
        exclude_podcasts: bool,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export a user's full listen history from the ListenBrainz API
    Export {
        /// ListenBrainz username (defaults to config)
        #[arg(long)]
        username: Option<String>,

        /// ListenBrainz user token (defaults to config)
        #[arg(long)]
        token: Option<String>,

        /// Output file (defaults to <username>_full.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Explicit --config must parse; the XDG one falls back to defaults
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path).context("Failed to load config")?,
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Audit { paths, near_window, top, exclude_podcasts, json } => {
            let loaded = listen_audit::loader::load_paths(&paths)
                .context("Failed to load listens")?;
            log::info!(
                "Loaded {} listens from {} files ({} lines skipped)",
                loaded.records.len(),
                loaded.files_read,
                loaded.lines_skipped
            );

            let mut records = loaded.records;
            if exclude_podcasts || config.audit.exclude_podcasts {
                let (kept, removed) = listen_audit::loader::filter_podcasts(records);
                if !json {
                    println!("Removed {removed} podcast listens before auditing");
                }
                records = kept;
            }

            // CLI > config > built-in defaults
            let defaults = config.audit_options();
            let options = AuditOptions {
                near_window: near_window.or(defaults.near_window),
                top_artists: top.unwrap_or(defaults.top_artists),
            };

            let report = listen_audit::audit::run_audit(&records, &options);

            if json {
                let out = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize report")?;
                println!("{out}");
            } else {
                print_report(&report);
            }
        }

        Commands::Export { username, token, output } => {
            let lb = &config.listenbrainz;
            let username = username
                .or_else(|| lb.username.clone())
                .context("No username. Pass --username or set listenbrainz.username in config.")?;
            let token = token
                .or_else(|| lb.token.clone())
                .context("No token. Pass --token or set listenbrainz.token in config.")?;
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{username}_full.json")));

            let api = listen_audit::export::ListenBrainzApi::new(lb, &username, &token);
            let options = listen_audit::export::ExportOptions {
                output: output.clone(),
                rate_limit: Duration::from_millis(lb.rate_limit_ms),
                max_retries: lb.max_retries,
                backoff_unit: Duration::from_secs(1),
            };

            let result = listen_audit::export::export_listens(&api, &options)
                .context("Export failed")?;
            println!(
                "Export complete: {} listens in {} ({} fetched this run)",
                result.total,
                output.display(),
                result.fetched
            );
        }
    }

    Ok(())
}

/// Print the sectioned text report.
fn print_report(r: &AuditReport) {
    println!();
    println!("==============================");
    println!("LISTENBRAINZ FORENSIC AUDIT");
    println!("==============================");
    println!();

    println!("==== STRUCTURAL INTEGRITY ====");
    println!("Total listens:              {}", r.total);
    println!("Exact duplicates:           {}", r.exact_duplicates);
    println!("Unique listen events:       {}", r.unique_count);
    println!("Timestamp collision groups: {}", r.collision_group_count);
    if r.collision_group_count > 0 {
        println!("Largest collision:          {}", r.largest_collision_size);
    }
    if let (Some(window), Some(count)) = (r.near_duplicate_window, r.near_duplicate_count) {
        println!("Near duplicates (±{}s):     {}", window, count);
    }
    println!();

    println!("==== TEMPORAL ANALYSIS ====");
    println!("Rapid ≤5s:                  {}", r.rapid_burst_5s);
    println!("Rapid ≤10s:                 {}", r.rapid_burst_10s);
    if let (Some(min), Some(median)) = (r.min_gap, r.median_gap) {
        println!("Minimum gap:                {}s", min);
        println!("Median gap:                 {}s", median);
    }
    println!("Same track ≤15s:            {}", r.same_track_repeats_15s);
    println!("Same track ≤60s:            {}", r.same_track_repeats_60s);
    println!();

    println!("==== METADATA HEALTH ====");
    println!(
        "Recording MBID coverage:    {}/{} ({:.1}%)",
        r.mbid_coverage.present,
        r.mbid_coverage.total,
        r.mbid_coverage.ratio() * 100.0
    );
    println!(
        "Duration metadata coverage: {}/{} ({:.1}%)",
        r.duration_coverage.present,
        r.duration_coverage.total,
        r.duration_coverage.ratio() * 100.0
    );
    if !r.client_distribution.is_empty() {
        println!();
        println!("Submission clients:");
        for c in &r.client_distribution {
            println!("  {:<30} {}", truncate(&c.name, 30), c.count);
        }
    }
    println!();

    println!("==== DIVERSITY ANALYSIS ====");
    println!("Unique artists:             {}", r.unique_artist_count);
    println!("Global entropy:             {:.4}", r.global_entropy);

    if !r.top_artists.is_empty() {
        println!();
        println!("Top {} artists:", r.top_artists.len());
        for (i, a) in r.top_artists.iter().enumerate() {
            println!("  {:>2}. {:<40} {}", i + 1, truncate(&a.name, 40), a.count);
        }
    }

    if !r.yearly_counts.is_empty() {
        println!();
        println!("Yearly distribution:");
        for y in &r.yearly_counts {
            println!("  {}  {}", y.year, y.count);
        }
    }

    if !r.yearly_entropy.is_empty() {
        println!();
        println!("Entropy by year:");
        for y in &r.yearly_entropy {
            println!("  {}  {:.3}", y.year, y.entropy);
        }
    }
    println!();

    println!("==== DURATION PROFILE ====");
    let p = &r.duration_profile;
    println!("Listens with duration:      {}", p.with_duration);
    if p.with_duration > 0 {
        println!();
        println!("Skip analysis (duration ≤ threshold):");
        for t in &p.skip_counts {
            println!("  ≤{:<3}s {}", t.threshold_secs, t.count);
        }
        println!();
        println!("Duration distribution:");
        for b in &p.buckets {
            println!("  {:<9} {}", b.label, b.count);
        }
    }
    println!();

    println!("==== FINAL INTEGRITY SCORE ====");
    println!("Integrity score:            {} / 100", r.integrity_score);
    println!("Risk level:                 {}", r.risk_tier);
    println!();
}

/// Truncate long names for table display, on a char boundary.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
