//! Full listen history export from the ListenBrainz API.
//!
//! Pages backwards in time with `max_ts`, rewriting the output file after
//! every page so an interrupted export can resume where it stopped.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ListenBrainzConfig;
use crate::loader::listenbrainz::parse_timestamp;

/// API response for `/user/{name}/listens` (partial).
#[derive(Debug, Deserialize)]
struct ListensResponse {
    payload: ListensPayload,
}

#[derive(Debug, Deserialize)]
struct ListensPayload {
    #[serde(default)]
    listens: Vec<Value>,
}

/// One page of listens older than a cursor.
pub trait ListenSource {
    /// Fetch up to one page of listens at or before `max_ts`, newest first.
    /// `None` starts from the most recent listen.
    fn fetch_page(&self, max_ts: Option<i64>) -> Result<Vec<Value>>;
}

/// Live ListenBrainz API client.
pub struct ListenBrainzApi {
    agent: ureq::Agent,
    api_root: String,
    username: String,
    token: String,
    batch_size: usize,
}

impl ListenBrainzApi {
    pub fn new(config: &ListenBrainzConfig, username: &str, token: &str) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            api_root: config.api_root.trim_end_matches('/').to_string(),
            username: username.to_string(),
            token: token.to_string(),
            batch_size: config.batch_size,
        }
    }
}

impl ListenSource for ListenBrainzApi {
    fn fetch_page(&self, max_ts: Option<i64>) -> Result<Vec<Value>> {
        let url = format!("{}/user/{}/listens", self.api_root, encode_path_segment(&self.username));
        log::debug!("Fetching {url} (max_ts={max_ts:?})");

        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .query("count", &self.batch_size.to_string());
        if let Some(ts) = max_ts {
            request = request.query("max_ts", &ts.to_string());
        }

        let response: ListensResponse = request
            .call()
            .with_context(|| format!("HTTP request failed for {url}"))?
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse listens JSON from {url}"))?;

        Ok(response.payload.listens)
    }
}

/// Settings for one export run.
pub struct ExportOptions {
    pub output: PathBuf,
    /// Pause between successful page requests.
    pub rate_limit: Duration,
    /// Attempts per page before giving up.
    pub max_retries: u32,
    /// Retry n waits `backoff_unit * 2^n`.
    pub backoff_unit: Duration,
}

pub struct ExportResult {
    /// Listens in the output file.
    pub total: usize,
    /// Listens fetched during this run.
    pub fetched: usize,
    /// Cursor the run resumed from, when a previous file existed.
    pub resumed_from: Option<i64>,
}

/// Export every listen from `source` into `options.output`.
pub fn export_listens<S: ListenSource>(source: &S, options: &ExportOptions) -> Result<ExportResult> {
    let mut all_listens = read_existing(&options.output)?;
    let mut max_ts = None;
    let mut resumed_from = None;

    if !all_listens.is_empty() {
        let cursor = next_cursor(&all_listens).with_context(|| {
            format!("{} has listens without timestamps, cannot resume", options.output.display())
        })?;
        println!("Resuming previous export from timestamp {cursor}...");
        max_ts = Some(cursor);
        resumed_from = Some(cursor);
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut fetched = 0;
    loop {
        let listens = fetch_with_retry(source, max_ts, options)?;
        if listens.is_empty() {
            break;
        }

        fetched += listens.len();
        all_listens.extend(listens);
        let cursor = next_cursor(&all_listens).context("API returned listens without timestamps")?;
        if max_ts.is_some_and(|prev| cursor >= prev) {
            bail!("Export cursor did not advance past {cursor}");
        }
        max_ts = Some(cursor);

        pb.set_message(format!("Fetched total: {} listens", all_listens.len()));
        write_atomic(&options.output, &all_listens)?;

        thread::sleep(options.rate_limit);
    }

    // Always leave a valid file, even for an account with no listens.
    write_atomic(&options.output, &all_listens)?;
    pb.finish_with_message(format!("Done: {} listens", all_listens.len()));

    Ok(ExportResult {
        total: all_listens.len(),
        fetched,
        resumed_from,
    })
}

fn fetch_with_retry<S: ListenSource>(
    source: &S,
    max_ts: Option<i64>,
    options: &ExportOptions,
) -> Result<Vec<Value>> {
    let attempts = options.max_retries.max(1);
    let mut attempt = 0;
    loop {
        match source.fetch_page(max_ts) {
            Ok(listens) => return Ok(listens),
            Err(e) => {
                attempt += 1;
                if attempt >= attempts {
                    return Err(e.context(format!("Max retries ({attempts}) exceeded")));
                }
                let wait = options.backoff_unit * 2u32.saturating_pow(attempt);
                log::warn!("Error: {e:#}. Retrying in {wait:?} ({attempt}/{attempts})...");
                thread::sleep(wait);
            }
        }
    }
}

/// Oldest timestamp minus one, or None if no listen carries a timestamp.
fn next_cursor(listens: &[Value]) -> Option<i64> {
    listens
        .iter()
        .filter_map(|l| l.get("listened_at").and_then(parse_timestamp))
        .min()
        .map(|ts| ts - 1)
}

fn read_existing(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a listen array, refusing to resume", path.display()))
}

/// Write via a sibling temp file and rename, so a crash never truncates the export.
fn write_atomic(path: &Path, listens: &[Value]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let json = serde_json::to_vec(listens).context("Failed to serialize listens")?;
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", tmp.display()))?;
    Ok(())
}

/// Percent-encode characters that break a URL path segment.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
