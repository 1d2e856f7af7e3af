//! Builds the news index: enumerates the article pages, extracts their
//! metadata, and writes the JSON document and the embeddable script.

use std::cmp::Reverse;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use indoc::indoc;
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;

use crate::config::Config;
use crate::extract;

/// Article pages end with this, case-insensitively
pub const ARTICLE_EXT: &str = ".html";

/// The authoring template, never indexed
pub const TEMPLATE_FILE: &str = "template.html";

/// One entry of the generated index. Field order is the serialization order.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub filename: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub thumbnail: String,
    pub category: String,
}

pub fn has_article_ext(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(ARTICLE_EXT)
}

pub fn is_article_file(name: &str) -> bool {
    has_article_ext(name) && !name.eq_ignore_ascii_case(TEMPLATE_FILE)
}

/// Runs a full generation pass: scan, extract, sort, write both outputs.
///
/// A file that cannot be read is warned about and skipped; an unreadable
/// source directory or a failed output write aborts the run.
pub fn generate(config: &Config) -> anyhow::Result<()> {
    let entries = fs::read_dir(&config.news_dir)
        .with_context(|| format!("Cannot list news directory {:?}", &config.news_dir))?;

    let mut files = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_article_file(name))
        .collect::<Vec<_>>();

    // Directory enumeration order is OS-dependent: sort by name so that
    // records with equal dates come out in a stable order.
    files.sort();

    let url_base = config
        .news_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("news");

    let mut items = files
        .par_iter()
        .filter_map(|file| match build_record(config, url_base, file) {
            Ok(record) => Some(record),
            Err(err) => {
                eprintln!("Skipping {}: {:#}", file, err);
                None
            }
        })
        .collect::<Vec<_>>();

    // Most recent first. The sort is stable, and unparseable dates sink to
    // the bottom as "oldest".
    items.sort_by_cached_key(|item| Reverse(parse_date_lenient(&item.date)));

    write_outputs(config, &items)?;

    println!("Wrote news index with {} items to {:?}", items.len(), config.output_json_path());
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {}", i + 1, item.title);
    }

    Ok(())
}

fn build_record(config: &Config, url_base: &str, filename: &str) -> anyhow::Result<ArticleRecord> {
    let path = config.news_dir.join(filename);
    let html = fs::read_to_string(&path).with_context(|| format!("Cannot read {:?}", &path))?;

    let meta = extract::extract(&html);

    let date = match meta.date {
        Some(date) => date,
        None => {
            let mtime = fs::metadata(&path)
                .and_then(|m| m.modified())
                .with_context(|| format!("Cannot stat {:?}", &path))?;
            iso_timestamp(mtime)
        }
    };

    // A configured override beats whatever the page says
    let thumbnail = config
        .thumbnails
        .get(filename)
        .cloned()
        .or(meta.thumbnail)
        .map(|t| extract::normalize_thumbnail(&t))
        .unwrap_or_default();

    Ok(ArticleRecord {
        filename: filename.to_string(),
        url: format!("{}/{}", url_base, filename),
        title: meta.title.unwrap_or_else(|| title_from_filename(filename)),
        description: meta.description.unwrap_or_default(),
        date,
        thumbnail,
        category: meta.category.unwrap_or_default(),
    })
}

lazy_static! {
    static ref EXT_RE: Regex = Regex::new(r"(?i)\.html$").unwrap();
    static ref NEWS_PREFIX_RE: Regex = Regex::new("(?i)^news-?").unwrap();
}

/// Derives a readable title from a filename such as `news-launch-day.html`
pub fn title_from_filename(filename: &str) -> String {
    let stem = EXT_RE.replace(filename, "");
    let stem = NEWS_PREFIX_RE.replace(&stem, "");
    stem.replace('-', " ")
}

/// Renders a file timestamp the way the index stores dates:
/// `2024-03-01T00:00:00.000Z`
pub fn iso_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an article date for sorting. Accepts RFC 3339 as well as the bare
/// date and date-time shapes authors actually write; anything else sorts as
/// the oldest possible date (relative order among such records is unspecified).
pub fn parse_date_lenient(date: &str) -> DateTime<Utc> {
    let date = date.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return parsed.with_timezone(&Utc);
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S") {
        return Utc.from_utc_datetime(&parsed);
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Utc.from_utc_datetime(&parsed.and_time(NaiveTime::MIN));
    }

    DateTime::<Utc>::MIN_UTC
}

fn write_outputs(config: &Config, items: &[ArticleRecord]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(items)?;

    write_replacing(&config.output_json_path(), &json)?;

    let script = format!(
        indoc! {r#"
            // Generated by news-indexer. Do not edit: the next run overwrites this file.
            const NEWS_INDEX = {};
        "#},
        json
    );
    write_replacing(&config.output_js_path(), &script)?;

    Ok(())
}

/// Writes through a temp sibling and renames over the target, so a failed run
/// never leaves a truncated output behind.
fn write_replacing(path: &Path, contents: &str) -> anyhow::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, contents).with_context(|| format!("Cannot write to {:?}", tmp))?;
    fs::rename(tmp, path).with_context(|| format!("Cannot move {:?} to {:?}", tmp, path))?;

    Ok(())
}
