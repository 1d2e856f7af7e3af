use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use testresult::TestResult;

use news_indexer::config::Config;
use news_indexer::index::{self, ArticleRecord};

fn config_for(news_dir: &Path) -> Config {
    Config {
        news_dir: news_dir.to_path_buf(),
        ..Config::default()
    }
}

fn read_index(news_dir: &Path) -> anyhow::Result<Vec<ArticleRecord>> {
    let json = fs::read_to_string(news_dir.join("news-index.json"))?;
    Ok(serde_json::from_str(&json)?)
}

#[test]
fn test_template_only_dir_yields_empty_outputs() -> TestResult {
    let dir = tempfile::tempdir()?;
    let news = dir.path().join("news");
    fs::create_dir(&news)?;
    fs::write(news.join("template.html"), "<html><body></body></html>")?;
    fs::write(news.join("styles.css"), "body {}")?;

    index::generate(&config_for(&news))?;

    assert!(read_index(&news)?.is_empty());

    // the script artifact is written too, holding the same empty array
    let script = fs::read_to_string(news.join("news-index.js"))?;
    assert!(script.starts_with("// Generated by news-indexer."));
    assert!(script.contains("const NEWS_INDEX = []"));

    Ok(())
}

#[test]
fn test_metadata_extraction_and_mtime_fallback() -> TestResult {
    let dir = tempfile::tempdir()?;
    let news = dir.path().join("news");
    fs::create_dir(&news)?;

    let page = news.join("news-launch-day.html");
    fs::write(
        &page,
        r#"<html><head>
            <meta property="og:title" content="Launch Day">
            <meta name="description" content="We are launching something new and exciting today.">
            <meta name="category" content="Releases">
        </head><body></body></html>"#,
    )?;

    index::generate(&config_for(&news))?;

    let items = read_index(&news)?;
    assert_eq!(1, items.len());

    let item = &items[0];
    assert_eq!("news-launch-day.html", item.filename);
    assert_eq!("news/news-launch-day.html", item.url);
    assert_eq!("Launch Day", item.title);
    assert_eq!("We are launching something new and exciting today.", item.description);
    assert_eq!("Releases", item.category);
    assert_eq!("", item.thumbnail);

    // no date annotation: the record carries the file's mtime as ISO-8601
    let mtime = fs::metadata(&page)?.modified()?;
    let expected = DateTime::<Utc>::from(mtime).to_rfc3339_opts(SecondsFormat::Millis, true);
    assert_eq!(expected, item.date);

    Ok(())
}

#[test]
fn test_filename_fallback_title() -> TestResult {
    let dir = tempfile::tempdir()?;
    let news = dir.path().join("news");
    fs::create_dir(&news)?;
    fs::write(news.join("news-spring-update.html"), "<html><body></body></html>")?;

    index::generate(&config_for(&news))?;

    let items = read_index(&news)?;
    assert_eq!("spring update", items[0].title);

    Ok(())
}

#[test]
fn test_index_is_sorted_by_date_descending() -> TestResult {
    let dir = tempfile::tempdir()?;
    let news = dir.path().join("news");
    fs::create_dir(&news)?;

    for (file, date) in [
        ("oldest.html", "2023-01-15"),
        ("newest.html", "2024-06-01T08:00:00Z"),
        ("middle.html", "2024-01-01"),
    ] {
        fs::write(
            news.join(file),
            format!(r#"<meta name="date" content="{}">"#, date),
        )?;
    }

    index::generate(&config_for(&news))?;

    let items = read_index(&news)?;
    let filenames = items.iter().map(|i| i.filename.as_str()).collect::<Vec<_>>();
    assert_eq!(vec!["newest.html", "middle.html", "oldest.html"], filenames);

    for pair in items.windows(2) {
        assert!(index::parse_date_lenient(&pair[0].date) >= index::parse_date_lenient(&pair[1].date));
    }

    Ok(())
}

#[test]
fn test_thumbnail_override_beats_markup() -> TestResult {
    let dir = tempfile::tempdir()?;
    let news = dir.path().join("news");
    fs::create_dir(&news)?;
    fs::write(
        news.join("news-party.html"),
        r#"<img src="../assets/from markup.png">"#,
    )?;

    let mut config = config_for(&news);
    config
        .thumbnails
        .insert("news-party.html".to_string(), "/assets/override pic.jpg".to_string());

    index::generate(&config)?;

    let items = read_index(&news)?;
    assert_eq!("assets/override%20pic.jpg", items[0].thumbnail);

    Ok(())
}

#[test]
fn test_thumbnail_from_markup_is_normalized() -> TestResult {
    let dir = tempfile::tempdir()?;
    let news = dir.path().join("news");
    fs::create_dir(&news)?;
    fs::write(
        news.join("news-gallery.html"),
        r#"<div style="background-image: url('../assets/photo one.png')"></div>"#,
    )?;

    index::generate(&config_for(&news))?;

    let items = read_index(&news)?;
    assert_eq!("assets/photo%20one.png", items[0].thumbnail);

    Ok(())
}

#[test]
fn test_missing_news_dir_fails_the_run() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config = config_for(&dir.path().join("no-such-dir"));

    assert!(index::generate(&config).is_err());

    Ok(())
}

#[test]
fn test_outputs_are_overwritten_in_place() -> TestResult {
    let dir = tempfile::tempdir()?;
    let news = dir.path().join("news");
    fs::create_dir(&news)?;
    let config = config_for(&news);

    fs::write(news.join("a.html"), r#"<meta name="date" content="2024-01-01">"#)?;
    index::generate(&config)?;
    assert_eq!(1, read_index(&news)?.len());

    fs::remove_file(news.join("a.html"))?;
    index::generate(&config)?;
    assert!(read_index(&news)?.is_empty());

    // no temp leftovers from the rename dance
    assert!(!news.join("news-index.json.tmp").exists());
    assert!(!news.join("news-index.js.tmp").exists());

    Ok(())
}

#[test]
fn test_custom_output_paths() -> TestResult {
    let dir = tempfile::tempdir()?;
    let news = dir.path().join("news");
    fs::create_dir(&news)?;
    fs::write(news.join("a.html"), "<html></html>")?;

    let mut config = config_for(&news);
    config.output_json = Some(dir.path().join("out.json"));
    config.output_js = Some(dir.path().join("out.js"));

    index::generate(&config)?;

    assert!(dir.path().join("out.json").exists());
    assert!(dir.path().join("out.js").exists());
    assert!(!news.join("news-index.json").exists());

    Ok(())
}
