use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

//----- Command line parameters

/// Build the index of static news pages
#[derive(Parser, Debug)]
pub struct RootCommand {
    /// Path to the config file
    #[arg(global = true, long, default_value = "news-indexer.yml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl RootCommand {
    // Avoids importing Parser in main
    pub fn read() -> RootCommand {
        RootCommand::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the news directory and regenerate the index files (the default)
    Generate,

    /// Keep regenerating the index as news pages are edited
    Watch,
}

//----- Config file

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Directory holding the article pages
    pub news_dir: PathBuf,
    /// JSON output path, defaults to `<news_dir>/news-index.json`
    pub output_json: Option<PathBuf>,
    /// Embeddable script output path, defaults to `<news_dir>/news-index.js`
    pub output_js: Option<PathBuf>,
    /// Per-file thumbnail overrides, keyed by article filename. Takes
    /// precedence over whatever the page markup contains.
    pub thumbnails: HashMap<String, String>,
    pub concurrency: Option<usize>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            news_dir: "news".into(),
            output_json: None,
            output_js: None,
            thumbnails: HashMap::new(),
            concurrency: None,
        }
    }
}

impl Config {
    /// Reads the config file. A missing file is fine: the tool runs with
    /// defaults so it can be invoked with no arguments at all.
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let config = serde_yaml::from_reader(file).with_context(|| format!("Failed to read {:?}", path))?;
        Ok(config)
    }

    pub fn output_json_path(&self) -> PathBuf {
        self.output_json
            .clone()
            .unwrap_or_else(|| self.news_dir.join("news-index.json"))
    }

    pub fn output_js_path(&self) -> PathBuf {
        self.output_js
            .clone()
            .unwrap_or_else(|| self.news_dir.join("news-index.js"))
    }
}
