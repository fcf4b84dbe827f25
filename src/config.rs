use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub input_dir: PathBuf,
    #[serde(default = "default_solr_url")]
    pub solr_url: String,
    pub case_id: String,
    pub custodian: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Use a Tika server for extraction instead of the built-in extractor.
    pub tika_url: Option<String>,
}

fn default_solr_url() -> String {
    "http://localhost:8983/solr".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_extension() -> String {
    "eml".to_string()
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("eml_indexer"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

/// Loads the default config file, writing a template on first use.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        // create a template config for users to edit
        let sample = Config {
            input_dir: PathBuf::from("/path/to/mail"),
            solr_url: default_solr_url(),
            case_id: "1".to_string(),
            custodian: "custodian".to_string(),
            workers: default_workers(),
            extension: default_extension(),
            tika_url: None,
        };
        let tom = toml::to_string_pretty(&sample)?;
        fs::write(&path, tom)?;
        return Err(anyhow::anyhow!(
            "Created template config at {} — edit it and run again",
            path.display()
        ));
    }
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
    let cfg: Config = toml::from_str(&s)?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.case_id.trim().is_empty() {
            return Err(anyhow::anyhow!("case_id must not be empty"));
        }
        if self.workers == 0 {
            return Err(anyhow::anyhow!("workers must be at least 1"));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(anyhow::anyhow!("extension must not be empty"));
        }
        Ok(())
    }
}
