use anyhow::{Context, Result};
use keeper_core::ClassificationPolicy;
use keeper_store::{StorePaths, PROCESSED_FILE, RAW_FILE, SUMMARY_FILE};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::llm::Provider;
use crate::state::ensure_keeper_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmSection,
    #[serde(default)]
    pub ledger: LedgerSection,
    #[serde(default)]
    pub classification: ClassificationPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    /// "ollama", "openai", "anthropic" or "rules"
    pub provider: String,
    pub model: String,
    /// Provider default when unset
    pub base_url: Option<String>,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// Directory holding the ledger files (default: `<keeper home>/ledger`)
    pub data_dir: Option<PathBuf>,
    pub raw_file: String,
    pub processed_file: String,
    pub summary_file: String,
}

impl Default for Config {
    fn default() -> Self {
        let provider = Provider::Ollama;
        Self {
            llm: LlmSection {
                provider: provider.to_string(),
                model: provider.default_model().to_string(),
                base_url: None,
                temperature: 0.0,
            },
            ledger: LedgerSection::default(),
            classification: ClassificationPolicy::default(),
        }
    }
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            data_dir: None,
            raw_file: RAW_FILE.to_string(),
            processed_file: PROCESSED_FILE.to_string(),
            summary_file: SUMMARY_FILE.to_string(),
        }
    }
}

impl Config {
    /// Apply `MODEL_PROVIDER` and `OLLAMA_MODEL` from `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("MODEL_PROVIDER").filter(|v| !v.trim().is_empty()) {
            match value.parse::<Provider>() {
                Ok(p) if p.to_string() != self.llm.provider => {
                    self.llm.provider = p.to_string();
                    self.llm.model = p.default_model().to_string();
                    self.llm.base_url = None;
                }
                Ok(_) => {}
                Err(e) => warn!("ignoring MODEL_PROVIDER: {e}"),
            }
        }
        if self.llm.provider == Provider::Ollama.to_string() {
            if let Some(model) = var("OLLAMA_MODEL").filter(|v| !v.trim().is_empty()) {
                self.llm.model = model.trim().to_string();
            }
        }
    }

    pub fn data_dir(&self, home: &Path) -> PathBuf {
        self.ledger
            .data_dir
            .clone()
            .unwrap_or_else(|| home.join("ledger"))
    }

    pub fn store_paths(&self, home: &Path) -> StorePaths {
        let dir = self.data_dir(home);
        StorePaths {
            raw: dir.join(&self.ledger.raw_file),
            processed: dir.join(&self.ledger.processed_file),
            summary: dir.join(&self.ledger.summary_file),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_keeper_home()?.join("config.toml"))
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Config file plus environment overrides
pub fn load_config() -> Result<Config> {
    let mut cfg = read_config_file(&config_path()?)?;
    cfg.apply_env(|k| std::env::var(k).ok());
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
