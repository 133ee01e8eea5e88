use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$KEEPER_HOME`, or `~/.keeper`
pub fn keeper_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("KEEPER_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set (or set KEEPER_HOME)")?;
    Ok(PathBuf::from(home).join(".keeper"))
}

pub fn ensure_keeper_home() -> Result<PathBuf> {
    let dir = keeper_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
