use anyhow::{Context, Result};
use lexicards_core::{Scheduler, SchedulerConfig};
use lexicards_json::paths::data_root;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(data_root)
}

/// Default policy unless a JSON override file is given; missing keys keep their defaults.
pub fn load_scheduler(path: Option<&Path>) -> Result<Scheduler> {
    let Some(path) = path else {
        return Ok(Scheduler::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading scheduler config {}", path.display()))?;
    let config: SchedulerConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing scheduler config {}", path.display()))?;
    let scheduler = Scheduler::new(config)?;
    info!(path = %path.display(), config = ?scheduler.config(), "loaded scheduler config");
    Ok(scheduler)
}
