use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::DataLayout;
use crate::store::DocumentStore;

pub fn run(args: StatusArgs) -> Result<()> {
    let layout = DataLayout::new(&args.data_dir);
    let db_path = layout.db_path();

    info!(
        data_dir = %layout.root().display(),
        uploads = %layout.uploads_dir().display(),
        highlighted = %layout.highlighted_dir().display(),
        exports = %layout.exports_dir().display(),
        "status requested"
    );

    if db_path.exists() {
        let store = DocumentStore::open(&db_path)?;
        info!(
            path = %db_path.display(),
            documents = store.count()?,
            bundles = store.count_bundles()?,
            "document store status"
        );
    } else {
        warn!(path = %db_path.display(), "document store missing");
    }

    match latest_manifest(&layout.manifests_dir())? {
        Some(path) => {
            let raw = fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: Value = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            let field = |pointer: &str| {
                manifest.pointer(pointer).map(display_value).unwrap_or_default()
            };

            info!(
                path = %path.display(),
                run_id = %field("/run_id"),
                status = %field("/status"),
                document_id = %field("/document_id"),
                highlight_type = %field("/highlight_type"),
                updated_at = %field("/updated_at"),
                marks_total = %field("/counts/marks_total"),
                "latest highlight run"
            );
        }
        None => warn!(dir = %layout.manifests_dir().display(), "no highlight runs recorded"),
    }

    Ok(())
}

/// Strings without their JSON quotes; other values in JSON form.
fn display_value(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

/// Run manifests carry a compact UTC timestamp in their names, so the greatest name is the newest.
fn latest_manifest(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        let is_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("highlight_") && name.ends_with(".json"));
        if is_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }
    Ok(latest)
}
