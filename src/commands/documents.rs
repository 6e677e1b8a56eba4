use anyhow::Result;
use tracing::{info, warn};

use crate::cli::DocumentsArgs;
use crate::commands::DataLayout;
use crate::store::DocumentStore;
use crate::util::print_json_pretty;

pub fn run(args: DocumentsArgs) -> Result<()> {
    let layout = DataLayout::new(&args.data_dir);
    let db_path = layout.db_path();
    if !db_path.exists() {
        warn!(path = %db_path.display(), "document store missing; nothing uploaded yet");
        return print_json_pretty(&Vec::<()>::new());
    }

    let store = DocumentStore::open(&db_path)?;
    let documents = store
        .list()?
        .into_iter()
        .filter(|document| {
            args.bundle
                .as_deref()
                .is_none_or(|bundle| document.bundle_key == bundle)
        })
        .collect::<Vec<_>>();

    info!(count = documents.len(), "listed documents");
    print_json_pretty(&documents)
}
