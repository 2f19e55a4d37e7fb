use tracing::debug;

use crate::cli::commands::HistoryArgs;
use crate::cli::render;
use crate::config::HistorySettings;
use crate::errors::ScanError;
use crate::history::HistoryStore;

pub async fn handle_history(args: HistoryArgs, config_path: Option<&str>) -> Result<(), ScanError> {
    let config = super::load_config(config_path).await?;
    let settings = HistorySettings::from_config(config.history.as_ref());
    debug!(path = %settings.path.display(), limit = args.limit, "Reading scan history");

    let store = HistoryStore::open(&settings.path, settings.max_entries)?;
    let entries = store.list(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render::render_history(&entries));
    }
    Ok(())
}
