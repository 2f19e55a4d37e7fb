use console::style;

use crate::cli::commands::ProbeArgs;
use crate::config::EngineSettings;
use crate::engine::probe::probe;
use crate::engine::{EngineApi, ZapEngine};
use crate::errors::ScanError;

pub async fn handle_probe(args: ProbeArgs, config_path: Option<&str>) -> Result<(), ScanError> {
    let config = super::load_config(config_path).await?;
    let settings = EngineSettings::resolve(config.engine.as_ref(), args.relay.as_deref())?;
    let engine = ZapEngine::new(&settings)?;

    let version = probe(&engine).await?;
    println!(
        "{} Engine reachable via {} (version {})",
        style("✓").green().bold(),
        style(engine.endpoint()).cyan(),
        version
    );
    Ok(())
}
