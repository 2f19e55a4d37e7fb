pub mod parser;
pub mod settings;
pub mod types;

pub use types::*;
pub use settings::{EngineSettings, HistorySettings, RelaySettings, ScanSettings};
pub use parser::{parse_config, parse_config_str};
