use std::sync::Once;

use depreciation_core::{DepreciationEngine, EngineConfig};

use crate::input;

static TRACING_INIT: Once = Once::new();

/// Install the stderr log subscriber. `RUST_LOG` overrides the default
/// `depreciation_core=info,depr=info` directives.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("depreciation_core=info,depr=info"));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

/// Build the engine from an optional config file; defaults otherwise.
pub fn load_engine(path: Option<&str>) -> Result<DepreciationEngine, Box<dyn std::error::Error>> {
    let config: EngineConfig = match path {
        Some(p) => input::file::read_yaml(p)?,
        None => EngineConfig::default(),
    };
    tracing::debug!(?config, "engine configuration loaded");
    Ok(DepreciationEngine::new(config)?)
}
