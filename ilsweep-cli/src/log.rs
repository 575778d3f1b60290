use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt, prelude::*, util::TryInitError};

#[allow(unused_imports)]
pub use tracing::{debug, error, info, trace, warn};

pub fn init() -> Result<(), TryInitError> {
    let stdout_log = fmt::layer().compact().without_time();

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(
            Targets::default()
                .with_target("ilsweep", Level::DEBUG)
                .with_target("ilsweep_core", Level::DEBUG)
                .with_target("jack", Level::WARN)
                .with_default(Level::INFO),
        )
        .try_init()
}
