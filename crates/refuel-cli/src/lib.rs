//! Refuel CLI - command line tools for mid-air refueling scenarios.
//!
//! Binaries:
//! - simulate: build a scenario, fly it and write the run report
//! - plan_paths: build a scenario and write the planned paths only

pub mod output;
pub mod settings;

pub use output::write_json;
pub use settings::RunSettings;

/// Install the fmt subscriber; `RUST_LOG` adds to the crate defaults.
pub fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("refuel_core=info".parse()?)
                .add_directive("refuel_cli=info".parse()?),
        )
        .init();
    Ok(())
}
