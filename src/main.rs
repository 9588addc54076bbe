//! Binary entry point: load configuration, connect to MongoDB, and print the
//! files of the most recently updated library.
//!
//! # Environment variables
//!
//! | Variable                 | Default                     | Description                    |
//! |--------------------------|-----------------------------|--------------------------------|
//! | `LIBRARY_MONGO_URI`      | `mongodb://localhost:27017` | MongoDB connection string      |
//! | `LIBRARY_MONGO_DATABASE` | `library`                   | Database holding the libraries |
//! | `LIBRARY_DISPLAY_LIMIT`  | unset (all)                 | Maximum file records to print  |
//! | `RUST_LOG`               | `library_inspect=info`      | Log filter (stderr)            |

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use library_inspect::{config, run, Config, MongoStore, Outcome};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let env_files = config::load_env_files();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_inspect=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    for path in &env_files {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    match inspect() {
        Ok(Outcome::NoLibrary) => {
            tracing::warn!("no library registered yet, nothing to list");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Listed { library, printed }) => {
            tracing::info!(library = %library.id, printed, "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// The store is dropped, and its connection released, when this returns.
fn inspect() -> anyhow::Result<Outcome> {
    let config = Config::from_env().context("failed to load configuration")?;
    let store = MongoStore::connect(&config)
        .with_context(|| format!("could not reach {}", config.mongo_uri))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = run(&store, &config, &mut out)?;
    out.flush().context("failed to flush output")?;

    Ok(outcome)
}
