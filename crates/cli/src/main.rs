use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_app::modules::books::seed::{self, IdStrategy, SampleData};
use shelf_kernel::settings::Settings;
use shelf_store::KeyValueStore;

/// Operator commands against the configured key-value store
#[derive(Debug, Parser)]
#[command(name = "shelf-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ping the store and print its reply
    Ping,
    /// Print the value stored at KEY
    Get { key: String },
    /// Store VALUE at KEY
    Set { key: String, value: String },
    /// Write the sample books and chapters
    Populate {
        /// Use stable ids so reruns overwrite the same keys
        #[arg(long)]
        deterministic: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::debug!(command = ?cli.command, backend = ?settings.store.backend, "running");

    let store = shelf_store::open(&settings.store).context("failed to configure store")?;
    let outcome = run(cli.command, store.as_ref(), &settings).await;
    store.disconnect().await?;
    outcome
}

async fn run(command: Command, store: &dyn KeyValueStore, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Ping => {
            let reply = store.ping().await.context("ping failed")?;
            println!("{reply}");
        }
        Command::Get { key } => match store.get(&key).await.context("get failed")? {
            Some(value) => println!("{value}"),
            None => anyhow::bail!("key '{}' not found", key),
        },
        Command::Set { key, value } => {
            let ack = store.set(&key, &value).await.context("set failed")?;
            println!("{ack}");
        }
        Command::Populate { deterministic } => {
            let ids = if deterministic || settings.seed.deterministic_ids {
                IdStrategy::Deterministic
            } else {
                IdStrategy::Random
            };
            let data = SampleData::generate(ids, time::OffsetDateTime::now_utc());
            let report = seed::write(store, &data)
                .await
                .context("populate aborted; earlier writes were kept")?;
            println!(
                "created {} books and {} chapters",
                report.books_created, report.chapters_created
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_populate_flag() {
        let cli = Cli::try_parse_from(["shelf-cli", "populate", "--deterministic"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Populate {
                deterministic: true
            }
        ));
    }

    #[test]
    fn set_requires_a_value() {
        assert!(Cli::try_parse_from(["shelf-cli", "set", "only-key"]).is_err());
    }
}
