use anyhow::Context;
use clap::{Parser, Subcommand};
use library_kernel::settings::Settings;

/// Book catalogue service command line
#[derive(Debug, Parser)]
#[command(name = "library", version, about)]
struct Cli {
    /// Override the `LIBRARY_ENV` environment (local, test, staging, production)
    #[arg(long, global = true)]
    env: Option<String>,

    /// Directory holding `base.toml` and the environment overlays
    #[arg(long, global = true)]
    config_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the effective configuration as JSON
    Config,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        if self.env.is_none() && self.config_dir.is_none() {
            return Settings::load();
        }

        let environment = match &self.env {
            Some(env) => env.clone(),
            None => std::env::var("LIBRARY_ENV").unwrap_or_else(|_| "local".to_string()),
        };
        let config_dir = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };
        Settings::load_from(&config_dir, &environment)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli
        .settings()
        .with_context(|| "failed to load library settings")?;

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Command::Migrate => {
            library_telemetry::init(&settings.telemetry)?;
            let (pool, registry) = library_app::bootstrap::prepare(&settings).await?;
            let applied = library_app::bootstrap::migrate(&pool, &registry).await?;
            pool.close().await;
            tracing::info!(applied, "migrate finished");
            Ok(())
        }
        Command::Serve => {
            library_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "library CLI serving");
            library_app::bootstrap::serve(settings).await
        }
    }
}
