use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod manifest;

#[derive(Parser)]
#[command(
    name = "sfj",
    about = "sfj — content-addressed function deployment",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy every bundle in a directory behind the account's gateway.
    ///
    /// Each `*.zip` file is one function; its file stem is the name used in
    /// the redirect manifest. Bundles with identical bytes share a function.
    Deploy {
        /// Directory holding the built bundles
        #[arg(short, long, default_value = "dist")]
        dir: PathBuf,
        /// Store account that owns the gateway
        #[arg(short, long)]
        account: String,
        /// Configuration file (defaults apply when absent)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Local control-plane database
        #[arg(long, default_value = ".sfj/state.redb")]
        state: PathBuf,
        /// Directory standing in for the bootstrap bucket
        #[arg(long, default_value = ".sfj/bootstrap")]
        bootstrap_dir: PathBuf,
        /// Where to write the `name → url` redirect manifest
        #[arg(long, default_value = "redirects.json")]
        redirects: PathBuf,
    },
    /// Print the content identity of a bundle
    Hash {
        file: PathBuf,
    },
    /// List deployed functions
    List {
        #[arg(long, default_value = ".sfj/state.redb")]
        state: PathBuf,
        /// Configuration file (defaults apply when absent)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sfj=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            dir,
            account,
            config,
            state,
            bootstrap_dir,
            redirects,
        } => {
            let opts = commands::deploy::DeployArgs {
                dir,
                account,
                config,
                state,
                bootstrap_dir,
                redirects,
            };
            commands::deploy::deploy(&opts).await
        }
        Commands::Hash { file } => commands::hash::hash(&file),
        Commands::List { state, config } => {
            commands::list::list(&state, config.as_deref()).await
        }
    }
}
