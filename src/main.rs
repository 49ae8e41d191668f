use clap::Parser;
use tracing_subscriber::EnvFilter;

use abstract_account::cli::{self, Cli, Commands};
use abstract_account::config::AppConfig;

fn main() {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config);

    // RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.node.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let res = match cli.command {
        Commands::Init { genesis } => cli::node::handle_init(&config, genesis),
        Commands::Params { cmd } => cli::params::handle_params_command(cmd, &config),
        Commands::Genesis { cmd } => cli::genesis::handle_genesis_command(cmd, &config),
        Commands::Migrate => cli::node::handle_migrate(&config),
    };

    if let Err(e) = res {
        eprintln!("Error: {} ({:?})", e, e.class());
        std::process::exit(1);
    }
}
