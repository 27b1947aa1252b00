use clap::Parser;
use polbatch::app::{handle_fatal_error, init_logging, AppConfig, INTERRUPTED_EXIT_CODE};
use polbatch::cli::{execute_command, Cli};
use tracing::warn;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let config = AppConfig::new(cli.verbose).with_config_path(cli.config);
    init_logging(&config);

    tokio::select! {
        result = execute_command(cli.command, &config) => {
            if let Err(e) = result {
                handle_fatal_error(e, config.verbose);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping before the next record");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }
}
