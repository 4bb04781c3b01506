use clap::Parser;
use indexer_cli::commands::{check, cli, serve};
use indexer_cli::logging::init_tracing;
use indexer_core::error::CliError;

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = indexer_core::config::load(args.config.as_deref())?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    match args.command {
        None => serve::handle_serve(cli::ServeArgs::default(), cfg).await,
        Some(cli::Commands::Serve(serve_args)) => serve::handle_serve(serve_args, cfg).await,
        Some(cli::Commands::Check) => check::handle_check(&cfg).await,
    }
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 1: not ready (returned by `check` as a normal exit code)
    // 11: config error
    // 20: IO / bind / server error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Io(_) => 20,
        CliError::Server(_) => 20,
        CliError::Command(_) => 20,
        CliError::Metrics(_) => 50,
        CliError::Anyhow(_) => 50,
    }
}
