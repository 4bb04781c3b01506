use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "indexer", version, about = "Indexer health and metrics host")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file. Defaults to ~/.indexer/config.toml, then ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve /health, /readiness and /metrics until interrupted (default).
    Serve(ServeArgs),
    /// Run every readiness check once and print the report.
    Check,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Overrides `http.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides `http.port`.
    #[arg(long)]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let args = Args::try_parse_from(["indexer"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_serve_overrides() {
        let args =
            Args::try_parse_from(["indexer", "serve", "--port", "9000", "--config", "a.toml"])
                .unwrap();
        match args.command {
            Some(Commands::Serve(serve)) => {
                assert_eq!(serve.port, Some(9000));
                assert!(serve.host.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(args.config, Some(PathBuf::from("a.toml")));
    }

    #[test]
    fn test_bad_port_rejected() {
        assert!(Args::try_parse_from(["indexer", "serve", "--port", "99999"]).is_err());
    }
}
