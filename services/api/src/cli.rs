use crate::allocate::{run_allocation, AllocateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use salsa_raffle::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Salsa Raffle",
    about = "Allocate dance-class registrants to levels and run the raffle service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run the raffle for a registration export and write the groups
    Allocate(AllocateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Allocate(args) => run_allocation(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_to_serve_without_a_subcommand() {
        let cli = Cli::try_parse_from(["salsa-raffle-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_allocate_flags() {
        let cli = Cli::try_parse_from([
            "salsa-raffle-api",
            "allocate",
            "--registrations",
            "responses.csv",
            "--previous-groups",
            "last/groups.csv",
            "--members",
            "members.csv",
            "--cutoff",
            "2025-09-01 12:00:00",
            "--output-dir",
            "out",
            "--json",
        ])
        .expect("parses");

        let Some(Command::Allocate(args)) = cli.command else {
            panic!("expected allocate command");
        };
        assert_eq!(args.registrations, PathBuf::from("responses.csv"));
        assert_eq!(args.previous_groups, Some(PathBuf::from("last/groups.csv")));
        assert_eq!(args.members, Some(PathBuf::from("members.csv")));
        assert!(args.cutoff.is_some());
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert!(args.json);
    }

    #[test]
    fn rejects_malformed_cutoff() {
        let result = Cli::try_parse_from([
            "salsa-raffle-api",
            "allocate",
            "--registrations",
            "responses.csv",
            "--cutoff",
            "soon",
        ]);
        assert!(result.is_err());
    }
}
