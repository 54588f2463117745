use crate::server;
use crate::submit::{run_submit, SubmitArgs};
use clap::{Args, Parser, Subcommand};
use job_intake::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Job Application Intake",
    about = "Accept job applications over HTTP or from the command line",
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
    /// Submit a single application and print the outcome as JSON
    Submit(SubmitArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Keep applications in memory and log confirmations instead of emailing them
    #[arg(long)]
    pub(crate) dry_run: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Submit(args) => run_submit(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["job-intake-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn submit_requires_a_resume_path() {
        let err = Cli::try_parse_from([
            "job-intake-api",
            "submit",
            "--first-name",
            "Ann",
            "--last-name",
            "Lee",
            "--email",
            "ann@example.com",
            "--date-of-birth",
            "1990-01-01",
            "--education-degree",
            "BSc",
        ])
        .expect_err("resume is mandatory");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
