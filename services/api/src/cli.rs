use crate::demo::{run_demo, run_forms, run_validate, DemoArgs, FormsCommand, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use devnet_forms::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Developer Network Forms",
    about = "Serve and exercise the developer network lead-capture forms",
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
    /// Inspect the form catalog
    Forms {
        #[command(subcommand)]
        command: FormsCommand,
    },
    /// Validate a set of field values against a form without submitting them
    Validate(ValidateArgs),
    /// Walk through the booking form the way a visitor would, printing each snapshot
    Demo(DemoArgs),
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
        Command::Forms { command } => run_forms(command),
        Command::Validate(args) => run_validate(args),
        Command::Demo(args) => run_demo(args),
    }
}
