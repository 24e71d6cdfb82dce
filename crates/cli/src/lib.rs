pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "helpdesk",
    about = "Helpdesk operator CLI",
    long_about = "Apply migrations, load the demo support dataset, inspect configuration, and ask the resolution pipeline one-off questions.",
    after_help = "Examples:\n  helpdesk migrate\n  helpdesk seed\n  helpdesk ask \"Where is SH123?\" --user u1\n  helpdesk config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo FAQ, order and product fixtures (idempotent)")]
    Seed,
    #[command(about = "Resolve one question against the configured database")]
    Ask {
        #[arg(help = "Question text, as a customer would type it")]
        question: String,
        #[arg(long, default_value = "anonymous", help = "User id that owns the conversation context")]
        user: String,
        #[arg(long, help = "Language code the answer should be returned in")]
        lang: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Ask { question, user, lang } => {
            commands::ask::run(&question, &user, lang.as_deref())
        }
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
