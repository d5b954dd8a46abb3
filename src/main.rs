mod cli;
mod columns;
mod error;
mod fmt;
mod ledger;
mod models;
mod parsing;
mod reports;
mod settings;
mod source;
mod tui;

use std::io;

use clap::{CommandFactory, Parser};
use env_logger::Env;

use cli::{Cli, Commands, Context};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let ctx = || Context::new(cli.file.as_deref(), cli.url.as_deref());

    let result = match &cli.command {
        None | Some(Commands::Dashboard) => cli::dashboard::run(&ctx()),
        Some(Commands::Init {
            data_file,
            source_url,
            name,
        }) => cli::init::run(data_file.clone(), source_url.clone(), name.clone()),
        Some(Commands::Add(args)) => cli::add::run(&ctx(), args),
        Some(Commands::List {
            period,
            kind,
            pending,
        }) => cli::list::run(&ctx(), period, *kind, *pending),
        Some(Commands::Summary { period }) => cli::report::summary(&ctx(), period),
        Some(Commands::Categories { period, kind }) => {
            cli::report::categories(&ctx(), period, *kind)
        }
        Some(Commands::Methods { period, kind }) => cli::report::methods(&ctx(), period, *kind),
        Some(Commands::Monthly { year }) => cli::report::monthly(&ctx(), *year),
        Some(Commands::Pending) => cli::cards::pending(&ctx()),
        Some(Commands::Cards) => cli::cards::cards(&ctx()),
        Some(Commands::Pay { row, method }) => cli::pay::run(&ctx(), *row, method.as_deref()),
        Some(Commands::Status) => cli::status::run(&ctx()),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "finanzas", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        log::debug!("command failed: {e:?}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
