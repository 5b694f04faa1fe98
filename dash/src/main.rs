mod commands;
mod handlers;
mod output;

use clap::Parser;
use commands::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(err) = handlers::handle_command(&cli.data_dir, cli.command) {
        output::print_error(&err.to_string());
        std::process::exit(1);
    }
}
