use clap::Parser;
use flowmark::cli::commands::{Cli, Commands};
use flowmark::cli::handlers;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        // Init is handled before project discovery
        Commands::Init(args) => handlers::cmd_init(args, cli.project_dir.as_deref()),
        _ => handlers::dispatch(cli),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
