use clap::Parser;
use verseclock_cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = verseclock_cli::run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
