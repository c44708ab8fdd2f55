use clap::Parser;
use png_stego::cli::{self, Cli};

fn main() {
    let args = Cli::parse();

    // Logs go to stderr so command output on stdout stays clean
    tracing_subscriber::fmt()
        .with_max_level(cli::log_level(args.verbose))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    if let Err(e) = cli::run(&args.command, &mut stdout.lock()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
