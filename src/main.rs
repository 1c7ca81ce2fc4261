use std::env;

use tracing_subscriber::EnvFilter;

use bairro::cli;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bairro=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    std::process::exit(cli::run_with_args(&args));
}
