use airtraffic_analytics::cli::{args::Args, commands};
use clap::Parser;
use std::process;

fn main() {
    let args = Args::parse();

    if let Err(error) = commands::run(args) {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}
