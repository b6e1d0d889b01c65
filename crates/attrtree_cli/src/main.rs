#![allow(missing_docs)]

use clap::{Parser, Subcommand};

mod cmd;
mod compression;
mod demo;
mod document;
mod dump;
mod error;
mod logging;

#[derive(Parser)]
#[command(name = "attrtree", about = "Attribute-tree document tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Load a JSON table document and print the resulting tree.
	Load(cmd::load::Args),
	/// List registered host types and factory classes.
	Types(cmd::types::Args),
	/// Search a key upward from a node path.
	Search(cmd::search::Args),
}

fn main() {
	logging::init_logging();
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> error::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Load(args) => cmd::load::run(args),
		Commands::Types(args) => cmd::types::run(args),
		Commands::Search(args) => cmd::search::run(args),
	}
}
