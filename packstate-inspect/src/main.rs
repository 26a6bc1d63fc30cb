//! packstate-inspect
//!
//! Prints the bit layout planned for a JSON state schema, and decodes or
//! encodes packed words against it.
//!
//! Usage:
//!   packstate-inspect plan person.json
//!   packstate-inspect decode person.json 0x29e
//!   packstate-inspect encode person.json age=30 isCool=true thing=BAZ

use anyhow::Result;
use clap::{Parser, Subcommand};
use packstate_inspect::{decode, encode, load_layout, parse_raw, plan_json, render_plan, render_state};
use std::path::PathBuf;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "packstate-inspect")]
#[command(about = "Inspect packed state layouts and words")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the planned layout of a schema
    Plan {
        /// Path to the JSON schema
        schema: PathBuf,

        /// Print the layout as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Validate a raw word and print its fields
    Decode {
        /// Path to the JSON schema
        schema: PathBuf,

        /// Raw word in decimal, 0x hex or 0b binary
        raw: String,
    },
    /// Build a word from field=value assignments
    Encode {
        /// Path to the JSON schema
        schema: PathBuf,

        /// Assignments applied in order to the initial state
        assignments: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match args.command {
        Command::Plan { schema, json } => {
            let layout = load_layout(&schema)?;
            if json {
                println!("{}", plan_json(&layout)?);
            } else {
                print!("{}", render_plan(&layout));
            }
        }
        Command::Decode { schema, raw } => {
            let layout = load_layout(&schema)?;
            let raw = parse_raw(&raw)?;
            debug!("Decoding {:#x} as {}", raw, layout.name());
            print!("{}", render_state(&decode(&layout, raw)?));
        }
        Command::Encode {
            schema,
            assignments,
        } => {
            let layout = load_layout(&schema)?;
            let state = encode(&layout, assignments.iter().map(String::as_str))?;
            print!("{}", render_state(&state));
        }
    }
    Ok(())
}
