//! CSM-Inspect: decode contract state, build message bodies, inspect
//! addresses.

use anyhow::Result;
use clap::{Parser, Subcommand};
use csm_inspect::{address_info, build_message, decode, demo_matrix, BuildArgs, DecodeKind};
use csm_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "csm-inspect")]
#[command(about = "Inspect Crypto Style matrix contract data")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a bag of cells given as hex or base64
    Decode {
        #[arg(value_enum)]
        kind: DecodeKind,
        boc: String,
    },
    /// Build a message body and print it as hex and base64
    Build {
        #[arg(long, default_value_t = 0, global = true)]
        query_id: u64,
        #[command(subcommand)]
        message: BuildArgs,
    },
    /// Print every form of a raw or friendly address
    Address { address: String },
    /// Load a seeded in-memory matrix and print the tree
    Demo {
        #[arg(long, default_value_t = 1)]
        level: u8,
        #[arg(long, default_value_t = 6)]
        places: u32,
        #[arg(long, default_value_t = 2)]
        depth: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::for_service("csm-inspect"))?;
    let args = Args::parse();
    let _span = csm_telemetry::component_span!("csm-inspect").entered();

    let output = match &args.command {
        Command::Decode { kind, boc } => decode(*kind, boc)?,
        Command::Build { query_id, message } => build_message(message, *query_id)?,
        Command::Address { address } => address_info(address)?,
        Command::Demo {
            level,
            places,
            depth,
        } => demo_matrix(*level, *places, *depth).await?,
    };
    tracing::debug!(command = ?args.command, "[csm-inspect] Command finished");

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
