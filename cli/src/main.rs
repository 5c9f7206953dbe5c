/*!

This is the command line interface for describing AWS infrastructure. Each subcommand reads a YAML
configuration, describes the resources it asks for, and prints the resulting plan for a
provisioning engine to apply.

!*/

mod cluster;
mod instance;
mod keypair;
mod lookups;
mod network;
mod output;
mod stack;

use anyhow::Result;
use clap::Parser;
use infra_model::constants::DEFAULT_STACK_NAME;
use log::LevelFilter;
use lookups::{CliLookup, LookupOverrides};
use output::Format;

/// The command line interface for describing networks, clusters and instances on AWS.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info")]
    log_level: LevelFilter,

    #[clap(flatten)]
    overrides: LookupOverrides,

    /// The format of the plan [json|yaml].
    #[clap(long, default_value = "json")]
    format: Format,

    /// The name of the stack that resources are described into. `stack` defaults to the name in
    /// its configuration, every other subcommand to `dev`.
    #[clap(long = "stack-name")]
    stack_name: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Describe a network.
    Network(network::Network),
    /// Describe a cluster in an existing network.
    Cluster(cluster::Cluster),
    /// Describe a single instance in an existing network.
    Instance(instance::Instance),
    /// Generate an RSA key pair.
    Keypair(keypair::Keypair),
    /// Describe a network with an optional bastion and cluster.
    Stack(stack::Stack),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    infra_utils::init_logger(env!("CARGO_CRATE_NAME"), Some(args.log_level));
    if let Err(e) = run(args).await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let format = args.format;
    let overrides = args.overrides;
    let stack_name = args.stack_name;
    let named = || {
        stack_name
            .clone()
            .unwrap_or_else(|| DEFAULT_STACK_NAME.to_string())
    };
    match args.command {
        // Key pairs need no lookups.
        Command::Keypair(keypair) => keypair.run(format),
        Command::Network(network) => {
            let lookup = CliLookup::new(&overrides).await;
            network.run(&named(), &lookup, format).await
        }
        Command::Cluster(cluster) => {
            let lookup = CliLookup::new(&overrides).await;
            cluster.run(&named(), &lookup, format).await
        }
        Command::Instance(instance) => {
            let lookup = CliLookup::new(&overrides).await;
            instance.run(&named(), &lookup, format).await
        }
        Command::Stack(stack) => {
            let lookup = CliLookup::new(&overrides).await;
            stack.run(stack_name, &lookup, format).await
        }
    }
}
