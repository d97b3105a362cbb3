// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use parcelport_checker::{with_deadline, Checker, FlagSource, StateStore, Target, Verdict};

#[derive(Parser)]
#[command(name = "parcelport-checker", version, about = "Verification harness for the Parcelport service")]
struct Cli {
    /// Hostname or address of the service under test.
    #[arg(long, global = true, default_value = "localhost")]
    target: String,

    /// Port of the HTML/JSON surface.
    #[arg(long, global = true, default_value_t = parcelport_protocol::HTTP_PORT)]
    http_port: u16,

    /// Port of the gRPC surface.
    #[arg(long, global = true, default_value_t = parcelport_protocol::RPC_PORT)]
    rpc_port: u16,

    /// Directory for state shared between plant and confirm runs.
    #[arg(long, global = true, default_value = "./checker-state")]
    state_dir: String,

    /// Secret the per-tick flags are derived from.
    #[arg(long, global = true, env = "CHECKER_FLAG_SECRET", default_value = "dev-flag-secret")]
    flag_secret: String,

    /// Per-operation network timeout in seconds.
    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    /// Overall deadline for the whole phase in seconds.
    #[arg(long, global = true, default_value_t = 60)]
    overall_deadline_secs: u64,

    /// Seed for the data generators; omit for an entropy-derived run.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log filter, same syntax as RUST_LOG.
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a flag carrier and deposit the tick's flag.
    Plant {
        #[arg(long)]
        tick: u64,
    },
    /// Exercise the capability set over all three protocols.
    Check,
    /// Verify the flag planted for a tick is still retrievable.
    Confirm {
        #[arg(long)]
        tick: u64,
    },
}


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).context("invalid log filter")?)
        .init();

    let mut target = Target::new(cli.target.clone());
    target.http_port = cli.http_port;
    target.rpc_port = cli.rpc_port;
    target.timeout = Duration::from_secs(cli.timeout_secs);

    let store = StateStore::open(&cli.state_dir)
        .with_context(|| format!("cannot open state directory {}", cli.state_dir))?;
    let checker = Checker::new(target, store, FlagSource::new(cli.flag_secret.into_bytes()));

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let deadline = Duration::from_secs(cli.overall_deadline_secs);
    let verdict: Verdict = match cli.command {
        Command::Plant { tick } => with_deadline(deadline, checker.plant(&mut rng, tick)).await,
        Command::Check => with_deadline(deadline, checker.check(&mut rng)).await,
        Command::Confirm { tick } => with_deadline(deadline, checker.confirm(tick)).await,
    };

    println!("{verdict}");
    std::process::exit(verdict.exit_code());
}
