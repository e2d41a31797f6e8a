//! Proof-of-residency client binary.
//!
//! Composition root: loads configuration, sets up logging, wires the Hyle node
//! client and the HTTP prover clients into the submission orchestrator, and
//! submits one document.
//!
//! # Examples
//!
//! ```bash
//! # Local node and prover
//! cargo run -p residency-client -- bill.pdf
//!
//! # Devnet, another claim
//! cargo run -p residency-client -- bill.pdf --network devnet --claim Spain
//! ```

use anyhow::Result;
use clap::Parser;

use residency_client::{Args, ClientConfig, app, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let _guard = logging::setup_logging()?;

    let config = ClientConfig::from_env(args.network)?;
    tracing::info!(
        "Starting residency client: network={}, contract={}",
        config.hyle.network,
        config.runtime.contract_name
    );

    app::run(args, config).await
}
