//! Command-line arguments.

use std::path::PathBuf;

use chain_hyle::HyleNetwork;
use clap::Parser;

/// Prove residency from a utility bill and settle the proof on Hyle
#[derive(Parser, Debug)]
#[command(name = "residency")]
#[command(version, long_about = None)]
pub struct Args {
    /// Document to prove from (PDF utility bill)
    pub document: PathBuf,

    /// Country the document should establish residency in
    #[arg(long, default_value = "Portugal")]
    pub claim: String,

    /// MIME type of the document (inferred from the extension by default)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Network to use, overriding HYLE_NETWORK (localhost, devnet)
    #[arg(long)]
    pub network: Option<HyleNetwork>,
}
