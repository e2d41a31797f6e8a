//! Command-line client for proof-of-residency submissions.
//!
//! ```text
//! residency (binary)
//!   ├─→ HyleClient            chain transport
//!   ├─→ HttpSessionManager    prover sessions
//!   ├─→ HttpProverService     proof generation
//!   └─→ SubmissionOrchestrator
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod document;
pub mod logging;

pub use cli::Args;
pub use config::ClientConfig;
