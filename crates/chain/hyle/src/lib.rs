//! Hyle chain integration for residency proof submission.
//!
//! This crate implements [`chain_core::ChainTransport`] against the REST API of
//! a Hyle node:
//! - Contract existence checks and verifier contract registration
//! - Blob (data) transaction broadcast
//! - Proof transaction broadcast
//!
//! It also carries the endpoint table for the supported deployments
//! ([`HyleNetwork`]), including where the SP1 prover lives on each of them.
//!
//! # Usage
//!
//! ```ignore
//! use chain_hyle::{HyleClient, HyleConfig};
//! use chain_core::ChainTransport;
//!
//! let client = HyleClient::new(HyleConfig::from_env()?)?;
//! let exists = client.contract_exists(&"sp1_residency".into()).await?;
//! ```

pub mod client;
pub mod config;
mod wire;

pub use client::HyleClient;
pub use config::{ConfigError, HyleConfig, HyleNetwork};
