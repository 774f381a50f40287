//! # chainmeta Solana
//!
//! The Solana variant of the chain-RPC contract.
//!
//! - [`SolanaClient`]: nonblocking RPC connection, also an [`AccountSource`]
//! - [`SolanaRpc`]: [`chainmeta_traits::ChainRpc`] over a client and the shared token cache
//!
//! Token identity is read from the SPL mint (supply, decimals) and the
//! Metaplex metadata account, with Token-2022 embedded metadata taking
//! precedence when the mint carries it. Balances and allowances come from
//! the owner's associated token account; a missing account reads as zero.
//! The system program id and the hex zero address both stand for native SOL.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod layout;
pub mod metadata;
pub mod source;
pub mod tlv;

mod solana_client;
mod solana_rpc;

pub use address::{is_native_address, parse_pubkey};
pub use solana_client::{parse_signature, SolanaClient};
pub use solana_commitment_config::CommitmentConfig;
pub use solana_rpc::SolanaRpc;
pub use source::AccountSource;
