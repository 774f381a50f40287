//! Subcommand handlers.

use anyhow::{anyhow, Context};
use chainmeta::prelude::*;
use clap::Subcommand;
use serde::Serialize;

use crate::types::{Amount, ChainSummary, Head};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List every loaded chain
    Chains,
    /// Show one chain's configuration by name, chain id or network code
    Chain {
        /// Chain name, external chain id, or `#<network code>`
        key: String,
    },
    /// Resolve a token on chain
    Token { chain: String, address: String },
    /// Look a token up in the row file by symbol
    TokenByName { chain: String, name: String },
    /// Balance of an owner, native asset when `--token` is omitted
    Balance {
        chain: String,
        owner: String,
        #[arg(long)]
        token: Option<String>,
        /// Pin to a historical block (EVM only)
        #[arg(long)]
        block: Option<u64>,
    },
    /// Amount `spender` may move out of `owner`'s token balance
    Allowance {
        chain: String,
        owner: String,
        token: String,
        spender: String,
    },
    /// Transaction outcome
    Tx { chain: String, hash: String },
    /// Current head height
    Head { chain: String },
}

/// Sentinel every chain-RPC variant treats as the native asset
const NATIVE: &str = "0x0";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn find_chain(meta: &ChainMeta, key: &str) -> Option<std::sync::Arc<ChainEntry>> {
    let registry = meta.registry();
    if let Some(code) = key.strip_prefix('#') {
        return code.parse().ok().and_then(|c| registry.by_network_code(c));
    }
    registry
        .by_name(key)
        .or_else(|| registry.by_chain_id(key))
}

pub async fn run(meta: &ChainMeta, command: Command) -> anyhow::Result<()> {
    let ctx = meta.context();
    match command {
        Command::Chains => {
            let chains: Vec<ChainSummary> = meta
                .registry()
                .all_chains()
                .iter()
                .map(|entry| ChainSummary::from(entry.as_ref()))
                .collect();
            print_json(&chains)
        }
        Command::Chain { key } => {
            let entry = find_chain(meta, &key).ok_or_else(|| anyhow!("unknown chain {key}"))?;
            print_json(entry.config.as_ref())
        }
        Command::Token { chain, address } => {
            let info = meta.rpc(&chain)?.get_token_info(&ctx, &address).await?;
            print_json(&info)
        }
        Command::TokenByName { chain, name } => {
            let info = meta
                .tokens()
                .by_name(&chain, &name)
                .await?
                .ok_or_else(|| anyhow!("no token {name} on {chain}"))?;
            print_json(&info)
        }
        Command::Balance {
            chain,
            owner,
            token,
            block,
        } => {
            let rpc = meta.rpc(&chain)?;
            let token = token.unwrap_or_else(|| NATIVE.to_string());
            let info = rpc
                .get_token_info(&ctx, &token)
                .await
                .context("resolving token")?;
            let raw = match block {
                Some(block) => rpc.get_balance_at(&ctx, &owner, &token, block).await?,
                None => rpc.get_balance(&ctx, &owner, &token).await?,
            };
            print_json(&Amount::new(&chain, &info, raw))
        }
        Command::Allowance {
            chain,
            owner,
            token,
            spender,
        } => {
            let rpc = meta.rpc(&chain)?;
            let info = rpc
                .get_token_info(&ctx, &token)
                .await
                .context("resolving token")?;
            let raw = rpc.get_allowance(&ctx, &owner, &token, &spender).await?;
            print_json(&Amount::new(&chain, &info, raw))
        }
        Command::Tx { chain, hash } => {
            let status = meta
                .rpc(&chain)?
                .is_transaction_successful(&ctx, &hash)
                .await?;
            print_json(&status)
        }
        Command::Head { chain } => {
            let height = meta.rpc(&chain)?.get_latest_block_height(&ctx).await?;
            print_json(&Head { chain, height })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chainmeta::ChainMetaConfig;
    use chainmeta::registry::RegistryConfig;
    use chainmeta_testing::{evm_row, solana_row, MemoryRowStore, StubClientFactory};

    async fn meta() -> ChainMeta {
        let store = Arc::new(MemoryRowStore::with_chains(vec![
            evm_row(1, "1", "ethereum", 10),
            solana_row(2, "101", "solana", 20),
        ]));
        let config = ChainMetaConfig::new()
            .with_registry(RegistryConfig::new().with_reload_interval(std::time::Duration::ZERO));
        let meta = ChainMeta::builder(store)
            .client_factory(Arc::new(StubClientFactory::default()))
            .config(config)
            .build()
            .unwrap();
        meta.start().await.unwrap();
        meta
    }

    #[tokio::test]
    async fn test_find_chain_by_each_key() {
        let meta = meta().await;
        assert_eq!(find_chain(&meta, "Ethereum").unwrap().config.id, 1);
        assert_eq!(find_chain(&meta, "101").unwrap().config.id, 2);
        assert_eq!(find_chain(&meta, "#20").unwrap().config.id, 2);
        assert!(find_chain(&meta, "#x").is_none());
        assert!(find_chain(&meta, "bitcoin").is_none());
    }

    #[tokio::test]
    async fn test_native_balance_token_is_local() {
        let meta = meta().await;
        let rpc = meta.rpc("ethereum").unwrap();
        let info = rpc.get_token_info(&meta.context(), NATIVE).await.unwrap();
        assert_eq!(info.name, "ETH");
        assert_eq!(info.decimals, 18);
    }

    #[tokio::test]
    async fn test_unknown_chain_command_fails() {
        let meta = meta().await;
        let err = run(&meta, Command::Head { chain: "nope".into() }).await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_listing_commands_succeed() {
        let meta = meta().await;
        run(&meta, Command::Chains).await.unwrap();
        run(&meta, Command::Chain { key: "solana".into() }).await.unwrap();
    }
}
