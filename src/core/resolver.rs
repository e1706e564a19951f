//! Metadata Resolver
//!
//! Races one metadata lookup per unique validated address. The first lookup
//! that yields a tradeable mint wins; the others keep running detached and
//! their results are dropped on the floor.

use async_trait::async_trait;
use eyre::Result;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::types::{ResolvedToken, TokenMetadata};
use crate::utils::constants::MAX_RESOLVE_CANDIDATES;

/// Looks up mint metadata for an address.
///
/// `Ok(None)` means the account does not exist or is not a token mint.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn lookup(&self, address: &str) -> Result<Option<TokenMetadata>>;
}

/// Every lookup failed, returned nothing, or returned a non-token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoResolvableToken {
    pub attempted: usize,
}

impl fmt::Display for NoResolvableToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no resolvable token among {} addresses", self.attempted)
    }
}

impl std::error::Error for NoResolvableToken {}

/// Exact-string dedupe, first occurrence wins
pub fn unique_addresses(addresses: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    addresses
        .iter()
        .filter(|a| seen.insert(a.as_str()))
        .cloned()
        .collect()
}

/// Resolve the first tradeable token among `addresses`
pub async fn resolve_first(
    source: Arc<dyn MetadataSource>,
    addresses: &[String],
) -> std::result::Result<ResolvedToken, NoResolvableToken> {
    let mut unique = unique_addresses(addresses);
    if unique.len() > MAX_RESOLVE_CANDIDATES {
        warn!(
            unique = unique.len(),
            cap = MAX_RESOLVE_CANDIDATES,
            "Too many candidate addresses, resolving only the first ones"
        );
        unique.truncate(MAX_RESOLVE_CANDIDATES);
    }
    let attempted = unique.len();

    let mut pending: FuturesUnordered<_> = unique
        .into_iter()
        .map(|address| {
            let source = source.clone();
            tokio::spawn(async move {
                let outcome = source.lookup(&address).await;
                (address, outcome)
            })
        })
        .collect();

    while let Some(joined) = pending.next().await {
        match joined {
            Ok((mint, Ok(Some(metadata)))) if metadata.is_token() => {
                info!(
                    mint = %mint,
                    decimals = metadata.decimals,
                    supply = metadata.supply,
                    still_pending = pending.len(),
                    "🎯 Token resolved"
                );
                // Dropping the JoinHandles detaches the losers without aborting them
                return Ok(ResolvedToken { mint, metadata });
            }
            Ok((address, Ok(Some(metadata)))) => {
                debug!(address = %address, decimals = metadata.decimals, "Account is not a tradeable mint");
            }
            Ok((address, Ok(None))) => {
                debug!(address = %address, "No mint account");
            }
            Ok((address, Err(e))) => {
                debug!(address = %address, error = %e, "Metadata lookup failed");
            }
            Err(e) => {
                warn!(error = %e, "Metadata lookup task panicked");
            }
        }
    }

    Err(NoResolvableToken { attempted })
}
