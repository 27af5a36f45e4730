// src/labels/mod.rs
//! Label Directory
//!
//! Static mapping from well-known Solana program identifiers to a display
//! label and a category. Lookups are pure and total: an identifier missing
//! from the table resolves to a shortened form of itself in the `Other`
//! category.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Program category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramCategory {
    /// Native runtime programs
    System,

    /// Token programs
    Token,

    /// Exchanges, aggregators and lending
    DeFi,

    /// NFT metadata and marketplaces
    Nft,

    /// Staking and liquid staking
    Staking,

    /// Cross-chain bridges
    Bridge,

    /// Anything not in the directory
    Other,
}

impl std::fmt::Display for ProgramCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramCategory::System => write!(f, "System"),
            ProgramCategory::Token => write!(f, "Token"),
            ProgramCategory::DeFi => write!(f, "DeFi"),
            ProgramCategory::Nft => write!(f, "NFT"),
            ProgramCategory::Staking => write!(f, "Staking"),
            ProgramCategory::Bridge => write!(f, "Bridge"),
            ProgramCategory::Other => write!(f, "Other"),
        }
    }
}

/// Resolved display metadata for an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLabel {
    /// Human label, or the shortened identifier when unknown
    pub label: Cow<'static, str>,

    /// Category, `Other` when unknown
    pub category: ProgramCategory,
}

impl ProgramLabel {
    /// Whether the identifier was found in the directory
    pub fn is_known(&self) -> bool {
        matches!(self.label, Cow::Borrowed(_))
    }
}

/// Identifiers at or below this length are shown verbatim
const SHORT_ID_LEN: usize = 12;

/// Known programs: (identifier, label, category)
const KNOWN_PROGRAMS: &[(&str, &str, ProgramCategory)] = &[
    ("11111111111111111111111111111111", "System Program", ProgramCategory::System),
    ("ComputeBudget111111111111111111111111111111", "Compute Budget", ProgramCategory::System),
    ("Vote111111111111111111111111111111111111111", "Vote Program", ProgramCategory::System),
    ("AddressLookupTab1e1111111111111111111111111", "Address Lookup Table", ProgramCategory::System),
    ("BPFLoaderUpgradeab1e11111111111111111111111", "BPF Upgradeable Loader", ProgramCategory::System),
    ("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr", "Memo Program", ProgramCategory::System),
    ("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "Token Program", ProgramCategory::Token),
    ("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb", "Token-2022", ProgramCategory::Token),
    ("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL", "Associated Token Account", ProgramCategory::Token),
    ("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4", "Jupiter Aggregator v6", ProgramCategory::DeFi),
    ("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", "Raydium AMM v4", ProgramCategory::DeFi),
    ("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK", "Raydium CLMM", ProgramCategory::DeFi),
    ("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc", "Orca Whirlpool", ProgramCategory::DeFi),
    ("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo", "Meteora DLMM", ProgramCategory::DeFi),
    ("PhoeNiXZ8ByJGLkxNfZRnkUfjvmuYqLR89jjFHGqdXY", "Phoenix", ProgramCategory::DeFi),
    ("srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX", "OpenBook", ProgramCategory::DeFi),
    ("dRiftyHA39MWEi3m9aunc5MzRF1JYuBsbn6VPcn33UH", "Drift Protocol", ProgramCategory::DeFi),
    ("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P", "Pump.fun", ProgramCategory::DeFi),
    ("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s", "Metaplex Token Metadata", ProgramCategory::Nft),
    ("M2mx93ekt1fmXSVkTrUL9xVFHkmME8HTUi5Cyc5aF7K", "Magic Eden v2", ProgramCategory::Nft),
    ("TSWAPaqyCSx2KABk68Shruf4rp7CxcNi8hAsbdwmHbN", "Tensor Swap", ProgramCategory::Nft),
    ("Stake11111111111111111111111111111111111111", "Stake Program", ProgramCategory::Staking),
    ("MarBmsSgKXdrN1egZf5sqe1TMai9K1rChYNDJgjq7aD", "Marinade Finance", ProgramCategory::Staking),
    ("worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth", "Wormhole Core Bridge", ProgramCategory::Bridge),
];

/// Resolve an identifier to its label and category
pub fn resolve_label(program_id: &str) -> ProgramLabel {
    match KNOWN_PROGRAMS.iter().find(|(id, _, _)| *id == program_id) {
        Some((_, label, category)) => ProgramLabel {
            label: Cow::Borrowed(label),
            category: *category,
        },
        None => ProgramLabel {
            label: Cow::Owned(shorten_identifier(program_id)),
            category: ProgramCategory::Other,
        },
    }
}

/// Shorten a long identifier to `abcd...wxyz`
pub fn shorten_identifier(program_id: &str) -> String {
    let chars: Vec<char> = program_id.chars().collect();
    if chars.len() <= SHORT_ID_LEN {
        return program_id.to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Number of entries in the directory
pub fn known_program_count() -> usize {
    KNOWN_PROGRAMS.len()
}
