//! Core types for the ideamint marketplace.
//!
//! This crate provides the domain model shared by the storage and service
//! layers:
//!
//! - **Identifiers**: `AccountId`, `IdeaId`, `OrderId`, `WithdrawalId`, `EntryId`
//! - **Accounts**: `Account`, `Role`, the coin and wallet balances
//! - **Ledger**: `LedgerEntry`, `EntryKind`, `EntryStatus`
//! - **Ideas**: `Idea`, `IdeaStatus` and its transition rules
//! - **Referrals**: `ReferralCode` and code generation
//! - **Payments**: `PaymentOrder`, `OrderStatus`, the coin-pack menu
//! - **Withdrawals**: `WithdrawalRequest`, fee computation
//!
//! # Money
//!
//! Wallet amounts are stored as `i64` paise (integer minor units) to avoid
//! floating point precision issues. ₹500 is `50_000` paise. Coins are plain
//! `i64` counters with no monetary denomination.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod idea;
pub mod ids;
pub mod ledger;
pub mod payment;
pub mod referral;
pub mod withdrawal;

pub use account::{
    Account, Role, IDEA_SUBMISSION_COST_COINS, REFERRAL_BONUS_COINS, SIGNUP_BONUS_COINS,
};
pub use error::{MarketError, Result};
pub use idea::{Idea, IdeaStatus};
pub use ids::{AccountId, EntryId, IdError, IdeaId, OrderId, WithdrawalId};
pub use ledger::{EntryKind, EntryStatus, LedgerEntry};
pub use payment::{pack_price_paise, CoinPack, OrderStatus, PaymentOrder, COIN_PACKS};
pub use referral::{generate_code, ReferralCode, REFERRAL_CODE_LEN};
pub use withdrawal::{
    withdrawal_fee_paise, WithdrawalRequest, WithdrawalStatus, MIN_WITHDRAWAL_PAISE,
    WITHDRAWAL_FEE_BPS,
};
