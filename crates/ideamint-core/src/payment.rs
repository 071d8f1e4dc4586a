//! Payment orders and coin-pack pricing.
//!
//! A payment order maps a gateway checkout to a pending coin purchase. The
//! `Created -> Completed` flip is the idempotency gate: coins are credited
//! in the same atomic unit as the flip, so a replayed confirmation can never
//! credit twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, OrderId};

/// A pending or settled coin purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    /// Internal order ID.
    pub id: OrderId,

    /// The purchasing account.
    pub account_id: AccountId,

    /// Coins to credit on completion.
    pub coin_amount: i64,

    /// Price charged, in paise.
    pub currency_amount_paise: i64,

    /// Order status; flips to `Completed` at most once.
    pub status: OrderStatus,

    /// Order id issued by the payment gateway (unique).
    pub external_order_id: String,

    /// Payment id reported by the gateway, set on completion.
    pub external_payment_id: Option<String>,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl PaymentOrder {
    /// Create a new order in `Created`.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        coin_amount: i64,
        currency_amount_paise: i64,
        external_order_id: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            account_id,
            coin_amount,
            currency_amount_paise,
            status: OrderStatus::Created,
            external_order_id,
            external_payment_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payment order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Checkout initiated; awaiting gateway confirmation.
    Created,

    /// Payment confirmed and coins credited.
    Completed,
}

/// A purchasable coin pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPack {
    /// Coins in the pack.
    pub coins: i64,

    /// Price in paise.
    pub price_paise: i64,
}

/// The purchase menu. Orders are only accepted for listed packs.
pub const COIN_PACKS: [CoinPack; 3] = [
    CoinPack {
        coins: 10,
        price_paise: 7_900,
    },
    CoinPack {
        coins: 50,
        price_paise: 34_900,
    },
    CoinPack {
        coins: 120,
        price_paise: 79_900,
    },
];

/// Look up the price for a coin amount, if it matches a pack.
#[must_use]
pub fn pack_price_paise(coins: i64) -> Option<i64> {
    COIN_PACKS
        .iter()
        .find(|pack| pack.coins == coins)
        .map(|pack| pack.price_paise)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_starts_created() {
        let order = PaymentOrder::new(AccountId::generate(), 50, 34_900, "ord_1".into());
        assert_eq!(order.status, OrderStatus::Created);
        assert!(order.external_payment_id.is_none());
    }

    #[test]
    fn fifty_coin_pack_costs_349_rupees() {
        assert_eq!(pack_price_paise(50), Some(34_900));
    }

    #[test]
    fn unlisted_amounts_have_no_price() {
        assert_eq!(pack_price_paise(51), None);
        assert_eq!(pack_price_paise(0), None);
    }
}
