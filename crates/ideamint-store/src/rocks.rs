//! `RocksDB` storage implementation.
//!
//! Compound operations follow one shape: take the write lock, read and
//! validate, stage every effect into a `WriteBatch`, commit. The lock
//! serializes the read-check-write window (two concurrent submits cannot
//! both pass one cover-able balance check); the batch makes the commit
//! all-or-nothing.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use ideamint_core::{
    Account, AccountId, EntryId, EntryStatus, Idea, IdeaId, IdeaStatus, LedgerEntry, MarketError,
    OrderId, OrderStatus, PaymentOrder, ReferralCode, WithdrawalId, WithdrawalRequest,
    MIN_WITHDRAWAL_PAISE, REFERRAL_BONUS_COINS, SIGNUP_BONUS_COINS,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{ConfirmOutcome, IdeaDecision, Store};

/// How many candidate referral codes to try before giving up.
const CODE_ISSUE_ATTEMPTS: usize = 16;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes compound read-check-write operations. RocksDB batches are
    /// atomic but do not provide conditional writes, so the balance and
    /// status checks need this gate.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        // A poisoned lock means another thread panicked mid-compound; the
        // batch it never committed left the store consistent, so continue.
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Fetch and deserialize one value from a column family.
    fn get_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Check a column family for a key without deserializing.
    fn key_exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        let exists = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        Ok(exists)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn load_account(&self, account_id: &AccountId) -> Result<Account> {
        self.get_value(cf::ACCOUNTS, &keys::account_key(account_id))?
            .ok_or_else(|| StoreError::not_found("account", account_id))
    }

    /// Apply an entry's deltas to the in-memory account, rejecting any
    /// result that would take a balance negative.
    fn checked_apply(account: &mut Account, entry: &LedgerEntry) -> Result<()> {
        let coins = account
            .coins
            .checked_add(entry.coin_delta)
            .ok_or_else(|| {
                StoreError::Domain(MarketError::Validation("coin balance overflow".into()))
            })?;
        if coins < 0 {
            return Err(StoreError::Domain(MarketError::InsufficientCoins {
                balance: account.coins,
                required: -entry.coin_delta,
            }));
        }
        let wallet = account
            .wallet_paise
            .checked_add(entry.currency_delta_paise)
            .ok_or_else(|| {
                StoreError::Domain(MarketError::Validation("wallet balance overflow".into()))
            })?;
        if wallet < 0 {
            return Err(StoreError::Domain(MarketError::InsufficientBalance {
                balance_paise: account.wallet_paise,
                required_paise: -entry.currency_delta_paise,
            }));
        }
        account.coins = coins;
        account.wallet_paise = wallet;
        account.updated_at = chrono::Utc::now();
        Ok(())
    }

    fn stage_account(&self, batch: &mut WriteBatch, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        batch.put_cf(&cf, keys::account_key(&account.id), Self::serialize(account)?);
        Ok(())
    }

    fn stage_entry(&self, batch: &mut WriteBatch, entry: &LedgerEntry) -> Result<()> {
        let cf_ledger = self.cf(cf::LEDGER)?;
        let cf_index = self.cf(cf::LEDGER_BY_ACCOUNT)?;
        batch.put_cf(&cf_ledger, keys::entry_key(&entry.id), Self::serialize(entry)?);
        batch.put_cf(
            &cf_index,
            keys::account_index_key(&entry.account_id, &entry.id.to_bytes()),
            [], // Index entry (empty value)
        );
        Ok(())
    }

    fn stage_idea(&self, batch: &mut WriteBatch, idea: &Idea) -> Result<()> {
        let cf_ideas = self.cf(cf::IDEAS)?;
        batch.put_cf(&cf_ideas, keys::idea_key(&idea.id), Self::serialize(idea)?);
        Ok(())
    }

    fn stage_order(&self, batch: &mut WriteBatch, order: &PaymentOrder) -> Result<()> {
        let cf_orders = self.cf(cf::ORDERS)?;
        batch.put_cf(&cf_orders, keys::order_key(&order.id), Self::serialize(order)?);
        Ok(())
    }

    fn stage_withdrawal(&self, batch: &mut WriteBatch, request: &WithdrawalRequest) -> Result<()> {
        let cf_wd = self.cf(cf::WITHDRAWALS)?;
        batch.put_cf(
            &cf_wd,
            keys::withdrawal_key(&request.id),
            Self::serialize(request)?,
        );
        Ok(())
    }

    /// Collect all index keys under a prefix, oldest first.
    fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut all_keys = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        Ok(all_keys)
    }

    /// Generate a referral code that no account holds yet.
    fn issue_unique_code(&self) -> Result<String> {
        for _ in 0..CODE_ISSUE_ATTEMPTS {
            let candidate = ideamint_core::generate_code();
            if !self.key_exists(cf::REFERRAL_CODES, &keys::referral_code_key(&candidate))? {
                return Ok(candidate);
            }
        }
        Err(StoreError::CodeExhausted)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Accounts & Registration
    // =========================================================================

    fn register_account(
        &self,
        account: Account,
        referral_code: Option<&str>,
    ) -> Result<Account> {
        let _guard = self.write_guard();

        let email_key = keys::contact_key(&account.email);
        let mobile_key = keys::contact_key(&account.mobile);

        if self.key_exists(cf::ACCOUNTS_BY_EMAIL, &email_key)? {
            return Err(StoreError::Duplicate {
                field: "email",
                value: account.email,
            });
        }
        if self.key_exists(cf::ACCOUNTS_BY_MOBILE, &mobile_key)? {
            return Err(StoreError::Duplicate {
                field: "mobile",
                value: account.mobile,
            });
        }

        let mut account = account;
        let own_code = self.issue_unique_code()?;
        account.referral_code = Some(own_code.clone());

        let mut batch = WriteBatch::default();

        // Signup bonus
        let signup = LedgerEntry::signup_bonus(account.id, SIGNUP_BONUS_COINS);
        Self::checked_apply(&mut account, &signup)?;
        self.stage_entry(&mut batch, &signup)?;

        // Referral redemption: an unknown or inactive code is not an error,
        // registration proceeds without the bonus.
        if let Some(code) = referral_code.map(str::trim).filter(|c| !c.is_empty()) {
            match self.get_referral_code(code)? {
                Some(mut referral) if referral.active => {
                    match self.get_account(&referral.account_id)? {
                        Some(mut referrer) => {
                            referral.total_referrals += 1;
                            let bonus = LedgerEntry::referral_bonus(
                                referrer.id,
                                REFERRAL_BONUS_COINS,
                                account.id,
                            );
                            Self::checked_apply(&mut referrer, &bonus)?;
                            self.stage_entry(&mut batch, &bonus)?;
                            self.stage_account(&mut batch, &referrer)?;

                            let cf_codes = self.cf(cf::REFERRAL_CODES)?;
                            batch.put_cf(
                                &cf_codes,
                                keys::referral_code_key(code),
                                Self::serialize(&referral)?,
                            );
                            account.referred_by = Some(referral.account_id);
                        }
                        None => {
                            tracing::warn!(code = %code, "Referral code owner missing, skipping bonus");
                        }
                    }
                }
                _ => {
                    tracing::debug!(code = %code, "Unknown or inactive referral code");
                }
            }
        }

        // Own referral code record
        let own_referral = ReferralCode::new(account.id, own_code.clone());
        let cf_codes = self.cf(cf::REFERRAL_CODES)?;
        batch.put_cf(
            &cf_codes,
            keys::referral_code_key(&own_code),
            Self::serialize(&own_referral)?,
        );

        // Account + unique contact indexes
        self.stage_account(&mut batch, &account)?;
        let cf_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;
        let cf_mobile = self.cf(cf::ACCOUNTS_BY_MOBILE)?;
        batch.put_cf(&cf_email, &email_key, account.id.as_bytes());
        batch.put_cf(&cf_mobile, &mobile_key, account.id.as_bytes());

        self.commit(batch)?;
        Ok(account)
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        self.get_value(cf::ACCOUNTS, &keys::account_key(account_id))
    }

    fn set_role(&self, account_id: &AccountId, role: ideamint_core::Role) -> Result<Account> {
        let _guard = self.write_guard();

        let mut account = self.load_account(account_id)?;
        account.role = role;
        account.updated_at = chrono::Utc::now();

        let mut batch = WriteBatch::default();
        self.stage_account(&mut batch, &account)?;
        self.commit(batch)?;
        Ok(account)
    }

    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let cf_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;
        let Some(id_bytes) = self
            .db
            .get_cf(&cf_email, keys::contact_key(email))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let uuid = uuid::Uuid::from_slice(&id_bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.get_account(&AccountId::from_uuid(uuid))
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    fn append_entry(&self, entry: &LedgerEntry) -> Result<(i64, i64)> {
        let _guard = self.write_guard();

        let mut account = self.load_account(&entry.account_id)?;
        Self::checked_apply(&mut account, entry)?;

        let mut batch = WriteBatch::default();
        self.stage_entry(&mut batch, entry)?;
        self.stage_account(&mut batch, &account)?;
        self.commit(batch)?;

        Ok((account.coins, account.wallet_paise))
    }

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>> {
        self.get_value(cf::LEDGER, &keys::entry_key(entry_id))
    }

    fn list_entries_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let prefix = keys::account_prefix(account_id);
        let mut all_keys = self.scan_prefix(cf::LEDGER_BY_ACCOUNT, &prefix)?;

        // ULID entry ids make the index chronological; reverse for newest first.
        all_keys.reverse();

        let mut entries = Vec::new();
        for key in all_keys.into_iter().skip(offset).take(limit) {
            let Some(id_bytes) = keys::record_id_from_index_key(&key) else {
                continue;
            };
            let entry_id = EntryId::from_bytes(id_bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            if let Some(entry) = self.get_entry(&entry_id)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    // =========================================================================
    // Ideas
    // =========================================================================

    fn submit_idea(&self, idea: &Idea, cost_entry: &LedgerEntry) -> Result<i64> {
        let _guard = self.write_guard();

        let mut account = self.load_account(&idea.account_id)?;
        Self::checked_apply(&mut account, cost_entry)?;

        let mut batch = WriteBatch::default();
        self.stage_entry(&mut batch, cost_entry)?;
        self.stage_account(&mut batch, &account)?;
        self.stage_idea(&mut batch, idea)?;

        let cf_by_account = self.cf(cf::IDEAS_BY_ACCOUNT)?;
        let cf_by_status = self.cf(cf::IDEAS_BY_STATUS)?;
        batch.put_cf(
            &cf_by_account,
            keys::account_index_key(&idea.account_id, idea.id.as_bytes()),
            [],
        );
        batch.put_cf(&cf_by_status, keys::idea_status_key(idea.status, &idea.id), []);

        self.commit(batch)?;
        Ok(account.coins)
    }

    fn get_idea(&self, idea_id: &IdeaId) -> Result<Option<Idea>> {
        self.get_value(cf::IDEAS, &keys::idea_key(idea_id))
    }

    fn decide_idea(
        &self,
        idea_id: &IdeaId,
        reviewer: AccountId,
        decision: IdeaDecision,
    ) -> Result<Idea> {
        let _guard = self.write_guard();

        let mut idea = self
            .get_idea(idea_id)?
            .ok_or_else(|| StoreError::not_found("idea", idea_id))?;
        let previous_status = idea.status;

        let mut batch = WriteBatch::default();

        match decision {
            IdeaDecision::Approve { payout_paise, note } => {
                idea.approve(reviewer, payout_paise, note)
                    .map_err(StoreError::Domain)?;

                let mut owner = self.load_account(&idea.account_id)?;
                let earning =
                    LedgerEntry::idea_earning(owner.id, payout_paise, &idea.id.to_string());
                Self::checked_apply(&mut owner, &earning)?;
                self.stage_entry(&mut batch, &earning)?;
                self.stage_account(&mut batch, &owner)?;
            }
            IdeaDecision::Reject { reason } => {
                idea.reject(reviewer, reason).map_err(StoreError::Domain)?;
            }
        }

        self.stage_idea(&mut batch, &idea)?;

        // Move the status index entry
        let cf_by_status = self.cf(cf::IDEAS_BY_STATUS)?;
        batch.delete_cf(&cf_by_status, keys::idea_status_key(previous_status, &idea.id));
        batch.put_cf(&cf_by_status, keys::idea_status_key(idea.status, &idea.id), []);

        self.commit(batch)?;
        Ok(idea)
    }

    fn list_ideas_by_account(
        &self,
        account_id: &AccountId,
        status: Option<IdeaStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Idea>> {
        let prefix = keys::account_prefix(account_id);
        let all_keys = self.scan_prefix(cf::IDEAS_BY_ACCOUNT, &prefix)?;

        // Idea ids are UUIDs (no intrinsic ordering); fetch then sort by time.
        // The status filter runs here, ahead of pagination, so offset and
        // limit count matching ideas.
        let mut ideas = Vec::new();
        for key in all_keys {
            let Some(id_bytes) = keys::record_id_from_index_key(&key) else {
                continue;
            };
            let idea_id = IdeaId::from_uuid(uuid::Uuid::from_bytes(id_bytes));
            if let Some(idea) = self.get_idea(&idea_id)? {
                if status.map_or(true, |s| idea.status == s) {
                    ideas.push(idea);
                }
            }
        }
        ideas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ideas.into_iter().skip(offset).take(limit).collect())
    }

    fn list_ideas_by_status(
        &self,
        status: IdeaStatus,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Idea>> {
        let prefix = [keys::status_byte(status)];
        let all_keys = self.scan_prefix(cf::IDEAS_BY_STATUS, &prefix)?;

        let mut ideas = Vec::new();
        for key in all_keys {
            let Some(id_bytes) = keys::idea_id_from_status_key(&key) else {
                continue;
            };
            let idea_id = IdeaId::from_uuid(uuid::Uuid::from_bytes(id_bytes));
            if let Some(idea) = self.get_idea(&idea_id)? {
                ideas.push(idea);
            }
        }
        // Oldest first: moderators work the queue in submission order.
        ideas.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(ideas.into_iter().skip(offset).take(limit).collect())
    }

    // =========================================================================
    // Referrals
    // =========================================================================

    fn get_referral_code(&self, code: &str) -> Result<Option<ReferralCode>> {
        self.get_value(cf::REFERRAL_CODES, &keys::referral_code_key(code))
    }

    // =========================================================================
    // Payment Orders
    // =========================================================================

    fn create_order(&self, order: &PaymentOrder) -> Result<()> {
        let _guard = self.write_guard();

        let external_key = keys::external_order_key(&order.external_order_id);
        if self.key_exists(cf::ORDERS_BY_EXTERNAL, &external_key)? {
            return Err(StoreError::Duplicate {
                field: "external_order_id",
                value: order.external_order_id.clone(),
            });
        }

        let mut batch = WriteBatch::default();
        self.stage_order(&mut batch, order)?;

        let cf_external = self.cf(cf::ORDERS_BY_EXTERNAL)?;
        let cf_by_account = self.cf(cf::ORDERS_BY_ACCOUNT)?;
        batch.put_cf(&cf_external, &external_key, order.id.as_bytes());
        batch.put_cf(
            &cf_by_account,
            keys::account_index_key(&order.account_id, order.id.as_bytes()),
            [],
        );

        self.commit(batch)
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<PaymentOrder>> {
        self.get_value(cf::ORDERS, &keys::order_key(order_id))
    }

    fn find_order_by_external(&self, external_order_id: &str) -> Result<Option<PaymentOrder>> {
        let cf_external = self.cf(cf::ORDERS_BY_EXTERNAL)?;
        let Some(id_bytes) = self
            .db
            .get_cf(&cf_external, keys::external_order_key(external_order_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let uuid = uuid::Uuid::from_slice(&id_bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.get_order(&OrderId::from_uuid(uuid))
    }

    fn confirm_order(
        &self,
        external_order_id: &str,
        external_payment_id: &str,
    ) -> Result<ConfirmOutcome> {
        let _guard = self.write_guard();

        let mut order = self
            .find_order_by_external(external_order_id)?
            .ok_or_else(|| StoreError::not_found("payment order", external_order_id))?;

        // Single-writer gate: the first confirmation flips the status and
        // credits in one batch; anyone after that lands here.
        if order.status == OrderStatus::Completed {
            return Ok(ConfirmOutcome::AlreadyProcessed { order });
        }

        order.status = OrderStatus::Completed;
        order.external_payment_id = Some(external_payment_id.to_string());
        order.updated_at = chrono::Utc::now();

        let mut account = self.load_account(&order.account_id)?;
        let purchase =
            LedgerEntry::purchase(account.id, order.coin_amount, external_payment_id);
        Self::checked_apply(&mut account, &purchase)?;

        let mut batch = WriteBatch::default();
        self.stage_order(&mut batch, &order)?;
        self.stage_entry(&mut batch, &purchase)?;
        self.stage_account(&mut batch, &account)?;
        self.commit(batch)?;

        Ok(ConfirmOutcome::Credited {
            order,
            coin_balance: account.coins,
        })
    }

    fn list_orders_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PaymentOrder>> {
        let prefix = keys::account_prefix(account_id);
        let all_keys = self.scan_prefix(cf::ORDERS_BY_ACCOUNT, &prefix)?;

        let mut orders = Vec::new();
        for key in all_keys {
            let Some(id_bytes) = keys::record_id_from_index_key(&key) else {
                continue;
            };
            let order_id = OrderId::from_uuid(uuid::Uuid::from_bytes(id_bytes));
            if let Some(order) = self.get_order(&order_id)? {
                orders.push(order);
            }
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }

    // =========================================================================
    // Withdrawals
    // =========================================================================

    fn request_withdrawal(
        &self,
        account_id: &AccountId,
        amount_paise: i64,
    ) -> Result<WithdrawalRequest> {
        if amount_paise < MIN_WITHDRAWAL_PAISE {
            return Err(StoreError::Domain(MarketError::BelowMinimum {
                requested_paise: amount_paise,
                minimum_paise: MIN_WITHDRAWAL_PAISE,
            }));
        }

        let _guard = self.write_guard();

        let mut account = self.load_account(account_id)?;

        let withdrawal_id = WithdrawalId::generate();
        let debit =
            LedgerEntry::withdrawal(*account_id, amount_paise, &withdrawal_id.to_string());
        Self::checked_apply(&mut account, &debit)?;

        let request =
            WithdrawalRequest::new(withdrawal_id, *account_id, amount_paise, debit.id);

        let mut batch = WriteBatch::default();
        self.stage_entry(&mut batch, &debit)?;
        self.stage_account(&mut batch, &account)?;
        self.stage_withdrawal(&mut batch, &request)?;

        let cf_by_account = self.cf(cf::WITHDRAWALS_BY_ACCOUNT)?;
        batch.put_cf(
            &cf_by_account,
            keys::account_index_key(account_id, request.id.as_bytes()),
            [],
        );

        self.commit(batch)?;
        Ok(request)
    }

    fn get_withdrawal(&self, withdrawal_id: &WithdrawalId) -> Result<Option<WithdrawalRequest>> {
        self.get_value(cf::WITHDRAWALS, &keys::withdrawal_key(withdrawal_id))
    }

    fn decide_withdrawal(
        &self,
        withdrawal_id: &WithdrawalId,
        admin: AccountId,
        approve: bool,
        note: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let _guard = self.write_guard();

        let mut request = self
            .get_withdrawal(withdrawal_id)?
            .ok_or_else(|| StoreError::not_found("withdrawal", withdrawal_id))?;
        request.decide(admin, approve, note).map_err(StoreError::Domain)?;

        // Settle the holding debit either way.
        let mut held = self
            .get_entry(&request.ledger_entry_id)?
            .ok_or_else(|| StoreError::not_found("ledger entry", request.ledger_entry_id))?;
        held.status = EntryStatus::Completed;

        let mut batch = WriteBatch::default();

        if !approve {
            // Rejection is fully compensating: the user gets the entire
            // amount back, fee included.
            let mut account = self.load_account(&request.account_id)?;
            let reversal = LedgerEntry::withdrawal_reversal(
                request.account_id,
                request.amount_paise,
                &request.id.to_string(),
            );
            Self::checked_apply(&mut account, &reversal)?;
            self.stage_entry(&mut batch, &reversal)?;
            self.stage_account(&mut batch, &account)?;
        }

        let cf_ledger = self.cf(cf::LEDGER)?;
        batch.put_cf(&cf_ledger, keys::entry_key(&held.id), Self::serialize(&held)?);
        self.stage_withdrawal(&mut batch, &request)?;

        self.commit(batch)?;
        Ok(request)
    }

    fn list_withdrawals_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WithdrawalRequest>> {
        let prefix = keys::account_prefix(account_id);
        let all_keys = self.scan_prefix(cf::WITHDRAWALS_BY_ACCOUNT, &prefix)?;

        let mut requests = Vec::new();
        for key in all_keys {
            let Some(id_bytes) = keys::record_id_from_index_key(&key) else {
                continue;
            };
            let withdrawal_id = WithdrawalId::from_uuid(uuid::Uuid::from_bytes(id_bytes));
            if let Some(request) = self.get_withdrawal(&withdrawal_id)? {
                requests.push(request);
            }
        }
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideamint_core::{EntryKind, WithdrawalStatus, IDEA_SUBMISSION_COST_COINS};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn register(store: &RocksStore, tag: &str, code: Option<&str>) -> Account {
        let account = Account::new(
            AccountId::generate(),
            format!("User {tag}"),
            format!("{tag}@example.com"),
            format!("98000{tag:0>5}"),
        );
        store.register_account(account, code).unwrap()
    }

    fn submit(store: &RocksStore, account: &Account, title: &str) -> Idea {
        let idea = Idea::new(
            account.id,
            "energy".into(),
            title.into(),
            "problem".into(),
            "solution".into(),
            vec![],
        );
        let cost = LedgerEntry::idea_submission_cost(
            account.id,
            IDEA_SUBMISSION_COST_COINS,
            &idea.id.to_string(),
        );
        store.submit_idea(&idea, &cost).unwrap();
        idea
    }

    /// Sum the ledger and compare against the stored running balances.
    fn assert_balances_match_ledger(store: &RocksStore, account_id: &AccountId) {
        let account = store.get_account(account_id).unwrap().unwrap();
        let entries = store
            .list_entries_by_account(account_id, 1000, 0)
            .unwrap();
        let coin_sum: i64 = entries.iter().map(|e| e.coin_delta).sum();
        let wallet_sum: i64 = entries.iter().map(|e| e.currency_delta_paise).sum();
        assert_eq!(account.coins, coin_sum);
        assert_eq!(account.wallet_paise, wallet_sum);
    }

    #[test]
    fn registration_grants_signup_bonus_and_code() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        assert_eq!(account.coins, SIGNUP_BONUS_COINS);
        assert_eq!(account.wallet_paise, 0);
        let code = account.referral_code.clone().unwrap();
        let referral = store.get_referral_code(&code).unwrap().unwrap();
        assert_eq!(referral.account_id, account.id);
        assert_eq!(referral.total_referrals, 0);
        assert_balances_match_ledger(&store, &account.id);
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        let found = store.find_account_by_email("ASHA@Example.com").unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert!(store.find_account_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let (store, _dir) = create_test_store();
        register(&store, "asha", None);

        let dup = Account::new(
            AccountId::generate(),
            "Other".into(),
            "ASHA@example.com".into(), // Same email, different case
            "9811111111".into(),
        );
        let err = store.register_account(dup, None).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email", .. }));
    }

    #[test]
    fn referral_redemption_credits_referrer_once() {
        let (store, _dir) = create_test_store();
        let referrer = register(&store, "asha", None);
        let code = referrer.referral_code.clone().unwrap();

        let referred = register(&store, "bala", Some(&code));
        assert_eq!(referred.referred_by, Some(referrer.id));
        assert_eq!(referred.coins, SIGNUP_BONUS_COINS); // No bonus to the new account

        let referrer = store.get_account(&referrer.id).unwrap().unwrap();
        assert_eq!(referrer.coins, SIGNUP_BONUS_COINS + REFERRAL_BONUS_COINS);

        let referral = store.get_referral_code(&code).unwrap().unwrap();
        assert_eq!(referral.total_referrals, 1);
        assert_balances_match_ledger(&store, &referrer.id);
    }

    #[test]
    fn unknown_referral_code_is_not_an_error() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", Some("NOSUCH00"));
        assert!(account.referred_by.is_none());
        assert_eq!(account.coins, SIGNUP_BONUS_COINS);
    }

    #[test]
    fn append_entry_rejects_negative_result() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        let debit = LedgerEntry::idea_submission_cost(account.id, 100, "idea-x");
        let err = store.append_entry(&debit).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(MarketError::InsufficientCoins { balance: 10, required: 100 })
        ));

        // Nothing was written
        assert!(store.get_entry(&debit.id).unwrap().is_none());
        assert_balances_match_ledger(&store, &account.id);
    }

    #[test]
    fn append_entry_rejects_balance_overflow() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        // Signup bonus already holds 10 coins, so this credit overflows.
        let credit = LedgerEntry::purchase(account.id, i64::MAX, "pay_huge");
        let err = store.append_entry(&credit).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(MarketError::Validation(_))
        ));

        assert!(store.get_entry(&credit.id).unwrap().is_none());
        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.coins, 10);
        assert_balances_match_ledger(&store, &account.id);
    }

    #[test]
    fn submit_idea_debits_cost() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        let idea = submit(&store, &account, "Solar dryer");

        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.coins, SIGNUP_BONUS_COINS - IDEA_SUBMISSION_COST_COINS);
        let stored = store.get_idea(&idea.id).unwrap().unwrap();
        assert_eq!(stored.status, IdeaStatus::Pending);
        assert_balances_match_ledger(&store, &account.id);
    }

    #[test]
    fn submit_with_insufficient_coins_leaves_no_trace() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        // Burn down to 0 coins (10 / 2 = 5 ideas)
        for i in 0..5 {
            submit(&store, &account, &format!("Idea {i}"));
        }

        let idea = Idea::new(
            account.id,
            "energy".into(),
            "One too many".into(),
            "p".into(),
            "s".into(),
            vec![],
        );
        let cost = LedgerEntry::idea_submission_cost(
            account.id,
            IDEA_SUBMISSION_COST_COINS,
            &idea.id.to_string(),
        );
        let err = store.submit_idea(&idea, &cost).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(MarketError::InsufficientCoins { .. })
        ));

        assert!(store.get_idea(&idea.id).unwrap().is_none());
        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.coins, 0);
        assert_eq!(
            store.list_ideas_by_account(&account.id, None, 100, 0).unwrap().len(),
            5
        );
    }

    #[test]
    fn list_ideas_filter_applies_before_pagination() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);
        let reviewer = AccountId::generate();

        let oldest = submit(&store, &account, "Oldest");
        let middle = submit(&store, &account, "Middle");
        let newest = submit(&store, &account, "Newest");

        store
            .decide_idea(
                &oldest.id,
                reviewer,
                IdeaDecision::Approve {
                    payout_paise: 5_000,
                    note: None,
                },
            )
            .unwrap();

        // The approved idea sits beyond the first unfiltered page; a
        // filtered query must still find it.
        let approved = store
            .list_ideas_by_account(&account.id, Some(IdeaStatus::Approved), 2, 0)
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, oldest.id);

        // Offset counts matching ideas only (newest first among pending).
        let second_pending = store
            .list_ideas_by_account(&account.id, Some(IdeaStatus::Pending), 1, 1)
            .unwrap();
        assert_eq!(second_pending.len(), 1);
        assert_eq!(second_pending[0].id, middle.id);

        let unfiltered = store
            .list_ideas_by_account(&account.id, None, 10, 0)
            .unwrap();
        assert_eq!(unfiltered.len(), 3);
        assert_eq!(unfiltered[0].id, newest.id);
    }

    #[test]
    fn approve_credits_wallet_and_is_terminal() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);
        let reviewer = AccountId::generate();
        let idea = submit(&store, &account, "Solar dryer");

        let decided = store
            .decide_idea(
                &idea.id,
                reviewer,
                IdeaDecision::Approve {
                    payout_paise: 15_000,
                    note: Some("solid".into()),
                },
            )
            .unwrap();
        assert_eq!(decided.status, IdeaStatus::Approved);
        assert_eq!(decided.payout_paise, Some(15_000));

        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.wallet_paise, 15_000);
        assert_balances_match_ledger(&store, &account.id);

        // Second decision of either kind fails without mutation
        let err = store
            .decide_idea(
                &idea.id,
                reviewer,
                IdeaDecision::Reject { reason: "nope".into() },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(MarketError::InvalidTransition { .. })
        ));
        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.wallet_paise, 15_000);
    }

    #[test]
    fn reject_moves_queue_index_without_balance_effect() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);
        let reviewer = AccountId::generate();
        let idea = submit(&store, &account, "Solar dryer");

        assert_eq!(store.list_ideas_by_status(IdeaStatus::Pending, 10, 0).unwrap().len(), 1);

        store
            .decide_idea(
                &idea.id,
                reviewer,
                IdeaDecision::Reject { reason: "duplicate".into() },
            )
            .unwrap();

        assert!(store.list_ideas_by_status(IdeaStatus::Pending, 10, 0).unwrap().is_empty());
        assert_eq!(store.list_ideas_by_status(IdeaStatus::Rejected, 10, 0).unwrap().len(), 1);

        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.wallet_paise, 0);
    }

    #[test]
    fn confirm_order_credits_exactly_once() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        let order = PaymentOrder::new(account.id, 50, 34_900, "ord_ext_1".into());
        store.create_order(&order).unwrap();

        let outcome = store.confirm_order("ord_ext_1", "pay_1").unwrap();
        let ConfirmOutcome::Credited { coin_balance, .. } = outcome else {
            panic!("first confirm should credit");
        };
        assert_eq!(coin_balance, SIGNUP_BONUS_COINS + 50);

        // Replay
        let outcome = store.confirm_order("ord_ext_1", "pay_1").unwrap();
        assert!(matches!(outcome, ConfirmOutcome::AlreadyProcessed { .. }));

        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.coins, SIGNUP_BONUS_COINS + 50);
        assert_balances_match_ledger(&store, &account.id);
    }

    #[test]
    fn duplicate_external_order_id_rejected() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        let order = PaymentOrder::new(account.id, 10, 7_900, "ord_dup".into());
        store.create_order(&order).unwrap();

        let clash = PaymentOrder::new(account.id, 50, 34_900, "ord_dup".into());
        let err = store.create_order(&clash).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "external_order_id", .. }));
    }

    #[test]
    fn withdrawal_below_minimum_fails_without_debit() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        let err = store.request_withdrawal(&account.id, 49_999).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(MarketError::BelowMinimum { .. })
        ));
        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.wallet_paise, 0);
    }

    #[test]
    fn withdrawal_over_balance_fails_without_debit() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        // ₹150 in the wallet, ₹500 requested
        let earning = LedgerEntry::idea_earning(account.id, 15_000, "idea-x");
        store.append_entry(&earning).unwrap();

        let err = store.request_withdrawal(&account.id, 50_000).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(MarketError::InsufficientBalance {
                balance_paise: 15_000,
                required_paise: 50_000
            })
        ));
        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.wallet_paise, 15_000);
        assert!(store.list_withdrawals_by_account(&account.id, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn rejected_withdrawal_restores_the_full_amount() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);
        let admin = AccountId::generate();

        let earning = LedgerEntry::idea_earning(account.id, 100_000, "idea-x");
        store.append_entry(&earning).unwrap();

        let request = store.request_withdrawal(&account.id, 60_000).unwrap();
        assert_eq!(request.fee_paise, 1_200);
        assert_eq!(request.net_paise, 58_800);
        let mid = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(mid.wallet_paise, 40_000);

        let decided = store
            .decide_withdrawal(&request.id, admin, false, Some("bank details invalid".into()))
            .unwrap();
        assert_eq!(decided.status, WithdrawalStatus::Rejected);

        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.wallet_paise, 100_000); // Fee included
        assert_balances_match_ledger(&store, &account.id);
    }

    #[test]
    fn approved_withdrawal_keeps_the_debit() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);
        let admin = AccountId::generate();

        let earning = LedgerEntry::idea_earning(account.id, 100_000, "idea-x");
        store.append_entry(&earning).unwrap();

        let request = store.request_withdrawal(&account.id, 60_000).unwrap();
        let decided = store.decide_withdrawal(&request.id, admin, true, None).unwrap();
        assert_eq!(decided.status, WithdrawalStatus::Approved);

        let account = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account.wallet_paise, 40_000);

        // The holding entry settled
        let held = store.get_entry(&request.ledger_entry_id).unwrap().unwrap();
        assert_eq!(held.status, EntryStatus::Completed);

        // Deciding again fails
        let err = store
            .decide_withdrawal(&request.id, admin, false, None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(MarketError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn ledger_history_is_newest_first() {
        let (store, _dir) = create_test_store();
        let account = register(&store, "asha", None);

        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure distinct ULIDs
        let earning = LedgerEntry::idea_earning(account.id, 5_000, "idea-1");
        store.append_entry(&earning).unwrap();

        let entries = store.list_entries_by_account(&account.id, 10, 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::IdeaEarning);
        assert_eq!(entries[1].kind, EntryKind::SignupBonus);

        // Pagination
        let page2 = store.list_entries_by_account(&account.id, 1, 1).unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].kind, EntryKind::SignupBonus);
    }

    #[test]
    fn marketplace_walkthrough() {
        // Account starts with 6 coins: submit, approve ₹150, withdrawal
        // fails below balance, buy 50 coins, submit 10 more.
        let (store, _dir) = create_test_store();
        let reviewer = AccountId::generate();
        let account = register(&store, "asha", None);

        // Trim the signup bonus down to exactly 6 coins for the scenario.
        let adjust = LedgerEntry::idea_submission_cost(account.id, SIGNUP_BONUS_COINS - 6, "setup");
        store.append_entry(&adjust).unwrap();

        let idea = submit(&store, &account, "Solar dryer");
        let account_now = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account_now.coins, 4);

        store
            .decide_idea(
                &idea.id,
                reviewer,
                IdeaDecision::Approve { payout_paise: 15_000, note: None },
            )
            .unwrap();
        let account_now = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account_now.wallet_paise, 15_000);

        let err = store.request_withdrawal(&account.id, 50_000).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(MarketError::InsufficientBalance { .. })
        ));

        let order = PaymentOrder::new(account.id, 50, 34_900, "ord_walk".into());
        store.create_order(&order).unwrap();
        store.confirm_order("ord_walk", "pay_walk").unwrap();
        let account_now = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account_now.coins, 54);

        for i in 0..10 {
            submit(&store, &account, &format!("Idea {i}"));
        }
        let account_now = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(account_now.coins, 34);
        let pending = store.list_ideas_by_status(IdeaStatus::Pending, 100, 0).unwrap();
        assert_eq!(pending.len(), 10);
        assert_balances_match_ledger(&store, &account.id);
    }
}
