use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Which balance an entry moved. `Available` is spendable; `Pending` is
/// the seller escrow credited at payment confirmation and released at
/// delivery.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerBucket {
    Available,
    Pending,
}

/// Immutable monetary movement record. Created, never mutated or
/// deleted; balances are always recomputable as the running sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub delta: i64,
    pub bucket: LedgerBucket,
    pub resulting_balance: i64,
    pub order_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAccount {
    pub account_id: Uuid,
    pub balance: i64,
    pub pending_balance: i64,
    pub total_deposited: i64,
    pub total_spent: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
}

struct AccountState {
    account: WalletAccount,
    entries: Vec<LedgerEntry>,
}

impl AccountState {
    fn new(account_id: Uuid) -> Self {
        Self {
            account: WalletAccount {
                account_id,
                balance: 0,
                pending_balance: 0,
                total_deposited: 0,
                total_spent: 0,
            },
            entries: Vec::new(),
        }
    }

    fn push_entry(&mut self, delta: i64, bucket: LedgerBucket, order_id: Option<Uuid>, description: &str) {
        let resulting_balance = match bucket {
            LedgerBucket::Available => self.account.balance,
            LedgerBucket::Pending => self.account.pending_balance,
        };
        self.entries.push(LedgerEntry {
            id: Uuid::new_v4(),
            account_id: self.account.account_id,
            delta,
            bucket,
            resulting_balance,
            order_id,
            description: description.to_string(),
            created_at: Utc::now(),
        });
    }
}

/// The only component permitted to mutate balances. Each account is
/// guarded by its own async mutex, so two concurrent debits against the
/// same account are serialized and can never jointly overdraw it.
#[derive(Default)]
pub struct WalletLedger {
    accounts: RwLock<HashMap<Uuid, Arc<Mutex<AccountState>>>>,
}

impl WalletLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, account_id: Uuid) -> Arc<Mutex<AccountState>> {
        if let Some(state) = self.accounts.read().unwrap().get(&account_id) {
            return state.clone();
        }
        let mut accounts = self.accounts.write().unwrap();
        accounts
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(AccountState::new(account_id))))
            .clone()
    }

    /// Atomically decrement the spendable balance and append the entry.
    pub async fn debit(
        &self,
        account_id: Uuid,
        amount: i64,
        order_id: Option<Uuid>,
        description: &str,
    ) -> Result<LedgerEntry, WalletError> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        let handle = self.handle(account_id);
        let mut state = handle.lock().await;
        if amount > state.account.balance {
            return Err(WalletError::InsufficientFunds {
                needed: amount,
                available: state.account.balance,
            });
        }
        state.account.balance -= amount;
        state.account.total_spent += amount;
        state.push_entry(-amount, LedgerBucket::Available, order_id, description);
        Ok(state.entries.last().unwrap().clone())
    }

    /// Credits are never rejected.
    pub async fn credit(
        &self,
        account_id: Uuid,
        amount: i64,
        order_id: Option<Uuid>,
        description: &str,
    ) -> Result<LedgerEntry, WalletError> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        let handle = self.handle(account_id);
        let mut state = handle.lock().await;
        state.account.balance += amount;
        state.account.total_deposited += amount;
        state.push_entry(amount, LedgerBucket::Available, order_id, description);
        Ok(state.entries.last().unwrap().clone())
    }

    /// Credit the escrowed (not yet spendable) balance.
    pub async fn credit_pending(
        &self,
        account_id: Uuid,
        amount: i64,
        order_id: Option<Uuid>,
        description: &str,
    ) -> Result<LedgerEntry, WalletError> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        let handle = self.handle(account_id);
        let mut state = handle.lock().await;
        state.account.pending_balance += amount;
        state.push_entry(amount, LedgerBucket::Pending, order_id, description);
        Ok(state.entries.last().unwrap().clone())
    }

    /// Reverse an escrow credit, e.g. when a paid order is refunded.
    pub async fn debit_pending(
        &self,
        account_id: Uuid,
        amount: i64,
        order_id: Option<Uuid>,
        description: &str,
    ) -> Result<LedgerEntry, WalletError> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        let handle = self.handle(account_id);
        let mut state = handle.lock().await;
        if amount > state.account.pending_balance {
            return Err(WalletError::InsufficientFunds {
                needed: amount,
                available: state.account.pending_balance,
            });
        }
        state.account.pending_balance -= amount;
        state.push_entry(-amount, LedgerBucket::Pending, order_id, description);
        Ok(state.entries.last().unwrap().clone())
    }

    /// Move escrowed funds into the spendable balance. Appends one entry
    /// per bucket so both running sums stay exact.
    pub async fn release_pending(
        &self,
        account_id: Uuid,
        amount: i64,
        order_id: Option<Uuid>,
        description: &str,
    ) -> Result<(), WalletError> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }
        let handle = self.handle(account_id);
        let mut state = handle.lock().await;
        if amount > state.account.pending_balance {
            return Err(WalletError::InsufficientFunds {
                needed: amount,
                available: state.account.pending_balance,
            });
        }
        state.account.pending_balance -= amount;
        state.push_entry(-amount, LedgerBucket::Pending, order_id, description);
        state.account.balance += amount;
        state.push_entry(amount, LedgerBucket::Available, order_id, description);
        Ok(())
    }

    pub async fn balance_of(&self, account_id: Uuid) -> i64 {
        self.handle(account_id).lock().await.account.balance
    }

    pub async fn pending_of(&self, account_id: Uuid) -> i64 {
        self.handle(account_id).lock().await.account.pending_balance
    }

    pub async fn account(&self, account_id: Uuid) -> WalletAccount {
        self.handle(account_id).lock().await.account.clone()
    }

    pub async fn entries_for(&self, account_id: Uuid) -> Vec<LedgerEntry> {
        self.handle(account_id).lock().await.entries.clone()
    }

    /// Consistency check: stored balances must equal the running sums of
    /// the account's entries.
    pub async fn audit(&self, account_id: Uuid) -> bool {
        let handle = self.handle(account_id);
        let state = handle.lock().await;
        let available: i64 = state
            .entries
            .iter()
            .filter(|e| e.bucket == LedgerBucket::Available)
            .map(|e| e.delta)
            .sum();
        let pending: i64 = state
            .entries
            .iter()
            .filter(|e| e.bucket == LedgerBucket::Pending)
            .map(|e| e.delta)
            .sum();
        available == state.account.balance && pending == state.account.pending_balance
    }
}
