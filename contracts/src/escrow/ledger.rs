//! Ledger of escrowed deposits, keyed by operator.
//!
//! Every operator has at most one deposit for the whole lifetime of the
//! escrow. A deposit is created by [`DepositLedger::record`], only ever
//! mutated by [`DepositLedger::mark_withdrawn`], and never removed: fully
//! withdrawn deposits stay as historical records.
use alloc::{vec, vec::Vec};

use alloy_primitives::{Address, U256};
pub use sol::*;
use stylus_sdk::{
    call::MethodError,
    prelude::*,
    storage::{StorageBool, StorageMap, StorageU256},
};

#[cfg_attr(coverage_nightly, coverage(off))]
mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// The operator already has a deposit.
        ///
        /// * `operator` - Operator of the existing deposit.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowDuplicateDeposit(address operator);

        /// Withdrawing would break `withdrawn <= deposited`, or the operator
        /// has no deposit to withdraw from.
        ///
        /// * `operator` - Operator of the deposit.
        /// * `withdrawn` - Total withdrawn amount the update would lead to.
        /// * `deposited` - Deposited amount.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowInvariantViolation(address operator, uint256 withdrawn, uint256 deposited);
    }
}

/// An error that occurred while updating the [`DepositLedger`].
#[derive(SolidityError, Debug)]
pub enum Error {
    /// The operator already has a deposit.
    DuplicateDeposit(EscrowDuplicateDeposit),
    /// A withdrawal would break the ledger invariants.
    InvariantViolation(EscrowInvariantViolation),
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl MethodError for Error {
    fn encode(self) -> alloc::vec::Vec<u8> {
        self.into()
    }
}

/// A single deposit.
#[storage]
pub struct Deposit {
    /// Grant the deposited tokens come from.
    pub(crate) grant_id: StorageU256,
    /// Amount deposited at intake.
    pub(crate) amount: StorageU256,
    /// Total amount withdrawn so far.
    pub(crate) withdrawn: StorageU256,
    /// Whether the deposit has been recorded.
    pub(crate) recorded: StorageBool,
}

/// State of a [`DepositLedger`].
#[storage]
pub struct DepositLedger {
    /// Maps operators to their deposit.
    pub(crate) deposits: StorageMap<Address, Deposit>,
}

impl DepositLedger {
    /// Records a new deposit of `amount` tokens from grant `grant_id` for
    /// `operator`.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the ledger's state.
    /// * `operator` - Operator the tokens are held for.
    /// * `grant_id` - Grant the tokens come from.
    /// * `amount` - Deposited amount.
    ///
    /// # Errors
    ///
    /// * [`Error::DuplicateDeposit`] - If `operator` already has a deposit.
    pub fn record(
        &mut self,
        operator: Address,
        grant_id: U256,
        amount: U256,
    ) -> Result<(), Error> {
        if self.has_deposit(operator) {
            return Err(Error::DuplicateDeposit(EscrowDuplicateDeposit {
                operator,
            }));
        }

        let mut deposit = self.deposits.setter(operator);
        deposit.grant_id.set(grant_id);
        deposit.amount.set(amount);
        deposit.withdrawn.set(U256::ZERO);
        deposit.recorded.set(true);

        Ok(())
    }

    /// Returns whether `operator` has a deposit.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the ledger's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    pub fn has_deposit(&self, operator: Address) -> bool {
        self.deposits.getter(operator).recorded.get()
    }

    /// Returns the grant of `operator`'s deposit, if there is one.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the ledger's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    pub fn grant_id(&self, operator: Address) -> Option<U256> {
        let deposit = self.deposits.getter(operator);
        deposit.recorded.get().then(|| deposit.grant_id.get())
    }

    /// Returns the amount deposited for `operator`, zero if there is no
    /// deposit.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the ledger's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    pub fn deposited_amount(&self, operator: Address) -> U256 {
        self.deposits.getter(operator).amount.get()
    }

    /// Returns the amount already withdrawn for `operator`, zero if there is
    /// no deposit.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the ledger's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    pub fn withdrawn_amount(&self, operator: Address) -> U256 {
        self.deposits.getter(operator).withdrawn.get()
    }

    /// Returns the amount still held for `operator`, whether unlocked or
    /// not.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the ledger's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    pub fn available_amount(&self, operator: Address) -> U256 {
        let deposit = self.deposits.getter(operator);
        // `withdrawn <= amount` is kept by `mark_withdrawn`.
        deposit.amount.get().saturating_sub(deposit.withdrawn.get())
    }

    /// Adds `delta` to the amount withdrawn for `operator`.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the ledger's state.
    /// * `operator` - Operator whose deposit is withdrawn from.
    /// * `delta` - Newly withdrawn amount.
    ///
    /// # Errors
    ///
    /// * [`Error::InvariantViolation`] - If `operator` has no deposit, or if
    ///   the total withdrawn amount would exceed the deposited amount.
    pub fn mark_withdrawn(
        &mut self,
        operator: Address,
        delta: U256,
    ) -> Result<(), Error> {
        let mut deposit = self.deposits.setter(operator);
        let deposited = deposit.amount.get();
        let withdrawn = deposit.withdrawn.get();

        let violation = |withdrawn| {
            Error::InvariantViolation(EscrowInvariantViolation {
                operator,
                withdrawn,
                deposited,
            })
        };

        if !deposit.recorded.get() {
            return Err(violation(withdrawn));
        }

        let total = withdrawn
            .checked_add(delta)
            .ok_or_else(|| violation(U256::MAX))?;
        if total > deposited {
            return Err(violation(total));
        }

        deposit.withdrawn.set(total);

        Ok(())
    }
}
