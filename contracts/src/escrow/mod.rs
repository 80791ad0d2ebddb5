//! Escrow holding staked grant tokens on behalf of operators.
//!
//! Tokens enter the escrow through the token's approve-and-call hook
//! ([`ITokenStakingEscrow::receive_approval`]): the staking contract
//! approves the escrow and the token forwards the approval together with an
//! ABI-encoded `(address operator, uint256 grantId)` payload. The escrow pulls
//! the approved amount and records one [`ledger::Deposit`] per operator.
//!
//! A deposit unlocks on the schedule of the grant it came from (see
//! [`vesting`]). Unlocked tokens are released to the grant's beneficiary in
//! any number of rounds:
//! - [`ITokenStakingEscrow::withdraw`] for direct grants, paying the grantee
//!   recorded in the grant;
//! - [`ITokenStakingEscrow::withdraw_to_managed_grantee`] for managed grants,
//!   paying the beneficiary returned by the managed grant resolver.
//!
//! Either the beneficiary or the operator may trigger a withdrawal, the tokens
//! always go to the beneficiary.
use alloc::{vec, vec::Vec};

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
pub use sol::*;
use stylus_sdk::{
    abi::Bytes,
    block,
    call::{Call, MethodError},
    contract, evm, msg,
    prelude::*,
    storage::StorageAddress,
};

use self::{
    abi::{IManagedGrantResolver, ITokenGrant},
    grant::{Grant, GrantKind},
    ledger::DepositLedger,
};
use crate::utils::safe_erc20::{self, ISafeErc20, SafeErc20};

pub mod abi;
pub mod grant;
pub mod ledger;
pub mod vesting;

/// Length of the payload attached to a deposit: an ABI-encoded
/// `(address operator, uint256 grantId)`.
pub const DEPOSIT_PAYLOAD_LENGTH: usize = 64;

#[cfg_attr(coverage_nightly, coverage(off))]
mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// Emitted when tokens are deposited for `operator`.
        ///
        /// * `operator` - Operator the tokens are held for.
        /// * `grant_id` - Grant the tokens come from.
        /// * `amount` - Deposited amount.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event Deposited(address indexed operator, uint256 indexed grant_id, uint256 amount);

        /// Emitted when unlocked tokens of `operator`'s deposit are released.
        ///
        /// * `operator` - Operator of the deposit.
        /// * `grantee` - Beneficiary the tokens were sent to.
        /// * `amount` - Released amount.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event DepositWithdrawn(address indexed operator, address indexed grantee, uint256 amount);
    }

    sol! {
        /// The approval does not come from the held token.
        ///
        /// * `token` - Token that forwarded the approval.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowUnexpectedToken(address token);

        /// The deposit payload is not 64 bytes long.
        ///
        /// * `length` - Length of the received payload.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowUnexpectedDataLength(uint256 length);

        /// The deposit payload does not decode as `(address, uint256)`.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowMalformedData();

        /// Tokens were approved by someone other than the staking contract.
        ///
        /// * `from` - Account that approved the tokens.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowUnauthorizedDepositor(address from);

        /// The grant registry does not know the grant.
        ///
        /// * `grant_id` - Identifier of the grant.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowNonexistentGrant(uint256 grant_id);

        /// The operator has no deposit.
        ///
        /// * `operator` - Operator without a deposit.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowUnknownOperator(address operator);

        /// The caller is neither the beneficiary nor the operator.
        ///
        /// * `account` - Account that tried to withdraw.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowUnauthorizedAccount(address account);

        /// A direct withdrawal was requested for a managed grant.
        ///
        /// * `grant_id` - Identifier of the grant.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowManagedGrant(uint256 grant_id);

        /// A managed withdrawal was requested for a direct grant.
        ///
        /// * `grant_id` - Identifier of the grant.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowNotManagedGrant(uint256 grant_id);

        /// A collaborator address is [`Address::ZERO`].
        ///
        /// * `collaborator` - Rejected address.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowInvalidCollaborator(address collaborator);

        /// A call to a collaborator contract failed.
        ///
        /// * `target` - Address of the collaborator.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error EscrowFailedCall(address target);
    }
}

/// An error that occurred in the implementation of a [`TokenStakingEscrow`].
#[derive(SolidityError, Debug)]
pub enum Error {
    /// The approval does not come from the held token.
    UnexpectedToken(EscrowUnexpectedToken),
    /// The deposit payload is not [`DEPOSIT_PAYLOAD_LENGTH`] bytes long.
    UnexpectedDataLength(EscrowUnexpectedDataLength),
    /// The deposit payload does not decode as `(address, uint256)`.
    MalformedData(EscrowMalformedData),
    /// Tokens were approved by someone other than the staking contract.
    UnauthorizedDepositor(EscrowUnauthorizedDepositor),
    /// The grant registry does not know the grant.
    NonexistentGrant(EscrowNonexistentGrant),
    /// The operator has no deposit.
    UnknownOperator(EscrowUnknownOperator),
    /// The caller is neither the beneficiary nor the operator.
    UnauthorizedAccount(EscrowUnauthorizedAccount),
    /// The operator already has a deposit.
    DuplicateDeposit(ledger::EscrowDuplicateDeposit),
    /// A direct withdrawal was requested for a managed grant.
    ManagedGrant(EscrowManagedGrant),
    /// A managed withdrawal was requested for a direct grant.
    NotManagedGrant(EscrowNotManagedGrant),
    /// A withdrawal would break the ledger invariants.
    InvariantViolation(ledger::EscrowInvariantViolation),
    /// A collaborator address is [`Address::ZERO`].
    InvalidCollaborator(EscrowInvalidCollaborator),
    /// A call to a collaborator contract failed.
    FailedCall(EscrowFailedCall),
    /// An operation with the held token failed.
    SafeErc20FailedOperation(safe_erc20::SafeErc20FailedOperation),
}

/// Broad category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller is not allowed to perform the operation.
    Unauthorized,
    /// The referenced deposit or grant does not exist.
    NotFound,
    /// An argument is malformed.
    InvalidInput,
    /// The operator already has a deposit.
    DuplicateDeposit,
    /// The withdrawal path does not match the kind of the grant.
    WrongGrantKind,
    /// The ledger would end up in an inconsistent state.
    InvariantViolation,
    /// A collaborator contract failed.
    ExternalCall,
}

impl Error {
    /// Returns the category of the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedToken(_)
            | Error::UnauthorizedDepositor(_)
            | Error::UnauthorizedAccount(_) => ErrorKind::Unauthorized,
            Error::NonexistentGrant(_) | Error::UnknownOperator(_) => {
                ErrorKind::NotFound
            }
            Error::UnexpectedDataLength(_)
            | Error::MalformedData(_)
            | Error::InvalidCollaborator(_) => ErrorKind::InvalidInput,
            Error::DuplicateDeposit(_) => ErrorKind::DuplicateDeposit,
            Error::ManagedGrant(_) | Error::NotManagedGrant(_) => {
                ErrorKind::WrongGrantKind
            }
            Error::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Error::FailedCall(_) | Error::SafeErc20FailedOperation(_) => {
                ErrorKind::ExternalCall
            }
        }
    }

    /// Returns a human readable reason for the error.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Error::UnexpectedToken(_) => "Not the expected token",
            Error::UnexpectedDataLength(_) => "Unexpected data length",
            Error::MalformedData(_) => "Malformed deposit data",
            Error::UnauthorizedDepositor(_) => {
                "Only staking contract can deposit"
            }
            Error::NonexistentGrant(_) => "Grant with this ID does not exist",
            Error::UnknownOperator(_) => "No deposit for this operator",
            Error::UnauthorizedAccount(_) => {
                "Only grantee or operator can withdraw"
            }
            Error::DuplicateDeposit(_) => {
                "Deposit already exists for this operator"
            }
            Error::ManagedGrant(_) => "Can not be called for managed grant",
            Error::NotManagedGrant(_) => "Not a managed grant",
            Error::InvariantViolation(_) => "Withdrawn amount exceeds deposit",
            Error::InvalidCollaborator(_) => {
                "Collaborator can not be the zero address"
            }
            Error::FailedCall(_) => "Collaborator call failed",
            Error::SafeErc20FailedOperation(_) => "Token transfer failed",
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl From<ledger::Error> for Error {
    fn from(value: ledger::Error) -> Self {
        match value {
            ledger::Error::DuplicateDeposit(e) => Error::DuplicateDeposit(e),
            ledger::Error::InvariantViolation(e) => {
                Error::InvariantViolation(e)
            }
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl From<safe_erc20::Error> for Error {
    fn from(value: safe_erc20::Error) -> Self {
        match value {
            safe_erc20::Error::SafeErc20FailedOperation(e) => {
                Error::SafeErc20FailedOperation(e)
            }
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl MethodError for Error {
    fn encode(self) -> alloc::vec::Vec<u8> {
        self.into()
    }
}

/// State of a [`TokenStakingEscrow`] contract.
#[storage]
pub struct TokenStakingEscrow {
    /// Held token.
    pub(crate) token: StorageAddress,
    /// Grant registry the deposits come from.
    pub(crate) token_grant: StorageAddress,
    /// The only contract allowed to deposit.
    pub(crate) token_staking: StorageAddress,
    /// Resolves the beneficiary of managed grants.
    pub(crate) managed_grant_resolver: StorageAddress,
    /// Deposits, keyed by operator.
    pub(crate) ledger: DepositLedger,
    /// [`SafeErc20`] utility moving the held token.
    safe_erc20: SafeErc20,
}

/// NOTE: Implementation of [`TopLevelStorage`] to be able use `&mut self` when
/// calling other contracts and not `&mut (impl TopLevelStorage +
/// BorrowMut<Self>)`. Should be fixed in the future by the Stylus team.
unsafe impl TopLevelStorage for TokenStakingEscrow {}

/// Interface for a [`TokenStakingEscrow`] contract.
pub trait ITokenStakingEscrow {
    /// The error type associated to the trait implementation.
    type Error: Into<alloc::vec::Vec<u8>>;

    /// Returns the held token.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    fn token(&self) -> Address;

    /// Returns the grant registry.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    fn token_grant(&self) -> Address;

    /// Returns the staking contract, the only allowed depositor.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    fn token_staking(&self) -> Address;

    /// Returns the resolver of managed grant beneficiaries.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    fn managed_grant_resolver(&self) -> Address;

    /// Returns the amount deposited for `operator`, zero if there is no
    /// deposit.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    fn deposited_amount(&self, operator: Address) -> U256;

    /// Returns the amount already withdrawn for `operator`, zero if there is
    /// no deposit.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    fn withdrawn_amount(&self, operator: Address) -> U256;

    /// Returns the amount still held for `operator`, unlocked or not.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    fn available_amount(&self, operator: Address) -> U256;

    /// Returns the grant `operator`'s deposit comes from, zero if there is no
    /// deposit.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    fn deposit_grant_id(&self, operator: Address) -> U256;

    /// Returns whether `operator` has a deposit.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `operator` - Operator to look up.
    #[must_use]
    fn has_deposit(&self, operator: Address) -> bool;

    /// Returns the amount of `operator`'s deposit that can be withdrawn right
    /// now, zero if there is no deposit.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state, needed to call
    ///   the grant registry.
    /// * `operator` - Operator to look up.
    ///
    /// # Errors
    ///
    /// * [`Error::FailedCall`] - If reading the grant from the registry
    ///   fails.
    fn withdrawable(&mut self, operator: Address)
        -> Result<U256, Self::Error>;

    /// Releases the withdrawable part of `operator`'s deposit to the grantee
    /// of the underlying direct grant, and returns the released amount.
    ///
    /// Succeeds without doing anything when nothing is withdrawable.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `operator` - Operator of the deposit.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownOperator`] - If `operator` has no deposit.
    /// * [`Error::ManagedGrant`] - If the deposit comes from a managed grant.
    /// * [`Error::UnauthorizedAccount`] - If the caller is neither the grantee
    ///   nor `operator`.
    /// * [`Error::FailedCall`] - If reading the grant from the registry
    ///   fails.
    /// * [`Error::SafeErc20FailedOperation`] - If the token transfer fails.
    ///
    /// # Events
    ///
    /// * [`DepositWithdrawn`].
    fn withdraw(&mut self, operator: Address) -> Result<U256, Self::Error>;

    /// Releases the withdrawable part of `operator`'s deposit to the
    /// beneficiary of the underlying managed grant, and returns the released
    /// amount.
    ///
    /// Succeeds without doing anything when nothing is withdrawable.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `operator` - Operator of the deposit.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownOperator`] - If `operator` has no deposit.
    /// * [`Error::NotManagedGrant`] - If the deposit comes from a direct
    ///   grant.
    /// * [`Error::UnauthorizedAccount`] - If the caller is neither the
    ///   beneficiary nor `operator`.
    /// * [`Error::FailedCall`] - If a call to the grant registry or the
    ///   resolver fails.
    /// * [`Error::SafeErc20FailedOperation`] - If the token transfer fails.
    ///
    /// # Events
    ///
    /// * [`DepositWithdrawn`].
    fn withdraw_to_managed_grantee(
        &mut self,
        operator: Address,
    ) -> Result<U256, Self::Error>;

    /// Hook invoked by the held token after `from` approved `value` tokens
    /// to the escrow. Pulls the tokens and records them as the deposit of the
    /// operator encoded in `extra_data`.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `from` - Account that approved the tokens.
    /// * `value` - Approved amount.
    /// * `token` - Token the approval was made on.
    /// * `extra_data` - ABI-encoded `(address operator, uint256 grantId)`.
    ///
    /// # Errors
    ///
    /// * [`Error::UnexpectedToken`] - If the caller or `token` is not the
    ///   held token.
    /// * [`Error::UnexpectedDataLength`] - If `extra_data` is not 64 bytes
    ///   long.
    /// * [`Error::UnauthorizedDepositor`] - If `from` is not the staking
    ///   contract.
    /// * [`Error::MalformedData`] - If `extra_data` carries a malformed
    ///   operator address.
    /// * [`Error::NonexistentGrant`] - If the grant does not exist.
    /// * [`Error::DuplicateDeposit`] - If the operator already has a deposit.
    /// * [`Error::FailedCall`] - If the grant registry call fails.
    /// * [`Error::SafeErc20FailedOperation`] - If pulling the tokens fails.
    ///
    /// # Events
    ///
    /// * [`Deposited`].
    fn receive_approval(
        &mut self,
        from: Address,
        value: U256,
        token: Address,
        extra_data: Bytes,
    ) -> Result<(), Self::Error>;
}

#[public]
#[implements(ITokenStakingEscrow<Error = Error>)]
impl TokenStakingEscrow {
    /// Constructor.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `token` - Held token.
    /// * `token_grant` - Grant registry.
    /// * `token_staking` - Staking contract, the only allowed depositor.
    /// * `managed_grant_resolver` - Resolver of managed grant beneficiaries.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidCollaborator`] - If any of the addresses is
    ///   [`Address::ZERO`].
    #[constructor]
    pub fn constructor(
        &mut self,
        token: Address,
        token_grant: Address,
        token_staking: Address,
        managed_grant_resolver: Address,
    ) -> Result<(), Error> {
        if [token, token_grant, token_staking, managed_grant_resolver]
            .iter()
            .any(|collaborator| collaborator.is_zero())
        {
            return Err(Error::InvalidCollaborator(EscrowInvalidCollaborator {
                collaborator: Address::ZERO,
            }));
        }

        self.token.set(token);
        self.token_grant.set(token_grant);
        self.token_staking.set(token_staking);
        self.managed_grant_resolver.set(managed_grant_resolver);

        Ok(())
    }
}

#[public]
impl ITokenStakingEscrow for TokenStakingEscrow {
    type Error = Error;

    fn token(&self) -> Address {
        self.token()
    }

    fn token_grant(&self) -> Address {
        self.token_grant()
    }

    fn token_staking(&self) -> Address {
        self.token_staking()
    }

    fn managed_grant_resolver(&self) -> Address {
        self.managed_grant_resolver()
    }

    fn deposited_amount(&self, operator: Address) -> U256 {
        self.deposited_amount(operator)
    }

    fn withdrawn_amount(&self, operator: Address) -> U256 {
        self.withdrawn_amount(operator)
    }

    fn available_amount(&self, operator: Address) -> U256 {
        self.available_amount(operator)
    }

    fn deposit_grant_id(&self, operator: Address) -> U256 {
        self.deposit_grant_id(operator)
    }

    fn has_deposit(&self, operator: Address) -> bool {
        self.has_deposit(operator)
    }

    fn withdrawable(
        &mut self,
        operator: Address,
    ) -> Result<U256, Self::Error> {
        self.withdrawable(operator)
    }

    fn withdraw(&mut self, operator: Address) -> Result<U256, Self::Error> {
        self.withdraw(operator)
    }

    fn withdraw_to_managed_grantee(
        &mut self,
        operator: Address,
    ) -> Result<U256, Self::Error> {
        self.withdraw_to_managed_grantee(operator)
    }

    fn receive_approval(
        &mut self,
        from: Address,
        value: U256,
        token: Address,
        extra_data: Bytes,
    ) -> Result<(), Self::Error> {
        self.receive_approval(from, value, token, extra_data)
    }
}

impl TokenStakingEscrow {
    /// Check [`ITokenStakingEscrow::token()`] for more information.
    #[must_use]
    pub fn token(&self) -> Address {
        self.token.get()
    }

    /// Check [`ITokenStakingEscrow::token_grant()`] for more information.
    #[must_use]
    pub fn token_grant(&self) -> Address {
        self.token_grant.get()
    }

    /// Check [`ITokenStakingEscrow::token_staking()`] for more information.
    #[must_use]
    pub fn token_staking(&self) -> Address {
        self.token_staking.get()
    }

    /// Check [`ITokenStakingEscrow::managed_grant_resolver()`] for more
    /// information.
    #[must_use]
    pub fn managed_grant_resolver(&self) -> Address {
        self.managed_grant_resolver.get()
    }

    /// Check [`ITokenStakingEscrow::deposited_amount()`] for more
    /// information.
    #[must_use]
    pub fn deposited_amount(&self, operator: Address) -> U256 {
        self.ledger.deposited_amount(operator)
    }

    /// Check [`ITokenStakingEscrow::withdrawn_amount()`] for more
    /// information.
    #[must_use]
    pub fn withdrawn_amount(&self, operator: Address) -> U256 {
        self.ledger.withdrawn_amount(operator)
    }

    /// Check [`ITokenStakingEscrow::available_amount()`] for more
    /// information.
    #[must_use]
    pub fn available_amount(&self, operator: Address) -> U256 {
        self.ledger.available_amount(operator)
    }

    /// Check [`ITokenStakingEscrow::deposit_grant_id()`] for more
    /// information.
    #[must_use]
    pub fn deposit_grant_id(&self, operator: Address) -> U256 {
        self.ledger.grant_id(operator).unwrap_or_default()
    }

    /// Check [`ITokenStakingEscrow::has_deposit()`] for more information.
    #[must_use]
    pub fn has_deposit(&self, operator: Address) -> bool {
        self.ledger.has_deposit(operator)
    }

    /// Check [`ITokenStakingEscrow::withdrawable()`] for more information.
    #[allow(clippy::missing_errors_doc)]
    pub fn withdrawable(&mut self, operator: Address) -> Result<U256, Error> {
        self._withdrawable_at(operator, block::timestamp())
    }

    /// Check [`ITokenStakingEscrow::withdraw()`] for more information.
    #[allow(clippy::missing_errors_doc)]
    pub fn withdraw(&mut self, operator: Address) -> Result<U256, Error> {
        self._withdraw(
            msg::sender(),
            operator,
            GrantKind::Direct,
            block::timestamp(),
        )
    }

    /// Check [`ITokenStakingEscrow::withdraw_to_managed_grantee()`] for more
    /// information.
    #[allow(clippy::missing_errors_doc)]
    pub fn withdraw_to_managed_grantee(
        &mut self,
        operator: Address,
    ) -> Result<U256, Error> {
        self._withdraw(
            msg::sender(),
            operator,
            GrantKind::Managed,
            block::timestamp(),
        )
    }

    /// Check [`ITokenStakingEscrow::receive_approval()`] for more
    /// information.
    #[allow(clippy::missing_errors_doc)]
    pub fn receive_approval(
        &mut self,
        from: Address,
        value: U256,
        token: Address,
        extra_data: Bytes,
    ) -> Result<(), Error> {
        self._on_approval_received(
            msg::sender(),
            from,
            value,
            token,
            &extra_data,
        )
    }
}

impl TokenStakingEscrow {
    /// Validates an approval forwarded by `token_caller` and records it as a
    /// deposit.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `token_caller` - Contract that invoked the hook.
    /// * `approver` - Account that approved the tokens.
    /// * `amount` - Approved amount.
    /// * `token` - Token the approval was made on, as claimed by the caller.
    /// * `payload` - ABI-encoded `(address operator, uint256 grantId)`.
    ///
    /// # Errors
    ///
    /// * [`Error::UnexpectedToken`] - If `token_caller` or `token` is not the
    ///   held token.
    /// * [`Error::UnexpectedDataLength`] - If `payload` is not
    ///   [`DEPOSIT_PAYLOAD_LENGTH`] bytes long.
    /// * [`Error::MalformedData`] - If `payload` does not decode as
    ///   `(address, uint256)`.
    /// * [`Error::UnauthorizedDepositor`] - If `approver` is not the staking
    ///   contract.
    /// * [`Error::NonexistentGrant`] - If the grant does not exist.
    /// * [`Error::DuplicateDeposit`] - If the operator already has a deposit.
    /// * [`Error::FailedCall`] - If the grant registry call fails.
    /// * [`Error::SafeErc20FailedOperation`] - If pulling the tokens fails.
    ///
    /// # Events
    ///
    /// * [`Deposited`].
    pub fn _on_approval_received(
        &mut self,
        token_caller: Address,
        approver: Address,
        amount: U256,
        token: Address,
        payload: &[u8],
    ) -> Result<(), Error> {
        let held = self.token();
        for candidate in [token_caller, token] {
            if candidate != held {
                return Err(Error::UnexpectedToken(EscrowUnexpectedToken {
                    token: candidate,
                }));
            }
        }

        if payload.len() != DEPOSIT_PAYLOAD_LENGTH {
            return Err(Error::UnexpectedDataLength(
                EscrowUnexpectedDataLength {
                    length: U256::from(payload.len()),
                },
            ));
        }

        if approver != self.token_staking() {
            return Err(Error::UnauthorizedDepositor(
                EscrowUnauthorizedDepositor { from: approver },
            ));
        }

        let (operator, grant_id) =
            <(Address, U256)>::abi_decode_params(payload, true)
                .map_err(|_| Error::MalformedData(EscrowMalformedData {}))?;

        if !self.grant_exists(grant_id)? {
            return Err(Error::NonexistentGrant(EscrowNonexistentGrant {
                grant_id,
            }));
        }

        self.ledger.record(operator, grant_id, amount)?;

        self.safe_erc20.safe_transfer_from(
            held,
            approver,
            contract::address(),
            amount,
        )?;

        evm::log(Deposited { operator, grant_id, amount });

        Ok(())
    }

    /// Returns the amount of `operator`'s deposit withdrawable at `now`.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `operator` - Operator to look up.
    /// * `now` - Point in time to evaluate the unlocking schedule at.
    ///
    /// # Errors
    ///
    /// * [`Error::FailedCall`] - If reading the grant from the registry
    ///   fails.
    pub fn _withdrawable_at(
        &mut self,
        operator: Address,
        now: u64,
    ) -> Result<U256, Error> {
        let Some(grant_id) = self.ledger.grant_id(operator) else {
            return Ok(U256::ZERO);
        };

        let grant = self.fetch_grant(grant_id)?;

        Ok(self.withdrawable_under(operator, &grant, now))
    }

    /// Releases the part of `operator`'s deposit withdrawable at `now` to the
    /// beneficiary of its grant, on behalf of `caller`.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `caller` - Account requesting the withdrawal.
    /// * `operator` - Operator of the deposit.
    /// * `path` - Kind of grant the withdrawal is meant for.
    /// * `now` - Point in time to evaluate the unlocking schedule at.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownOperator`] - If `operator` has no deposit.
    /// * [`Error::ManagedGrant`] - If `path` is [`GrantKind::Direct`] and the
    ///   grant is managed.
    /// * [`Error::NotManagedGrant`] - If `path` is [`GrantKind::Managed`] and
    ///   the grant is direct.
    /// * [`Error::UnauthorizedAccount`] - If `caller` is neither the
    ///   beneficiary nor `operator`.
    /// * [`Error::FailedCall`] - If a collaborator call fails.
    /// * [`Error::SafeErc20FailedOperation`] - If the token transfer fails.
    ///   The ledger already counts the amount as withdrawn at that point, so
    ///   the error must be propagated for the transaction revert to undo it.
    ///
    /// # Events
    ///
    /// * [`DepositWithdrawn`].
    pub fn _withdraw(
        &mut self,
        caller: Address,
        operator: Address,
        path: GrantKind,
        now: u64,
    ) -> Result<U256, Error> {
        let grant_id = self.ledger.grant_id(operator).ok_or(
            Error::UnknownOperator(EscrowUnknownOperator { operator }),
        )?;

        let grant = self.fetch_grant(grant_id)?;
        let beneficiary = self.resolve_beneficiary(grant_id, &grant, path)?;

        if caller != beneficiary && caller != operator {
            return Err(Error::UnauthorizedAccount(EscrowUnauthorizedAccount {
                account: caller,
            }));
        }

        let amount = self.withdrawable_under(operator, &grant, now);
        if amount.is_zero() {
            return Ok(U256::ZERO);
        }

        // Recorded before the transfer, so a reentrant call sees the new
        // total.
        self.ledger.mark_withdrawn(operator, amount)?;
        let token = self.token();
        self.safe_erc20.safe_transfer(token, beneficiary, amount)?;

        evm::log(DepositWithdrawn { operator, grantee: beneficiary, amount });

        Ok(amount)
    }

    fn withdrawable_under(
        &self,
        operator: Address,
        grant: &Grant,
        now: u64,
    ) -> U256 {
        let unlocked = vesting::unlocked_amount(
            grant,
            self.ledger.deposited_amount(operator),
            now,
        );
        vesting::withdrawable_amount(
            unlocked,
            self.ledger.withdrawn_amount(operator),
        )
    }

    /// Picks the account entitled to the tokens of grant `grant_id`, after
    /// checking that `path` matches the kind of the grant.
    fn resolve_beneficiary(
        &mut self,
        grant_id: U256,
        grant: &Grant,
        path: GrantKind,
    ) -> Result<Address, Error> {
        match (path, grant.kind()) {
            (GrantKind::Direct, GrantKind::Direct) => Ok(grant.grantee),
            (GrantKind::Direct, GrantKind::Managed) => {
                Err(Error::ManagedGrant(EscrowManagedGrant { grant_id }))
            }
            (GrantKind::Managed, GrantKind::Direct) => {
                Err(Error::NotManagedGrant(EscrowNotManagedGrant { grant_id }))
            }
            (GrantKind::Managed, GrantKind::Managed) => {
                let resolver = self.managed_grant_resolver();
                IManagedGrantResolver::new(resolver)
                    .resolve_grantee(Call::new_in(self), grant_id)
                    .map_err(|_| {
                        Error::FailedCall(EscrowFailedCall { target: resolver })
                    })
            }
        }
    }

    fn grant_exists(&mut self, grant_id: U256) -> Result<bool, Error> {
        let registry = self.token_grant();
        ITokenGrant::new(registry)
            .exists(Call::new_in(self), grant_id)
            .map_err(|_| {
                Error::FailedCall(EscrowFailedCall { target: registry })
            })
    }

    fn fetch_grant(&mut self, grant_id: U256) -> Result<Grant, Error> {
        let registry = self.token_grant();
        ITokenGrant::new(registry)
            .get_grant(Call::new_in(self), grant_id)
            .map(Grant::from)
            .map_err(|_| {
                Error::FailedCall(EscrowFailedCall { target: registry })
            })
    }
}
