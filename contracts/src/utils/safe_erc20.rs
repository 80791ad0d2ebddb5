//! Wrappers around ERC-20 operations that fail when the token contract
//! returns `false`.
//!
//! Tokens that return no value (and instead revert on failure) are also
//! supported: non-reverting calls are assumed to be successful.
//!
//! To use it, add a [`SafeErc20`] field to your contract and call the safe
//! operations as `self.safe_erc20.safe_transfer(token, ...)`.
use alloc::{vec, vec::Vec};

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
pub use sol::*;
use stylus_sdk::{
    call::{MethodError, RawCall},
    prelude::*,
    ArbResult,
};

#[cfg_attr(coverage_nightly, coverage(off))]
mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// An operation with an ERC-20 token failed.
        ///
        /// * `token` - Address of the ERC-20 token.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error SafeErc20FailedOperation(address token);
    }
}

/// A [`SafeErc20`] error.
#[derive(SolidityError, Debug)]
pub enum Error {
    /// An operation with an ERC-20 token failed.
    SafeErc20FailedOperation(SafeErc20FailedOperation),
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl MethodError for Error {
    fn encode(self) -> alloc::vec::Vec<u8> {
        self.into()
    }
}

pub use token::*;
mod token {
    #![allow(missing_docs)]
    #![cfg_attr(coverage_nightly, coverage(off))]
    alloy_sol_types::sol! {
        /// Token operations wrapped by [`super::SafeErc20`].
        interface IErc20 {
            function transfer(address to, uint256 value) external returns (bool);
            function transferFrom(address from, address to, uint256 value) external returns (bool);
        }
    }
}

/// State of a [`SafeErc20`] utility.
#[storage]
pub struct SafeErc20 {}

/// Required interface of a [`SafeErc20`] utility.
pub trait ISafeErc20 {
    /// The error type associated to this trait implementation.
    type Error: Into<alloc::vec::Vec<u8>>;

    /// Transfer `value` amount of `token` from the calling contract to `to`.
    /// If `token` returns no value, non-reverting calls are assumed to be
    /// successful.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `token` - Address of the ERC-20 token contract.
    /// * `to` - Account to transfer tokens to.
    /// * `value` - Number of tokens to transfer.
    ///
    /// # Errors
    ///
    /// * [`Error::SafeErc20FailedOperation`] - If the `token` address is not a
    ///   contract, the contract fails to execute the call or the call returns
    ///   a value that is not `true`.
    fn safe_transfer(
        &mut self,
        token: Address,
        to: Address,
        value: U256,
    ) -> Result<(), Self::Error>;

    /// Transfer `value` amount of `token` from `from` to `to`, spending the
    /// approval given by `from` to the calling contract. If `token` returns
    /// no value, non-reverting calls are assumed to be successful.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `token` - Address of the ERC-20 token contract.
    /// * `from` - Account to transfer tokens from.
    /// * `to` - Account to transfer tokens to.
    /// * `value` - Number of tokens to transfer.
    ///
    /// # Errors
    ///
    /// * [`Error::SafeErc20FailedOperation`] - If the `token` address is not a
    ///   contract, the contract fails to execute the call or the call returns
    ///   a value that is not `true`.
    fn safe_transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), Self::Error>;
}

impl ISafeErc20 for SafeErc20 {
    type Error = Error;

    fn safe_transfer(
        &mut self,
        token: Address,
        to: Address,
        value: U256,
    ) -> Result<(), Self::Error> {
        let call = IErc20::transferCall { to, value };

        Self::call_optional_return(token, &call)
    }

    fn safe_transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), Self::Error> {
        let call = IErc20::transferFromCall { from, to, value };

        Self::call_optional_return(token, &call)
    }
}

impl SafeErc20 {
    /// Imitates a Stylus high-level call, relaxing the requirement on the
    /// return value: if data is returned, it must not be `false`, otherwise
    /// calls are assumed to be successful.
    ///
    /// # Arguments
    ///
    /// * `token` - Address of the ERC-20 token contract.
    /// * `call` - [`IErc20`] call that implements [`SolCall`] trait.
    ///
    /// # Errors
    ///
    /// * [`Error::SafeErc20FailedOperation`] - If the `token` address is not a
    ///   contract, the contract fails to execute the call or the call returns
    ///   a value that is not `true`.
    fn call_optional_return(
        token: Address,
        call: &impl SolCall,
    ) -> Result<(), Error> {
        if !token.has_code() {
            return Err(SafeErc20FailedOperation { token }.into());
        }

        match Self::raw_call(token, &call.abi_encode()) {
            Ok(data) if data.is_empty() || Self::encodes_true(&data) => Ok(()),
            _ => Err(SafeErc20FailedOperation { token }.into()),
        }
    }

    /// Calls `token` with at most one word of return data. With the
    /// `reentrant` feature, storage caches are flushed before the call.
    fn raw_call(token: Address, call_data: &[u8]) -> ArbResult {
        let call = RawCall::new().limit_return_data(0, 32);

        #[cfg(feature = "reentrant")]
        unsafe {
            call.flush_storage_cache().call(token, call_data)
        }
        #[cfg(not(feature = "reentrant"))]
        unsafe {
            call.call(token, call_data)
        }
    }

    /// Returns true if a slice of bytes is an ABI encoded `true` value.
    ///
    /// # Arguments
    ///
    /// * `data` - Slice of bytes.
    fn encodes_true(data: &[u8]) -> bool {
        data.split_last().is_some_and(|(last, rest)| {
            *last == 1 && rest.iter().all(|&byte| byte == 0)
        })
    }
}
