//! Consolidated Solidity interfaces of the escrow's collaborators.
//!
//! All of them are defined with [`stylus_sdk::prelude::sol_interface`], which
//! enables invoking functions directly on the deployed collaborator
//! contracts:
//! - [`ITokenGrant`] - the grant registry that owns vesting schedules;
//! - [`IManagedGrantResolver`] - the registry resolving the real beneficiary
//!   of a managed grant.
//!
//! Transfers of the held token go through [`crate::utils::safe_erc20`].

#![allow(missing_docs)]
#![cfg_attr(coverage_nightly, coverage(off))]

pub use callable::*;

mod callable {
    #![allow(missing_docs)]
    #![cfg_attr(coverage_nightly, coverage(off))]

    use alloc::vec;

    use stylus_sdk::prelude::sol_interface;

    sol_interface! {
        /// Grant registry.
        ///
        /// `getGrant` returns `(grantee, start, cliff, duration, revoked,
        /// managed)`, where `cliff` and `duration` are durations in seconds
        /// counted from `start`.
        interface ITokenGrant {
            function exists(uint256 id) external view returns (bool);
            function getGrant(uint256 id) external view returns (address, uint64, uint64, uint64, bool, bool);
        }
    }

    sol_interface! {
        /// Resolves the beneficiary of a managed grant.
        interface IManagedGrantResolver {
            function resolveGrantee(uint256 id) external view returns (address);
        }
    }
}
