//! Grants as seen by the escrow.
//!
//! The escrow never issues, modifies or revokes grants. It only reads the
//! vesting schedule of a grant through [`ITokenGrant::get_grant`] and, for
//! managed grants, asks [`IManagedGrantResolver::resolve_grantee`] for the
//! real beneficiary.
//!
//! [`ITokenGrant::get_grant`]: super::abi::ITokenGrant::get_grant
//! [`IManagedGrantResolver::resolve_grantee`]: super::abi::IManagedGrantResolver::resolve_grantee
use alloy_primitives::Address;

/// How the beneficiary of a grant is determined, and hence which withdrawal
/// path a deposit tied to it must use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantKind {
    /// The grantee recorded in the grant is the beneficiary.
    Direct,
    /// The grantee is resolved through the managed grant resolver.
    Managed,
}

/// Vesting schedule and status of an external grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grant {
    /// Grantee recorded in the registry.
    pub grantee: Address,
    /// Unix timestamp at which unlocking starts.
    pub start: u64,
    /// Seconds after `start` during which nothing is unlocked.
    pub cliff: u64,
    /// Seconds after `start` at which everything is unlocked.
    pub duration: u64,
    /// Whether the grant has been revoked.
    pub revoked: bool,
    /// Whether the grantee is an indirection to the real beneficiary.
    pub managed: bool,
}

impl Grant {
    /// Timestamp at which the cliff ends.
    #[must_use]
    pub fn cliff_end(&self) -> u64 {
        self.start.saturating_add(self.cliff)
    }

    /// Timestamp at which the whole grant is unlocked.
    #[must_use]
    pub fn unlocking_end(&self) -> u64 {
        self.start.saturating_add(self.duration)
    }

    /// Withdrawal path for deposits tied to this grant.
    #[must_use]
    pub fn kind(&self) -> GrantKind {
        if self.managed {
            GrantKind::Managed
        } else {
            GrantKind::Direct
        }
    }
}

impl From<(Address, u64, u64, u64, bool, bool)> for Grant {
    fn from(
        (grantee, start, cliff, duration, revoked, managed): (
            Address,
            u64,
            u64,
            u64,
            bool,
            bool,
        ),
    ) -> Self {
        Grant { grantee, start, cliff, duration, revoked, managed }
    }
}
