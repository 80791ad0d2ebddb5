//! Unlocking schedule of escrowed deposits.
//!
//! A deposit unlocks on the schedule of the grant it is tied to: nothing
//! before the cliff ends, then linearly from the grant's `start` until
//! `start + duration`, when the whole deposit is unlocked. The cliff does not
//! release a separate amount: right after it ends, the unlocked amount is
//! `deposited * cliff / duration` rounded down.
//!
//! A revoked grant unlocks nothing, whatever the time and whatever had
//! already unlocked before the revocation.
use alloy_primitives::U256;

use super::grant::Grant;
use crate::utils::math::Math;

/// Returns the part of `deposited` that is unlocked at `now` under the
/// schedule of `grant`.
///
/// # Arguments
///
/// * `grant` - Grant the deposit is tied to.
/// * `deposited` - Amount held in the deposit.
/// * `now` - Point in time for which to compute the unlocked amount.
#[must_use]
pub fn unlocked_amount(grant: &Grant, deposited: U256, now: u64) -> U256 {
    if grant.revoked || now < grant.cliff_end() {
        return U256::ZERO;
    }

    if now >= grant.unlocking_end() {
        return deposited;
    }

    // `grant.start <= grant.cliff_end() <= now`.
    let elapsed = now - grant.start;

    // `elapsed < duration` here, so the quotient is below `deposited` and the
    // division by `duration` (non-zero, since `start + duration > now`)
    // always succeeds.
    deposited
        .checked_mul_div(U256::from(elapsed), U256::from(grant.duration))
        .unwrap_or(deposited)
}

/// Returns how much of an unlocked amount is still to be withdrawn.
///
/// Revocation can push the unlocked amount below what was already withdrawn,
/// in which case nothing is withdrawable.
///
/// # Arguments
///
/// * `unlocked` - Amount currently unlocked.
/// * `withdrawn` - Amount already withdrawn.
#[must_use]
pub fn withdrawable_amount(unlocked: U256, withdrawn: U256) -> U256 {
    unlocked.saturating_sub(withdrawn)
}
