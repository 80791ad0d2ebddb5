//! Standard math utilities missing in `alloy_primitives`.
use alloy_primitives::{U256, U512};

/// Trait for standard math utilities missing in `alloy_primitives`.
pub trait Math: Sized {
    /// Calculates floor(`self` * `y` / `denominator`) with full precision.
    ///
    /// The product is computed in 512 bits, so the multiplication itself
    /// never overflows. Returns `None` if `denominator` is zero or the
    /// quotient does not fit into `Self`.
    ///
    /// # Arguments
    ///
    /// * `self` - first factor of the product.
    /// * `y` - second factor of the product.
    /// * `denominator` - denominator of the division.
    #[must_use]
    fn checked_mul_div(self, y: Self, denominator: Self) -> Option<Self>;
}

impl Math for U256 {
    fn checked_mul_div(self, y: Self, denominator: Self) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }

        // `U256::MAX * U256::MAX < U512::MAX`.
        let prod = U512::from(self).checked_mul(U512::from(y))?;
        let quotient = prod / U512::from(denominator);

        if quotient > U512::from(U256::MAX) {
            None
        } else {
            Some(U256::from(quotient))
        }
    }
}
