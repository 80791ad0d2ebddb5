//! Common utilities shared by the escrow contracts.
pub mod math;
pub mod safe_erc20;
