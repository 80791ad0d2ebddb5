/*!
# Token Staking Escrow for Stylus

A custodial escrow for [Arbitrum Stylus] that holds granted tokens on behalf
of staking operators and releases them to the grant's beneficiary on the
grant's own vesting schedule.

Tokens enter the escrow only from the staking contract, through the token's
`approveAndCall` callback ([`escrow::ITokenStakingEscrow::receive_approval`]).
Each operator holds exactly one deposit, tied to a grant in an external
`TokenGrant` registry. The deposit unlocks linearly after the grant's cliff
and can be withdrawn in as many rounds as needed, either directly to the
grantee or, for managed grants, to the beneficiary resolved through a
second registry.

## Usage

Embed [`escrow::TokenStakingEscrow`] in an `#[entrypoint]` contract:

```ignore
use token_staking_escrow::escrow::{self, ITokenStakingEscrow, TokenStakingEscrow};

#[entrypoint]
#[storage]
struct Escrow {
    escrow: TokenStakingEscrow,
}

#[public]
#[implements(ITokenStakingEscrow<Error = escrow::Error>)]
impl Escrow {
    #[constructor]
    fn constructor(
        &mut self,
        token: Address,
        token_grant: Address,
        token_staking: Address,
        managed_grant_resolver: Address,
    ) -> Result<(), escrow::Error> {
        self.escrow.constructor(token, token_grant, token_staking, managed_grant_resolver)
    }
}
```

[Arbitrum Stylus]: https://docs.arbitrum.io/stylus/stylus-gentle-introduction
*/

#![allow(clippy::module_name_repetitions)]
#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![deny(rustdoc::broken_intra_doc_links)]
extern crate alloc;

pub mod escrow;
pub mod utils;
