#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
extern crate alloc;

use alloc::vec::Vec;

use alloy_primitives::{Address, U256};
use stylus_sdk::{abi::Bytes, prelude::*};
use token_staking_escrow::escrow::{
    self, ITokenStakingEscrow, TokenStakingEscrow,
};

#[entrypoint]
#[storage]
struct TokenStakingEscrowExample {
    escrow: TokenStakingEscrow,
}

#[public]
#[implements(ITokenStakingEscrow<Error = escrow::Error>)]
impl TokenStakingEscrowExample {
    #[constructor]
    pub fn constructor(
        &mut self,
        token: Address,
        token_grant: Address,
        token_staking: Address,
        managed_grant_resolver: Address,
    ) -> Result<(), escrow::Error> {
        self.escrow.constructor(
            token,
            token_grant,
            token_staking,
            managed_grant_resolver,
        )
    }
}

#[public]
impl ITokenStakingEscrow for TokenStakingEscrowExample {
    type Error = escrow::Error;

    fn token(&self) -> Address {
        self.escrow.token()
    }

    fn token_grant(&self) -> Address {
        self.escrow.token_grant()
    }

    fn token_staking(&self) -> Address {
        self.escrow.token_staking()
    }

    fn managed_grant_resolver(&self) -> Address {
        self.escrow.managed_grant_resolver()
    }

    fn deposited_amount(&self, operator: Address) -> U256 {
        self.escrow.deposited_amount(operator)
    }

    fn withdrawn_amount(&self, operator: Address) -> U256 {
        self.escrow.withdrawn_amount(operator)
    }

    fn available_amount(&self, operator: Address) -> U256 {
        self.escrow.available_amount(operator)
    }

    fn deposit_grant_id(&self, operator: Address) -> U256 {
        self.escrow.deposit_grant_id(operator)
    }

    fn has_deposit(&self, operator: Address) -> bool {
        self.escrow.has_deposit(operator)
    }

    fn withdrawable(
        &mut self,
        operator: Address,
    ) -> Result<U256, Self::Error> {
        self.escrow.withdrawable(operator)
    }

    fn withdraw(&mut self, operator: Address) -> Result<U256, Self::Error> {
        self.escrow.withdraw(operator)
    }

    fn withdraw_to_managed_grantee(
        &mut self,
        operator: Address,
    ) -> Result<U256, Self::Error> {
        self.escrow.withdraw_to_managed_grantee(operator)
    }

    fn receive_approval(
        &mut self,
        from: Address,
        value: U256,
        token: Address,
        extra_data: Bytes,
    ) -> Result<(), Self::Error> {
        self.escrow.receive_approval(from, value, token, extra_data)
    }
}
