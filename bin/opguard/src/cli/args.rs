use crate::utils::{parse_address, parse_u256};
use clap::{value_parser, Parser};
use ethers::types::{Address, U256};
use opguard_primitives::{
    constants::validation::storage::{MAX_STRUCT_OFFSET, MAX_STRUCT_OFFSET_LIMIT},
    ValidationConfig,
};

/// Validation rules args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct ValidationArgs {
    /// Minimum stake (in wei) for an entity to count as staked.
    #[clap(long, default_value = "500000000000000000", value_parser=parse_u256)]
    pub min_stake: U256,

    /// Minimum unstake delay (in seconds) for an entity to count as staked.
    #[clap(long, default_value = "86400", value_parser=parse_u256)]
    pub min_unstake_delay: U256,

    /// How many slots below an accessed slot are searched for the base of a struct stored in a
    /// mapping.
    #[clap(
        long,
        default_value_t = MAX_STRUCT_OFFSET,
        value_parser = value_parser!(u64).range(..=MAX_STRUCT_OFFSET_LIMIT)
    )]
    pub max_struct_offset: u64,

    /// Contract the entry point calls to run the factory.
    #[clap(long, value_parser=parse_address)]
    pub sender_creator: Option<Address>,

    /// Entry point address, overrides the one of the fixture.
    #[clap(long, value_parser=parse_address)]
    pub entry_point: Option<Address>,
}

impl ValidationArgs {
    pub fn val_config(&self) -> ValidationConfig {
        ValidationConfig {
            min_stake: self.min_stake,
            min_unstake_delay: self.min_unstake_delay,
            max_struct_offset: self.max_struct_offset,
            sender_creator: self.sender_creator,
        }
    }
}
