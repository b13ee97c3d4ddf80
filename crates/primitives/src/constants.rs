//! Account abstraction (ERC-4337)-related constants

/// Entry point smart contract
pub mod entry_point {
    /// Address of the entry point smart contract
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Version of the entry point smart contract
    pub const VERSION: &str = "0.6.0";
    /// Selector of `depositTo(address)`, the only entry point method entities may call
    pub const DEPOSIT_TO_SELECTOR: [u8; 4] = [0xb7, 0x60, 0xfa, 0xf9];
}

/// User operation validation
pub mod validation {
    /// Staking
    /// https://github.com/eth-infinitism/account-abstraction/blob/develop/erc/ERCS/erc-7562.md#constants
    pub mod stake {
        /// Minimum unstake delay (in seconds) for an entity to count as staked
        pub const MIN_UNSTAKE_DELAY: u64 = 86400;
        /// Minimum stake (in wei) for an entity to count as staked, 0.5 native token units
        pub const MIN_STAKE_VALUE: u128 = 500_000_000_000_000_000;
    }

    /// Storage slot resolution
    pub mod storage {
        /// How many slots below an accessed slot are searched for the base of a mapping value
        /// (recovers fields of structs stored in mappings)
        pub const MAX_STRUCT_OFFSET: u64 = 128;
        /// Upper limit accepted for the struct offset search, larger bounds are clamped to it
        pub const MAX_STRUCT_OFFSET_LIMIT: u64 = 1024;
    }

    /// Precompiled contracts
    pub mod precompiles {
        /// Highest address of the consecutive block of precompiles starting at `0x01`
        pub const MAX_PRECOMPILE: u64 = 0x11;
        /// secp256r1 signature verification precompile (RIP-7212)
        pub const P256_VERIFY: u64 = 0x100;
    }
}
