use ethers::{
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use opguard_primitives::{
    constants::validation::stake::{MIN_STAKE_VALUE, MIN_UNSTAKE_DELAY},
    Opcode, TraceStep, UserOperation, ValidationConfig,
};
use opguard_validator::{validate, MemoryState, ValidationOutcome, ValidationResult};

pub const ENTRY_POINT: u64 = 0xe9;
pub const SENDER_CREATOR: u64 = 0x5c;
pub const ACCOUNT: u64 = 0xacc;
pub const FACTORY: u64 = 0xfac;
pub const PAYMASTER: u64 = 0x9a7;
pub const TOKEN: u64 = 0x70c;

pub fn addr(a: u64) -> Address {
    Address::from_low_u64_be(a)
}

pub fn word(a: Address) -> U256 {
    U256::from_big_endian(a.as_bytes())
}

pub fn slot_word(slot: H256) -> U256 {
    U256::from_big_endian(slot.as_bytes())
}

/// A user operation and the state its validation call is traced against
pub struct TestContext {
    pub uo: UserOperation,
    pub entry_point: Address,
    pub state: MemoryState,
    pub val_config: ValidationConfig,
}

impl TestContext {
    /// An already deployed account paying for itself, the entry point and a token have code
    pub fn new() -> Self {
        Self {
            uo: UserOperation { sender: addr(ACCOUNT), ..Default::default() },
            entry_point: addr(ENTRY_POINT),
            state: MemoryState::new()
                .with_code(addr(ENTRY_POINT))
                .with_code(addr(TOKEN))
                .with_label(addr(TOKEN), "token"),
            val_config: ValidationConfig {
                sender_creator: Some(addr(SENDER_CREATOR)),
                ..Default::default()
            },
        }
    }

    pub fn with_paymaster(mut self, staked: bool) -> Self {
        self.uo.paymaster_and_data = [addr(PAYMASTER).as_bytes(), &[0x01u8][..]].concat().into();
        self.state.set_code(addr(PAYMASTER));
        if staked {
            self.stake(PAYMASTER);
        }
        self
    }

    pub fn with_factory(mut self, staked: bool) -> Self {
        self.uo.init_code = [addr(FACTORY).as_bytes(), &[0x02u8][..]].concat().into();
        self.state.set_code(addr(FACTORY));
        self.state.set_code(addr(SENDER_CREATOR));
        if staked {
            self.stake(FACTORY);
        }
        self
    }

    pub fn stake(&mut self, entity: u64) {
        self.state.set_stake(
            addr(entity),
            U256::from(MIN_STAKE_VALUE),
            U256::from(MIN_UNSTAKE_DELAY),
        );
    }

    pub fn validate(&self, trace: &[TraceStep]) -> ValidationResult<ValidationOutcome> {
        validate(&self.uo, &self.entry_point, trace, &self.state, self.val_config.clone())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the trace of a validation call made to the entry point.
pub struct TraceBuilder {
    steps: Vec<TraceStep>,
    /// Executing contract of every open frame, the entry point's frame first
    frames: Vec<Address>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self { steps: vec![], frames: vec![addr(ENTRY_POINT)] }
    }

    fn contract(&self) -> Address {
        self.frames.last().copied().unwrap_or_default()
    }

    /// Adds a step of the current frame, `stack` given bottom first
    pub fn op(&mut self, opcode: Opcode, stack: &[U256]) -> &mut Self {
        self.steps.push(TraceStep {
            contract: self.contract(),
            opcode,
            depth: self.frames.len() as u64,
            stack: stack.to_vec(),
            ..Default::default()
        });
        self
    }

    fn call_step(&mut self, to: Address, value: U256, input: &[u8]) -> &mut Self {
        self.op(Opcode::CALL, &[U256::zero(), U256::zero(), value, word(to), U256::from(100_000)]);
        if let Some(step) = self.steps.last_mut() {
            step.memory_input = Bytes::from(input.to_vec());
        }
        self
    }

    /// Leaves every nested frame and lets the entry point call `entity`
    pub fn phase(&mut self, entity: u64) -> &mut Self {
        self.frames.truncate(1);
        self.call_step(addr(entity), U256::zero(), &[]);
        self.frames.push(addr(entity));
        self
    }

    /// Calls `to` from the current frame and enters the callee
    pub fn enter(&mut self, to: u64) -> &mut Self {
        self.call_step(addr(to), U256::zero(), &[]);
        self.frames.push(addr(to));
        self
    }

    pub fn leave(&mut self) -> &mut Self {
        self.frames.pop();
        self
    }

    /// Calls `to` without entering the callee
    pub fn call(&mut self, to: u64, value: u64, input: &[u8]) -> &mut Self {
        self.call_step(addr(to), U256::from(value), input)
    }

    pub fn sload(&mut self, slot: H256, value: u64) -> &mut Self {
        self.op(Opcode::SLOAD, &[slot_word(slot)]);
        self.op(Opcode::PUSH1, &[U256::from(value)])
    }

    pub fn sstore(&mut self, slot: H256, value: u64) -> &mut Self {
        self.op(Opcode::SSTORE, &[U256::from(value), slot_word(slot)])
    }

    /// Hashes `key ∥ parent_slot` like a mapping access and returns the resulting slot
    pub fn keccak(&mut self, key: H256, parent_slot: H256) -> H256 {
        let preimage = [key.as_bytes(), parent_slot.as_bytes()].concat();
        let slot = H256::from(keccak256(&preimage));
        self.op(Opcode::KECCAK256, &[U256::from(64), U256::zero()]);
        if let Some(step) = self.steps.last_mut() {
            step.memory_input = Bytes::from(preimage);
        }
        slot
    }

    pub fn build(&self) -> Vec<TraceStep> {
        self.steps.clone()
    }
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
