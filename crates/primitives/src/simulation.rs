//! Recorded execution of a user operation validation: instruction steps and the call-level
//! access records derived from them

use crate::constants::validation::{
    precompiles::{MAX_PRECOMPILE, P256_VERIFY},
    stake::{MIN_STAKE_VALUE, MIN_UNSTAKE_DELAY},
    storage::MAX_STRUCT_OFFSET,
};
use ethers::types::{Address, Bytes, H256, U256};
use lazy_static::lazy_static;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};
use strum_macros::Display;

/// Settings of a validation pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    /// Minimum stake (in wei) for an entity to count as staked
    pub min_stake: U256,
    /// Minimum unstake delay (in seconds) for an entity to count as staked
    pub min_unstake_delay: U256,
    /// How many slots below an accessed slot are searched for a recorded mapping entry, at most
    /// `MAX_STRUCT_OFFSET_LIMIT`
    pub max_struct_offset: u64,
    /// Helper contract the entry point calls to run the factory, frames below it belong to the
    /// factory
    pub sender_creator: Option<Address>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_stake: U256::from(MIN_STAKE_VALUE),
            min_unstake_delay: U256::from(MIN_UNSTAKE_DELAY),
            max_struct_offset: MAX_STRUCT_OFFSET,
            sender_creator: None,
        }
    }
}

/// An [EVM opcode](https://evm.codes), serialized as its byte.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[num_enum(error_type(name = UnknownOpcode, constructor = UnknownOpcode))]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Opcode {
    // 0x00 range - arithmetic
    #[default]
    STOP = 0x00,
    ADD,
    MUL,
    SUB,
    DIV,
    SDIV,
    MOD,
    SMOD,
    ADDMOD,
    MULMOD,
    EXP,
    SIGNEXTEND,

    // 0x10 range - comparison and bitwise logic
    LT = 0x10,
    GT,
    SLT,
    SGT,
    EQ,
    ISZERO,
    AND,
    OR,
    XOR,
    NOT,
    BYTE,
    SHL,
    SHR,
    SAR,

    KECCAK256 = 0x20,

    // 0x30 range - environment
    ADDRESS = 0x30,
    BALANCE,
    ORIGIN,
    CALLER,
    CALLVALUE,
    CALLDATALOAD,
    CALLDATASIZE,
    CALLDATACOPY,
    CODESIZE,
    CODECOPY,
    GASPRICE,
    EXTCODESIZE,
    EXTCODECOPY,
    RETURNDATASIZE,
    RETURNDATACOPY,
    EXTCODEHASH,

    // 0x40 range - block
    BLOCKHASH = 0x40,
    COINBASE,
    TIMESTAMP,
    NUMBER,
    PREVRANDAO,
    GASLIMIT,
    CHAINID,
    SELFBALANCE,
    BASEFEE,
    BLOBHASH,
    BLOBBASEFEE,

    // 0x50 range - stack, memory, storage and flow
    POP = 0x50,
    MLOAD,
    MSTORE,
    MSTORE8,
    SLOAD,
    SSTORE,
    JUMP,
    JUMPI,
    PC,
    MSIZE,
    GAS,
    JUMPDEST,
    TLOAD,
    TSTORE,
    MCOPY,
    PUSH0,

    PUSH1 = 0x60,
    PUSH2,
    PUSH3,
    PUSH4,
    PUSH5,
    PUSH6,
    PUSH7,
    PUSH8,
    PUSH9,
    PUSH10,
    PUSH11,
    PUSH12,
    PUSH13,
    PUSH14,
    PUSH15,
    PUSH16,
    PUSH17,
    PUSH18,
    PUSH19,
    PUSH20,
    PUSH21,
    PUSH22,
    PUSH23,
    PUSH24,
    PUSH25,
    PUSH26,
    PUSH27,
    PUSH28,
    PUSH29,
    PUSH30,
    PUSH31,
    PUSH32,

    DUP1 = 0x80,
    DUP2,
    DUP3,
    DUP4,
    DUP5,
    DUP6,
    DUP7,
    DUP8,
    DUP9,
    DUP10,
    DUP11,
    DUP12,
    DUP13,
    DUP14,
    DUP15,
    DUP16,

    SWAP1 = 0x90,
    SWAP2,
    SWAP3,
    SWAP4,
    SWAP5,
    SWAP6,
    SWAP7,
    SWAP8,
    SWAP9,
    SWAP10,
    SWAP11,
    SWAP12,
    SWAP13,
    SWAP14,
    SWAP15,
    SWAP16,

    LOG0 = 0xa0,
    LOG1,
    LOG2,
    LOG3,
    LOG4,

    // 0xf0 range - calls and creations
    CREATE = 0xf0,
    CALL,
    CALLCODE,
    RETURN,
    DELEGATECALL,
    CREATE2,

    STATICCALL = 0xfa,

    REVERT = 0xfd,
    INVALID,
    SELFDESTRUCT,
}

impl Opcode {
    /// CALL, CALLCODE, DELEGATECALL or STATICCALL
    pub fn is_call(&self) -> bool {
        matches!(*self, Self::CALL | Self::CALLCODE | Self::DELEGATECALL | Self::STATICCALL)
    }

    /// SLOAD, SSTORE and their transient storage counterparts
    pub fn is_storage_access(&self) -> bool {
        matches!(*self, Self::SLOAD | Self::SSTORE | Self::TLOAD | Self::TSTORE)
    }

    pub fn is_storage_write(&self) -> bool {
        matches!(*self, Self::SSTORE | Self::TSTORE)
    }

    /// EXTCODESIZE, EXTCODEHASH or EXTCODECOPY
    pub fn is_ext_code_access(&self) -> bool {
        matches!(*self, Self::EXTCODESIZE | Self::EXTCODEHASH | Self::EXTCODECOPY)
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode as u8
    }
}

/// A byte without a defined instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownOpcode(pub u8);

impl fmt::Display for UnknownOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UNKNOWN(0x{:02x})", self.0)
    }
}

impl std::error::Error for UnknownOpcode {}

lazy_static! {
    /// [OP-011] opcodes an entity may not use during validation
    pub static ref FORBIDDEN_OPCODES: HashSet<Opcode> = HashSet::from([
        Opcode::GASPRICE,
        Opcode::GASLIMIT,
        Opcode::PREVRANDAO,
        Opcode::TIMESTAMP,
        Opcode::BASEFEE,
        Opcode::BLOCKHASH,
        Opcode::NUMBER,
        Opcode::SELFBALANCE,
        Opcode::BALANCE,
        Opcode::ORIGIN,
        Opcode::GAS,
        Opcode::CREATE,
        Opcode::COINBASE,
        Opcode::INVALID,
        Opcode::SELFDESTRUCT,
    ]);
}

/// Whether the address is a precompiled contract (which has no code but may be called)
pub fn is_precompile(address: &Address) -> bool {
    let addr = U256::from_big_endian(address.as_bytes());
    (!addr.is_zero() && addr <= U256::from(MAX_PRECOMPILE)) || addr == U256::from(P256_VERIFY)
}

/// One executed instruction of the validation call
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    /// Address whose storage and balance are in context (the caller's for DELEGATECALL frames)
    pub contract: Address,
    pub opcode: Opcode,
    /// Call stack depth
    pub depth: u64,
    /// Operand stack before the instruction executes, the top of the stack is the last element
    #[serde(default)]
    pub stack: Vec<U256>,
    /// Memory region the instruction reads (call data for calls, init code for creations, the
    /// preimage for KECCAK256)
    #[serde(default)]
    pub memory_input: Bytes,
    /// The instruction aborted because gas ran out
    #[serde(default)]
    pub is_out_of_gas: bool,
}

impl TraceStep {
    /// The `n`-th element from the top of the operand stack
    pub fn peek(&self, n: usize) -> Option<U256> {
        self.stack.len().checked_sub(n + 1).map(|idx| self.stack[idx])
    }

    /// The `n`-th element from the top of the operand stack as a word, zero if the stack is
    /// shorter
    pub fn peek_word(&self, n: usize) -> H256 {
        let mut word = H256::zero();
        if let Some(v) = self.peek(n) {
            v.to_big_endian(word.as_bytes_mut());
        }
        word
    }

    /// The `n`-th element from the top of the operand stack as an address, zero if the stack is
    /// shorter
    pub fn peek_address(&self, n: usize) -> Address {
        Address::from(self.peek_word(n))
    }
}

impl fmt::Debug for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceStep")
            .field("contract", &self.contract)
            .field("opcode", &self.opcode)
            .field("depth", &self.depth)
            .field("stack_len", &self.stack.len())
            .field("is_out_of_gas", &self.is_out_of_gas)
            .finish()
    }
}

/// Kind of a call frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallKind {
    Call,
    DelegateCall,
    CallCode,
    StaticCall,
    Create,
}

impl CallKind {
    /// The kind of frame an instruction opens, `None` for instructions that do not open one
    pub fn from_opcode(opcode: Opcode) -> Option<Self> {
        match opcode {
            Opcode::CALL => Some(CallKind::Call),
            Opcode::DELEGATECALL => Some(CallKind::DelegateCall),
            Opcode::CALLCODE => Some(CallKind::CallCode),
            Opcode::STATICCALL => Some(CallKind::StaticCall),
            Opcode::CREATE | Opcode::CREATE2 => Some(CallKind::Create),
            _ => None,
        }
    }

    /// Whether the instruction opening this kind of frame takes a value operand
    pub fn transfers_value(&self) -> bool {
        matches!(self, CallKind::Call | CallKind::CallCode | CallKind::Create)
    }
}

/// A storage read or write inside a call frame
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccess {
    /// Contract owning the storage
    pub account: Address,
    pub slot: H256,
    pub previous_value: H256,
    pub new_value: H256,
    pub is_write: bool,
}

/// Call-level record of one frame opened during validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAccess {
    /// Callee (the created contract for creations)
    pub account: Address,
    /// Contract that opened the frame
    pub accessor: Address,
    pub kind: CallKind,
    pub value: U256,
    /// Call data, or init code for creations
    pub data: Bytes,
    /// Depth of the instruction that opened the frame
    pub depth: u64,
    pub storage_accesses: Vec<StorageAccess>,
}
