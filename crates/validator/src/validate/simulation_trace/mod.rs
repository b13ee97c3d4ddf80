pub mod call_stack;
pub mod external_contracts;
pub mod gas;
pub mod opcodes;
pub mod storage_access;
