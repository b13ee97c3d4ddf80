//! End to end tests of the validation rules over synthetic validation call traces.

pub mod common;

#[cfg(test)]
mod calls_tests;
#[cfg(test)]
mod fixture_tests;
#[cfg(test)]
mod opcodes_tests;
