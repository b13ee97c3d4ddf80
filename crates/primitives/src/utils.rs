//! Misc utils

use ethers::{
    types::{Address, H256},
    utils::to_checksum,
};

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// If possible, parses address from the first 20 bytes
///
/// Only buffers carrying more than the address itself (`initCode` = factory ∥ calldata,
/// `paymasterAndData` = paymaster ∥ data) yield an address.
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() > 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Left pads an address to a 32-byte word, the form in which addresses appear as storage slots and
/// mapping keys
pub fn address_to_word(address: &Address) -> H256 {
    H256::from(*address)
}

/// Takes the low 20 bytes of a word as an address
pub fn word_to_address(word: &H256) -> Address {
    Address::from(*word)
}
