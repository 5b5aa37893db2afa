//! Mesh address codec.
//!
//! A node's IPv6 address is derived from its ed25519 public key. The key
//! is bit-inverted so that keys with more leading zero bits (harder to
//! generate) map to addresses with a larger "ones" count:
//!
//! ```text
//! byte 0      0x02 (address) or 0x03 (subnet)
//! byte 1      number of leading 1 bits in !key
//! byte 2..16  the bits of !key following the first 0 bit
//! ```
//!
//! The subnet is the first 8 address bytes with the low prefix bit set.
//! Only a prefix of the key survives, so the reverse direction yields a
//! partial key suitable for lookups, not the original key.

use std::fmt;
use std::net::Ipv6Addr;

/// ed25519 public key length.
pub const PUBLIC_KEY_SIZE: usize = 32;

pub type PublicKey = [u8; PUBLIC_KEY_SIZE];

/// First byte of every node address.
pub const ADDRESS_PREFIX: u8 = 0x02;

/// First byte of every routed subnet.
pub const SUBNET_PREFIX: u8 = ADDRESS_PREFIX | 0x01;

/// A node's /128.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshAddress(pub [u8; 16]);

/// A node's /64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshSubnet(pub [u8; 8]);

impl MeshAddress {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0[0] == ADDRESS_PREFIX
    }

    #[inline]
    pub fn to_ipv6(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.0)
    }
}

impl MeshSubnet {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0[0] == SUBNET_PREFIX
    }

    /// Network address of the /64.
    pub fn to_ipv6(&self) -> Ipv6Addr {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.0);
        Ipv6Addr::from(bytes)
    }
}

impl fmt::Display for MeshAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_ipv6(), f)
    }
}

impl fmt::Display for MeshSubnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/64", self.to_ipv6())
    }
}

#[inline]
fn bit_at(bytes: &[u8], idx: usize) -> u8 {
    (bytes[idx / 8] >> (7 - idx % 8)) & 1
}

/// Derive the node address for `key`.
pub fn address_from_key(key: &PublicKey) -> MeshAddress {
    let mut inverted = *key;
    for b in inverted.iter_mut() {
        *b = !*b;
    }

    let mut addr = [0u8; 16];
    addr[0] = ADDRESS_PREFIX;

    // Wraps like a u8 counter; only an all-zero key reaches 256.
    let mut ones: u8 = 0;
    let mut idx = 0;
    while idx < PUBLIC_KEY_SIZE * 8 && bit_at(&inverted, idx) == 1 {
        ones = ones.wrapping_add(1);
        idx += 1;
    }
    addr[1] = ones;
    // Skip the terminating zero bit.
    idx += 1;

    let mut out = 2;
    let mut acc: u8 = 0;
    let mut bits = 0;
    while idx < PUBLIC_KEY_SIZE * 8 && out < addr.len() {
        acc = (acc << 1) | bit_at(&inverted, idx);
        bits += 1;
        if bits == 8 {
            addr[out] = acc;
            out += 1;
            acc = 0;
            bits = 0;
        }
        idx += 1;
    }

    MeshAddress(addr)
}

/// Derive the routed /64 for `key`.
pub fn subnet_from_key(key: &PublicKey) -> MeshSubnet {
    let addr = address_from_key(key);
    let mut subnet = [0u8; 8];
    subnet.copy_from_slice(&addr.0[..8]);
    subnet[0] |= 0x01;
    MeshSubnet(subnet)
}

/// Recover the key prefix an address was derived from.
///
/// Bits the address could not carry come back as 1s (the inversion of
/// zero), so only the leading `16 + ones` bits are meaningful.
pub fn partial_key_from_address(addr: &MeshAddress) -> PublicKey {
    let mut key = [0u8; PUBLIC_KEY_SIZE];
    let ones = addr.0[1] as usize;

    for idx in 0..ones {
        key[idx / 8] |= 0x80 >> (idx % 8);
    }

    // Prefix and ones-count bytes.
    let addr_offset = 16;
    let key_offset = ones + 1;
    for idx in addr_offset..addr.0.len() * 8 {
        let key_idx = key_offset + (idx - addr_offset);
        if key_idx >= PUBLIC_KEY_SIZE * 8 {
            break;
        }
        key[key_idx / 8] |= bit_at(&addr.0, idx) << (7 - key_idx % 8);
    }

    for b in key.iter_mut() {
        *b = !*b;
    }
    key
}

/// As [`partial_key_from_address`], for a subnet.
pub fn partial_key_from_subnet(subnet: &MeshSubnet) -> PublicKey {
    let mut addr = [0u8; 16];
    addr[..8].copy_from_slice(&subnet.0);
    addr[0] = ADDRESS_PREFIX;
    partial_key_from_address(&MeshAddress(addr))
}
