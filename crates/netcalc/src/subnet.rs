//! Subnet pool arithmetic
//!
//! An allocation pool is described by a base IPv4 address, the prefix
//! length of the whole pool (`subnet_len`) and the prefix length of each
//! allocated subnet (`alloc_subnet_len`). The pool then holds
//! `2^(alloc_subnet_len - subnet_len)` allocatable subnets, and every
//! allocation index maps to exactly one subnet address:
//!
//! ```text
//! addr(index) = base + (index << (32 - alloc_subnet_len))
//! ```
//!
//! `subnet_ip` and `subnet_index` are exact inverses of each other.

use std::net::Ipv4Addr;

use crate::error::NetCalcError;

/// Validated pool parameters: (masked base address, capacity, per-subnet shift)
fn pool_params(
    pool: &str,
    subnet_len: u32,
    alloc_subnet_len: u32,
) -> Result<(u32, u64, u32), NetCalcError> {
    if subnet_len > alloc_subnet_len || alloc_subnet_len > 32 {
        return Err(NetCalcError::InvalidPrefixLengths {
            subnet_len,
            alloc_subnet_len,
        });
    }

    let base_ip: Ipv4Addr = pool
        .parse()
        .map_err(|_| NetCalcError::InvalidPoolAddress(pool.to_string()))?;

    // Strip host bits so an off-base pool address cannot skew the mapping
    let mask = prefix_mask(subnet_len);
    let base = u32::from(base_ip) & mask;
    let capacity = 1u64 << (alloc_subnet_len - subnet_len);
    let shift = 32 - alloc_subnet_len;

    Ok((base, capacity, shift))
}

fn prefix_mask(len: u32) -> u32 {
    if len == 0 { 0 } else { u32::MAX << (32 - len) }
}

/// Map an allocation index to the dotted address of its subnet.
pub fn subnet_ip(
    pool: &str,
    subnet_len: u32,
    alloc_subnet_len: u32,
    index: u32,
) -> Result<String, NetCalcError> {
    let (base, capacity, shift) = pool_params(pool, subnet_len, alloc_subnet_len)?;

    if u64::from(index) >= capacity {
        return Err(NetCalcError::IndexOutOfRange { index, capacity });
    }

    // index < capacity keeps the sum within 32 bits
    let addr = u64::from(base) + (u64::from(index) << shift);
    Ok(Ipv4Addr::from(addr as u32).to_string())
}

/// Map a subnet address back to its allocation index.
///
/// Fails when the address lies outside the pool or is not aligned to an
/// allocation boundary.
pub fn subnet_index(
    pool: &str,
    subnet_len: u32,
    alloc_subnet_len: u32,
    addr: &str,
) -> Result<u32, NetCalcError> {
    let (base, _capacity, shift) = pool_params(pool, subnet_len, alloc_subnet_len)?;

    let ip: Ipv4Addr = addr
        .parse()
        .map_err(|_| NetCalcError::InvalidPoolAddress(addr.to_string()))?;
    let ip_num = u32::from(ip);

    let not_in_pool = || NetCalcError::AddressNotInPool {
        addr: addr.to_string(),
        pool: pool.to_string(),
        subnet_len,
    };

    if ip_num & prefix_mask(subnet_len) != base {
        return Err(not_in_pool());
    }

    let offset = u64::from(ip_num - base);
    let block = 1u64 << shift;
    if offset % block != 0 {
        return Err(not_in_pool());
    }

    Ok((offset >> shift) as u32)
}
