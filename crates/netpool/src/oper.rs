//! Tenant-global operational state (allocatable pools)
//!
//! One [`GlobalOper`] record per tenant owns the four allocation pools. A
//! set bit means the id is free, a cleared bit means it is allocated; every
//! allocation is first-fit and every free is idempotent.
//!
//! Callers must serialize access per tenant record and persist explicitly
//! after each successful mutation ("mutate then persist"). See the crate
//! docs for the concurrency contract.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use netcalc::{TagKind, TagRange, parse_tag_ranges, subnet_index, subnet_ip};
use statestore::StateDriver;

use crate::bitset::BitPool;
use crate::config::NET_TYPE_VXLAN;
use crate::error::PoolError;

/// Key prefix under which every tenant's operational record lives
pub const OPER_GLOBAL_PREFIX: &str = "/netpool/oper/global/";

/// VLAN ids occupy a 12-bit space (4096 ids)
const VLAN_SPACE_BITS: u32 = 12;
/// The VXLAN pool is a fixed window of 2^14 entries regardless of range
const VXLAN_SPACE_BITS: u32 = 14;

/// VLAN ids the 802.1Q standard reserves; never allocatable from any pool
const RESERVED_VLANS: [u32; 2] = [0, 4095];

/// VXLAN window used when no explicit range is configured
const DEFAULT_VXLAN_WINDOW: TagRange = TagRange {
    min: 10000,
    max: 26000,
};

/// One tenant's live allocation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalOper {
    /// Tenant this record belongs to (identity key)
    pub tenant: String,
    /// Deployment's default network type ("vlan" or "vxlan")
    pub default_net_type: String,
    /// IPv4 base address of the subnet allocation pool
    pub subnet_pool: String,
    /// Prefix length of the whole pool
    pub subnet_len: u32,
    /// Prefix length of each allocated subnet
    pub alloc_subnet_len: u32,
    /// Free subnet indexes
    pub free_subnets: BitPool,
    /// Free shared/global VLAN ids
    pub free_vlans: BitPool,
    /// Free host-local VLAN ids, derived from the shared set at
    /// initialization
    pub free_local_vlans: BitPool,
    /// Real VXLAN id of bit 0 in `free_vxlans`
    pub free_vxlans_start: u32,
    /// Free VXLAN ids, as offsets from `free_vxlans_start`
    pub free_vxlans: BitPool,
}

/// Strip the standard-reserved VLAN ids from a pool
fn clear_reserved_vlans(pool: &mut BitPool) {
    for vlan in RESERVED_VLANS {
        pool.clear(vlan as usize);
    }
}

/// Split the non-reserved VLAN space into local and shared pools.
///
/// In a pure-VXLAN deployment with no explicit VLAN carve-out the entire
/// non-reserved space doubles as local-VLAN space, and the shared pool
/// becomes its complement (reserved ids re-stripped). In every other case
/// the local pool is exactly the complement of the shared pool, so the two
/// partition the id space.
fn derive_local_vlan_pools(
    shared_vlans: BitPool,
    explicit_vlan_range: bool,
    default_net_type: &str,
) -> (BitPool, BitPool) {
    if default_net_type == NET_TYPE_VXLAN && !explicit_vlan_range {
        let local = shared_vlans.clone();
        let mut shared = shared_vlans.complement();
        clear_reserved_vlans(&mut shared);
        (local, shared)
    } else {
        let mut local = shared_vlans.complement();
        clear_reserved_vlans(&mut local);
        (local, shared_vlans)
    }
}

fn oper_key(tenant: &str) -> String {
    format!("{OPER_GLOBAL_PREFIX}{tenant}")
}

impl GlobalOper {
    /// Initialize the shared VLAN pool from a configured range string.
    ///
    /// An empty range string makes the whole non-reserved space (1-4094)
    /// available; an explicit range restricts the pool to exactly those ids.
    pub(crate) fn init_vlan_pool(&mut self, vlans: &str) -> Result<(), PoolError> {
        let mut pool = BitPool::new(1 << VLAN_SPACE_BITS);

        let ranges = if vlans.trim().is_empty() {
            vec![TagRange { min: 1, max: 4094 }]
        } else {
            parse_tag_ranges(vlans, TagKind::Vlan)?
        };
        for range in ranges {
            for vlan in range.min..=range.max {
                pool.set(vlan as usize);
            }
        }
        clear_reserved_vlans(&mut pool);

        self.free_vlans = pool;
        Ok(())
    }

    /// Initialize the VXLAN pool and derive the local-VLAN pool.
    ///
    /// Must run after [`Self::init_vlan_pool`]: the local-VLAN derivation
    /// consumes the shared pool that call produced.
    pub(crate) fn init_vxlan_pool(&mut self, vxlans: &str, vlans: &str) -> Result<(), PoolError> {
        self.free_vxlans = BitPool::new(1 << VXLAN_SPACE_BITS);

        let shared = std::mem::replace(&mut self.free_vlans, BitPool::new(0));
        let explicit_vlan_range = !vlans.trim().is_empty();
        let (local, shared) =
            derive_local_vlan_pools(shared, explicit_vlan_range, &self.default_net_type);
        self.free_local_vlans = local;
        self.free_vlans = shared;

        // The window is the first configured range; an empty range string
        // selects the default window
        let window = parse_tag_ranges(vxlans, TagKind::Vxlan)?
            .first()
            .copied()
            .unwrap_or(DEFAULT_VXLAN_WINDOW);

        self.free_vxlans_start = window.min;
        for vxlan in window.min..=window.max {
            self.free_vxlans.set((vxlan - window.min) as usize);
        }

        Ok(())
    }

    // --- shared VLANs ---

    /// Allocate the lowest free shared VLAN id
    pub fn alloc_vlan(&mut self) -> Result<u32, PoolError> {
        let Some(vlan) = self.free_vlans.next_set(0) else {
            return Err(PoolError::NoVlansAvailable);
        };
        self.free_vlans.clear(vlan);
        Ok(vlan as u32)
    }

    /// Return a shared VLAN id to the pool; freeing a free id is a no-op
    pub fn free_vlan(&mut self, vlan: u32) {
        self.free_vlans.set(vlan as usize);
    }

    /// Check that `vlan` is still free for explicit reservation
    pub fn check_vlan_in_use(&self, vlan: u32) -> Result<(), PoolError> {
        if self.free_vlans.test(vlan as usize) {
            Ok(())
        } else {
            Err(PoolError::VlanNotAvailable(vlan))
        }
    }

    /// Reserve a specific shared VLAN id instead of the first-fit choice
    pub fn set_vlan(&mut self, vlan: u32) -> Result<(), PoolError> {
        self.check_vlan_in_use(vlan)?;
        self.free_vlans.clear(vlan as usize);
        Ok(())
    }

    // --- local VLANs ---

    /// Allocate the lowest free local VLAN id
    pub fn alloc_local_vlan(&mut self) -> Result<u32, PoolError> {
        let Some(vlan) = self.free_local_vlans.next_set(0) else {
            return Err(PoolError::NoLocalVlansAvailable);
        };
        self.free_local_vlans.clear(vlan);
        Ok(vlan as u32)
    }

    /// Return a local VLAN id to the pool; freeing a free id is a no-op
    pub fn free_local_vlan(&mut self, vlan: u32) {
        self.free_local_vlans.set(vlan as usize);
    }

    // --- VXLANs ---

    /// Allocate a VXLAN id together with its local VLAN id, all-or-nothing.
    ///
    /// Both first-fit lookups happen before either pool is touched, so an
    /// exhausted local-VLAN pool cannot leak a half-allocated VXLAN id (or
    /// vice versa). Returns `(vxlan, local_vlan)`.
    pub fn alloc_vxlan(&mut self) -> Result<(u32, u32), PoolError> {
        let Some(vxlan_bit) = self.free_vxlans.next_set(0) else {
            return Err(PoolError::NoVxlansAvailable);
        };
        let Some(local_vlan) = self.free_local_vlans.next_set(0) else {
            return Err(PoolError::NoLocalVlansAvailable);
        };

        self.free_local_vlans.clear(local_vlan);
        self.free_vxlans.clear(vxlan_bit);

        Ok((vxlan_bit as u32 + self.free_vxlans_start, local_vlan as u32))
    }

    /// Return a VXLAN id and its local VLAN id to their pools.
    ///
    /// Idempotent per pool. A vxlan id below the pool window start cannot
    /// belong to this record; it is logged and skipped while the local VLAN
    /// is still freed.
    pub fn free_vxlan(&mut self, vxlan: u32, local_vlan: u32) {
        self.free_local_vlans.set(local_vlan as usize);

        if vxlan < self.free_vxlans_start {
            warn!(
                "vxlan {vxlan} is below the pool window start {} for tenant {}",
                self.free_vxlans_start, self.tenant
            );
            return;
        }
        self.free_vxlans.set((vxlan - self.free_vxlans_start) as usize);
    }

    // --- subnets ---

    /// Allocate the lowest free subnet and return its dotted base address.
    ///
    /// The pool bit is cleared only after the index converts to an address,
    /// so a conversion failure leaves the pool unchanged.
    pub fn alloc_subnet(&mut self) -> Result<String, PoolError> {
        let Some(index) = self.free_subnets.next_set(0) else {
            debug!(
                "subnet pool exhausted for tenant {}: 0 of {} free",
                self.tenant,
                self.free_subnets.capacity()
            );
            return Err(PoolError::SubnetExhausted);
        };

        let addr = subnet_ip(
            &self.subnet_pool,
            self.subnet_len,
            self.alloc_subnet_len,
            index as u32,
        )?;

        self.free_subnets.clear(index);
        Ok(addr)
    }

    /// Return an allocated subnet to the pool by its dotted base address.
    ///
    /// An address that does not resolve to a pool index aborts the free
    /// with an error and mutates nothing.
    pub fn free_subnet(&mut self, subnet_addr: &str) -> Result<(), PoolError> {
        let index = subnet_index(
            &self.subnet_pool,
            self.subnet_len,
            self.alloc_subnet_len,
            subnet_addr,
        )
        .inspect_err(|err| {
            warn!(
                "cannot resolve subnet {subnet_addr}/{} to a pool index: {err}",
                self.alloc_subnet_len
            );
        })?;

        self.free_subnets.set(index as usize);
        Ok(())
    }

    // --- persistence ---

    /// Persist this record under its tenant key
    pub async fn write(&self, driver: &dyn StateDriver) -> Result<(), PoolError> {
        let value = serde_json::to_vec(self)?;
        driver.write_state(&oper_key(&self.tenant), &value).await?;
        Ok(())
    }

    /// Read one tenant's operational record back from the store
    pub async fn read(driver: &dyn StateDriver, tenant: &str) -> Result<Self, PoolError> {
        let value = driver.read_state(&oper_key(tenant)).await?;
        Ok(serde_json::from_slice(&value)?)
    }

    /// Remove this tenant's operational record from the store
    pub async fn clear(&self, driver: &dyn StateDriver) -> Result<(), PoolError> {
        driver.clear_state(&oper_key(&self.tenant)).await?;
        Ok(())
    }
}
