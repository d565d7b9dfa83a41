//! Tenant-global network configuration (desired state)
//!
//! A [`GlobalConfig`] is parsed from JSON, validated wholesale, and then
//! transformed exactly once by [`GlobalConfig::process`] into the
//! operational [`GlobalOper`](crate::oper::GlobalOper) record that serves
//! allocations. Both records persist through a
//! [`StateDriver`](statestore::StateDriver), one record per tenant.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use netcalc::{TagKind, parse_tag_ranges};
use statestore::StateDriver;

use crate::bitset::BitPool;
use crate::error::PoolError;
use crate::oper::GlobalOper;

/// Key prefix under which every tenant's configuration record lives
pub const CFG_GLOBAL_PREFIX: &str = "/netpool/config/global/";

/// The single configuration version this engine understands.
///
/// Unknown versions are rejected outright rather than best-effort parsed.
pub const SUPPORTED_VERSION: &str = "0.01";

/// Deployment backed by shared 802.1Q VLANs
pub const NET_TYPE_VLAN: &str = "vlan";
/// Deployment backed by VXLAN overlays (with per-host local VLANs)
pub const NET_TYPE_VXLAN: &str = "vxlan";

/// Parameters the engine draws automatic allocations from.
///
/// Configuring these once allows hands-free allocation of networks and
/// endpoints without naming concrete ids at each creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoParams {
    /// IPv4 base address of the subnet allocation pool
    pub subnet_pool: String,
    /// Prefix length of the whole pool
    pub subnet_len: u32,
    /// Prefix length of each allocated subnet
    pub alloc_subnet_len: u32,
    /// VLAN range string (`"100-200,300"`); empty means no explicit range
    #[serde(default)]
    pub vlans: String,
    /// VXLAN range string; empty means the default window
    #[serde(default)]
    pub vxlans: String,
}

/// Parameters deciding deployment-wide choices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployParams {
    /// Default network type, one of `"vlan"` or `"vxlan"`
    pub default_net_type: String,
}

/// One tenant's declarative network configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Configuration format version; must equal [`SUPPORTED_VERSION`]
    pub version: String,
    /// Tenant this configuration belongs to (identity key)
    pub tenant: String,
    /// Allocation pool parameters
    pub auto: AutoParams,
    /// Deployment choices
    pub deploy: DeployParams,
}

fn config_key(tenant: &str) -> String {
    format!("{CFG_GLOBAL_PREFIX}{tenant}")
}

impl GlobalConfig {
    /// Parse and validate a configuration from JSON bytes.
    ///
    /// Rejects the configuration wholesale on the first failed check; no
    /// partially valid record escapes.
    pub fn parse(config_bytes: &[u8]) -> Result<Self, PoolError> {
        let config: Self = serde_json::from_slice(config_bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Run every validation check, in order
    fn validate(&self) -> Result<(), PoolError> {
        if self.auto.subnet_pool.parse::<Ipv4Addr>().is_err() {
            return Err(PoolError::InvalidSubnetPool(self.auto.subnet_pool.clone()));
        }

        parse_tag_ranges(&self.auto.vlans, TagKind::Vlan)?;
        parse_tag_ranges(&self.auto.vxlans, TagKind::Vxlan)?;

        if self.deploy.default_net_type != NET_TYPE_VLAN
            && self.deploy.default_net_type != NET_TYPE_VXLAN
        {
            return Err(PoolError::UnsupportedNetType(
                self.deploy.default_net_type.clone(),
            ));
        }

        if self.auto.subnet_len > self.auto.alloc_subnet_len || self.auto.alloc_subnet_len > 32 {
            return Err(PoolError::InvalidSubnetLens {
                subnet_len: self.auto.subnet_len,
                alloc_subnet_len: self.auto.alloc_subnet_len,
            });
        }

        Ok(())
    }

    /// Transform this configuration into its operational record.
    ///
    /// Pure with respect to `self`: every allocation pool is initialized
    /// from scratch and any failure aborts the whole transform — no partial
    /// [`GlobalOper`] is ever returned.
    pub fn process(&self) -> Result<GlobalOper, PoolError> {
        if self.version != SUPPORTED_VERSION {
            return Err(PoolError::UnsupportedVersion(self.version.clone()));
        }

        self.validate()?;

        if self.tenant.is_empty() {
            return Err(PoolError::EmptyTenant);
        }

        let subnet_pool_bits = self.auto.alloc_subnet_len - self.auto.subnet_len;
        let mut oper = GlobalOper {
            tenant: self.tenant.clone(),
            default_net_type: self.deploy.default_net_type.clone(),
            subnet_pool: self.auto.subnet_pool.clone(),
            subnet_len: self.auto.subnet_len,
            alloc_subnet_len: self.auto.alloc_subnet_len,
            free_subnets: BitPool::all_set(1 << subnet_pool_bits),
            free_vlans: BitPool::new(0),
            free_local_vlans: BitPool::new(0),
            free_vxlans_start: 0,
            free_vxlans: BitPool::new(0),
        };

        oper.init_vlan_pool(&self.auto.vlans).inspect_err(|err| {
            error!("error initializing vlan pool for tenant {}: {err}", self.tenant);
        })?;

        oper.init_vxlan_pool(&self.auto.vxlans, &self.auto.vlans)
            .inspect_err(|err| {
                error!("error initializing vxlan pool for tenant {}: {err}", self.tenant);
            })?;

        debug!(
            "processed global config for tenant {}: {} subnets, {} vlans, {} local vlans, {} vxlans free",
            self.tenant,
            oper.free_subnets.count_set(),
            oper.free_vlans.count_set(),
            oper.free_local_vlans.count_set(),
            oper.free_vxlans.count_set(),
        );

        Ok(oper)
    }

    /// Persist this configuration under its tenant key
    pub async fn write(&self, driver: &dyn StateDriver) -> Result<(), PoolError> {
        let value = serde_json::to_vec(self)?;
        driver.write_state(&config_key(&self.tenant), &value).await?;
        Ok(())
    }

    /// Read one tenant's configuration back from the store
    pub async fn read(driver: &dyn StateDriver, tenant: &str) -> Result<Self, PoolError> {
        let value = driver.read_state(&config_key(tenant)).await?;
        Ok(serde_json::from_slice(&value)?)
    }

    /// Remove this tenant's configuration from the store
    pub async fn clear(&self, driver: &dyn StateDriver) -> Result<(), PoolError> {
        driver.clear_state(&config_key(&self.tenant)).await?;
        Ok(())
    }
}

/// Enumerate every tenant's stored configuration
pub async fn read_all_global_config(
    driver: &dyn StateDriver,
) -> Result<Vec<GlobalConfig>, PoolError> {
    let records = driver.read_all_state(CFG_GLOBAL_PREFIX).await?;
    let mut configs = Vec::with_capacity(records.len());
    for record in records {
        configs.push(serde_json::from_slice(&record)?);
    }
    Ok(configs)
}
