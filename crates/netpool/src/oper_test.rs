//! Unit tests for the allocation pools and their coupled initialization

#[cfg(test)]
mod tests {
    use crate::config::{
        AutoParams, DeployParams, GlobalConfig, NET_TYPE_VLAN, NET_TYPE_VXLAN, SUPPORTED_VERSION,
    };
    use crate::error::PoolError;
    use crate::oper::GlobalOper;
    use statestore::MemStateDriver;

    fn make_oper(net_type: &str, vlans: &str, vxlans: &str) -> GlobalOper {
        let config = GlobalConfig {
            version: SUPPORTED_VERSION.to_string(),
            tenant: "teal".to_string(),
            auto: AutoParams {
                subnet_pool: "10.1.0.0".to_string(),
                subnet_len: 16,
                alloc_subnet_len: 24,
                vlans: vlans.to_string(),
                vxlans: vxlans.to_string(),
            },
            deploy: DeployParams {
                default_net_type: net_type.to_string(),
            },
        };
        config.process().unwrap()
    }

    // --- shared VLANs ---

    #[test]
    fn test_alloc_vlan_is_first_fit_and_exhaustive() {
        let mut oper = make_oper(NET_TYPE_VLAN, "200-205", "");

        // Every id comes out exactly once, in ascending order
        let mut allocated = Vec::new();
        while let Ok(vlan) = oper.alloc_vlan() {
            allocated.push(vlan);
        }
        assert_eq!(allocated, vec![200, 201, 202, 203, 204, 205]);

        assert!(matches!(oper.alloc_vlan().unwrap_err(), PoolError::NoVlansAvailable));
        assert_eq!(oper.free_vlans.count_set(), 0, "failed alloc must not mutate");
    }

    #[test]
    fn test_alloc_vlan_ranges_need_no_ordering() {
        let mut oper = make_oper(NET_TYPE_VLAN, "300,100-101", "");

        assert_eq!(oper.alloc_vlan().unwrap(), 100);
        assert_eq!(oper.alloc_vlan().unwrap(), 101);
        assert_eq!(oper.alloc_vlan().unwrap(), 300);
    }

    #[test]
    fn test_free_vlan_is_idempotent() {
        let mut oper = make_oper(NET_TYPE_VLAN, "100-110", "");

        let vlan = oper.alloc_vlan().unwrap();
        oper.free_vlan(vlan);
        let after_first_free = oper.free_vlans.clone();
        oper.free_vlan(vlan);
        assert_eq!(oper.free_vlans, after_first_free);

        // The freed id is the first-fit choice again
        assert_eq!(oper.alloc_vlan().unwrap(), vlan);
    }

    #[test]
    fn test_reserved_vlans_never_allocated() {
        let mut oper = make_oper(NET_TYPE_VLAN, "", "");

        assert_eq!(oper.alloc_vlan().unwrap(), 1, "id 0 is reserved");
        assert!(!oper.free_vlans.test(0));
        assert!(!oper.free_vlans.test(4095));
        assert!(oper.free_vlans.test(4094));

        // Same over the local pool in the unconfigured vxlan deployment
        let mut oper = make_oper(NET_TYPE_VXLAN, "", "");
        assert_eq!(oper.alloc_local_vlan().unwrap(), 1);
        assert!(!oper.free_local_vlans.test(0));
        assert!(!oper.free_local_vlans.test(4095));
    }

    #[test]
    fn test_set_vlan_reserves_a_specific_id() {
        let mut oper = make_oper(NET_TYPE_VLAN, "100-200", "");

        oper.check_vlan_in_use(150).unwrap();
        oper.set_vlan(150).unwrap();

        assert!(matches!(
            oper.set_vlan(150).unwrap_err(),
            PoolError::VlanNotAvailable(150)
        ));
        // Ids outside the configured range were never free
        assert!(matches!(
            oper.set_vlan(300).unwrap_err(),
            PoolError::VlanNotAvailable(300)
        ));
        // First-fit skips the reserved id
        assert_eq!(oper.alloc_vlan().unwrap(), 100);
    }

    // --- local VLANs ---

    #[test]
    fn test_local_vlan_alloc_free_cycle() {
        let mut oper = make_oper(NET_TYPE_VLAN, "100-200", "");

        // Local pool is the complement of the configured range
        let vlan = oper.alloc_local_vlan().unwrap();
        assert_eq!(vlan, 1);

        oper.free_local_vlan(vlan);
        oper.free_local_vlan(vlan); // idempotent
        assert_eq!(oper.alloc_local_vlan().unwrap(), vlan);

        // Freeing an id beyond the vlan space is ignored, not fatal
        oper.free_local_vlan(9999);
        assert!(!oper.free_local_vlans.test(9999));
    }

    // --- deployment-mode branch ---

    #[test]
    fn test_unconfigured_vxlan_mode_swaps_the_pools() {
        let oper = make_oper(NET_TYPE_VXLAN, "", "");

        // The whole non-reserved space doubles as local-VLAN space
        assert_eq!(oper.free_local_vlans.count_set(), 4094);
        assert!(oper.free_local_vlans.test(1));
        assert!(oper.free_local_vlans.test(4094));

        // ... and the shared pool becomes its reserved-stripped complement:
        // nothing is left for shared allocation
        assert_eq!(oper.free_vlans.count_set(), 0);
    }

    #[test]
    fn test_explicit_vlan_range_partitions_the_space() {
        // Any mode: the local pool is the complement of the configured range
        for net_type in [NET_TYPE_VLAN, NET_TYPE_VXLAN] {
            let oper = make_oper(net_type, "100-200", "");

            assert_eq!(oper.free_vlans.count_set(), 101);
            assert_eq!(oper.free_local_vlans.count_set(), 4094 - 101);
            assert!(oper.free_local_vlans.test(99));
            assert!(!oper.free_local_vlans.test(100));
            assert!(!oper.free_local_vlans.test(200));
            assert!(oper.free_local_vlans.test(201));
            assert!(!oper.free_local_vlans.test(0));
            assert!(!oper.free_local_vlans.test(4095));
        }
    }

    #[test]
    fn test_vlan_mode_without_range_has_no_local_vlans() {
        let oper = make_oper(NET_TYPE_VLAN, "", "");

        assert_eq!(oper.free_vlans.count_set(), 4094);
        assert_eq!(oper.free_local_vlans.count_set(), 0);
    }

    // --- VXLANs ---

    #[test]
    fn test_vxlan_default_window() {
        let mut oper = make_oper(NET_TYPE_VXLAN, "", "");

        assert_eq!(oper.free_vxlans_start, 10000);
        assert_eq!(oper.free_vxlans.count_set(), 16001);

        let (vxlan, local_vlan) = oper.alloc_vxlan().unwrap();
        assert_eq!(vxlan, 10000);
        assert_eq!(local_vlan, 1);
    }

    #[test]
    fn test_vxlan_configured_window() {
        let mut oper = make_oper(NET_TYPE_VXLAN, "", "20000-20004");

        assert_eq!(oper.free_vxlans_start, 20000);
        assert_eq!(oper.free_vxlans.count_set(), 5);

        let mut allocated = Vec::new();
        while let Ok((vxlan, _)) = oper.alloc_vxlan() {
            allocated.push(vxlan);
        }
        assert_eq!(allocated, vec![20000, 20001, 20002, 20003, 20004]);
        assert!(matches!(
            oper.alloc_vxlan().unwrap_err(),
            PoolError::NoVxlansAvailable
        ));
    }

    #[test]
    fn test_alloc_vxlan_is_atomic_on_local_vlan_exhaustion() {
        // vlans 1-4093 leaves exactly one local vlan: 4094
        let mut oper = make_oper(NET_TYPE_VXLAN, "1-4093", "");
        assert_eq!(oper.free_local_vlans.count_set(), 1);

        let (vxlan, local_vlan) = oper.alloc_vxlan().unwrap();
        assert_eq!((vxlan, local_vlan), (10000, 4094));

        let vxlans_before = oper.free_vxlans.clone();
        assert!(matches!(
            oper.alloc_vxlan().unwrap_err(),
            PoolError::NoLocalVlansAvailable
        ));
        assert_eq!(
            oper.free_vxlans, vxlans_before,
            "no vxlan id may be consumed when the local vlan lookup fails"
        );
        assert_eq!(oper.free_vxlans.next_set(0), Some(1));
    }

    #[test]
    fn test_free_vxlan_returns_both_ids() {
        let mut oper = make_oper(NET_TYPE_VXLAN, "", "");

        let (vxlan, local_vlan) = oper.alloc_vxlan().unwrap();
        oper.free_vxlan(vxlan, local_vlan);
        let after_first_free = oper.clone();
        oper.free_vxlan(vxlan, local_vlan);
        assert_eq!(oper, after_first_free);

        // Both ids are the first-fit choices again
        assert_eq!(oper.alloc_vxlan().unwrap(), (vxlan, local_vlan));
    }

    #[test]
    fn test_free_vxlan_below_window_frees_only_the_local_vlan() {
        let mut oper = make_oper(NET_TYPE_VXLAN, "", "");
        let (_, local_vlan) = oper.alloc_vxlan().unwrap();

        let vxlans_before = oper.free_vxlans.clone();
        oper.free_vxlan(5, local_vlan);
        assert_eq!(oper.free_vxlans, vxlans_before);
        assert!(oper.free_local_vlans.test(local_vlan as usize));
    }

    // --- subnets ---

    #[test]
    fn test_alloc_subnet_capacity_four_scenario() {
        let config = GlobalConfig {
            version: SUPPORTED_VERSION.to_string(),
            tenant: "teal".to_string(),
            auto: AutoParams {
                subnet_pool: "10.1.0.0".to_string(),
                subnet_len: 24,
                alloc_subnet_len: 26,
                vlans: String::new(),
                vxlans: String::new(),
            },
            deploy: DeployParams {
                default_net_type: NET_TYPE_VLAN.to_string(),
            },
        };
        let mut oper = config.process().unwrap();

        assert_eq!(oper.alloc_subnet().unwrap(), "10.1.0.0");
        assert_eq!(oper.alloc_subnet().unwrap(), "10.1.0.64");
        assert_eq!(oper.alloc_subnet().unwrap(), "10.1.0.128");
        assert_eq!(oper.alloc_subnet().unwrap(), "10.1.0.192");
        assert!(matches!(
            oper.alloc_subnet().unwrap_err(),
            PoolError::SubnetExhausted
        ));
    }

    #[test]
    fn test_subnet_alloc_free_round_trip() {
        let mut oper = make_oper(NET_TYPE_VLAN, "", "");
        let before = oper.free_subnets.clone();

        let addr = oper.alloc_subnet().unwrap();
        assert_eq!(addr, "10.1.0.0");
        assert_eq!(oper.free_subnets.count_set(), before.count_set() - 1);

        oper.free_subnet(&addr).unwrap();
        assert_eq!(oper.free_subnets, before);
        assert_eq!(oper.alloc_subnet().unwrap(), addr);
    }

    #[test]
    fn test_free_subnet_rejects_foreign_address() {
        let mut oper = make_oper(NET_TYPE_VLAN, "", "");
        let _ = oper.alloc_subnet().unwrap();
        let count = oper.free_subnets.count_set();

        assert!(matches!(
            oper.free_subnet("192.168.0.0").unwrap_err(),
            PoolError::Calc(_)
        ));
        assert_eq!(oper.free_subnets.count_set(), count, "failed free must not mutate");
    }

    // --- persistence ---

    #[tokio::test]
    async fn test_oper_write_read_clear() {
        let driver = MemStateDriver::new();
        let mut oper = make_oper(NET_TYPE_VXLAN, "", "");
        let _ = oper.alloc_vxlan().unwrap();
        let _ = oper.alloc_subnet().unwrap();

        oper.write(&driver).await.unwrap();
        let read_back = GlobalOper::read(&driver, "teal").await.unwrap();
        assert_eq!(read_back, oper, "allocation state must survive the store");

        oper.clear(&driver).await.unwrap();
        assert!(matches!(
            GlobalOper::read(&driver, "teal").await.unwrap_err(),
            PoolError::Store(_)
        ));
    }
}
