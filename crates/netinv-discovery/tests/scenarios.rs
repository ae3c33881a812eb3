//! End-to-end discovery runs against in-memory device snapshots

use std::collections::HashSet;

use netinv_core::{attr, mib, ModelCatalog, ResourceCategory, SnapshotSource};
use netinv_discovery::{Autoload, AutoloadConfig, DiscoveryError, DeviceTables};

const IOS_DESCR: &str = "Cisco IOS Software, C3750 Software (C3750-IPSERVICESK9-M), \
Version 12.2(55)SE5, RELEASE SOFTWARE (fc1)";

fn device() -> SnapshotSource {
    SnapshotSource::new()
        .with_column(mib::SNMPV2, mib::SYS_DESCR, 0u32, IOS_DESCR)
        .with_column(mib::SNMPV2, mib::SYS_NAME, 0u32, "lab-sw-01")
        .with_column(mib::SNMPV2, mib::SYS_OBJECT_ID, 0u32, "CISCO-PRODUCTS-MIB::catalyst375048ps")
        .with_table(
            mib::CDP,
            mib::CDP_CACHE_TABLE,
            &[mib::CDP_CACHE_DEVICE_ID, mib::CDP_CACHE_DEVICE_PORT],
        )
        .with_table(
            mib::LLDP,
            mib::LLDP_REM_TABLE,
            &[mib::LLDP_REM_SYS_NAME, mib::LLDP_REM_PORT_DESC],
        )
        .with_table(mib::IP, mib::IP_ADDR_TABLE, &[mib::IP_AD_ENT_IF_INDEX])
        .with_table(mib::IPV6, mib::IPV6_ADDR_ENTRY, &[mib::IPV6_ADDR_IF_INDEX])
}

fn entity(
    source: SnapshotSource,
    id: u32,
    parent: &str,
    pos: &str,
    class: &str,
    vendor_type: &str,
    name: &str,
) -> SnapshotSource {
    source
        .with_column(mib::ENTITY, mib::ENT_PARENT_REL_POS, id, pos)
        .with_column(mib::ENTITY, mib::ENT_CONTAINED_IN, id, parent)
        .with_column(mib::ENTITY, mib::ENT_CLASS, id, class)
        .with_column(mib::ENTITY, mib::ENT_VENDOR_TYPE, id, vendor_type)
        .with_column(mib::ENTITY, mib::ENT_NAME, id, name)
        .with_column(mib::ENTITY, mib::ENT_DESCR, id, name)
}

/// Physical port `id` bound to logical interface `if_index`
fn port(source: SnapshotSource, id: u32, parent: &str, pos: &str, name: &str, if_index: u32) -> SnapshotSource {
    entity(source, id, parent, pos, "port", "cevPortGigBaseT", name)
        .with_column(
            mib::ENTITY,
            mib::ENT_ALIAS_MAPPING,
            format!("{}.0", id).as_str(),
            format!("IF-MIB::ifIndex.{}", if_index),
        )
        .with_column(mib::IF, mib::IF_DESCR, if_index, name)
}

fn base_device() -> SnapshotSource {
    let source = entity(device(), 1, "0", "0", "chassis", "cevChassisWSC375048PS", "WS-C3750-48PS");
    entity(source, 2, "1", "1", "module", "cevModuleC37xxStack", "Switch 1 module")
}

fn engine(source: SnapshotSource) -> Autoload<SnapshotSource> {
    Autoload::new(source, AutoloadConfig::default(), ModelCatalog::empty()).unwrap()
}

fn port_addresses(result: &netinv_core::DiscoveryResult) -> Vec<String> {
    result
        .resources
        .iter()
        .filter(|r| r.category == ResourceCategory::Port)
        .map(|r| r.address.clone())
        .collect()
}

#[test]
fn test_single_chassis_module_port() {
    let source = port(base_device(), 3, "2", "1", "GigabitEthernet1/0/1", 10);
    let result = engine(source).discover().unwrap();

    assert_eq!(result.resource("0").unwrap().category, ResourceCategory::Chassis);
    assert_eq!(result.resource("0/1").unwrap().name, "Module 1");
    assert_eq!(result.resource("0/1/1").unwrap().name, "GigabitEthernet1-0-1");

    // root attributes come first
    assert_eq!(result.attributes[0].address, "");
    assert_eq!(result.attribute("", attr::SYSTEM_NAME), Some("lab-sw-01"));
    assert_eq!(result.attribute("", attr::MODEL), Some("Catalyst375048ps"));
    assert_eq!(result.attribute("", attr::OS_VERSION), Some("12.2(55)SE5"));
}

#[test]
fn test_colliding_ports_get_offset() {
    let source = port(base_device(), 3, "2", "1", "GigabitEthernet1/0/1", 10);
    let source = port(source, 4, "2", "1", "GigabitEthernet1/0/2", 11);
    let result = engine(source).discover().unwrap();

    assert_eq!(port_addresses(&result), vec!["0/1/1", "0/1/1001"]);
}

#[test]
fn test_excluded_port_name_never_addressed() {
    let source = port(base_device(), 3, "2", "1", "GigabitEthernet1/0/1", 10);
    let source = port(source, 4, "2", "2", "Management0", 11);
    let result = engine(source).discover().unwrap();

    assert_eq!(port_addresses(&result), vec!["0/1/1"]);
    assert!(result.resource("0/1/2").is_none());
}

#[test]
fn test_no_chassis_gives_empty_result() {
    let source = entity(device(), 2, "0", "1", "module", "cevModuleC37xx", "orphan module");
    let source = port(source, 3, "2", "1", "GigabitEthernet1/0/1", 10);
    let result = engine(source).discover().unwrap();

    assert!(result.is_empty());
}

#[test]
fn test_cdp_adjacency_wins_over_lldp() {
    let source = port(base_device(), 3, "2", "1", "GigabitEthernet1/0/1", 10)
        .with_column(mib::CDP, mib::CDP_CACHE_DEVICE_ID, "10.1", "core-sw")
        .with_column(mib::CDP, mib::CDP_CACHE_DEVICE_PORT, "10.1", "GigabitEthernet2/0/48")
        .with_column(mib::LLDP, mib::LLDP_LOC_PORT_DESC, 10u32, "GigabitEthernet1/0/1")
        .with_column(mib::LLDP, mib::LLDP_REM_SYS_NAME, "0.10.1", "lldp-peer")
        .with_column(mib::LLDP, mib::LLDP_REM_PORT_DESC, "0.10.1", "eth0");
    let result = engine(source).discover().unwrap();

    assert_eq!(
        result.attribute("0/1/1", attr::ADJACENT),
        Some("core-sw through GigabitEthernet2/0/48")
    );
}

#[test]
fn test_empty_position_excluded_before_classification() {
    let source = entity(base_device(), 5, "2", "", "port", "cevPortGigBaseT", "GigabitEthernet1/0/5");
    let autoload = engine(source);
    let tables = DeviceTables::load_interfaces(autoload.source()).unwrap();
    let ctx = autoload.build_context(&tables).unwrap();

    assert!(ctx.is_excluded(5));
    assert!(ctx.node(5).is_none());
}

#[test]
fn test_propagation_converges() {
    let source = port(base_device(), 3, "2", "1", "GigabitEthernet1/0/1", 10);
    // parent 40 does not exist; 6 hangs below 5
    let source = entity(source, 5, "40", "3", "module", "cevModuleX", "lost module");
    let source = entity(source, 6, "5", "9", "port", "cevPortGigBaseT", "lost port");
    let autoload = engine(source);
    let tables = DeviceTables::load_interfaces(autoload.source()).unwrap();
    let mut ctx = autoload.build_context(&tables).unwrap();

    ctx.propagate_exclusions();
    assert!(ctx.is_excluded(5));
    assert!(ctx.is_excluded(6));
    assert!(!ctx.is_excluded(3));

    let converged = ctx.exclusions.clone();
    assert_eq!(ctx.propagate_exclusions(), 0);
    assert_eq!(ctx.exclusions, converged);
}

#[test]
fn test_port_addresses_unique() {
    let mut source = base_device();
    for (i, pos) in ["1", "1", "2", "1001", "1", "2"].iter().enumerate() {
        let id = 10 + i as u32;
        source = port(source, id, "2", pos, &format!("GigabitEthernet1/0/{}", id), 100 + id);
    }
    let result = engine(source).discover().unwrap();

    let addresses = port_addresses(&result);
    assert_eq!(addresses.len(), 6);
    let unique: HashSet<&String> = addresses.iter().collect();
    assert_eq!(unique.len(), addresses.len());
}

/// Module bay split into an upper and a lower container, with the given ids
fn split_bay(upper: u32, lower: u32) -> SnapshotSource {
    let source = entity(device(), 1, "0", "-1", "chassis", "cevChassisN7K", "chassis");
    let source = entity(source, upper, "1", "1", "container", "cevContainerUpperModuleBay", "upper");
    let source = entity(source, lower, "1", "2", "container", "cevContainerLowerModuleBay", "lower");
    let source = entity(source, 20, &upper.to_string(), "1", "module", "cevModuleA", "a");
    let source = entity(source, 21, &upper.to_string(), "2", "module", "cevModuleB", "b");
    let source = entity(source, 22, &lower.to_string(), "1", "module", "cevModuleC", "c");
    entity(source, 23, &lower.to_string(), "2", "module", "cevModuleD", "d")
}

#[test]
fn test_dual_bay_repair_independent_of_row_order() {
    for (upper, lower) in [(10, 11), (11, 10)] {
        let autoload = engine(split_bay(upper, lower));
        let tables = DeviceTables::load_interfaces(autoload.source()).unwrap();
        let mut ctx = autoload.build_context(&tables).unwrap();
        ctx.repair_dual_bay();

        for (id, expected) in [(22, 3), (23, 4)] {
            let node = ctx.node(id).unwrap();
            assert_eq!(node.parent_id, upper);
            assert_eq!(node.parent_rel_pos, expected);
        }
    }
}

#[test]
fn test_position_overflow_keeps_colliding_address() {
    let max = i64::MAX.to_string();
    let source = port(base_device(), 3, "2", &max, "GigabitEthernet1/0/1", 10);
    let source = port(source, 4, "2", &max, "GigabitEthernet1/0/2", 11);
    let result = engine(source).discover().unwrap();

    let expected = format!("0/1/{}", max);
    assert_eq!(port_addresses(&result), vec![expected.clone(), expected]);
}

#[test]
fn test_ipv6_reported_on_port_and_channel() {
    let source = port(base_device(), 3, "2", "1", "GigabitEthernet1/0/1", 10)
        .with_column(mib::IF, mib::IF_DESCR, 50u32, "Port-channel1")
        .with_column(mib::IPV6, mib::IPV6_ADDR_IF_INDEX, "2001:db8::10", "10")
        .with_column(mib::IPV6, mib::IPV6_ADDR_IF_INDEX, "2001:db8::11", "10")
        .with_column(mib::IPV6, mib::IPV6_ADDR_IF_INDEX, "2001:db8:50::1", "50");
    let result = engine(source).discover().unwrap();

    assert_eq!(result.attribute("0/1/1", attr::IPV6_ADDRESS), Some("2001:db8::10"));
    assert_eq!(result.attribute("PC1", attr::IPV6_ADDRESS), Some("2001:db8:50::1"));
}

#[test]
fn test_repeated_runs_identical() {
    let source = port(base_device(), 3, "2", "1", "GigabitEthernet1/0/1", 10);
    let source = port(source, 4, "2", "1", "GigabitEthernet1/0/2", 11)
        .with_column(mib::IF, mib::IF_DESCR, 50u32, "Port-channel1")
        .with_column(mib::LAG, mib::LAG_ATTACHED_AGG_ID, 10u32, "50")
        .with_column(mib::IP, mib::IP_AD_ENT_IF_INDEX, "10.1.1.1", "50");
    let autoload = engine(source);

    let first = autoload.discover().unwrap();
    let second = autoload.discover().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.attribute("PC1", attr::IPV4_ADDRESS), Some("10.1.1.1"));
    assert_eq!(first.attribute("PC1", attr::ASSOCIATED_PORTS), Some("GigabitEthernet1-0-1"));
}

#[test]
fn test_empty_inventory_is_fatal() {
    let result = engine(device()).discover();
    assert!(matches!(result, Err(DiscoveryError::EmptyInventory)));
}

#[test]
fn test_unreadable_inventory_is_fatal() {
    let source = base_device().with_unavailable(mib::ENTITY, mib::ENT_PARENT_REL_POS);
    let result = engine(source).discover();
    assert!(matches!(result, Err(DiscoveryError::Query(_))));
}

#[test]
fn test_unsupported_os_rejected_before_walk() {
    let source = base_device().with_column(mib::SNMPV2, mib::SYS_DESCR, 0u32, "Juniper Networks JUNOS 12.3");
    let result = engine(source).discover();
    assert!(matches!(result, Err(DiscoveryError::Validation(_))));
}

#[test]
fn test_snapshot_json_round_trip_discovers_same_tree() {
    let source = port(base_device(), 3, "2", "1", "GigabitEthernet1/0/1", 10);
    let json = source.to_json().unwrap();
    let reloaded = SnapshotSource::from_json_str(&json).unwrap();

    let expected = engine(source).discover().unwrap();
    let actual = engine(reloaded).discover().unwrap();
    assert_eq!(expected, actual);
}
