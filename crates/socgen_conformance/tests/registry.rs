//! Board and CPU registry completeness.

use socgen_common::Vendor;
use socgen_cpu::{CpuError, CpuRegistry, CpuSettings};
use socgen_soc::{has_capability, BoardRegistry, SocError, BOARDS};

#[test]
fn every_builtin_board_resolves() {
    let registry = BoardRegistry::builtin();
    for spec in BOARDS {
        let board = registry.lookup(spec.name).unwrap();
        assert_eq!(board.name, spec.name);
        assert_eq!(board.vendor, spec.vendor);
        for cap in spec.capabilities {
            assert!(has_capability(board, cap), "{} lacks {cap}", spec.name);
        }
    }
}

#[test]
fn board_names_are_unique() {
    assert_eq!(BoardRegistry::builtin().len(), BOARDS.len());
}

#[test]
fn every_vendor_has_boards() {
    let registry = BoardRegistry::builtin();
    for vendor in Vendor::ALL {
        assert!(
            registry.iter().any(|b| b.vendor == vendor),
            "no board for {vendor}"
        );
    }
}

#[test]
fn unknown_board_enumerates_every_name() {
    let registry = BoardRegistry::builtin();
    let err = registry.lookup("not_a_board").unwrap_err();
    let SocError::UnknownBoard { name, available } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(name, "not_a_board");
    let names: Vec<String> = registry.names().iter().map(|n| n.to_string()).collect();
    assert_eq!(available, &names);
    assert!(err.to_string().starts_with("unknown board 'not_a_board', supported are: "));
}

#[test]
fn capability_query_filters_boards() {
    let registry = BoardRegistry::builtin();
    let pcie = registry.with_capability("pcie");
    assert!(!pcie.is_empty());
    assert!(pcie.iter().all(|b| b.capabilities.contains("pcie")));
    assert!(registry.with_capability("warp_drive").is_empty());
}

#[test]
fn every_cpu_variant_instantiates() {
    let registry = CpuRegistry::builtin();
    for descriptor in registry.descriptors() {
        for variant in descriptor.variants {
            if variant.contains("cfu") || variant.contains("cxu") {
                continue;
            }
            let cpu = registry
                .create(descriptor.name, Some(variant), &CpuSettings::default())
                .unwrap()
                .unwrap();
            assert_eq!(cpu.info().name, descriptor.name);
            assert_eq!(cpu.variant(), *variant);
        }
    }
}

#[test]
fn unknown_cpu_and_variant_enumerate_alternatives() {
    let registry = CpuRegistry::builtin();
    match registry.lookup("rocket") {
        Err(CpuError::UnknownCpu { available, .. }) => {
            assert_eq!(available, vec!["none", "vexriscv_smp", "vexiiriscv"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    match registry.resolve_variant("vexriscv_smp", Some("debian")) {
        Err(CpuError::UnknownVariant { available, .. }) => {
            assert_eq!(available.len(), 6);
            assert!(available.contains(&"linux+cxu".to_string()));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
