// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::io::Write;

use votf_config::{ConfError, RingConf};
use votf_ring::types::{ModuleType, Service};

const GOOD_CONF: &str = r#"
[[devices]]
name = "votf0"

[[devices.endpoints]]
service = "tws"
ip = 2
ids = [0, 1, 2]
addr = 0x1b040000
module = "service"
module_type = "m16s16"

[[devices.endpoints]]
service = "trs"
ip = 5
ids = [0, 1]
addr = 0x1b050000
module = "service"
module_type = "m16s16"

[[devices]]
name = "votf1"

[[devices.endpoints]]
service = "trs"
ip = 8
ids = [0]
addr = 0x1b070000
module = "agent"
module_type = "m1m13"
"#;

#[test]
fn parse_and_expand_slots() {
    let conf = RingConf::from_toml_str(GOOD_CONF).unwrap();
    assert_eq!(conf.devices.len(), 2);

    let votf0 = conf.device("votf0").unwrap();
    let slots = votf0.slots().unwrap();
    assert_eq!(slots.len(), 5);
    assert_eq!(slots[0].service, Service::Tws);
    assert_eq!(slots[0].ip, 2);
    assert_eq!(slots[0].addr, 0x1b04_0000);
    assert_eq!(slots[0].module_type, ModuleType::M16S16);
    assert_eq!(slots[4].service, Service::Trs);
    assert_eq!(slots[4].id, 1);

    let votf1 = conf.device("votf1").unwrap();
    assert_eq!(votf1.slots().unwrap()[0].module_type, ModuleType::M1M13);
}

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(GOOD_CONF.as_bytes()).unwrap();

    let conf = RingConf::from_file(file.path()).unwrap();
    assert_eq!(conf.devices.len(), 2);
}

#[test]
fn unknown_service_is_rejected() {
    let bad = GOOD_CONF.replace("service = \"tws\"", "service = \"twx\"");
    let err = RingConf::from_toml_str(&bad).unwrap_err();
    assert!(matches!(err, ConfError::Invalid(_)));
    assert!(format!("{err}").contains("twx"));
}

#[test]
fn unknown_module_type_is_rejected() {
    let bad = GOOD_CONF.replace("module_type = \"m1m13\"", "module_type = \"m9m9\"");
    let err = RingConf::from_toml_str(&bad).unwrap_err();
    assert!(format!("{err}").contains("m9m9"));
}

#[test]
fn mismatched_family_is_rejected() {
    // An agent module type declared under the service family.
    let bad = GOOD_CONF.replace(
        "module = \"agent\"\nmodule_type = \"m1m13\"",
        "module = \"service\"\nmodule_type = \"m1m13\"",
    );
    let err = RingConf::from_toml_str(&bad).unwrap_err();
    assert!(matches!(err, ConfError::Invalid(_)));
}

#[test]
fn empty_ids_are_rejected() {
    let bad = GOOD_CONF.replace("ids = [0, 1]", "ids = []");
    let err = RingConf::from_toml_str(&bad).unwrap_err();
    assert!(format!("{err}").contains("empty ids"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = RingConf::from_toml_str("devices = 3").unwrap_err();
    assert!(matches!(err, ConfError::Parse(_)));
}
