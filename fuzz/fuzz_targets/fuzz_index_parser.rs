#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_dispatch::oid::MAX_OID_LEN;
use snmp_dispatch::table::{IndexType, build_index, parse_index, parse_index_prefix};

const TEMPLATES: &[&[IndexType]] = &[
    &[IndexType::Integer],
    &[IndexType::Integer, IndexType::Integer],
    &[IndexType::OctetString, IndexType::Integer],
    &[IndexType::IpAddress, IndexType::ImpliedOctetString],
    &[IndexType::Gauge32, IndexType::ObjectIdentifier],
    &[IndexType::OctetString, IndexType::ImpliedObjectIdentifier],
];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let template = TEMPLATES[selector as usize % TEMPLATES.len()];
    let arcs: Vec<u32> = rest
        .chunks(2)
        .map(|c| u32::from(c[0]) << 8 | u32::from(*c.get(1).unwrap_or(&0)))
        .take(MAX_OID_LEN)
        .collect();

    // A prefix parse never yields more values than the template has
    assert!(parse_index_prefix(template, &arcs).len() <= template.len());

    // Whatever parses strictly must encode back to the same arcs
    if let Ok(values) = parse_index(template, &arcs) {
        let index = build_index(template, &values).expect("parsed index must encode");
        assert_eq!(index.arcs(), arcs.as_slice());
    }
});
