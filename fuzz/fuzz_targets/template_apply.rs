#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use flowpost_netflow::fields::{FieldKey, default_fields};
use flowpost_netflow::{FieldTemplate, Template};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    fields: Vec<(u16, u16)>,
    scope_count: u8,
    count_hint: u8,
    payload: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let fields: Vec<FieldTemplate> = input
        .fields
        .iter()
        .take(64)
        .map(|&(id, length)| {
            let info = default_fields().get(&FieldKey::standard(id)).cloned();
            FieldTemplate::new(length, info)
        })
        .collect();

    let template = if input.scope_count > 0 {
        Template::options(256, fields, usize::from(input.scope_count))
    } else {
        Template::new(256, fields)
    };
    let mut buf = Bytes::from(input.payload);
    let _ = template.apply(&mut buf, usize::from(input.count_hint));
});
