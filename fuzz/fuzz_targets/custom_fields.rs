#![no_main]

use flowpost_netflow::fields::custom::parse_yaml;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
        let _ = parse_yaml(content, "fuzz");
    }
});
