#![no_main]

use ghost_mysql::InstanceKey;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    let _ = input.parse::<InstanceKey>();
    if let Ok(key) = InstanceKey::parse_with_default_port(input, 3306) {
        // A parsed key must survive its own rendering when bracketed correctly
        let rendered = if key.is_ipv6() {
            format!("[{}]:{}", key.hostname, key.port)
        } else {
            key.to_string()
        };
        if let Ok(reparsed) = rendered.parse::<InstanceKey>() {
            assert_eq!(reparsed, key);
        }
    }
});
