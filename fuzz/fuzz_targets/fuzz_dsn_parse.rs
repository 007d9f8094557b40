#![no_main]

use ghost_mysql::connection::redact_dsn;
use ghost_mysql::{DsnInfo, TlsRegistry};
use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

#[derive(Debug)]
struct DsnInput {
    user: String,
    password: String,
    tail: String,
}

impl<'a> Arbitrary<'a> for DsnInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> libfuzzer_sys::arbitrary::Result<Self> {
        Ok(Self {
            user: u.arbitrary()?,
            password: u.arbitrary()?,
            tail: u.arbitrary()?,
        })
    }
}

fuzz_target!(|input: DsnInput| {
    let dsn = format!("{}:{}@tcp({}", input.user, input.password, input.tail);
    let _ = redact_dsn(&dsn);
    if let Ok(info) = DsnInfo::parse(&dsn) {
        let _ = info.to_config(&TlsRegistry::new());
    }
});
