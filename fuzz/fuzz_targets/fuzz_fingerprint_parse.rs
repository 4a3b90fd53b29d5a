//! Fuzz target: fingerprint parsing and wallet derivation
//!
//! 1. derive_identity() never panics on arbitrary text
//! 2. Anything it accepts yields a valid, reproducible address
//! 3. Device id + salt input always derives
//!
//! Run: cargo +nightly fuzz run fuzz_fingerprint_parse -- -max_len=256

#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    raw: String,
    device_id: String,
    salt: String,
}

fuzz_target!(|input: Input| {
    if let Ok(identity) = mahala_crypto::derive_identity(&input.raw) {
        assert_eq!(input.raw.len(), mahala_crypto::FINGERPRINT_HEX_LEN);
        assert!(mahala_crypto::validate_address(identity.address()));
        let again = mahala_crypto::derive_identity(&input.raw.to_uppercase())
            .expect("case must not matter");
        assert_eq!(again.address(), identity.address());
    }

    let fingerprint = mahala_crypto::fingerprint_hex_from_device(&input.device_id, &input.salt);
    assert!(mahala_crypto::derive_identity(&fingerprint).is_ok());
});
