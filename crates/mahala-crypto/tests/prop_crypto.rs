// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROPERTY-BASED TESTS — mahala-crypto
//
// - Same fingerprint → same address, every time
// - Malformed fingerprints are rejected, never truncated or padded
// - Derived addresses always pass address validation
//
// Run: cargo test -p mahala-crypto --test prop_crypto
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use mahala_crypto::{
    derive_identity, fingerprint_hex_from_device, validate_address, CryptoError,
    FINGERPRINT_HEX_LEN,
};
use proptest::prelude::*;

proptest! {
    /// PROPERTY: derivation is a pure function of the fingerprint
    #[test]
    fn prop_derivation_deterministic(bytes in prop::array::uniform32(any::<u8>())) {
        let fp = hex::encode(bytes);
        let a = derive_identity(&fp).unwrap();
        let b = derive_identity(&fp).unwrap();
        prop_assert_eq!(a.address(), b.address());
        prop_assert!(validate_address(a.address()));
    }

    /// PROPERTY: device id + salt → fingerprint → address is reproducible
    #[test]
    fn prop_device_recovery(device in "[a-zA-Z0-9-]{1,32}", salt in "[a-zA-Z0-9]{32}") {
        let first = derive_identity(&fingerprint_hex_from_device(&device, &salt)).unwrap();
        let again = derive_identity(&fingerprint_hex_from_device(&device, &salt)).unwrap();
        prop_assert_eq!(first.address(), again.address());
    }

    /// PROPERTY: any width other than 64 is a length error
    #[test]
    fn prop_wrong_length_rejected(s in "[0-9a-f]{0,128}") {
        prop_assume!(s.len() != FINGERPRINT_HEX_LEN);
        let is_length_error = matches!(derive_identity(&s), Err(CryptoError::InvalidLength { .. }));
        prop_assert!(is_length_error);
    }

    /// PROPERTY: a single non-hex character anywhere is rejected at its position
    #[test]
    fn prop_non_hex_rejected(
        bytes in prop::array::uniform32(any::<u8>()),
        pos in 0usize..FINGERPRINT_HEX_LEN,
        bad in "[g-zG-Z!@# ]",
    ) {
        let mut fp = hex::encode(bytes);
        fp.replace_range(pos..pos + 1, &bad);
        match derive_identity(&fp) {
            Err(CryptoError::InvalidHex { position, .. }) => prop_assert_eq!(position, pos),
            other => prop_assert!(false, "expected InvalidHex, got {:?}", other.map(|id| id.address().to_string())),
        }
    }
}
