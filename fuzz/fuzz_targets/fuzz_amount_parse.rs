//! Fuzz target: decimal amount parsing
//!
//! Full nodes send balances as strings or JSON numbers; neither path may
//! panic, and every accepted amount must survive its own rendering.
//!
//! Run: cargo +nightly fuzz run fuzz_amount_parse -- -max_len=128

#![no_main]
use libfuzzer_sys::fuzz_target;
use mahala_light::Amount;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(amount) = s.parse::<Amount>() {
        let rendered = amount.to_string();
        assert_eq!(rendered.parse::<Amount>(), Ok(amount), "{} -> {}", s, rendered);
    }

    let _ = serde_json::from_str::<Amount>(s);
});
