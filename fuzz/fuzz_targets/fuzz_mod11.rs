//! Fuzz target for the modulus 11 check digit.
//!
//! Both weight schemes must agree and a computed check digit must validate.

#![no_main]

use libfuzzer_sys::fuzz_target;
use norwegian_banks::{mod11, ChecksumAlgorithm};

fuzz_target!(|data: [u8; 10]| {
    // Clamp values to valid digit range
    let payload = data.map(|b| b % 10);

    let weighted = ChecksumAlgorithm::Weighted.expected_check_digit(&payload);
    let generic = ChecksumAlgorithm::Modulus11.expected_check_digit(&payload);
    assert_eq!(weighted, generic, "weight schemes disagree");

    match mod11::check_digit(&payload) {
        Some(check) => {
            assert!(check <= 9, "check digit should be 0-9");
            let mut full = [0u8; 11];
            full[..10].copy_from_slice(&payload);
            full[10] = check;
            assert!(mod11::validate(&full), "appending the check digit should validate");
        }
        None => assert_eq!(mod11::weighted_sum(&payload) % 11, 1),
    }
});
