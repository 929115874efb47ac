//! Fuzz target for account number formatting.
//!
//! Formatting is best-effort and must never panic on arbitrary input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use norwegian_banks::format;

fuzz_target!(|data: &str| {
    let _ = format::format_with_delimiter(data, " ");
    let _ = format::format_with_delimiter(data, "");
    let _ = format::split_into_groups(data);
    let _ = format::is_valid_format(data);

    // Digits survive formatting unchanged
    let formatted = format::format_account_number(data);
    assert_eq!(
        format::strip_formatting(&formatted),
        format::strip_formatting(data),
        "formatting must preserve digits"
    );
    assert_eq!(format::format_account_number(&formatted), formatted);
});
