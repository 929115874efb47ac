//! Fuzz target for account validation.
//!
//! Tests that validation never panics and agrees across entry points.

#![no_main]

use libfuzzer_sys::fuzz_target;
use norwegian_banks::{passes_checksum, validate_checksum, AccountValidator, BankTable};

fuzz_target!(|data: &str| {
    let result = validate_checksum(data);
    assert_eq!(result.is_ok(), passes_checksum(data));

    let mut banks = BankTable::new();
    banks.insert("1594", "DNBANOKK", "DNB Bank ASA");

    // Without the prefix check the validator reduces to the checksum
    let unchecked = AccountValidator::new().check_bank_prefix(false);
    assert_eq!(unchecked.validate(data, &banks), result.is_ok());

    if let Ok(account) = result {
        assert_eq!(account.number().len(), 11);
        let checked = AccountValidator::new().validate(data, &banks);
        assert_eq!(checked, account.prefix() == "1594");
    }
});
