//! Account number formatting utilities.
//!
//! Norwegian account numbers are written in three groups: the 4-digit bank
//! prefix, a 2-digit account group, and the remaining 5 digits, e.g.
//! `1594.22.87248` or `1594 22 87248`.
//!
//! Formatting is best-effort: every non-digit is stripped and the delimiter is
//! inserted after the 4th and 6th digit whatever the total length is. Use
//! [`crate::validate_checksum`] to check that a number is well formed.
//!
//! # Example
//!
//! ```
//! use norwegian_banks::format::{format_account_number, format_with_delimiter};
//!
//! assert_eq!(format_account_number("12345678903"), "1234.56.78903");
//! assert_eq!(format_with_delimiter("1234 56 78903", " "), "1234 56 78903");
//! ```

use crate::account::PREFIX_DIGITS;

const GROUP_DIGITS: usize = 2;

/// Default delimiter used between groups.
pub const DEFAULT_DELIMITER: &str = ".";

/// Formats an account number with the default `.` delimiter.
///
/// # Example
///
/// ```
/// use norwegian_banks::format::format_account_number;
///
/// assert_eq!(format_account_number("15942287248"), "1594.22.87248");
/// assert_eq!(format_account_number("1594 22 87248"), "1594.22.87248");
/// ```
pub fn format_account_number(input: &str) -> String {
    format_with_delimiter(input, DEFAULT_DELIMITER)
}

/// Formats an account number with a custom delimiter.
///
/// The delimiter is always inserted twice, even when the input is too short
/// to fill every group.
///
/// # Example
///
/// ```
/// use norwegian_banks::format::format_with_delimiter;
///
/// assert_eq!(format_with_delimiter("12345678903", " "), "1234 56 78903");
/// assert_eq!(format_with_delimiter("12345678903", ""), "12345678903");
/// assert_eq!(format_with_delimiter("123", "."), "123..");
/// ```
pub fn format_with_delimiter(input: &str, delimiter: &str) -> String {
    let digits = strip_formatting(input);
    let [prefix, group, rest] = split_digits(&digits);

    let mut result = String::with_capacity(digits.len() + 2 * delimiter.len());
    result.push_str(prefix);
    result.push_str(delimiter);
    result.push_str(group);
    result.push_str(delimiter);
    result.push_str(rest);
    result
}

/// Strips all formatting from an account number, leaving only digits.
///
/// # Example
///
/// ```
/// use norwegian_banks::format::strip_formatting;
///
/// assert_eq!(strip_formatting("1594.22.87248"), "15942287248");
/// assert_eq!(strip_formatting("1594 22 87248"), "15942287248");
/// ```
pub fn strip_formatting(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Splits an account number into its prefix, group and remainder.
///
/// Empty groups are omitted.
///
/// # Example
///
/// ```
/// use norwegian_banks::format::split_into_groups;
///
/// assert_eq!(split_into_groups("1594.22.87248"), vec!["1594", "22", "87248"]);
/// assert_eq!(split_into_groups("15942"), vec!["1594", "2"]);
/// ```
pub fn split_into_groups(input: &str) -> Vec<String> {
    let digits = strip_formatting(input);
    split_digits(&digits)
        .iter()
        .filter(|g| !g.is_empty())
        .map(|g| g.to_string())
        .collect()
}

/// Checks that a string contains only digits and common separators.
///
/// Valid characters are digits, spaces, periods and dashes.
///
/// # Example
///
/// ```
/// use norwegian_banks::format::is_valid_format;
///
/// assert!(is_valid_format("1594.22.87248"));
/// assert!(is_valid_format("1594 22 87248"));
/// assert!(!is_valid_format("1594/22/87248"));
/// ```
pub fn is_valid_format(input: &str) -> bool {
    input
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-' || c == '.')
}

/// Splits an all-digit string at positions 4 and 6.
fn split_digits(digits: &str) -> [&str; 3] {
    let prefix_end = digits.len().min(PREFIX_DIGITS);
    let group_end = digits.len().min(PREFIX_DIGITS + GROUP_DIGITS);
    [
        &digits[..prefix_end],
        &digits[prefix_end..group_end],
        &digits[group_end..],
    ]
}
