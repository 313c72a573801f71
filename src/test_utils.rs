//! Shared proptest strategies.

use proptest::prelude::*;

/// Valid UTF-8 strings of up to `max` chars, without null bytes.
pub fn arb_valid_string(max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>().prop_filter("no NUL", |c| *c != '\0'), 0..max)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Arbitrary byte sequences of up to `max` bytes.
pub fn arb_bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..max)
}

fn arb_unreserved() -> impl Strategy<Value = u8> {
    prop::sample::select(
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~".to_vec(),
    )
}

fn percent_triplet(byte: u8, lower: bool) -> String {
    if lower {
        format!("%{:02x}", byte)
    } else {
        format!("%{:02X}", byte)
    }
}

/// URI text that normalization leaves unchanged after decoding.
///
/// Tokens are raw unreserved characters, percent-encoded unreserved
/// characters in either hex case, and percent-encoded UTF-8 of arbitrary
/// non-null chars.
pub fn arb_uri_safe(max: usize) -> impl Strategy<Value = String> {
    let token = prop_oneof![
        arb_unreserved().prop_map(|b| (b as char).to_string()),
        (arb_unreserved(), any::<bool>()).prop_map(|(b, lower)| percent_triplet(b, lower)),
        (any::<char>().prop_filter("no NUL", |c| *c != '\0'), any::<bool>()).prop_map(
            |(c, lower)| {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| percent_triplet(b, lower))
                    .collect::<String>()
            }
        ),
    ];
    prop::collection::vec(token, 0..max).prop_map(|tokens| tokens.concat())
}
