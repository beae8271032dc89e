//! QR code generation for balance-card tokens
//!
//! Encodes the extracted card token into one or more raster QR codes. When
//! several codes are requested, each payload carries a distinguishing index
//! so that every code scans as a distinct payment voucher.

mod encoder;

pub use encoder::QrEncoder;

use crate::portal::CardToken;

/// Upper bound on the number of QR codes per run
pub const MAX_CODES: usize = 3;

/// Default pixel size of a rendered QR code
pub const DEFAULT_SIZE: u32 = 300;

/// Smallest accepted QR pixel size
pub const MIN_SIZE: u32 = 64;

/// Largest accepted QR pixel size
pub const MAX_SIZE: u32 = 2048;

/// Build the payload encoded into the QR code at `index`.
///
/// A single code carries the bare token. A multi-code sheet appends a
/// 1-based counter so the codes remain distinguishable when scanned.
pub fn payload_for(token: &CardToken, index: usize, count: usize) -> String {
    if count == 1 {
        token.as_str().to_string()
    } else {
        format!("{}/{}", token.as_str(), index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_code_payload_is_the_bare_token() {
        let token = CardToken::parse("CARD-1").unwrap();
        assert_eq!(payload_for(&token, 0, 1), "CARD-1");
    }

    #[test]
    fn multi_code_payloads_carry_a_counter() {
        let token = CardToken::parse("CARD-1").unwrap();
        assert_eq!(payload_for(&token, 0, 3), "CARD-1/1");
        assert_eq!(payload_for(&token, 2, 3), "CARD-1/3");
    }
}
