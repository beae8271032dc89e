//! QR code encoder

use crate::error::{Error, Result};
use crate::portal::CardToken;
use crate::qr::{self, MAX_CODES, MAX_SIZE, MIN_SIZE};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Luma};
use qrcode::QrCode;

/// QR code encoder
///
/// Renders are resized to the exact configured pixel size with
/// nearest-neighbour sampling, so identical input always produces identical
/// pixels.
#[derive(Debug)]
pub struct QrEncoder {
    /// Error correction level
    ecc_level: qrcode::EcLevel,
    /// Edge length of each rendered code in pixels
    size: u32,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings (Medium ECC, 300 px).
    pub fn new() -> Self {
        Self {
            ecc_level: qrcode::EcLevel::M,
            size: qr::DEFAULT_SIZE,
        }
    }

    /// Create an encoder rendering at a specific pixel size.
    pub fn with_size(size: u32) -> Result<Self> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(Error::Validation(format!(
                "QR size must be between {MIN_SIZE} and {MAX_SIZE} pixels, got {size}"
            )));
        }
        Ok(Self {
            ecc_level: qrcode::EcLevel::M,
            size,
        })
    }

    /// Use a specific error correction level.
    pub fn with_ecc_level(mut self, ecc_level: qrcode::EcLevel) -> Self {
        self.ecc_level = ecc_level;
        self
    }

    /// Pixel size of each rendered code.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Encode a payload string into a QR code image.
    pub fn encode(&self, payload: &str) -> Result<DynamicImage> {
        let code = QrCode::with_error_correction_level(payload, self.ecc_level)
            .map_err(|e| Error::QrEncode(format!("Failed to create QR code: {}", e)))?;

        let rendered = code
            .render::<Luma<u8>>()
            .min_dimensions(self.size, self.size)
            .build();

        // The module grid rarely lands exactly on the requested size; snap to
        // it so grid layout and output dimensions stay exact.
        let exact = imageops::resize(&rendered, self.size, self.size, FilterType::Nearest);

        Ok(DynamicImage::ImageLuma8(exact))
    }

    /// Encode a card token into `count` distinct QR code images.
    pub fn encode_batch(&self, token: &CardToken, count: usize) -> Result<Vec<DynamicImage>> {
        if count == 0 || count > MAX_CODES {
            return Err(Error::Validation(format!(
                "code count must be between 1 and {MAX_CODES}, got {count}"
            )));
        }

        (0..count)
            .map(|index| self.encode(&qr::payload_for(token, index, count)))
            .collect()
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(img: &DynamicImage) -> String {
        let mut prepared = rqrr::PreparedImage::prepare(img.to_luma8());
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR code");
        grids[0].decode().expect("decode QR grid").1
    }

    #[test]
    fn encode_produces_exact_dimensions() {
        let encoder = QrEncoder::with_size(256).unwrap();
        let img = encoder.encode("CARD-0042").unwrap();
        assert_eq!((img.width(), img.height()), (256, 256));
    }

    #[test]
    fn round_trip_preserves_the_token() {
        let encoder = QrEncoder::new();
        let img = encoder.encode("CARD-0042-XYZ").unwrap();
        assert_eq!(decode(&img), "CARD-0042-XYZ");
    }

    #[test]
    fn batch_yields_exactly_n_distinct_codes() {
        let encoder = QrEncoder::new();
        let token = CardToken::parse("CARD-0042").unwrap();

        let images = encoder.encode_batch(&token, 3).unwrap();
        assert_eq!(images.len(), 3);

        let payloads: Vec<String> = images.iter().map(decode).collect();
        assert_eq!(payloads, ["CARD-0042/1", "CARD-0042/2", "CARD-0042/3"]);
    }

    #[test]
    fn single_code_batch_encodes_the_bare_token() {
        let encoder = QrEncoder::new();
        let token = CardToken::parse("CARD-0042").unwrap();

        let images = encoder.encode_batch(&token, 1).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(decode(&images[0]), "CARD-0042");
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = QrEncoder::new();
        let first = encoder.encode("CARD-0042").unwrap();
        let second = encoder.encode("CARD-0042").unwrap();
        assert_eq!(first.to_luma8().as_raw(), second.to_luma8().as_raw());
    }

    #[test]
    fn out_of_range_count_is_a_validation_error() {
        let encoder = QrEncoder::new();
        let token = CardToken::parse("CARD-0042").unwrap();

        for count in [0, MAX_CODES + 1] {
            let err = encoder.encode_batch(&token, count).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "count {count}: {err:?}");
        }
    }

    #[test]
    fn out_of_range_size_is_a_validation_error() {
        for size in [0, MIN_SIZE - 1, MAX_SIZE + 1] {
            let err = QrEncoder::with_size(size).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "size {size}: {err:?}");
        }
    }
}
