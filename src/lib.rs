//! PAYQR - balance-card QR sheets from a payment portal account
//!
//! This library logs in to a payment portal, extracts the balance-card token
//! embedded in the account page, and renders it as one or more QR codes
//! composited into a single printable image.
//!
//! # Features
//!
//! - **Portal login**: CSRF-protected form authentication with cookie handling
//! - **Configurable extraction**: the token's selector lives in configuration,
//!   surviving portal layout changes
//! - **Deterministic rendering**: identical input produces pixel-identical output
//!
//! # Example
//!
//! ```no_run
//! use payqr::{CardBridge, Credentials, PayqrConfig, compose};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PayqrConfig::load(None)?;
//!     let bridge = CardBridge::new(&config)?;
//!
//!     let credentials = Credentials::new("alice", "hunter2")?;
//!     let codes = bridge.fetch_codes(&credentials, 2).await?;
//!
//!     let sheet = compose::composite(&codes, bridge.qr_size())?;
//!     sheet.save("qrcode.png")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod compose;
pub mod config;
pub mod error;
pub mod logging;
pub mod portal;
pub mod qr;

// Re-exports for convenience
pub use error::{Error, Result};

pub use config::{
    CredentialOptions, LogRotation, LoggingOptions, PayqrConfig, PortalOptions, RenderOptions,
};
pub use portal::{CardToken, Credentials, PortalClient, PortalSession, TokenRule};
pub use qr::QrEncoder;

use image::DynamicImage;

/// High-level bridge combining portal login, token extraction and QR encoding
pub struct CardBridge {
    portal: PortalOptions,
    encoder: QrEncoder,
}

impl CardBridge {
    /// Create a bridge from resolved configuration.
    pub fn new(config: &PayqrConfig) -> Result<Self> {
        let encoder = QrEncoder::with_size(config.render.size)?;
        Ok(Self {
            portal: config.portal.clone(),
            encoder,
        })
    }

    /// Pixel size of each rendered QR code.
    pub fn qr_size(&self) -> u32 {
        self.encoder.size()
    }

    /// Log in, extract the card token, and encode it into `count` QR codes.
    ///
    /// The count is validated before the first portal request is made.
    pub async fn fetch_codes(
        &self,
        credentials: &Credentials,
        count: usize,
    ) -> Result<Vec<DynamicImage>> {
        if count == 0 || count > qr::MAX_CODES {
            return Err(Error::Validation(format!(
                "code count must be between 1 and {}, got {count}",
                qr::MAX_CODES
            )));
        }

        let client = PortalClient::new(&self.portal)?;
        let session = client.login(credentials).await?;
        let token = session.card_token().await?;

        self.encoder.encode_batch(&token, count)
    }
}
