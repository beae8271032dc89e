//! Render a sample card token into a QR sheet without touching the portal
//!
//! Usage: cargo run --example generate_codes

use payqr::portal::CardToken;
use payqr::{QrEncoder, compose};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let encoder = QrEncoder::new();
    let token = CardToken::parse("DEMO-0001-TOKEN")?;

    let images = encoder.encode_batch(&token, 3)?;
    let sheet = compose::composite(&images, encoder.size())?;
    sheet.save("qr_sheet.png")?;

    println!(
        "✓ Wrote 3 demo QR codes to qr_sheet.png ({}x{})",
        sheet.width(),
        sheet.height()
    );

    Ok(())
}
