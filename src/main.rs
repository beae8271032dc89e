//! payqr command-line entrypoint

use clap::Parser;
use payqr::{CardBridge, Credentials, Error, PayqrConfig, Result, compose, logging};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "payqr",
    version,
    about = "Generate balance-card QR codes from a payment portal account"
)]
struct Cli {
    /// Number of QR codes to render into the output sheet (1-3)
    #[arg(short = 'q', long = "codes", value_name = "COUNT", default_value_t = 1)]
    codes: usize,

    /// Portal account username (falls back to config file / PAYQR_USERNAME)
    #[arg(short, long, value_name = "USERNAME")]
    username: Option<String>,

    /// Portal account password (falls back to config file / PAYQR_PASSWORD)
    #[arg(short, long, value_name = "PASSWORD")]
    password: Option<String>,

    /// Pixel size of each rendered QR code
    #[arg(short, long, value_name = "PIXELS")]
    size: Option<u32>,

    /// Output image path; format follows the extension (png/jpg/jpeg/gif)
    #[arg(short, long, value_name = "PATH", default_value = "qrcode.png")]
    output: PathBuf,

    /// Optional configuration file (toml/yaml). Defaults to payqr.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the run summary as formatted JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PayqrConfig::load(cli.config.as_deref())?;

    if let Some(size) = cli.size {
        config.render.size = size;
    }
    if let Some(ref username) = cli.username {
        config.credentials.username = Some(username.clone());
    }
    if let Some(ref password) = cli.password {
        config.credentials.password = Some(password.clone());
    }

    logging::init(&config.logging)?;

    // Every argument is validated before the first portal request.
    compose::validate_output_path(&cli.output)?;
    let credentials = resolve_credentials(&config)?;
    let bridge = CardBridge::new(&config)?;

    info!(
        portal = %config.portal.base_url,
        codes = cli.codes,
        "Fetching balance-card QR codes"
    );

    let images = bridge.fetch_codes(&credentials, cli.codes).await?;
    let sheet = compose::composite(&images, bridge.qr_size())?;
    compose::write(&sheet, &cli.output)?;

    if cli.json {
        let summary = json!({
            "codes": images.len(),
            "output": cli.output.display().to_string(),
            "width": sheet.width(),
            "height": sheet.height(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Wrote {} QR code(s) to {} ({}x{})",
            images.len(),
            cli.output.display(),
            sheet.width(),
            sheet.height()
        );
    }

    Ok(())
}

fn resolve_credentials(config: &PayqrConfig) -> Result<Credentials> {
    let username = config.credentials.username.as_deref().ok_or_else(|| {
        Error::Validation(
            "missing username: pass --username, set PAYQR_USERNAME, or add it to the config file"
                .to_string(),
        )
    })?;
    let password = config.credentials.password.as_deref().ok_or_else(|| {
        Error::Validation(
            "missing password: pass --password, set PAYQR_PASSWORD, or add it to the config file"
                .to_string(),
        )
    })?;

    Credentials::new(username, password)
}
