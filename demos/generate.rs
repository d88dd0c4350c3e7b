use base64::{engine::general_purpose::STANDARD, Engine as _};
use rgen_studio::{GatewayConfig, GenerationRequest, ImageGateway, ImageRef, InlineData};
use std::env;
use std::fs;

/// Usage: cargo run --example generate -- <photo.png> "<prompt>" [rotation]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();
    rgen_studio::logger::init()?;
    if env_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found");
    }

    let mut args = env::args().skip(1);
    let photo = args.next().ok_or("missing path to a reference photo")?;
    let prompt = args
        .next()
        .unwrap_or_else(|| "studio shot on a plain white background".to_string());
    let rotation: i64 = args.next().map(|r| r.parse()).transpose()?.unwrap_or(0);

    let mime_type = if photo.ends_with(".jpg") || photo.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "image/png"
    };
    let data = STANDARD.encode(fs::read(&photo)?);

    let request = GenerationRequest {
        prompt: Some(prompt),
        rotation: Some(rotation.into()),
        images: vec![ImageRef::Inline {
            inline_data: InlineData::new(mime_type, data),
        }],
    };

    let config = GatewayConfig::from_env()?;
    let gateway = ImageGateway::new(&config);
    let image = gateway.generate(&request).await?;

    let filename = format!("generated_{}.png", chrono::Utc::now().timestamp());
    fs::write(&filename, STANDARD.decode(image.data.as_bytes())?)?;
    log::info!("💾 Image saved to: {}", filename);

    Ok(())
}
