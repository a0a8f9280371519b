use crate::error::{AppError, AppResult};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

/// Maps a ticket's check-in URL to a PNG data URL.
#[derive(Clone)]
pub struct QrGenerator {
    base_url: String,
}

impl QrGenerator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn checkin_url(&self, ticket_id: i64) -> String {
        format!("{}/checkin/{}", self.base_url, ticket_id)
    }

    /// Encoding failures are logged and yield `None`; callers keep going without a code.
    pub fn generate(&self, url: &str) -> Option<String> {
        match encode_png(url) {
            Ok(png) => Some(format!("data:image/png;base64,{}", STANDARD.encode(png))),
            Err(e) => {
                log::warn!("QR code generation failed for {url}: {e}");
                None
            }
        }
    }
}

fn encode_png(data: &str) -> AppResult<Vec<u8>> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::ExternalApiError(format!("QR encoding failed: {e}")))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(200, 200)
        .build();

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image)
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| AppError::ExternalApiError(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}
