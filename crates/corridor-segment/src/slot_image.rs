use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use corridor_content::{ContentError, ImageSource};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotImageError {
    #[error("image source failed: {0}")]
    Source(#[from] ContentError),

    #[error("invalid base64 image data: {0}")]
    Base64(String),

    #[error("undecodable raster: {0}")]
    Raster(String),

    #[error("empty image reference")]
    EmptyReference,

    #[error("image producer went away before resolving")]
    Abandoned,
}

/// A validated image ready to be shown on a picture frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotImage {
    source: ImageSource,
    dimensions: Option<(u32, u32)>,
}

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

impl SlotImage {
    /// Inline data is decoded fully so a broken raster never reaches a frame.
    /// References are kept as-is for the renderer to fetch.
    pub fn decode(source: ImageSource) -> Result<Self, SlotImageError> {
        match source {
            ImageSource::Base64(data) => {
                let data = data.trim();
                let data = data.strip_prefix(DATA_URI_PREFIX).unwrap_or(data);
                let bytes = STANDARD
                    .decode(data)
                    .map_err(|e| SlotImageError::Base64(e.to_string()))?;
                let img = image::load_from_memory(&bytes)
                    .map_err(|e| SlotImageError::Raster(e.to_string()))?;
                Ok(Self {
                    dimensions: Some((img.width(), img.height())),
                    source: ImageSource::Base64(data.to_string()),
                })
            }
            ImageSource::Url(url) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(SlotImageError::EmptyReference);
                }
                Ok(Self {
                    source: ImageSource::Url(url.to_string()),
                    dimensions: None,
                })
            }
        }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Pixel size, known only for inline data.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// URI a renderer can load the texture from.
    pub fn texture_uri(&self) -> String {
        match &self.source {
            ImageSource::Base64(data) => format!("{DATA_URI_PREFIX}{data}"),
            ImageSource::Url(url) => url.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn png_b64(w: u32, h: u32) -> String {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        STANDARD.encode(buf.into_inner())
    }

    #[test]
    fn decodes_inline_png_and_reports_size() {
        let img = SlotImage::decode(ImageSource::Base64(png_b64(3, 2))).unwrap();
        assert_eq!(img.dimensions(), Some((3, 2)));
        assert!(img.texture_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn accepts_data_uri_prefix() {
        let raw = format!("{DATA_URI_PREFIX}{}", png_b64(1, 1));
        let img = SlotImage::decode(ImageSource::Base64(raw)).unwrap();
        assert_eq!(img.dimensions(), Some((1, 1)));
        assert_eq!(img.texture_uri().matches("base64,").count(), 1);
    }

    #[test]
    fn rejects_bad_base64_and_bad_raster() {
        assert!(matches!(
            SlotImage::decode(ImageSource::Base64("not base64!!".into())),
            Err(SlotImageError::Base64(_))
        ));
        let garbage = STANDARD.encode(b"definitely not a png");
        assert!(matches!(
            SlotImage::decode(ImageSource::Base64(garbage)),
            Err(SlotImageError::Raster(_))
        ));
    }

    #[test]
    fn references_pass_through_but_must_be_non_empty() {
        let img = SlotImage::decode(ImageSource::Url(" https://x/y.png ".into())).unwrap();
        assert_eq!(img.texture_uri(), "https://x/y.png");
        assert_eq!(img.dimensions(), None);
        assert_eq!(
            SlotImage::decode(ImageSource::Url("  ".into())),
            Err(SlotImageError::EmptyReference)
        );
    }
}
