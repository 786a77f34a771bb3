//! Evidence image retrieval
//!
//! Each image is fetched with a bounded timeout, staged in a temporary file
//! that is removed when dropped, and decoded into RGB pixels for the layout.

use std::fs;
use std::io::{Read, Write};
use std::time::Duration;

use image::{DynamicImage, GenericImageView};
use thiserror::Error;
use url::Url;

use super::layout::RasterImage;

/// Upper bound on a single evidence download
const MAX_EVIDENCE_BYTES: u64 = 32 * 1024 * 1024;

/// Longest edge of an embedded evidence image, in pixels
const MAX_EDGE_PX: u32 = 1600;

/// Why an evidence URL could not be read
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid evidence URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("unsupported URL scheme '{scheme}' in '{url}'")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("server answered {code} for '{url}'")]
    Status { url: String, code: u16 },

    #[error("could not reach '{url}': {message}")]
    Transport { url: String, message: String },

    #[error("failed to read '{url}'")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why an evidence image was replaced by a placeholder
#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to stage evidence in a temporary file")]
    Stage(#[source] std::io::Error),

    #[error("evidence is not a readable image")]
    Decode(#[source] image::ImageError),
}

/// Source of evidence bytes by URL
pub trait EvidenceFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http(s)://` URLs with a timeout and reads `file://` URLs directly
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout(timeout)
            .build();
        Self { agent }
    }

    fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => FetchError::Status {
                url: url.to_string(),
                code,
            },
            ureq::Error::Transport(transport) => FetchError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            },
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_EVIDENCE_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|source| FetchError::Io {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes)
    }
}

impl EvidenceFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => self.fetch_http(url),
            "file" => {
                let path = parsed.to_file_path().map_err(|_| FetchError::InvalidUrl {
                    url: url.to_string(),
                    message: "not a local file path".to_string(),
                })?;
                fs::read(&path).map_err(|source| FetchError::Io {
                    url: url.to_string(),
                    source,
                })
            }
            other => Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
                scheme: other.to_string(),
            }),
        }
    }
}

/// Fetch, stage and decode one evidence image
pub fn load_evidence(
    fetcher: &dyn EvidenceFetcher,
    url: &str,
) -> Result<RasterImage, EvidenceError> {
    let bytes = fetcher.fetch(url)?;
    let format = image::guess_format(&bytes).map_err(EvidenceError::Decode)?;
    let suffix = format
        .extensions_str()
        .first()
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let mut staged = tempfile::Builder::new()
        .prefix("qag-evidence-")
        .suffix(&suffix)
        .tempfile()
        .map_err(EvidenceError::Stage)?;
    staged.write_all(&bytes).map_err(EvidenceError::Stage)?;
    staged.flush().map_err(EvidenceError::Stage)?;

    let decoded = image::open(staged.path()).map_err(EvidenceError::Decode)?;
    tracing::debug!(url, path = %staged.path().display(), "evidence staged");
    Ok(to_raster(&decoded))
}

/// Flatten onto white and downscale oversized images
pub fn to_raster(img: &DynamicImage) -> RasterImage {
    let (w, h) = img.dimensions();
    let img = if w.max(h) > MAX_EDGE_PX {
        img.thumbnail(MAX_EDGE_PX, MAX_EDGE_PX)
    } else {
        img.clone()
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        for channel in [r, g, b] {
            let blended = (channel as u16 * alpha + 255 * (255 - alpha)) / 255;
            rgb.push(blended as u8);
        }
    }

    RasterImage { width, height, rgb }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn png_bytes(w: u32, h: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, pixel);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(1))
    }

    #[test]
    fn test_file_url_is_fetched_and_decoded() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("shot.png");
        fs::write(&path, png_bytes(4, 3, Rgba([10, 20, 30, 255]))).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let raster = load_evidence(&fetcher(), url.as_str()).unwrap();
        assert_eq!((raster.width, raster.height), (4, 3));
        assert_eq!(&raster.rgb[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let img = image::load_from_memory(&png_bytes(1, 1, Rgba([0, 0, 0, 0]))).unwrap();
        assert_eq!(to_raster(&img).rgb, vec![255, 255, 255]);
    }

    #[test]
    fn test_large_images_are_downscaled() {
        let img = DynamicImage::new_rgb8(3200, 800);
        let raster = to_raster(&img);
        assert_eq!(raster.width, MAX_EDGE_PX);
        assert_eq!(raster.height, 400);
    }

    #[test]
    fn test_fetch_errors_are_distinguished() {
        let fetcher = fetcher();
        assert!(matches!(
            fetcher.fetch("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            fetcher.fetch("ftp://example.com/x.png"),
            Err(FetchError::UnsupportedScheme { .. })
        ));

        let tmp = tempdir().unwrap();
        let missing = Url::from_file_path(tmp.path().join("gone.png")).unwrap();
        assert!(matches!(
            fetcher.fetch(missing.as_str()),
            Err(FetchError::Io { .. })
        ));
    }

    #[test]
    fn test_non_image_bytes_fail_to_decode() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("notes.png");
        fs::write(&path, b"definitely not an image").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let err = load_evidence(&fetcher(), url.as_str()).unwrap_err();
        assert!(matches!(err, EvidenceError::Decode(_)));
    }
}
