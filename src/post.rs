use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat, ImageReader,
};
use std::io::Cursor;

use crate::error::ResizeError;
use crate::params::{OutputFormat, ResizeRequest};

/// Encoded output ready to be written as a response body.
#[derive(Debug)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Decode, resize, encode. Blocking; call from a blocking thread.
pub fn process(bytes: &[u8], req: &ResizeRequest) -> Result<EncodedImage, ResizeError> {
    let img = decode(bytes)?;
    let resized = resize(&img, req.width, req.height);
    let bytes = encode(&resized, req.format, req.quality)?;
    Ok(EncodedImage { bytes, content_type: req.format.content_type() })
}

/// Sniffs the container from the leading bytes rather than trusting the upload's filename.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ResizeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ResizeError::Decode(e.into()))?;
    reader.decode().map_err(ResizeError::Decode)
}

/// Stretches to exactly `width` x `height` with Lanczos3; aspect ratio is the caller's problem.
pub fn resize(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::Lanczos3)
}

pub fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u32,
) -> Result<Vec<u8>, ResizeError> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
            // JPEG has no alpha channel
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(ResizeError::Encode)?;
        }
        OutputFormat::Png => {
            img.write_to(&mut buf, ImageFormat::Png)
                .map_err(ResizeError::Encode)?;
        }
    }
    Ok(buf.into_inner())
}

/// Quality is not validated upstream; out-of-range values saturate like the encoder would.
fn jpeg_quality(q: u32) -> u8 {
    q.clamp(1, 100) as u8
}
