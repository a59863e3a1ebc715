use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// Pixel layout of a buffer delivered by the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// JPEG compressed still
    Jpeg,
    /// Packed 8-bit RGB
    Rgb24,
}

/// Clockwise rotation in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// Normalise any multiple of 90 degrees, negative values included.
    /// Returns `None` for angles that are not a quarter turn.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Rotate0),
            90 => Some(Rotation::Rotate90),
            180 => Some(Rotation::Rotate180),
            270 => Some(Rotation::Rotate270),
            _ => None,
        }
    }

    /// Apply the rotation to a decoded image
    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        match self {
            Rotation::Rotate0 => image,
            Rotation::Rotate90 => image.rotate90(),
            Rotation::Rotate180 => image.rotate180(),
            Rotation::Rotate270 => image.rotate270(),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Raw buffer handed over by the hardware once a still has been taken.
///
/// The buffer belongs to the hardware pipeline until it is released. Release
/// happens exactly once, either through [`CapturedImage::close`] or on drop.
pub struct CapturedImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: FrameFormat,
    rotation_degrees: i32,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl CapturedImage {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
        rotation_degrees: i32,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            rotation_degrees,
            release: None,
        }
    }

    /// Attach a hook run when the buffer is given back to the hardware
    pub fn with_release_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release = Some(Box::new(hook));
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Rotation the sensor reports for this still
    pub fn rotation_degrees(&self) -> i32 {
        self.rotation_degrees
    }

    /// Decode into an upright picture, rotating by the reported degrees
    pub fn decode(&self) -> Result<Picture, CaptureError> {
        let decoded = match self.format {
            FrameFormat::Jpeg => image::load_from_memory(&self.data).map_err(|e| {
                CaptureError::Decode {
                    details: format!("JPEG decode failed: {}", e),
                }
            })?,
            FrameFormat::Rgb24 => {
                let expected = self.width as usize * self.height as usize * 3;
                if self.data.len() != expected {
                    return Err(CaptureError::InvalidBuffer {
                        details: format!(
                            "RGB buffer holds {} bytes, expected {} for {}x{}",
                            self.data.len(),
                            expected,
                            self.width,
                            self.height
                        ),
                    });
                }
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(self.width, self.height, self.data.clone()).ok_or_else(
                        || CaptureError::InvalidBuffer {
                            details: "RGB buffer does not match dimensions".to_string(),
                        },
                    )?;
                DynamicImage::ImageRgb8(buffer)
            }
        };

        let rotation = Rotation::from_degrees(self.rotation_degrees).ok_or_else(|| {
            CaptureError::InvalidBuffer {
                details: format!("unsupported rotation {} degrees", self.rotation_degrees),
            }
        })?;

        let upright = if rotation == Rotation::Rotate0 {
            decoded
        } else {
            trace!("Rotating captured image by {}", rotation);
            rotation.apply(decoded)
        };

        Ok(Picture::new(upright))
    }

    /// Give the buffer back to the hardware
    pub fn close(self) {
        trace!("Releasing captured buffer ({} bytes)", self.data.len());
        drop(self);
    }
}

impl Drop for CapturedImage {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("bytes", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("rotation_degrees", &self.rotation_degrees)
            .finish()
    }
}

/// Decoded, upright still picture
#[derive(Clone)]
pub struct Picture {
    id: Uuid,
    captured_at: DateTime<Utc>,
    image: Arc<DynamicImage>,
}

impl Picture {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            image: Arc::new(image),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("id", &self.id)
            .field("captured_at", &self.captured_at)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]));
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 90)
            .encode_image(&DynamicImage::ImageRgb8(image))
            .unwrap();
        buf
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::Rotate0.degrees(), 0);
        assert_eq!(Rotation::Rotate90.degrees(), 90);
        assert_eq!(Rotation::Rotate180.degrees(), 180);
        assert_eq!(Rotation::Rotate270.degrees(), 270);
    }

    #[test]
    fn test_rotation_from_degrees_normalises() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::Rotate0));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Rotate90));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Rotate270));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn test_decode_jpeg_with_rotation_swaps_dimensions() {
        let captured = CapturedImage::new(jpeg_bytes(64, 32), 64, 32, FrameFormat::Jpeg, 90);

        let picture = captured.decode().unwrap();
        assert_eq!(picture.dimensions(), (32, 64));
    }

    #[test]
    fn test_decode_without_rotation_keeps_dimensions() {
        let captured = CapturedImage::new(jpeg_bytes(64, 32), 64, 32, FrameFormat::Jpeg, 0);

        let picture = captured.decode().unwrap();
        assert_eq!(picture.dimensions(), (64, 32));
    }

    #[test]
    fn test_decode_rgb_buffer() {
        let captured = CapturedImage::new(vec![0u8; 8 * 4 * 3], 8, 4, FrameFormat::Rgb24, 180);

        let picture = captured.decode().unwrap();
        assert_eq!(picture.dimensions(), (8, 4));
    }

    #[test]
    fn test_decode_rejects_short_rgb_buffer() {
        let captured = CapturedImage::new(vec![0u8; 10], 8, 4, FrameFormat::Rgb24, 0);

        assert!(matches!(
            captured.decode(),
            Err(CaptureError::InvalidBuffer { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_garbage_jpeg() {
        let captured = CapturedImage::new(vec![1, 2, 3, 4], 2, 2, FrameFormat::Jpeg, 0);

        assert!(matches!(captured.decode(), Err(CaptureError::Decode { .. })));
    }

    #[test]
    fn test_release_hook_runs_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);

        let captured = CapturedImage::new(vec![0u8; 12], 2, 2, FrameFormat::Rgb24, 0)
            .with_release_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        captured.close();

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pictures_compare_by_identity() {
        let image = DynamicImage::new_rgb8(2, 2);
        let first = Picture::new(image.clone());
        let second = Picture::new(image);

        assert_eq!(first, first.clone());
        assert_ne!(first, second);
    }
}
