use std::path::Path;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Decodes an image file into a BGR frame with the given index.
pub fn decode_frame(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::from_rgb(rgb.into_raw(), width, height, index)?)
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_decode_converts_to_bgr() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("red.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([255, 0, 0]))
            .save(&path)
            .unwrap();

        let frame = decode_frame(&path, 4).unwrap();

        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 4);
        assert_eq!(&frame.data()[..3], &[0, 0, 255]);
    }

    #[test]
    fn test_decode_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(decode_frame(&tmp.path().join("none.png"), 0).is_err());
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(&PathBuf::from("a/b/photo.JPG")));
        assert!(is_image(&PathBuf::from("frame_001.png")));
        assert!(!is_image(&PathBuf::from("detections.json")));
        assert!(!is_image(&PathBuf::from("no_extension")));
    }
}
