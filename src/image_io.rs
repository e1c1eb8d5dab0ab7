use std::path::{Path, PathBuf};
use std::fs;
use image::{ImageFormat, RgbaImage};

use crate::errors::{BubbleCharError, Result};
use crate::silhouette::Silhouette;

/// File extensions accepted as bubble frames
const FRAME_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// A binarized frame with its metadata
pub struct InputFrame {
    pub silhouette: Silhouette,
    pub path: PathBuf,
    pub filename: String,
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Get all frame images directly inside a directory, sorted by file name
pub fn get_frame_files_in_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(BubbleCharError::InvalidPath(dir_path.to_path_buf()));
    }

    if !dir_path.is_dir() {
        return Err(BubbleCharError::Config(format!(
            "{} is not a directory", dir_path.display()
        )));
    }

    let mut frames = Vec::new();
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();
        if path.is_file() && is_frame_file(&path) {
            frames.push(path);
        }
    }

    frames.sort();
    Ok(frames)
}

/// Load a frame as grayscale and binarize it at `threshold`
pub fn load_silhouette<P: AsRef<Path>>(path: P, threshold: u8) -> Result<InputFrame> {
    let path = path.as_ref();

    // Get filename without extension
    let filename = path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| BubbleCharError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let gray = image::open(path)?.to_luma8();

    Ok(InputFrame {
        silhouette: Silhouette::from_gray(&gray, threshold),
        path: path.to_path_buf(),
        filename,
    })
}

/// Save an RGBA image to the specified path
pub fn save_image<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use tempfile::tempdir;

    #[test]
    fn loads_and_binarizes_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1-00001.png");

        let gray = GrayImage::from_fn(8, 8, |x, y| {
            Luma([if (2..6).contains(&x) && (3..5).contains(&y) { 230 } else { 40 }])
        });
        gray.save(&path).unwrap();

        let frame = load_silhouette(&path, 200).unwrap();
        assert_eq!(frame.filename, "1-00001");
        assert_eq!(frame.silhouette.area(), 8);
        assert!(frame.silhouette.is_foreground(2, 3));
        assert!(!frame.silhouette.is_foreground(0, 0));
    }

    #[test]
    fn lists_frames_sorted() {
        let dir = tempdir().unwrap();
        let gray = GrayImage::new(2, 2);
        for name in ["b.png", "a.png", "c.jpg"] {
            gray.save(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let frames = get_frame_files_in_dir(dir.path()).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.jpg"]);
    }

    #[test]
    fn missing_directory_is_invalid_path() {
        assert!(matches!(
            get_frame_files_in_dir("/no/such/frames"),
            Err(BubbleCharError::InvalidPath(_))
        ));
    }
}
