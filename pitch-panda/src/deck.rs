//! Slide loading: image files (or directories of them) into data-URL slides

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schemas::SlideImage;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Deck path not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported slide format '{}' (expected png, jpg, jpeg, webp or gif)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Load slides from image files and/or directories.
///
/// Directory entries are taken in natural file-name order (`slide2` before
/// `slide10`); non-image files inside a directory are skipped. Slides are
/// numbered from 1 across all inputs in the order given.
pub fn load_slides(paths: &[PathBuf]) -> Result<Vec<SlideImage>, DeckError> {
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(DeckError::NotFound(path.clone()));
        }

        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|source| DeckError::Io {
                path: path.clone(),
                source,
            })?;

            let mut images: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && mime_type(p).is_some())
                .collect();
            images.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
            files.extend(images);
        } else if mime_type(path).is_some() {
            files.push(path.clone());
        } else {
            return Err(DeckError::UnsupportedFormat(path.clone()));
        }
    }

    files
        .iter()
        .enumerate()
        .map(|(i, file)| load_slide(file, i as u32 + 1))
        .collect()
}

fn load_slide(path: &Path, page: u32) -> Result<SlideImage, DeckError> {
    let mime = mime_type(path).ok_or_else(|| DeckError::UnsupportedFormat(path.to_path_buf()))?;
    let bytes = std::fs::read(path).map_err(|source| DeckError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(SlideImage {
        page,
        image_data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        file_name: Some(file_name(path)),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Keep slides with `page >= 1` and an image data URL.
/// Returns the kept slides and how many were dropped.
pub fn validate_slides(slides: Vec<SlideImage>) -> (Vec<SlideImage>, usize) {
    let total = slides.len();
    let valid: Vec<SlideImage> = slides
        .into_iter()
        .filter(|s| s.page >= 1 && s.image_data_url.starts_with("data:image/"))
        .collect();
    let dropped = total - valid.len();
    (valid, dropped)
}

/// Compare file names with digit runs ordered numerically
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let mut x_num = String::new();
                while let Some(c) = a_chars.peek().copied().filter(char::is_ascii_digit) {
                    x_num.push(c);
                    a_chars.next();
                }
                let mut y_num = String::new();
                while let Some(c) = b_chars.peek().copied().filter(char::is_ascii_digit) {
                    y_num.push(c);
                    b_chars.next();
                }

                let x_trim = x_num.trim_start_matches('0');
                let y_trim = y_num.trim_start_matches('0');
                let ord = x_trim
                    .len()
                    .cmp(&y_trim.len())
                    .then_with(|| x_trim.cmp(y_trim));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["slide10.png", "slide2.png", "Slide1.png", "slide02b.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["Slide1.png", "slide2.png", "slide02b.png", "slide10.png"]);
    }

    #[test]
    fn test_load_directory_in_natural_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "slide10.png", b"ten");
        write(dir.path(), "slide2.jpg", b"two");
        write(dir.path(), "notes.txt", b"skip me");
        write(dir.path(), "slide1.PNG", b"one");

        let slides = load_slides(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(slides.len(), 3);
        assert_eq!(slides[0].file_name.as_deref(), Some("slide1.PNG"));
        assert_eq!(slides[1].file_name.as_deref(), Some("slide2.jpg"));
        assert_eq!(slides[2].file_name.as_deref(), Some("slide10.png"));
        assert_eq!(slides.iter().map(|s| s.page).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(slides[1].image_data_url, "data:image/jpeg;base64,dHdv");
    }

    #[test]
    fn test_load_rejects_unknown_file_and_missing_path() {
        let dir = TempDir::new().unwrap();
        let txt = write(dir.path(), "deck.pdf", b"%PDF");

        assert!(matches!(load_slides(&[txt]), Err(DeckError::UnsupportedFormat(_))));
        assert!(matches!(
            load_slides(&[dir.path().join("missing.png")]),
            Err(DeckError::NotFound(_))
        ));
    }

    #[test]
    fn test_validate_slides_drops_invalid() {
        let slides = vec![
            SlideImage { page: 1, image_data_url: "data:image/png;base64,AA".into(), file_name: None },
            SlideImage { page: 0, image_data_url: "data:image/png;base64,AA".into(), file_name: None },
            SlideImage { page: 2, image_data_url: "https://example.com/x.png".into(), file_name: None },
        ];

        let (valid, dropped) = validate_slides(slides);
        assert_eq!(valid.len(), 1);
        assert_eq!(dropped, 2);
    }
}
