use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use reqwest::blocking::Client;
use tracing::{debug, warn};

pub const THUMB_MAX_W: u32 = 96;
pub const THUMB_QUALITY: u8 = 82;

const THUMB_RETENTION_DAYS: u64 = 14;
const THUMB_RETENTION_SECS: u64 = THUMB_RETENTION_DAYS * 24 * 60 * 60;

/// `<root>/thumbs`, created if missing and pruned of stale entries.
/// Falls back to `root` itself when the subfolder can't be created.
pub fn prepare_thumb_dir(root: &Path) -> PathBuf {
    let mut dir = root.join("thumbs");
    if let Err(e) = fs::create_dir_all(&dir) {
        warn!("failed to create thumbnail dir {}: {e}", dir.display());
        dir = root.to_path_buf();
        let _ = fs::create_dir_all(&dir);
    }
    match prune_thumb_dir(&dir) {
        Ok(0) => {}
        Ok(n) => debug!("pruned {n} stale thumbnails from {}", dir.display()),
        Err(err) => warn!("thumbnail cache prune failed: {err}"),
    }
    dir
}

/// Removes cached images older than the retention window and any leftover
/// `.part` files from interrupted writes.
pub fn prune_thumb_dir(dir: &Path) -> std::io::Result<usize> {
    prune_older_than(dir, Duration::from_secs(THUMB_RETENTION_SECS))
}

fn prune_older_than(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    prune_with(dir, max_age, |path| fs::remove_file(path))
}

fn prune_with(
    dir: &Path,
    max_age: Duration,
    mut remove: impl FnMut(&Path) -> std::io::Result<()>,
) -> std::io::Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
        else {
            continue;
        };
        let stale = match ext.as_str() {
            "part" => true,
            "jpg" | "jpeg" | "png" => {
                let modified = entry
                    .metadata()?
                    .modified()
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                modified < cutoff
            }
            _ => false,
        };
        if stale {
            match remove(&path) {
                Ok(()) => removed += 1,
                Err(err) => debug!("could not remove {}: {err}", path.display()),
            }
        }
    }
    Ok(removed)
}

pub fn url_to_cache_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

pub fn thumb_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.jpg"))
}

pub fn find_cached(dir: &Path, key: &str) -> Option<PathBuf> {
    let p = thumb_path(dir, key);
    p.exists().then_some(p)
}

/// Return (width, height, RGBA8 bytes) for a cached image file.
pub fn load_rgba(path: &Path) -> Result<(u32, u32, Vec<u8>), String> {
    let img = image::ImageReader::open(path)
        .map_err(|e| format!("open image {}: {e}", path.display()))?
        .with_guessed_format()
        .map_err(|e| format!("guess format {}: {e}", path.display()))?
        .decode()
        .map_err(|e| format!("decode {}: {e}", path.display()))?;
    let (w, h) = img.dimensions();
    Ok((w, h, img.to_rgba8().into_raw()))
}

/// Shrink to `max_width` keeping aspect; narrower images pass through.
pub fn shrink_to_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_width {
        return img;
    }
    let new_h = ((h as f32) * (max_width as f32 / w as f32))
        .round()
        .max(1.0) as u32;
    img.resize_exact(max_width, new_h, FilterType::CatmullRom)
}

/// Encode as JPEG and write `<dir>/<key>.jpg` through a `.part` file.
pub fn store_jpeg(dir: &Path, key: &str, img: &DynamicImage, quality: u8) -> Result<PathBuf, String> {
    let dest = thumb_path(dir, key);
    let mut jpeg_bytes: Vec<u8> = Vec::new();
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, quality)
        .encode_image(&rgb)
        .map_err(|e| format!("jpeg encode: {e}"))?;

    let tmp = dest.with_extension("jpg.part");
    {
        let mut f = fs::File::create(&tmp).map_err(|e| format!("create tmp: {e}"))?;
        f.write_all(&jpeg_bytes)
            .map_err(|e| format!("write: {e}"))?;
    }
    fs::rename(&tmp, &dest).map_err(|e| format!("rename: {e}"))?;
    Ok(dest)
}

/// Download a thumbnail with a shared client, shrink it and cache it as JPEG.
/// Returns the cached path immediately when the key is already on disk.
pub fn download_thumbnail(
    client: &Client,
    dir: &Path,
    url: &str,
    key: &str,
) -> Result<PathBuf, String> {
    if let Some(hit) = find_cached(dir, key) {
        return Ok(hit);
    }
    let bytes = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(|e| format!("download {url}: {e}"))?;
    let img = image::load_from_memory(&bytes).map_err(|e| format!("decode {url}: {e}"))?;
    store_jpeg(dir, key, &shrink_to_width(img, THUMB_MAX_W), THUMB_QUALITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 255])))
    }

    #[test]
    fn cache_key_is_stable_md5() {
        let a = url_to_cache_key("http://img/1.jpg");
        assert_eq!(a, url_to_cache_key("http://img/1.jpg"));
        assert_ne!(a, url_to_cache_key("http://img/2.jpg"));
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn shrink_keeps_aspect() {
        let out = shrink_to_width(sample(400, 200), THUMB_MAX_W);
        assert_eq!(out.dimensions(), (96, 48));
        let small = shrink_to_width(sample(50, 80), THUMB_MAX_W);
        assert_eq!(small.dimensions(), (50, 80));
    }

    #[test]
    fn store_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_jpeg(dir.path(), "abc", &sample(40, 30), THUMB_QUALITY).unwrap();
        assert_eq!(find_cached(dir.path(), "abc"), Some(path.clone()));
        let (w, h, rgba) = load_rgba(&path).unwrap();
        assert_eq!((w, h), (40, 30));
        assert_eq!(rgba.len(), 40 * 30 * 4);
        assert!(!dir.path().join("abc.jpg.part").exists());
    }

    #[test]
    fn prune_drops_partials_and_keeps_fresh() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.jpg.part"), b"half").unwrap();
        fs::write(dir.path().join("fresh.jpg"), b"img").unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(prune_thumb_dir(dir.path()).unwrap(), 1);
        assert!(dir.path().join("fresh.jpg").exists());
        assert!(dir.path().join("notes.txt").exists());

        assert_eq!(prune_older_than(dir.path(), Duration::ZERO).unwrap(), 1);
        assert!(!dir.path().join("fresh.jpg").exists());
    }

    #[test]
    fn prune_counts_only_successful_removals() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg.part"), b"half").unwrap();
        fs::write(dir.path().join("b.jpg.part"), b"half").unwrap();

        let removed = prune_with(dir.path(), Duration::ZERO, |path| {
            if path.ends_with("a.jpg.part") {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"))
            } else {
                fs::remove_file(path)
            }
        })
        .unwrap();
        assert_eq!(removed, 1);
        assert!(dir.path().join("a.jpg.part").exists());
        assert!(!dir.path().join("b.jpg.part").exists());
    }

    #[test]
    fn prepare_creates_thumbs_subdir() {
        let root = tempfile::tempdir().unwrap();
        let dir = prepare_thumb_dir(root.path());
        assert_eq!(dir, root.path().join("thumbs"));
        assert!(dir.is_dir());
    }
}
