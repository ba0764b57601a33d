use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::decode::{decode_image, encode_png};
use crate::foundation::error::{StrataError, StrataResult};
use crate::raster::buffer::PixelBuffer;

/// Normalize a manifest-relative path to `a/b/c.png` form.
///
/// Backslashes become `/`, empty and `.` segments are dropped. Absolute paths and `..` segments
/// are rejected so that a manifest can never reach outside its directory.
pub(crate) fn normalize_rel_path(source: &str) -> StrataResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') || has_drive_prefix(&s) {
        return Err(StrataError::validation(format!(
            "image path '{source}' must be relative"
        )));
    }
    if s.is_empty() {
        return Err(StrataError::validation("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StrataError::validation(format!(
                "image path '{source}' must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StrataError::validation("image path must contain a file name"));
    }

    Ok(out.join("/"))
}

fn has_drive_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}

/// Reads and writes layer images below a root directory.
#[derive(Clone, Debug)]
pub struct LayerImageStore {
    root: PathBuf,
}

impl LayerImageStore {
    /// Store rooted at `root`; every relative path resolves beneath it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory all relative paths resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a relative image path.
    pub fn resolve(&self, rel: &str) -> StrataResult<PathBuf> {
        let norm = normalize_rel_path(rel)?;
        Ok(self.root.join(Path::new(&norm)))
    }

    /// Read a file's raw bytes.
    pub fn read_bytes(&self, rel: &str) -> StrataResult<Vec<u8>> {
        let p = self.resolve(rel)?;
        let bytes = std::fs::read(&p)
            .with_context(|| format!("failed to read layer image '{}'", p.display()))?;
        Ok(bytes)
    }

    /// Read and decode one layer image.
    pub fn load(&self, rel: &str) -> StrataResult<PixelBuffer> {
        let bytes = self.read_bytes(rel)?;
        decode_image(&bytes).map_err(|e| {
            StrataError::malformed_image(format!("layer image '{rel}' could not be decoded: {e}"))
        })
    }

    /// Encode `buf` as PNG at `rel`, creating parent directories.
    pub fn save(&self, rel: &str, buf: &PixelBuffer) -> StrataResult<()> {
        let p = self.resolve(rel)?;
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create image directory '{}'", parent.display()))?;
        }
        let png = encode_png(buf)?;
        std::fs::write(&p, png)
            .with_context(|| format!("failed to write layer image '{}'", p.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
