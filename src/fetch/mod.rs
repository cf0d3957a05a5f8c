//! Retrieval and decoding of images.
//!
//! [`fetch`] turns a [`Reference`] into an [`Image`]: an 8-bit RGB raster
//! plus the [`Provenance`] it came from. Remote references must already be
//! resolved (see [`crate::resolve`]); this stage never looks at HTML.

use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::DroplabelError;
use crate::http::HttpClient;
use crate::source::Reference;

/// Where an [`Image`] came from. Diagnostic only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provenance {
    LocalFile(PathBuf),
    Remote {
        /// URL as classified from the raw input.
        requested: String,
        /// URL the bytes were actually fetched from.
        resolved: String,
    },
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::LocalFile(path) => write!(f, "{}", path.display()),
            Provenance::Remote {
                requested,
                resolved,
            } if requested == resolved => write!(f, "{}", resolved),
            Provenance::Remote {
                requested,
                resolved,
            } => write!(f, "{} (via {})", resolved, requested),
        }
    }
}

/// A decoded image held by the session until it is committed or replaced.
#[derive(Clone, Debug)]
pub struct Image {
    raster: RgbImage,
    provenance: Provenance,
}

impl Image {
    pub fn new(raster: RgbImage, provenance: Provenance) -> Self {
        Self { raster, provenance }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}

/// Fetches and decodes the image a reference points at.
///
/// `resolved_url` is the output of the resolver for a [`Reference::RemoteUrl`]
/// and is ignored for local files.
pub fn fetch(
    reference: &Reference,
    resolved_url: Option<&str>,
    http: &dyn HttpClient,
) -> Result<Image, DroplabelError> {
    match reference {
        Reference::LocalFile(path) => fetch_local(path),
        Reference::RemoteUrl(requested) => {
            let resolved = resolved_url.unwrap_or(requested);
            let mut image = fetch_remote(resolved, http)?;
            image.provenance = Provenance::Remote {
                requested: requested.clone(),
                resolved: resolved.to_string(),
            };
            Ok(image)
        }
        Reference::Unresolvable => Err(DroplabelError::Unresolvable {
            input: String::new(),
        }),
    }
}

/// Reads and decodes a local image file.
pub fn fetch_local(path: &Path) -> Result<Image, DroplabelError> {
    let bytes = std::fs::read(path).map_err(|source| DroplabelError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let raster = decode(&bytes, &path.display().to_string())?;
    Ok(Image::new(raster, Provenance::LocalFile(path.to_path_buf())))
}

/// Downloads and decodes an image URL.
pub fn fetch_remote(url: &str, http: &dyn HttpClient) -> Result<Image, DroplabelError> {
    let bytes = http.get_bytes(url).map_err(|e| DroplabelError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    tracing::debug!(url, bytes = bytes.len(), "downloaded image");
    let raster = decode(&bytes, url)?;
    Ok(Image::new(
        raster,
        Provenance::Remote {
            requested: url.to_string(),
            resolved: url.to_string(),
        },
    ))
}

/// Decodes any supported format into the canonical RGB raster.
pub fn decode(bytes: &[u8], origin: &str) -> Result<RgbImage, DroplabelError> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|source| DroplabelError::Decode {
            origin: origin.to_string(),
            source,
        })
}
