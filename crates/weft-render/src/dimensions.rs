//! Intrinsic image dimension resolution.
//!
//! Resolves the pixel width/height of an image reference so layout can
//! reserve space before the image loads. Remote references go through the
//! [`RemoteProbe`] seam (a ranged request for header bytes); local
//! references are checked for existence first, then opened, sniffed from
//! at most [`MAX_HEADER_BYTES`], and closed by scope exit on every path.
//!
//! Every failure degrades to `None` with exactly one diagnostic naming
//! the reference; nothing here returns an error to the render pass. No
//! shared mutable state — safe under unbounded concurrent invocation.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::assets::{AssetRoot, RemoteProbe};

/// Maximum bytes read from a local asset when sniffing.
pub const MAX_HEADER_BYTES: u64 = 64 * 1024;

/// Intrinsic pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, for fixed-aspect-ratio containers.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Resolves image references to dimensions via the injected seams.
#[derive(Clone)]
pub struct DimensionResolver {
    assets: Arc<dyn AssetRoot>,
    remote: Arc<dyn RemoteProbe>,
}

impl DimensionResolver {
    pub fn new(assets: Arc<dyn AssetRoot>, remote: Arc<dyn RemoteProbe>) -> Self {
        Self { assets, remote }
    }

    /// Resolve `reference` (absolute URL or site-relative path) to its
    /// intrinsic dimensions, or `None` when they cannot be determined.
    pub async fn resolve(&self, reference: &str) -> Option<Dimensions> {
        let lower = reference.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            self.resolve_remote(reference).await
        } else {
            self.resolve_local(reference).await
        }
    }

    async fn resolve_remote(&self, url: &str) -> Option<Dimensions> {
        match self.remote.probe(url).await {
            Ok(Some(dimensions)) => Some(dimensions),
            Ok(None) => {
                log::warn!("no dimensions in probed header: {}", url);
                None
            }
            Err(e) => {
                log::warn!("remote dimension probe failed for {}: {}", url, e);
                None
            }
        }
    }

    async fn resolve_local(&self, path: &str) -> Option<Dimensions> {
        // Existence first: absent assets never cost an open.
        if !self.assets.exists(path).await {
            log::warn!("local image not found: {}", path);
            return None;
        }

        let mut header = Vec::new();
        {
            // The stream lives only inside this block; scope exit closes
            // it on the read-failure path as much as on success.
            let stream = match self.assets.open(path).await {
                Ok(stream) => stream,
                Err(e) => {
                    log::warn!("failed to open local image {}: {}", path, e);
                    return None;
                }
            };
            let mut limited = stream.take(MAX_HEADER_BYTES);
            if let Err(e) = limited.read_to_end(&mut header).await {
                log::warn!("failed to read local image {}: {}", path, e);
                return None;
            }
        }

        match sniff_dimensions(&header) {
            Some(dimensions) => Some(dimensions),
            None => {
                log::warn!("unrecognized or corrupt image header: {}", path);
                None
            }
        }
    }
}

/// Sniff pixel dimensions from the leading bytes of an image file.
///
/// Recognizes PNG, GIF, JPEG, and WebP (VP8/VP8L/VP8X). Returns `None`
/// for anything truncated, corrupt, or unrecognized.
pub fn sniff_dimensions(header: &[u8]) -> Option<Dimensions> {
    sniff_png(header)
        .or_else(|| sniff_gif(header))
        .or_else(|| sniff_jpeg(header))
        .or_else(|| sniff_webp(header))
}

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn sniff_png(header: &[u8]) -> Option<Dimensions> {
    if header.len() < 24 || !header.starts_with(PNG_SIGNATURE) {
        return None;
    }
    // First chunk must be IHDR: width and height lead its payload.
    if &header[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(header[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(header[20..24].try_into().ok()?);
    nonzero(width, height)
}

fn sniff_gif(header: &[u8]) -> Option<Dimensions> {
    if header.len() < 10 {
        return None;
    }
    if !header.starts_with(b"GIF87a") && !header.starts_with(b"GIF89a") {
        return None;
    }
    let width = u32::from(u16::from_le_bytes(header[6..8].try_into().ok()?));
    let height = u32::from(u16::from_le_bytes(header[8..10].try_into().ok()?));
    nonzero(width, height)
}

fn sniff_jpeg(header: &[u8]) -> Option<Dimensions> {
    if header.len() < 4 || header[0] != 0xFF || header[1] != 0xD8 {
        return None;
    }
    // Walk marker segments until a start-of-frame carries the size.
    let mut offset = 2;
    while offset + 4 <= header.len() {
        if header[offset] != 0xFF {
            return None;
        }
        let marker = header[offset + 1];
        // Padding bytes between segments.
        if marker == 0xFF {
            offset += 1;
            continue;
        }
        // Standalone markers without a length word.
        if (0xD0..=0xD9).contains(&marker) || marker == 0x01 {
            offset += 2;
            continue;
        }
        let length = usize::from(u16::from_be_bytes([
            header[offset + 2],
            header[offset + 3],
        ]));
        if length < 2 {
            return None;
        }
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            if offset + 9 > header.len() {
                return None;
            }
            let height = u32::from(u16::from_be_bytes([
                header[offset + 5],
                header[offset + 6],
            ]));
            let width = u32::from(u16::from_be_bytes([
                header[offset + 7],
                header[offset + 8],
            ]));
            return nonzero(width, height);
        }
        offset += 2 + length;
    }
    None
}

fn sniff_webp(header: &[u8]) -> Option<Dimensions> {
    if header.len() < 30 || &header[0..4] != b"RIFF" || &header[8..12] != b"WEBP" {
        return None;
    }
    match &header[12..16] {
        // Lossy: 14-bit dimensions follow the frame tag and sync code.
        b"VP8 " => {
            if header[23..26] != [0x9D, 0x01, 0x2A] {
                return None;
            }
            let width = u32::from(u16::from_le_bytes(header[26..28].try_into().ok()?) & 0x3FFF);
            let height = u32::from(u16::from_le_bytes(header[28..30].try_into().ok()?) & 0x3FFF);
            nonzero(width, height)
        }
        // Lossless: 14-bit minus-one fields packed after the signature.
        b"VP8L" => {
            if header[20] != 0x2F {
                return None;
            }
            let bits = u32::from_le_bytes(header[21..25].try_into().ok()?);
            let width = (bits & 0x3FFF) + 1;
            let height = ((bits >> 14) & 0x3FFF) + 1;
            nonzero(width, height)
        }
        // Extended: 24-bit minus-one fields in the VP8X chunk.
        b"VP8X" => {
            let width =
                (u32::from(header[24]) | u32::from(header[25]) << 8 | u32::from(header[26]) << 16)
                    + 1;
            let height =
                (u32::from(header[27]) | u32::from(header[28]) << 8 | u32::from(header[29]) << 16)
                    + 1;
            Some(Dimensions::new(width, height))
        }
        _ => None,
    }
}

fn nonzero(width: u32, height: u32) -> Option<Dimensions> {
    if width == 0 || height == 0 {
        None
    } else {
        Some(Dimensions::new(width, height))
    }
}
