//! Seams for the blocking external services the engine consults during
//! conversion. The engine never retries, caches or times out; that is
//! the implementor's contract.

use std::collections::{HashMap, HashSet};

use crate::converters::EmbedKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelDimensions {
    pub width: u32,
    pub height: u32,
}

/// Batch image dimension probing, keyed by URL. An implementation must
/// answer every queried URL; `None` means "dimensions unknown" and is
/// never treated as a fatal condition.
pub trait DimensionLookup {
    fn lookup(&self, urls: &HashSet<String>) -> HashMap<String, Option<PixelDimensions>>;
}

/// oEmbed-shaped payload backing an embed placeholder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbedMetadata {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_width: Option<u32>,
    pub thumbnail_height: Option<u32>,
}

/// Fetches embed metadata for an auto-linked URL. `None` means the
/// fetch failed; the caller then leaves the link unconverted.
pub trait EmbedFetcher {
    fn fetch(&self, url: &str, kind: EmbedKind) -> Option<EmbedMetadata>;
}
