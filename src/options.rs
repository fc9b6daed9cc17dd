//! Shared output settings for the map builders

use exr::compression::Compression;
use exr::math::RoundingMode;
use exr::meta::attribute::LevelMode;

use crate::error::{EnvmapError, EnvmapResult};

/// Settings shared by the cube-face and latitude-longitude builders.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Width of one output face (or of the latitude-longitude map).
    pub map_width: usize,
    /// Tile size of the output file.
    pub tile_width: usize,
    pub tile_height: usize,
    /// Whether the output carries a full mip pyramid or one level.
    pub level_mode: LevelMode,
    /// How odd level sizes are halved.
    pub rounding_mode: RoundingMode,
    pub compression: Compression,
    /// Filter kernel radius in source pixels, at the scale of one
    /// output pixel.
    pub filter_radius: f32,
    /// Sample grid edge length for each filtered lookup.
    pub num_samples: usize,
    /// Report progress through the log.
    pub verbose: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            map_width: 256,
            tile_width: 64,
            tile_height: 64,
            level_mode: LevelMode::MipMap,
            rounding_mode: RoundingMode::Down,
            compression: Compression::ZIP16,
            filter_radius: 1.0,
            num_samples: 5,
            verbose: false,
        }
    }
}

/// Translate a compression name from the command line into the matching
/// container compression. `zip` selects the multi-scanline flavor,
/// `zips` the single-scanline one.
pub fn parse_compression(name: &str) -> EnvmapResult<Compression> {
    match name {
        "none" => Ok(Compression::Uncompressed),
        "rle" => Ok(Compression::RLE),
        "zip" => Ok(Compression::ZIP16),
        "zips" => Ok(Compression::ZIP1),
        "piz" => Ok(Compression::PIZ),
        "pxr24" => Ok(Compression::PXR24),
        "b44" => Ok(Compression::B44),
        "b44a" => Ok(Compression::B44A),
        "dwaa" => Ok(Compression::DWAA(None)),
        "dwab" => Ok(Compression::DWAB(None)),
        _ => Err(EnvmapError::invalid(format!(
            "unknown compression method \"{}\"",
            name
        ))),
    }
}
