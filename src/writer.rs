//! Tiled EXR output
//!
//! `ExrTileWriter` accepts tiles one at a time, in any order, and turns
//! them into a tiled EXR file with half-float RGBA channels and an
//! optional environment map attribute. Tile data is staged into one
//! pixel plane per resolution level and encoded when `finish` runs, so
//! the file either appears complete or, on a write failure, the error
//! names the path that was being written.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use exr::math::RoundingMode;
use exr::meta::attribute::{EnvironmentMap, LevelMode, LineOrder};
use exr::meta::mip_map_levels;
use exr::prelude::*;

use crate::error::{EnvmapError, EnvmapResult};
use crate::image::{PixelRegion, Rgba};

/// Destination for the tiles of a level sequence. The single-file and
/// per-face output paths both drive one of these; tests substitute
/// their own recorder.
pub trait TileWriter {
    /// Number of resolution levels the destination expects.
    fn num_levels(&self) -> usize;

    /// Pixel size of one level.
    fn level_size(&self, level: usize) -> (usize, usize);

    /// Number of tile columns and rows in one level. Edge tiles may be
    /// smaller than the nominal tile size.
    fn tile_counts(&self, level: usize) -> (usize, usize);

    /// Store one tile. `source` must cover the whole level; the writer
    /// cuts the tile rectangle out of it.
    fn write_tile(
        &mut self,
        level: usize,
        tile_x: usize,
        tile_y: usize,
        source: PixelRegion<'_>,
    ) -> EnvmapResult<()>;

    /// Encode and close the destination.
    fn finish(self) -> EnvmapResult<()>
    where
        Self: Sized;
}

struct LevelPlane {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl LevelPlane {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::ZERO; width * height],
        }
    }
}

/// Writes a tiled EXR file, one plane per resolution level.
pub struct ExrTileWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    planes: Vec<LevelPlane>,
    width: usize,
    height: usize,
    tile_width: usize,
    tile_height: usize,
    level_mode: LevelMode,
    rounding_mode: RoundingMode,
    compression: Compression,
    environment_map: Option<EnvironmentMap>,
}

impl ExrTileWriter {
    /// Open `path` for writing and stage the level planes. Fails with an
    /// `UnsupportedTopology` error for ripmap layouts, before the file
    /// is created, and with a `Create` error when the file cannot be
    /// opened.
    pub fn create(
        path: &Path,
        size: (usize, usize),
        tile: (usize, usize),
        level_mode: LevelMode,
        rounding_mode: RoundingMode,
        compression: Compression,
        environment_map: Option<EnvironmentMap>,
    ) -> EnvmapResult<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(EnvmapError::invalid(format!(
                "output size {}x{} is not positive",
                size.0, size.1
            )));
        }

        if tile.0 == 0 || tile.1 == 0 {
            return Err(EnvmapError::invalid(format!(
                "tile size {}x{} is not positive",
                tile.0, tile.1
            )));
        }

        if level_mode == LevelMode::RipMap {
            return Err(EnvmapError::topology(
                "ripmap level layout is not supported for environment maps",
            ));
        }

        let file = File::create(path).map_err(|source| {
            EnvmapError::create(format!(
                "cannot open output file \"{}\" ({})",
                path.display(),
                source
            ))
        })?;

        let planes = if level_mode == LevelMode::Singular {
            vec![LevelPlane::new(size.0, size.1)]
        } else {
            mip_map_levels(rounding_mode, Vec2(size.0, size.1))
                .map(|(_, level)| LevelPlane::new(level.x(), level.y()))
                .collect()
        };

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            planes,
            width: size.0,
            height: size.1,
            tile_width: tile.0,
            tile_height: tile.1,
            level_mode,
            rounding_mode,
            compression,
            environment_map,
        })
    }
}

fn as_levels(
    level_mode: LevelMode,
    rounding_mode: RoundingMode,
    mut planes: Vec<FlatSamples>,
) -> Levels<FlatSamples> {
    if level_mode == LevelMode::Singular {
        Levels::Singular(planes.remove(0))
    } else {
        Levels::Mip {
            rounding_mode,
            level_data: planes,
        }
    }
}

fn channel(
    name: &str,
    sample_data: Levels<FlatSamples>,
    quantize_linearly: bool,
) -> AnyChannel<Levels<FlatSamples>> {
    AnyChannel {
        name: Text::from(name),
        sample_data,
        quantize_linearly,
        sampling: Vec2(1, 1),
    }
}

impl TileWriter for ExrTileWriter {
    fn num_levels(&self) -> usize {
        self.planes.len()
    }

    fn level_size(&self, level: usize) -> (usize, usize) {
        let plane = &self.planes[level];
        (plane.width, plane.height)
    }

    fn tile_counts(&self, level: usize) -> (usize, usize) {
        let plane = &self.planes[level];
        (
            plane.width.div_ceil(self.tile_width),
            plane.height.div_ceil(self.tile_height),
        )
    }

    fn write_tile(
        &mut self,
        level: usize,
        tile_x: usize,
        tile_y: usize,
        source: PixelRegion<'_>,
    ) -> EnvmapResult<()> {
        if level >= self.planes.len() {
            return Err(EnvmapError::invalid(format!(
                "level {} out of range, file has {} levels",
                level,
                self.planes.len()
            )));
        }

        let (tiles_x, tiles_y) = self.tile_counts(level);
        if tile_x >= tiles_x || tile_y >= tiles_y {
            return Err(EnvmapError::invalid(format!(
                "tile ({}, {}) out of range, level {} has {}x{} tiles",
                tile_x, tile_y, level, tiles_x, tiles_y
            )));
        }

        let plane = &mut self.planes[level];
        if source.width != plane.width || source.height != plane.height {
            return Err(EnvmapError::invalid(format!(
                "source region is {}x{}, level {} is {}x{}",
                source.width, source.height, level, plane.width, plane.height
            )));
        }

        let x0 = tile_x * self.tile_width;
        let y0 = tile_y * self.tile_height;
        let x1 = (x0 + self.tile_width).min(plane.width);
        let y1 = (y0 + self.tile_height).min(plane.height);

        for y in y0..y1 {
            let row = y * plane.width;
            plane.pixels[row + x0..row + x1].copy_from_slice(&source.pixels[row + x0..row + x1]);
        }

        Ok(())
    }

    fn finish(self) -> EnvmapResult<()> {
        let ExrTileWriter {
            path,
            mut writer,
            planes,
            width,
            height,
            tile_width,
            tile_height,
            level_mode,
            rounding_mode,
            compression,
            environment_map,
        } = self;

        let mut red = Vec::with_capacity(planes.len());
        let mut green = Vec::with_capacity(planes.len());
        let mut blue = Vec::with_capacity(planes.len());
        let mut alpha = Vec::with_capacity(planes.len());

        for plane in planes {
            let mut r = Vec::with_capacity(plane.pixels.len());
            let mut g = Vec::with_capacity(plane.pixels.len());
            let mut b = Vec::with_capacity(plane.pixels.len());
            let mut a = Vec::with_capacity(plane.pixels.len());

            for pixel in &plane.pixels {
                r.push(pixel.r);
                g.push(pixel.g);
                b.push(pixel.b);
                a.push(pixel.a);
            }

            red.push(FlatSamples::F16(r));
            green.push(FlatSamples::F16(g));
            blue.push(FlatSamples::F16(b));
            alpha.push(FlatSamples::F16(a));
        }

        let mut list = SmallVec::<[AnyChannel<Levels<FlatSamples>>; 4]>::new();
        list.push(channel("R", as_levels(level_mode, rounding_mode, red), false));
        list.push(channel(
            "G",
            as_levels(level_mode, rounding_mode, green),
            false,
        ));
        list.push(channel(
            "B",
            as_levels(level_mode, rounding_mode, blue),
            false,
        ));
        list.push(channel(
            "A",
            as_levels(level_mode, rounding_mode, alpha),
            true,
        ));

        let mut attributes = LayerAttributes::default();
        attributes.environment_map = environment_map;

        let layer = Layer::new(
            Vec2(width, height),
            attributes,
            Encoding {
                compression,
                blocks: Blocks::Tiles(Vec2(tile_width, tile_height)),
                line_order: LineOrder::Increasing,
            },
            AnyChannels::sort(list),
        );

        Image::from_layer(layer)
            .write()
            .to_buffered(&mut writer)
            .map_err(|source| {
                EnvmapError::write(format!(
                    "cannot write output file \"{}\" ({})",
                    path.display(),
                    source
                ))
            })?;

        writer.flush().map_err(|source| {
            EnvmapError::write(format!(
                "cannot write output file \"{}\" ({})",
                path.display(),
                source
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exr::compression::Compression;

    #[test]
    fn ripmap_layout_fails_before_the_file_exists() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("ripmap.exr");

        let result = ExrTileWriter::create(
            &path,
            (16, 96),
            (8, 8),
            LevelMode::RipMap,
            RoundingMode::Down,
            Compression::ZIP16,
            Some(EnvironmentMap::Cube),
        );

        assert!(matches!(result, Err(EnvmapError::UnsupportedTopology(_))));
        assert!(!path.exists(), "no file may be left behind");
    }

    #[test]
    fn mip_levels_follow_round_down_halving() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("levels.exr");

        let writer = ExrTileWriter::create(
            &path,
            (16, 96),
            (8, 8),
            LevelMode::MipMap,
            RoundingMode::Down,
            Compression::ZIP16,
            Some(EnvironmentMap::Cube),
        )
        .expect("create writer");

        assert_eq!(writer.num_levels(), 7);
        assert_eq!(writer.level_size(0), (16, 96));
        assert_eq!(writer.level_size(1), (8, 48));
        assert_eq!(writer.level_size(4), (1, 6));
        assert_eq!(writer.level_size(6), (1, 1));
        assert_eq!(writer.tile_counts(0), (2, 12));
        assert_eq!(writer.tile_counts(1), (1, 6));
        assert_eq!(writer.tile_counts(6), (1, 1));
    }

    #[test]
    fn one_level_output_has_a_single_plane() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("single.exr");

        let writer = ExrTileWriter::create(
            &path,
            (20, 120),
            (64, 64),
            LevelMode::Singular,
            RoundingMode::Down,
            Compression::ZIP16,
            Some(EnvironmentMap::Cube),
        )
        .expect("create writer");

        assert_eq!(writer.num_levels(), 1);
        assert_eq!(writer.level_size(0), (20, 120));
        assert_eq!(writer.tile_counts(0), (1, 2));
    }

    #[test]
    fn out_of_range_tiles_are_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("bounds.exr");

        let mut writer = ExrTileWriter::create(
            &path,
            (16, 96),
            (8, 8),
            LevelMode::MipMap,
            RoundingMode::Down,
            Compression::ZIP16,
            None,
        )
        .expect("create writer");

        let pixels = vec![Rgba::ZERO; 16 * 96];
        let region = PixelRegion {
            pixels: &pixels,
            width: 16,
            height: 96,
        };

        assert!(matches!(
            writer.write_tile(7, 0, 0, region),
            Err(EnvmapError::Invalid(_))
        ));
        assert!(matches!(
            writer.write_tile(0, 2, 0, region),
            Err(EnvmapError::Invalid(_))
        ));
        assert!(writer.write_tile(0, 1, 11, region).is_ok());
    }

    #[test]
    fn mismatched_source_region_is_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("region.exr");

        let mut writer = ExrTileWriter::create(
            &path,
            (16, 96),
            (8, 8),
            LevelMode::MipMap,
            RoundingMode::Down,
            Compression::ZIP16,
            None,
        )
        .expect("create writer");

        let pixels = vec![Rgba::ZERO; 8 * 48];
        let region = PixelRegion {
            pixels: &pixels,
            width: 8,
            height: 48,
        };

        assert!(matches!(
            writer.write_tile(0, 0, 0, region),
            Err(EnvmapError::Invalid(_))
        ));
        assert!(writer.write_tile(1, 0, 0, region).is_ok());
    }
}
