//! Latitude-longitude environment map generation
//!
//! The output is a single tiled EXR panorama, half as tall as it is
//! wide, marked with the latitude-longitude environment map attribute.
//! `%` has no special meaning in latitude-longitude output names.

use std::path::Path;

use exr::meta::attribute::{EnvironmentMap, LevelMode};
use log::info;

use crate::error::{EnvmapError, EnvmapResult};
use crate::image::{EnvImage, EnvKind};
use crate::options::OutputOptions;
use crate::pyramid::LevelPair;
use crate::resample;
use crate::writer::{ExrTileWriter, TileWriter};

/// Render `input` as a latitude-longitude environment map and write it
/// to `output`.
pub fn make_latlong_map(
    input: &EnvImage,
    output: &str,
    options: &OutputOptions,
) -> EnvmapResult<()> {
    if input.width() == 0 || input.height() == 0 {
        return Err(EnvmapError::invalid("input image holds no pixels"));
    }

    if options.map_width == 0 {
        return Err(EnvmapError::invalid("output map width must be positive"));
    }

    if options.num_samples == 0 {
        return Err(EnvmapError::invalid("sample count must be positive"));
    }

    if options.level_mode == LevelMode::RipMap {
        return Err(EnvmapError::topology(
            "cannot generate ripmap latitude-longitude environments",
        ));
    }

    let width = options.map_width;
    let height = width / 2;
    if height == 0 {
        return Err(EnvmapError::invalid(format!(
            "map width {} leaves no room for a half-height panorama",
            width
        )));
    }

    let path = Path::new(output);

    let mut writer = ExrTileWriter::create(
        path,
        (width, height),
        (options.tile_width, options.tile_height),
        options.level_mode,
        options.rounding_mode,
        options.compression,
        Some(EnvironmentMap::LatitudeLongitude),
    )?;

    if options.verbose {
        info!("writing file {}", path.display());
    }

    write_latlong_levels(input, &mut writer, options)?;
    writer.finish()?;

    if options.verbose {
        info!("done.");
    }

    Ok(())
}

fn write_latlong_levels<W: TileWriter>(
    input: &EnvImage,
    writer: &mut W,
    options: &OutputOptions,
) -> EnvmapResult<()> {
    let mut pair = LevelPair::new(EnvKind::LatLong);

    for level in 0..writer.num_levels() {
        if options.verbose {
            info!("level {}", level);
        }

        let (width, height) = writer.level_size(level);

        {
            let (front, scratch) = pair.split();
            let source = if level == 0 { input } else { front };
            resample::resample_latlong(
                source,
                scratch,
                width,
                height,
                options.filter_radius,
                options.num_samples,
            );
        }
        pair.swap();

        let source = pair.front().full_region();
        let (tiles_x, tiles_y) = writer.tile_counts(level);

        for tile_y in 0..tiles_y {
            for tile_x in 0..tiles_x {
                writer.write_tile(level, tile_x, tile_y, source)?;
            }
        }
    }

    Ok(())
}
