//! Cube-face environment map generation
//!
//! The output is a single tiled EXR whose data window is one face wide
//! and six faces tall, faces stacked +X -X +Y -Y +Z -Z from the top,
//! marked with the cube environment map attribute. When the output
//! name contains a `%`, six separate single-level face files are
//! written instead, with the `%` replaced by the face token.
//!
//! Levels are generated progressively: the base level is rendered from
//! the input image, every coarser level from the level before it.

use std::path::Path;

use exr::meta::attribute::{EnvironmentMap, LevelMode};
use log::info;

use crate::error::{EnvmapError, EnvmapResult};
use crate::image::{EnvImage, EnvKind};
use crate::options::OutputOptions;
use crate::projection::CubeFace;
use crate::pyramid::LevelPair;
use crate::resample;
use crate::writer::{ExrTileWriter, TileWriter};

/// How an output (or input) name maps to files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// One file holding all six faces.
    SingleFile,
    /// Six files, one per face. `placeholder` is the byte position of
    /// the first `%` in the name; it is replaced by the face token.
    FacePattern { placeholder: usize },
}

impl OutputLayout {
    pub fn detect(name: &str) -> Self {
        match name.find('%') {
            Some(placeholder) => OutputLayout::FacePattern { placeholder },
            None => OutputLayout::SingleFile,
        }
    }
}

/// File name for one face of a six-file set. Only the first `%` is
/// replaced; any later ones stay as they are.
pub fn face_file_name(pattern: &str, placeholder: usize, face: CubeFace) -> String {
    format!(
        "{}{}{}",
        &pattern[..placeholder],
        face.token(),
        &pattern[placeholder + 1..]
    )
}

/// Render `input` as a cube-face environment map and write it to
/// `output`, as one stacked file or as six face files depending on the
/// output name.
pub fn make_cube_map(
    input: &EnvImage,
    output: &str,
    options: &OutputOptions,
) -> EnvmapResult<()> {
    if input.width() == 0 || input.height() == 0 {
        return Err(EnvmapError::invalid("input image holds no pixels"));
    }

    if options.map_width == 0 {
        return Err(EnvmapError::invalid("output face width must be positive"));
    }

    if options.num_samples == 0 {
        return Err(EnvmapError::invalid("sample count must be positive"));
    }

    if options.level_mode == LevelMode::RipMap {
        return Err(EnvmapError::topology(
            "cannot generate ripmap cube-face environments",
        ));
    }

    match OutputLayout::detect(output) {
        OutputLayout::SingleFile => single_file(input, Path::new(output), options),
        OutputLayout::FacePattern { placeholder } => {
            six_files(input, output, placeholder, options)
        }
    }
}

fn single_file(input: &EnvImage, path: &Path, options: &OutputOptions) -> EnvmapResult<()> {
    let width = options.map_width;

    let mut writer = ExrTileWriter::create(
        path,
        (width, 6 * width),
        (options.tile_width, options.tile_height),
        options.level_mode,
        options.rounding_mode,
        options.compression,
        Some(EnvironmentMap::Cube),
    )?;

    if options.verbose {
        info!("writing file {}", path.display());
    }

    write_cube_levels(input, &mut writer, options)?;
    writer.finish()?;

    if options.verbose {
        info!("done.");
    }

    Ok(())
}

/// Render every level the writer expects, reading each level from the
/// one before it, and hand the tiles over row by row.
fn write_cube_levels<W: TileWriter>(
    input: &EnvImage,
    writer: &mut W,
    options: &OutputOptions,
) -> EnvmapResult<()> {
    let mut pair = LevelPair::new(EnvKind::Cube);

    for level in 0..writer.num_levels() {
        if options.verbose {
            info!("level {}", level);
        }

        let (width, height) = writer.level_size(level);

        {
            let (front, scratch) = pair.split();
            let source = if level == 0 { input } else { front };
            resample::resample_cube(
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

fn six_files(
    input: &EnvImage,
    pattern: &str,
    placeholder: usize,
    options: &OutputOptions,
) -> EnvmapResult<()> {
    let width = options.map_width;

    let mut faces = EnvImage::new(EnvKind::Cube, 1, 1);
    resample::resample_cube(
        input,
        &mut faces,
        width,
        6 * width,
        options.filter_radius,
        options.num_samples,
    );

    for face in CubeFace::ALL {
        let name = face_file_name(pattern, placeholder, face);

        let mut writer = ExrTileWriter::create(
            Path::new(&name),
            (width, width),
            (options.tile_width, options.tile_height),
            LevelMode::Singular,
            options.rounding_mode,
            options.compression,
            None,
        )?;

        if options.verbose {
            info!("writing file {}", name);
        }

        let source = faces.face_region(face);
        let (tiles_x, tiles_y) = writer.tile_counts(0);

        for tile_y in 0..tiles_y {
            for tile_x in 0..tiles_x {
                writer.write_tile(0, tile_x, tile_y, source)?;
            }
        }

        writer.finish()?;
    }

    if options.verbose {
        info!("done.");
    }

    Ok(())
}
