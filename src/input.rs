//! Input image loading
//!
//! Reads the source environment image: an OpenEXR file (one file, or
//! six face files named with the `%` placeholder convention), or a
//! Radiance `.hdr` panorama. EXR inputs carry their projection in the
//! environment map attribute; everything else is taken to be a
//! latitude-longitude panorama unless the caller overrides the kind.

use std::path::Path;

use exr::meta::attribute::EnvironmentMap;
use exr::prelude::*;
use half::f16;
use log::{info, warn};

use crate::cubemap::{face_file_name, OutputLayout};
use crate::error::{EnvmapError, EnvmapResult};
use crate::hdr;
use crate::image::{EnvImage, EnvKind, Rgba};
use crate::projection::CubeFace;

/// Load the input image for a generation run.
///
/// `pad_top` and `pad_bottom` are fractions of the input height; a
/// latitude-longitude input is extended by that many replicated edge
/// rows, declaring a partial panorama that covers only part of the
/// sphere.
pub fn read_input_image(
    path: &str,
    pad_top: f32,
    pad_bottom: f32,
    kind_override: Option<EnvKind>,
    verbose: bool,
) -> EnvmapResult<EnvImage> {
    let mut image = match OutputLayout::detect(path) {
        OutputLayout::FacePattern { placeholder } => read_six_faces(path, placeholder, verbose)?,
        OutputLayout::SingleFile => {
            if verbose {
                info!("reading file {}", path);
            }

            let file = Path::new(path);
            if has_hdr_extension(file) {
                hdr::load_hdr(file)?
            } else {
                read_exr(file)?
            }
        }
    };

    if let Some(kind) = kind_override {
        image.set_kind(kind);
    }

    match image.kind() {
        EnvKind::LatLong => {
            if pad_top > 0.0 || pad_bottom > 0.0 {
                pad_rows(&mut image, pad_top, pad_bottom);
            }
        }
        EnvKind::Cube => {
            if pad_top > 0.0 || pad_bottom > 0.0 {
                warn!("ignoring top and bottom padding for a cube-face input");
            }

            if image.height() != 6 * image.width() {
                warn!(
                    "cube-face input is {}x{}, expected a height of six face widths",
                    image.width(),
                    image.height()
                );
            }
        }
    }

    Ok(image)
}

fn has_hdr_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("hdr"))
}

/// Assemble a cube image from six face files. The first face sets the
/// face size; all faces must be square and equally sized.
fn read_six_faces(pattern: &str, placeholder: usize, verbose: bool) -> EnvmapResult<EnvImage> {
    let mut assembled = EnvImage::new(EnvKind::Cube, 0, 0);
    let mut sof = 0usize;

    for (index, face) in CubeFace::ALL.into_iter().enumerate() {
        let name = face_file_name(pattern, placeholder, face);
        if verbose {
            info!("reading file {}", name);
        }

        let face_image = read_exr(Path::new(&name))?;

        if face_image.width() != face_image.height() {
            return Err(EnvmapError::read(format!(
                "face image \"{}\" is {}x{}, face images must be square",
                name,
                face_image.width(),
                face_image.height()
            )));
        }

        if index == 0 {
            sof = face_image.width();
            assembled.reset(EnvKind::Cube, sof, 6 * sof);
        } else if face_image.width() != sof {
            return Err(EnvmapError::read(format!(
                "face image \"{}\" is {}x{}, the other faces are {}x{}",
                name,
                face_image.width(),
                face_image.height(),
                sof,
                sof
            )));
        }

        let offset = face.index() * sof;
        for y in 0..sof {
            for x in 0..sof {
                assembled.set_pixel(x, offset + y, face_image.pixel(x, y));
            }
        }
    }

    Ok(assembled)
}

/// Read the first RGBA layer of an EXR file. Mip inputs collapse to
/// their largest level; a missing alpha channel reads as one.
fn read_exr(path: &Path) -> EnvmapResult<EnvImage> {
    let image = read_first_rgba_layer_from_file(
        path,
        |resolution, _| EnvImage::new(EnvKind::LatLong, resolution.x(), resolution.y()),
        |image: &mut EnvImage, position, (r, g, b, a): (f16, f16, f16, f16)| {
            image.set_pixel(position.x(), position.y(), Rgba { r, g, b, a });
        },
    )
    .map_err(|source| {
        EnvmapError::read(format!(
            "cannot read image file \"{}\" ({})",
            path.display(),
            source
        ))
    })?;

    let kind = match image.layer_data.attributes.environment_map {
        Some(EnvironmentMap::Cube) => EnvKind::Cube,
        Some(EnvironmentMap::LatitudeLongitude) | None => EnvKind::LatLong,
    };

    let mut result = image.layer_data.channel_data.pixels;
    result.set_kind(kind);
    Ok(result)
}

/// Extend a latitude-longitude image with replicated edge rows. The
/// fractions are rounded to whole rows against the unpadded height.
fn pad_rows(image: &mut EnvImage, pad_top: f32, pad_bottom: f32) {
    let width = image.width();
    let height = image.height();
    let top = (pad_top * height as f32 + 0.5) as usize;
    let bottom = (pad_bottom * height as f32 + 0.5) as usize;

    if top == 0 && bottom == 0 {
        return;
    }

    let mut padded = EnvImage::new(EnvKind::LatLong, width, height + top + bottom);
    for y in 0..height + top + bottom {
        let source_y = y.saturating_sub(top).min(height - 1);
        for x in 0..width {
            padded.set_pixel(x, y, image.pixel(x, source_y));
        }
    }

    *image = padded;
}
