//! Resampling between environment projections and resolutions
//!
//! Each target pixel is produced by one filtered lookup into the source
//! image along the direction that pixel represents. The same routines
//! build the base level from the input panorama and each coarser level
//! from the level above it.

use crate::image::{EnvImage, EnvKind};
use crate::projection::{self, CubeFace};

/// Fill `target` with a cube-face rendition of `source` at `width` by
/// `height` pixels. `height` is expected to be six times the face size;
/// rows beyond the six stacked faces are left zero.
pub fn resample_cube(
    source: &EnvImage,
    target: &mut EnvImage,
    width: usize,
    height: usize,
    filter_radius: f32,
    num_samples: usize,
) {
    if source.kind() == EnvKind::Cube && source.size() == (width, height) {
        target.copy_from(source);
        return;
    }

    target.reset(EnvKind::Cube, width, height);

    let sof = projection::size_of_face(width, height);
    if sof == 0 {
        return;
    }

    let radius = 1.5 * filter_radius / sof as f32;

    for face in CubeFace::ALL {
        let row_offset = face.index() * sof;

        for y in 0..sof {
            for x in 0..width {
                let direction =
                    projection::face_direction(face, sof, glam::Vec2::new(x as f32, y as f32));
                let value = source.filtered_lookup(direction, radius, num_samples);
                target.set_pixel(x, row_offset + y, value);
            }
        }
    }
}

/// Fill `target` with a latitude-longitude rendition of `source` at
/// `width` by `height` pixels.
pub fn resample_latlong(
    source: &EnvImage,
    target: &mut EnvImage,
    width: usize,
    height: usize,
    filter_radius: f32,
    num_samples: usize,
) {
    if source.kind() == EnvKind::LatLong && source.size() == (width, height) {
        target.copy_from(source);
        return;
    }

    target.reset(EnvKind::LatLong, width, height);

    if width == 0 || height == 0 {
        return;
    }

    let radius = 3.0 * filter_radius / height as f32;

    for y in 0..height {
        for x in 0..width {
            let direction =
                projection::latlong_direction(width, height, glam::Vec2::new(x as f32, y as f32));
            let value = source.filtered_lookup(direction, radius, num_samples);
            target.set_pixel(x, y, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rgba;

    fn constant_latlong(width: usize, height: usize, value: f32) -> EnvImage {
        let mut image = EnvImage::new(EnvKind::LatLong, width, height);
        for y in 0..height {
            for x in 0..width {
                image.set_pixel(x, y, Rgba::new(value, value, value, 1.0));
            }
        }
        image
    }

    #[test]
    fn matching_cube_source_is_copied_unchanged() {
        let mut source = EnvImage::new(EnvKind::Cube, 4, 24);
        source.set_pixel(1, 9, Rgba::new(0.5, 0.25, 0.125, 1.0));

        let mut target = EnvImage::new(EnvKind::Cube, 1, 1);
        resample_cube(&source, &mut target, 4, 24, 1.0, 5);

        assert_eq!(target.size(), (4, 24));
        assert_eq!(target.pixel(1, 9), source.pixel(1, 9));
    }

    #[test]
    fn constant_panorama_resamples_to_constant_faces() {
        let source = constant_latlong(32, 16, 0.75);

        let mut target = EnvImage::new(EnvKind::Cube, 1, 1);
        resample_cube(&source, &mut target, 8, 48, 1.0, 5);

        assert_eq!(target.kind(), EnvKind::Cube);
        for pixel in target.pixels() {
            assert!((pixel.r.to_f32() - 0.75).abs() < 1e-2, "r = {}", pixel.r);
            assert!((pixel.a.to_f32() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn constant_panorama_resamples_to_constant_latlong() {
        let source = constant_latlong(32, 16, 0.4);

        let mut target = EnvImage::new(EnvKind::LatLong, 1, 1);
        resample_latlong(&source, &mut target, 16, 8, 1.0, 5);

        assert_eq!(target.size(), (16, 8));
        for pixel in target.pixels() {
            assert!((pixel.g.to_f32() - 0.4).abs() < 1e-2);
        }
    }

    #[test]
    fn rows_past_the_sixth_face_stay_zero() {
        let source = constant_latlong(16, 8, 1.0);

        // A 1 by 3 target cannot hold six one-pixel faces, so the face
        // size collapses to zero and every row stays black.
        let mut target = EnvImage::new(EnvKind::Cube, 1, 1);
        resample_cube(&source, &mut target, 1, 3, 1.0, 5);

        assert_eq!(target.size(), (1, 3));
        assert!(target.pixels().iter().all(|p| *p == Rgba::ZERO));
    }

    #[test]
    fn matching_latlong_source_is_copied_unchanged() {
        let source = constant_latlong(8, 4, 0.9);

        let mut target = EnvImage::new(EnvKind::LatLong, 2, 1);
        resample_latlong(&source, &mut target, 8, 4, 1.0, 5);

        assert_eq!(target.size(), (8, 4));
        assert_eq!(target.pixel(3, 2), source.pixel(3, 2));
    }
}
