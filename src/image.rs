//! Pixel surfaces for environment map processing
//!
//! An `EnvImage` owns a rectangle of half-float RGBA texels together with
//! the projection its contents use. All filter arithmetic runs in f32 and
//! is rounded back to f16 on store, matching the container channel type.

use glam::{Vec2, Vec3, Vec4};
use half::f16;

use crate::error::{EnvmapError, EnvmapResult};
use crate::projection::{self, CubeFace};

/// A single RGBA texel at container channel precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: f16,
    pub g: f16,
    pub b: f16,
    pub a: f16,
}

impl Rgba {
    pub const ZERO: Rgba = Rgba {
        r: f16::ZERO,
        g: f16::ZERO,
        b: f16::ZERO,
        a: f16::ZERO,
    };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: f16::from_f32(r),
            g: f16::from_f32(g),
            b: f16::from_f32(b),
            a: f16::from_f32(a),
        }
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r.to_f32(),
            self.g.to_f32(),
            self.b.to_f32(),
            self.a.to_f32(),
        )
    }

    pub fn from_vec4(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

/// Projection used by an environment image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    /// Full-sphere panorama, one row per latitude.
    LatLong,
    /// Six square cube faces stacked vertically.
    Cube,
}

/// Borrowed rectangle of pixels used as the source for tile writes.
#[derive(Debug, Clone, Copy)]
pub struct PixelRegion<'a> {
    pub pixels: &'a [Rgba],
    pub width: usize,
    pub height: usize,
}

/// An owned environment image: projection kind plus a row-major pixel
/// rectangle anchored at the origin.
#[derive(Debug, Clone)]
pub struct EnvImage {
    kind: EnvKind,
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl EnvImage {
    /// Create a zero-filled image.
    pub fn new(kind: EnvKind, width: usize, height: usize) -> Self {
        Self {
            kind,
            width,
            height,
            pixels: vec![Rgba::ZERO; width * height],
        }
    }

    /// Wrap an existing pixel buffer.
    pub fn from_pixels(
        kind: EnvKind,
        width: usize,
        height: usize,
        pixels: Vec<Rgba>,
    ) -> EnvmapResult<Self> {
        if pixels.len() != width * height {
            return Err(EnvmapError::invalid(format!(
                "pixel buffer holds {} texels, expected {} for {}x{}",
                pixels.len(),
                width * height,
                width,
                height
            )));
        }

        Ok(Self {
            kind,
            width,
            height,
            pixels,
        })
    }

    pub fn kind(&self) -> EnvKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: EnvKind) {
        self.kind = kind;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Side length of one cube face; zero when the image is too small to
    /// hold six stacked faces.
    pub fn size_of_face(&self) -> usize {
        projection::size_of_face(self.width, self.height)
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: Rgba) {
        self.pixels[y * self.width + x] = value;
    }

    /// Change kind and dimensions, zero-filling the pixels. Keeps the
    /// existing allocation when it is large enough.
    pub fn reset(&mut self, kind: EnvKind, width: usize, height: usize) {
        self.kind = kind;
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, Rgba::ZERO);
    }

    /// Become a copy of `other`, reusing the existing allocation.
    pub fn copy_from(&mut self, other: &EnvImage) {
        self.kind = other.kind;
        self.width = other.width;
        self.height = other.height;
        self.pixels.clear();
        self.pixels.extend_from_slice(&other.pixels);
    }

    /// View of the whole pixel rectangle.
    pub fn full_region(&self) -> PixelRegion<'_> {
        PixelRegion {
            pixels: &self.pixels,
            width: self.width,
            height: self.height,
        }
    }

    /// View of one face of a stacked cube image.
    pub fn face_region(&self, face: CubeFace) -> PixelRegion<'_> {
        debug_assert_eq!(self.kind, EnvKind::Cube);

        let sof = self.size_of_face();
        let start = face.index() * sof * self.width;

        PixelRegion {
            pixels: &self.pixels[start..start + sof * self.width],
            width: self.width,
            height: sof,
        }
    }

    /// Point-sample the image at `pos`, interpolating bilinearly between
    /// the four nearest pixels. The horizontal axis wraps around so that
    /// lookups across the longitude seam blend both edges; the vertical
    /// axis clamps.
    pub fn sample(&self, pos: Vec2) -> Vec4 {
        let w = self.width as i32;
        let h = self.height as i32;

        let x1 = pos.x.floor() as i32;
        let x2 = x1 + 1;
        let sx = x2 as f32 - pos.x;
        let tx = 1.0 - sx;
        let x1 = x1.rem_euclid(w) as usize;
        let x2 = x2.rem_euclid(w) as usize;

        let y1 = pos.y.floor() as i32;
        let y2 = y1 + 1;
        let sy = y2 as f32 - pos.y;
        let ty = 1.0 - sy;
        let y1 = y1.clamp(0, h - 1) as usize;
        let y2 = y2.clamp(0, h - 1) as usize;

        let p11 = self.pixel(x1, y1).to_vec4();
        let p21 = self.pixel(x2, y1).to_vec4();
        let p12 = self.pixel(x1, y2).to_vec4();
        let p22 = self.pixel(x2, y2).to_vec4();

        (p11 * sx + p21 * tx) * sy + (p12 * sx + p22 * tx) * ty
    }

    /// Filtered environment lookup: take `num_samples` by `num_samples`
    /// point samples clustered around `direction` and combine them with a
    /// tent filter. `radius` is the half-width of the sample cluster in
    /// tangent space.
    pub fn filtered_lookup(&self, direction: Vec3, radius: f32, num_samples: usize) -> Rgba {
        debug_assert!(num_samples > 0);

        let d = direction.normalize_or_zero();

        // Two vectors of length `radius`, orthogonal to the lookup
        // direction and to each other, spanning the sample cluster.
        let dx = if d.x.abs() > 0.707 {
            d.cross(Vec3::Y).normalize_or_zero() * radius
        } else {
            d.cross(Vec3::X).normalize_or_zero() * radius
        };
        let dy = d.cross(dx).normalize_or_zero() * radius;

        let n = num_samples;
        let mut total = Vec4::ZERO;
        let mut weight_total = 0.0f32;

        for y in 0..n {
            let ry = (2 * y + 2) as f32 / (n + 1) as f32 - 1.0;
            let wy = 1.0 - ry.abs();
            let ddy = dy * ry;

            for x in 0..n {
                let rx = (2 * x + 2) as f32 / (n + 1) as f32 - 1.0;
                let wx = 1.0 - rx.abs();
                let ddx = dx * rx;

                let sample_dir = d + ddx + ddy;
                let pos = match self.kind {
                    EnvKind::LatLong => {
                        projection::latlong_pixel_position(sample_dir, self.width, self.height)
                    }
                    EnvKind::Cube => {
                        projection::cube_pixel_position(sample_dir, self.width, self.height)
                    }
                };

                let weight = wx * wy;
                total += self.sample(pos) * weight;
                weight_total += weight;
            }
        }

        Rgba::from_vec4(total / weight_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal_ramp(width: usize, height: usize) -> EnvImage {
        let mut image = EnvImage::new(EnvKind::LatLong, width, height);
        for y in 0..height {
            for x in 0..width {
                image.set_pixel(x, y, Rgba::new(x as f32, 0.0, 0.0, 1.0));
            }
        }
        image
    }

    #[test]
    fn from_pixels_rejects_wrong_buffer_size() {
        let result = EnvImage::from_pixels(EnvKind::LatLong, 4, 4, vec![Rgba::ZERO; 15]);
        assert!(matches!(result, Err(EnvmapError::Invalid(_))));
    }

    #[test]
    fn sample_interpolates_between_pixels() {
        let image = horizontal_ramp(8, 4);

        let v = image.sample(Vec2::new(2.0, 1.0));
        assert!((v.x - 2.0).abs() < 1e-4);

        let v = image.sample(Vec2::new(2.5, 1.0));
        assert!((v.x - 2.5).abs() < 1e-4);
    }

    #[test]
    fn sample_wraps_horizontally_and_clamps_vertically() {
        let image = horizontal_ramp(8, 4);

        // Half a pixel left of the first column blends columns 7 and 0.
        let v = image.sample(Vec2::new(-0.5, 1.0));
        assert!((v.x - 3.5).abs() < 1e-4);

        // Below the last row stays on the last row.
        let v = image.sample(Vec2::new(3.0, 10.0));
        assert!((v.x - 3.0).abs() < 1e-4);
    }

    #[test]
    fn filtered_lookup_of_constant_image_is_constant() {
        let mut image = EnvImage::new(EnvKind::LatLong, 16, 8);
        for y in 0..8 {
            for x in 0..16 {
                image.set_pixel(x, y, Rgba::new(0.25, 0.5, 0.75, 1.0));
            }
        }

        let value = image.filtered_lookup(Vec3::new(0.3, 0.5, -0.8), 0.1, 5);
        assert!((value.r.to_f32() - 0.25).abs() < 1e-3);
        assert!((value.g.to_f32() - 0.5).abs() < 1e-3);
        assert!((value.b.to_f32() - 0.75).abs() < 1e-3);
        assert!((value.a.to_f32() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn face_region_views_the_right_band() {
        let mut image = EnvImage::new(EnvKind::Cube, 4, 24);
        for face in CubeFace::ALL {
            for y in 0..4 {
                for x in 0..4 {
                    let v = face.index() as f32;
                    image.set_pixel(x, face.index() * 4 + y, Rgba::new(v, v, v, 1.0));
                }
            }
        }

        let region = image.face_region(CubeFace::PosZ);
        assert_eq!(region.width, 4);
        assert_eq!(region.height, 4);
        assert_eq!(region.pixels.len(), 16);
        assert_eq!(region.pixels[0].r.to_f32(), 4.0);
    }

    #[test]
    fn reset_reuses_the_allocation() {
        let mut image = EnvImage::new(EnvKind::LatLong, 8, 8);
        image.set_pixel(3, 3, Rgba::new(1.0, 1.0, 1.0, 1.0));

        image.reset(EnvKind::Cube, 2, 12);
        assert_eq!(image.size(), (2, 12));
        assert_eq!(image.kind(), EnvKind::Cube);
        assert!(image.pixels().iter().all(|p| *p == Rgba::ZERO));
    }
}
