//! Cube-face and latitude-longitude projection math
//!
//! Maps between 3D directions and pixel positions for the two supported
//! environment map layouts. Cube images store six square faces stacked
//! vertically in a fixed order; latitude-longitude images cover the full
//! sphere with +Y at the top row and +Z at the horizontal center.

use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Number of cube faces.
pub const FACE_COUNT: usize = 6;

/// One face of a cube environment map, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    /// All faces, top to bottom of the stacked layout.
    pub const ALL: [CubeFace; FACE_COUNT] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Two-character axis token used in face file names.
    pub fn token(self) -> &'static str {
        match self {
            CubeFace::PosX => "+X",
            CubeFace::NegX => "-X",
            CubeFace::PosY => "+Y",
            CubeFace::NegY => "-Y",
            CubeFace::PosZ => "+Z",
            CubeFace::NegZ => "-Z",
        }
    }

    /// Position of this face in the vertical stacking.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Side length of one face of a stacked cube image with the given dimensions.
///
/// A conforming image is six times as tall as it is wide. Undersized images
/// yield smaller (possibly zero) faces instead of failing; lookups simply
/// never reach the missing rows.
pub fn size_of_face(width: usize, height: usize) -> usize {
    width.min(height / 6)
}

/// Direction through pixel `position` of `face`, for faces with the given
/// side length. The dominant component of the result is always exactly 1.
pub fn face_direction(face: CubeFace, size_of_face: usize, position: Vec2) -> Vec3 {
    let pos = if size_of_face > 1 {
        Vec2::new(
            position.x / (size_of_face - 1) as f32 * 2.0 - 1.0,
            position.y / (size_of_face - 1) as f32 * 2.0 - 1.0,
        )
    } else {
        Vec2::ZERO
    };

    match face {
        CubeFace::PosX => Vec3::new(1.0, -pos.y, -pos.x),
        CubeFace::NegX => Vec3::new(-1.0, -pos.y, pos.x),
        CubeFace::PosY => Vec3::new(pos.y, 1.0, pos.x),
        CubeFace::NegY => Vec3::new(-pos.y, -1.0, pos.x),
        CubeFace::PosZ => Vec3::new(pos.x, -pos.y, 1.0),
        CubeFace::NegZ => Vec3::new(-pos.x, -pos.y, -1.0),
    }
}

/// Face and in-face pixel position hit by `direction`.
///
/// The face is selected by the dominant axis of the direction; ties go to
/// X over Y over Z. The zero direction maps to pixel (0, 0) of the +X face.
pub fn face_and_position(direction: Vec3, size_of_face: usize) -> (CubeFace, Vec2) {
    let scale = 0.5 * (size_of_face.max(1) - 1) as f32;

    let absx = direction.x.abs();
    let absy = direction.y.abs();
    let absz = direction.z.abs();

    if absx >= absy && absx >= absz {
        if absx == 0.0 {
            return (CubeFace::PosX, Vec2::ZERO);
        }

        let u = (1.0 - direction.z / direction.x) * scale;
        let v = (1.0 - direction.y / absx) * scale;
        let face = if direction.x > 0.0 {
            CubeFace::PosX
        } else {
            CubeFace::NegX
        };
        (face, Vec2::new(u, v))
    } else if absy >= absz {
        let u = (1.0 + direction.z / absy) * scale;
        let v = (1.0 + direction.x / direction.y) * scale;
        let face = if direction.y > 0.0 {
            CubeFace::PosY
        } else {
            CubeFace::NegY
        };
        (face, Vec2::new(u, v))
    } else {
        let u = (1.0 + direction.x / direction.z) * scale;
        let v = (1.0 - direction.y / absz) * scale;
        let face = if direction.z > 0.0 {
            CubeFace::PosZ
        } else {
            CubeFace::NegZ
        };
        (face, Vec2::new(u, v))
    }
}

/// Pixel position of `direction` within a stacked cube image.
pub fn cube_pixel_position(direction: Vec3, width: usize, height: usize) -> Vec2 {
    let sof = size_of_face(width, height);
    let (face, pos) = face_and_position(direction, sof);

    Vec2::new(pos.x, pos.y + (face.index() * sof) as f32)
}

/// Latitude and longitude of a direction, in radians.
///
/// Latitude is pi/2 at +Y and -pi/2 at -Y; longitude is 0 at +Z and pi/2
/// at +X. Near the poles the latitude comes from the horizontal radius
/// rather than the vertical component, which keeps more precision there.
pub fn latlong_of_direction(direction: Vec3) -> (f32, f32) {
    let r = (direction.x * direction.x + direction.z * direction.z).sqrt();
    let len = direction.length();

    let latitude = if len == 0.0 {
        0.0
    } else if r < direction.y.abs() {
        (r / len).acos() * direction.y.signum()
    } else {
        (direction.y / len).asin()
    };

    let longitude = if direction.z == 0.0 && direction.x == 0.0 {
        0.0
    } else {
        direction.x.atan2(direction.z)
    };

    (latitude, longitude)
}

/// Pixel position of a direction within a latitude-longitude image.
pub fn latlong_pixel_position(direction: Vec3, width: usize, height: usize) -> Vec2 {
    let (latitude, longitude) = latlong_of_direction(direction);

    Vec2::new(
        (width.max(1) - 1) as f32 * (longitude / (-2.0 * PI) + 0.5),
        (height.max(1) - 1) as f32 * (latitude / -PI + 0.5),
    )
}

/// Direction through pixel `position` of a latitude-longitude image.
pub fn latlong_direction(width: usize, height: usize, position: Vec2) -> Vec3 {
    let latitude = if height > 1 {
        -PI * (position.y / (height - 1) as f32 - 0.5)
    } else {
        0.0
    };

    let longitude = if width > 1 {
        -2.0 * PI * (position.x / (width - 1) as f32 - 0.5)
    } else {
        0.0
    };

    Vec3::new(
        longitude.sin() * latitude.cos(),
        latitude.sin(),
        longitude.cos() * latitude.cos(),
    )
}
