//! Diffuse blur of an environment image
//!
//! Convolves the environment with a cosine lobe, turning it into an
//! irradiance-style map. Convolving at full resolution would be far too
//! expensive, so the image is first resampled to a small proxy cube and
//! the gather runs texel against texel on the proxy. The blurred proxy
//! replaces the input; later resampling scales it up to the requested
//! output size.

use glam::{Vec2, Vec4};
use log::info;

use crate::image::{EnvImage, EnvKind, Rgba};
use crate::projection::{self, CubeFace};
use crate::resample;

/// Largest proxy cube face used for the gather.
const MAX_PROXY_FACE: usize = 40;

/// Replace `image` with a cosine-blurred proxy cube of itself.
pub fn blur_image(image: &mut EnvImage, verbose: bool) {
    if verbose {
        info!("blurring map image");
    }

    blur_with_proxy(image, proxy_face_size(image));
}

/// Proxy face size for an input: the input's own face size when it is
/// already a small cube, otherwise the fixed maximum.
fn proxy_face_size(image: &EnvImage) -> usize {
    if image.kind() == EnvKind::Cube {
        let sof = image.size_of_face();
        if sof > 0 && sof < MAX_PROXY_FACE {
            return sof;
        }
    }

    MAX_PROXY_FACE
}

fn blur_with_proxy(image: &mut EnvImage, sof: usize) {
    let width = sof;
    let height = 6 * sof;

    let mut proxy = EnvImage::new(EnvKind::Cube, 1, 1);
    resample::resample_cube(image, &mut proxy, width, height, 1.0, 5);

    // Per-texel directions, weights and colors of the proxy. The weight
    // is the texel's solid angle: face texels sit on a plane at unit
    // distance, so the angle falls off with the cube of the distance to
    // the texel. Edge texels are shared with the neighboring face and
    // count half per shared axis.
    let count = width * height;
    let mut directions = Vec::with_capacity(count);
    let mut weights = Vec::with_capacity(count);
    let mut colors = Vec::with_capacity(count);

    for face in CubeFace::ALL {
        for y in 0..sof {
            let y_edge = y == 0 || y == sof - 1;

            for x in 0..sof {
                let x_edge = x == 0 || x == sof - 1;

                let direction =
                    projection::face_direction(face, sof, Vec2::new(x as f32, y as f32));
                let length = direction.length();

                let mut weight = 1.0 / (length * length * length);
                if x_edge {
                    weight *= 0.5;
                }
                if y_edge {
                    weight *= 0.5;
                }

                directions.push(direction / length);
                weights.push(weight);
                colors.push(proxy.pixel(x, face.index() * sof + y).to_vec4());
            }
        }
    }

    // Every output texel gathers the light of the whole sphere, scaled
    // by the cosine against its own direction.
    image.reset(EnvKind::Cube, width, height);

    for face in CubeFace::ALL {
        for y in 0..sof {
            for x in 0..sof {
                let out_direction =
                    projection::face_direction(face, sof, Vec2::new(x as f32, y as f32))
                        .normalize_or_zero();

                let mut total = Vec4::ZERO;
                let mut weight_total = 0.0f32;

                for i in 0..count {
                    let w = out_direction.dot(directions[i]).max(0.0) * weights[i];
                    if w > 0.0 {
                        total += colors[i] * w;
                        weight_total += w;
                    }
                }

                image.set_pixel(x, face.index() * sof + y, Rgba::from_vec4(total / weight_total));
            }
        }
    }
}
