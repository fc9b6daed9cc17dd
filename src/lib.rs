//! Environment map generation for image-based lighting
//!
//! Converts panoramic (latitude-longitude) environment images into
//! cube-face environment maps, and back: tiled OpenEXR output with an
//! optional mip pyramid, a one-file six-face layout or six separate
//! face files, filtered resampling between the projections, and an
//! optional diffuse blur for irradiance-style maps.
//!
//! The usual flow is the one the `envmapgen` binary drives:
//!
//! 1. [`input::read_input_image`] loads an EXR or Radiance panorama.
//! 2. Optionally [`blur::blur_image`] convolves it with a cosine lobe.
//! 3. [`cubemap::make_cube_map`] or [`latlongmap::make_latlong_map`]
//!    resamples it level by level and writes the tiled output.

pub mod blur;
pub mod cubemap;
pub mod error;
pub mod hdr;
pub mod image;
pub mod input;
pub mod latlongmap;
pub mod options;
pub mod projection;
pub mod pyramid;
pub mod resample;
pub mod writer;

pub use blur::blur_image;
pub use cubemap::{make_cube_map, OutputLayout};
pub use error::{EnvmapError, EnvmapResult};
pub use image::{EnvImage, EnvKind, Rgba};
pub use input::read_input_image;
pub use latlongmap::make_latlong_map;
pub use options::{parse_compression, OutputOptions};
