use anyhow::Result;
use clap::Parser;
use exr::math::RoundingMode;
use exr::meta::attribute::LevelMode;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use envmapgen::{
    blur_image, make_cube_map, make_latlong_map, parse_compression, read_input_image, EnvKind,
    OutputOptions,
};

/// Convert latitude-longitude environment maps into cube-face maps
#[derive(Parser, Debug)]
#[command(name = "envmapgen", version, about)]
struct Args {
    /// Input image: an EXR or Radiance .hdr panorama, or six EXR cube
    /// faces named with a % placeholder
    input: String,

    /// Output EXR file; a % in the name writes six per-face files
    output: String,

    /// Produce a latitude-longitude map instead of a cube-face map
    #[arg(long)]
    latlong: bool,

    /// Produce a single-level file instead of a mip pyramid
    #[arg(long)]
    one_level: bool,

    /// Treat the input as a cube-face map regardless of its attributes
    #[arg(long, conflicts_with = "latlong_input")]
    cube_input: bool,

    /// Treat the input as a latitude-longitude map regardless of its
    /// attributes
    #[arg(long)]
    latlong_input: bool,

    /// Width of one output face (or of the latitude-longitude map)
    #[arg(short = 'w', long, default_value_t = 256)]
    width: usize,

    /// Tile width of the output file
    #[arg(long, default_value_t = 64)]
    tile_width: usize,

    /// Tile height of the output file
    #[arg(long, default_value_t = 64)]
    tile_height: usize,

    /// Filter radius, in source pixels per output pixel
    #[arg(long, default_value_t = 1.0)]
    filter_radius: f32,

    /// Edge length of the sample grid behind each output pixel
    #[arg(long, default_value_t = 5)]
    num_samples: usize,

    /// Round mip level sizes up instead of down
    #[arg(long)]
    round_up: bool,

    /// Compression: none, rle, zip, zips, piz, pxr24, b44, b44a, dwaa
    /// or dwab
    #[arg(short = 'z', long, default_value = "zip")]
    compression: String,

    /// Blur the environment with a diffuse cosine lobe before output
    #[arg(long)]
    blur: bool,

    /// Pad the top of a partial panorama by this fraction of its height
    #[arg(long, default_value_t = 0.0)]
    pad_top: f32,

    /// Pad the bottom of a partial panorama by this fraction of its
    /// height
    #[arg(long, default_value_t = 0.0)]
    pad_bottom: f32,

    /// Report progress while working
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    let kind_override = if args.cube_input {
        Some(EnvKind::Cube)
    } else if args.latlong_input {
        Some(EnvKind::LatLong)
    } else {
        None
    };

    let options = OutputOptions {
        map_width: args.width,
        tile_width: args.tile_width,
        tile_height: args.tile_height,
        level_mode: if args.one_level {
            LevelMode::Singular
        } else {
            LevelMode::MipMap
        },
        rounding_mode: if args.round_up {
            RoundingMode::Up
        } else {
            RoundingMode::Down
        },
        compression: parse_compression(&args.compression)?,
        filter_radius: args.filter_radius,
        num_samples: args.num_samples,
        verbose: args.verbose,
    };

    let mut image = read_input_image(
        &args.input,
        args.pad_top,
        args.pad_bottom,
        kind_override,
        args.verbose,
    )?;

    if args.blur {
        blur_image(&mut image, args.verbose);
    }

    if args.latlong {
        make_latlong_map(&image, &args.output, &options)?;
    } else {
        make_cube_map(&image, &args.output, &options)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_a_typical_invocation() {
        let args = Args::try_parse_from([
            "envmapgen",
            "-w",
            "128",
            "--one-level",
            "-z",
            "piz",
            "-v",
            "pano.exr",
            "cube.exr",
        ])
        .expect("parse");

        assert_eq!(args.width, 128);
        assert!(args.one_level);
        assert!(!args.latlong);
        assert_eq!(args.compression, "piz");
        assert!(args.verbose);
        assert_eq!(args.input, "pano.exr");
        assert_eq!(args.output, "cube.exr");
        assert_eq!(args.tile_width, 64);
        assert_eq!(args.num_samples, 5);
    }

    #[test]
    fn conflicting_input_kind_overrides_are_rejected() {
        let result = Args::try_parse_from([
            "envmapgen",
            "--cube-input",
            "--latlong-input",
            "in.exr",
            "out.exr",
        ]);
        assert!(result.is_err());
    }
}
