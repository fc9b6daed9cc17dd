//! Reading generated files back through the input module.

use std::io::Write;

use envmapgen::{make_cube_map, read_input_image, EnvImage, EnvKind, OutputOptions, Rgba};

fn gradient_panorama(width: usize, height: usize) -> EnvImage {
    let mut image = EnvImage::new(EnvKind::LatLong, width, height);
    for y in 0..height {
        for x in 0..width {
            image.set_pixel(
                x,
                y,
                Rgba::new(
                    x as f32 / width as f32,
                    y as f32 / height as f32,
                    0.125,
                    1.0,
                ),
            );
        }
    }
    image
}

fn small_options() -> OutputOptions {
    OutputOptions {
        map_width: 8,
        tile_width: 4,
        tile_height: 4,
        ..OutputOptions::default()
    }
}

#[test]
fn generated_cube_files_read_back_as_cubes() {
    let input = gradient_panorama(32, 16);
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("cube.exr");
    let path = path.to_str().expect("utf-8 path");

    make_cube_map(&input, path, &small_options()).expect("generate cube map");

    let image = read_input_image(path, 0.0, 0.0, None, false).expect("read cube map");
    assert_eq!(image.kind(), EnvKind::Cube);
    assert_eq!(image.size(), (8, 48));
}

#[test]
fn six_face_assembly_matches_the_single_file() {
    let input = gradient_panorama(32, 16);
    let dir = tempfile::tempdir().expect("create temp dir");
    let single = dir.path().join("cube.exr");
    let single = single.to_str().expect("utf-8 path");
    let pattern = dir.path().join("face_%.exr");
    let pattern = pattern.to_str().expect("utf-8 path");

    let options = small_options();
    make_cube_map(&input, single, &options).expect("generate single file");
    make_cube_map(&input, pattern, &options).expect("generate face files");

    let from_single = read_input_image(single, 0.0, 0.0, None, false).expect("read single file");
    let from_faces = read_input_image(pattern, 0.0, 0.0, None, false).expect("assemble faces");

    assert_eq!(from_faces.kind(), EnvKind::Cube);
    assert_eq!(from_faces.size(), from_single.size());
    assert_eq!(from_faces.pixels(), from_single.pixels());
}

#[test]
fn caller_override_beats_the_file_attribute() {
    let input = gradient_panorama(32, 16);
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("cube.exr");
    let path = path.to_str().expect("utf-8 path");

    make_cube_map(&input, path, &small_options()).expect("generate cube map");

    let image =
        read_input_image(path, 0.0, 0.0, Some(EnvKind::LatLong), false).expect("read cube map");
    assert_eq!(image.kind(), EnvKind::LatLong);
}

#[test]
fn hdr_panoramas_load_as_latlong_and_take_padding() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("pano.hdr");

    let mut file = std::fs::File::create(&path).expect("create hdr fixture");
    file.write_all(b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 2 +X 4\n")
        .expect("write header");
    // Two old-style scanlines of plain pixels, exponent 128 = half scale.
    for value in [10u8, 20, 30, 40, 50, 60, 70, 80] {
        file.write_all(&[value, value, value, 128])
            .expect("write pixel");
    }
    drop(file);

    let path = path.to_str().expect("utf-8 path");
    let image = read_input_image(path, 0.0, 0.0, None, false).expect("read hdr");
    assert_eq!(image.kind(), EnvKind::LatLong);
    assert_eq!(image.size(), (4, 2));
    assert!((image.pixel(0, 0).r.to_f32() - 10.0 / 256.0).abs() < 1e-6);
    assert!((image.pixel(3, 1).g.to_f32() - 80.0 / 256.0).abs() < 1e-6);

    // Half of two rows rounds to one replicated row at the top.
    let padded = read_input_image(path, 0.5, 0.0, None, false).expect("read padded hdr");
    assert_eq!(padded.size(), (4, 3));
    assert_eq!(padded.pixel(0, 0), padded.pixel(0, 1));
}
