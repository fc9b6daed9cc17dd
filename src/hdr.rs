//! Radiance HDR (.hdr) panorama loader
//!
//! Decodes Radiance RGBE images, covering both the old-style pixel
//! stream with repeat markers and the new-style per-component run
//! length coding. The shared-exponent pixels are expanded to linear
//! half floats; the result is always treated as a latitude-longitude
//! panorama.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{EnvmapError, EnvmapResult};
use crate::image::{EnvImage, EnvKind, Rgba};

/// Load a Radiance HDR panorama as a latitude-longitude image.
pub fn load_hdr(path: &Path) -> EnvmapResult<EnvImage> {
    let file = File::open(path).map_err(|source| {
        EnvmapError::read(format!(
            "cannot open input file \"{}\" ({})",
            path.display(),
            source
        ))
    })?;

    decode_hdr(BufReader::new(file))
}

/// Decode an HDR byte stream.
pub(crate) fn decode_hdr<R: BufRead>(mut reader: R) -> EnvmapResult<EnvImage> {
    let (width, height) = parse_header(&mut reader)?;

    let mut image = EnvImage::new(EnvKind::LatLong, width, height);
    let mut scanline = vec![[0u8; 4]; width];

    for y in 0..height {
        read_scanline(&mut reader, y, &mut scanline)?;
        for (x, rgbe) in scanline.iter().enumerate() {
            image.set_pixel(x, y, rgbe_to_rgba(*rgbe));
        }
    }

    Ok(image)
}

fn parse_header<R: BufRead>(reader: &mut R) -> EnvmapResult<(usize, usize)> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|source| EnvmapError::read(format!("cannot read HDR header ({})", source)))?;

    if !line.starts_with("#?RADIANCE") && !line.starts_with("#?RGBE") {
        return Err(EnvmapError::read(
            "not a Radiance HDR file (missing #? magic)",
        ));
    }

    let mut format_found = false;
    line.clear();

    while reader
        .read_line(&mut line)
        .map_err(|source| EnvmapError::read(format!("cannot read HDR header ({})", source)))?
        > 0
    {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            break;
        }

        if let Some(format) = trimmed.strip_prefix("FORMAT=") {
            if format != "32-bit_rle_rgbe" {
                return Err(EnvmapError::read(format!(
                    "unsupported HDR pixel format \"{}\"",
                    format
                )));
            }
            format_found = true;
        }

        line.clear();
    }

    if !format_found {
        return Err(EnvmapError::read("HDR header carries no FORMAT line"));
    }

    line.clear();
    reader
        .read_line(&mut line)
        .map_err(|source| EnvmapError::read(format!("cannot read HDR resolution ({})", source)))?;

    // Only the usual top-down, left-to-right pixel order is supported.
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 || parts[0] != "-Y" || parts[2] != "+X" {
        return Err(EnvmapError::read(format!(
            "unsupported HDR pixel order \"{}\"",
            line.trim()
        )));
    }

    let height = parts[1]
        .parse::<usize>()
        .map_err(|_| EnvmapError::read(format!("invalid HDR height \"{}\"", parts[1])))?;
    let width = parts[3]
        .parse::<usize>()
        .map_err(|_| EnvmapError::read(format!("invalid HDR width \"{}\"", parts[3])))?;

    if width == 0 || height == 0 {
        return Err(EnvmapError::read("HDR image dimensions must be positive"));
    }

    Ok((width, height))
}

fn read_scanline<R: Read>(
    reader: &mut R,
    y: usize,
    scanline: &mut [[u8; 4]],
) -> EnvmapResult<()> {
    let width = scanline.len();

    let mut lead = [0u8; 4];
    reader.read_exact(&mut lead).map_err(|source| {
        EnvmapError::read(format!("truncated HDR scanline {} ({})", y, source))
    })?;

    let coded_width = ((lead[2] as usize) << 8) | lead[3] as usize;
    if lead[0] == 2 && lead[1] == 2 && coded_width == width {
        read_rle_scanline(reader, y, scanline)
    } else {
        read_old_scanline(reader, y, lead, scanline)
    }
}

/// Old-style scanline: a plain pixel stream in which a pixel of
/// `(1, 1, 1, n)` repeats the previous pixel n times. The count shifts
/// up by eight bits for every consecutive marker.
fn read_old_scanline<R: Read>(
    reader: &mut R,
    y: usize,
    first: [u8; 4],
    scanline: &mut [[u8; 4]],
) -> EnvmapResult<()> {
    let width = scanline.len();
    let mut item = first;
    let mut pos = 0usize;
    let mut shift = 0u32;

    loop {
        if item[0] == 1 && item[1] == 1 && item[2] == 1 {
            if pos == 0 {
                return Err(EnvmapError::read(format!(
                    "HDR scanline {} starts with a repeat marker",
                    y
                )));
            }

            // A zero count makes no progress, and a chain of markers
            // long enough to need one would overrun the shift anyway.
            if item[3] == 0 {
                return Err(EnvmapError::read(format!(
                    "zero-count repeat marker in HDR scanline {}",
                    y
                )));
            }

            let count = (item[3] as usize) << shift;
            if pos + count > width {
                return Err(EnvmapError::read(format!(
                    "HDR repeat run exceeds the width of scanline {}",
                    y
                )));
            }

            let previous = scanline[pos - 1];
            for slot in &mut scanline[pos..pos + count] {
                *slot = previous;
            }
            pos += count;
            shift += 8;
        } else {
            scanline[pos] = item;
            pos += 1;
            shift = 0;
        }

        if pos >= width {
            break;
        }

        reader.read_exact(&mut item).map_err(|source| {
            EnvmapError::read(format!("truncated HDR scanline {} ({})", y, source))
        })?;
    }

    Ok(())
}

/// New-style scanline: four run-length coded byte planes, one per
/// component.
fn read_rle_scanline<R: Read>(
    reader: &mut R,
    y: usize,
    scanline: &mut [[u8; 4]],
) -> EnvmapResult<()> {
    let width = scanline.len();

    for component in 0..4 {
        let mut pos = 0usize;

        while pos < width {
            let mut code = [0u8; 1];
            reader.read_exact(&mut code).map_err(|source| {
                EnvmapError::read(format!("truncated HDR scanline {} ({})", y, source))
            })?;

            if code[0] > 128 {
                // Run: one value repeated.
                let count = (code[0] - 128) as usize;
                if pos + count > width {
                    return Err(EnvmapError::read(format!(
                        "HDR run exceeds the width of scanline {}",
                        y
                    )));
                }

                let mut value = [0u8; 1];
                reader.read_exact(&mut value).map_err(|source| {
                    EnvmapError::read(format!("truncated HDR scanline {} ({})", y, source))
                })?;

                for pixel in &mut scanline[pos..pos + count] {
                    pixel[component] = value[0];
                }
                pos += count;
            } else {
                // Literal: the next count bytes verbatim.
                let count = code[0] as usize;
                if count == 0 {
                    return Err(EnvmapError::read(format!(
                        "zero-length run in HDR scanline {}",
                        y
                    )));
                }
                if pos + count > width {
                    return Err(EnvmapError::read(format!(
                        "HDR run exceeds the width of scanline {}",
                        y
                    )));
                }

                let mut values = [0u8; 128];
                reader.read_exact(&mut values[..count]).map_err(|source| {
                    EnvmapError::read(format!("truncated HDR scanline {} ({})", y, source))
                })?;

                for (pixel, value) in scanline[pos..pos + count].iter_mut().zip(&values[..count]) {
                    pixel[component] = *value;
                }
                pos += count;
            }
        }
    }

    Ok(())
}

/// Expand one shared-exponent pixel to linear values. The exponent is
/// biased by 128, and the mantissa bytes carry another factor of 256.
fn rgbe_to_rgba([r, g, b, e]: [u8; 4]) -> Rgba {
    if e == 0 {
        return Rgba::new(0.0, 0.0, 0.0, 1.0);
    }

    let scale = 2.0f32.powi(e as i32 - 128 - 8);
    Rgba::new(
        r as f32 * scale,
        g as f32 * scale,
        b as f32 * scale,
        1.0,
    )
}
