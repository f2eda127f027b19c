//! HEIC Conversion Module
//!
//! Decodes one source image via the `image` crate, re-encodes it as HEIC
//! through libheif, and carries the source EXIF block and file timestamps
//! into the output.

use crate::errors::{ImgHeicError, Result};
use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader};
use libheif_rs::{
    Channel, ColorSpace, CompressionFormat, EncoderQuality, HeifContext, Image as HeifImage,
    LibHeif, RgbChroma,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

/// Lossy HEVC quality used when the caller does not override it.
pub const DEFAULT_QUALITY: u8 = 90;

/// Process-wide handle to the libheif codec tables.
///
/// Constructed once at startup and passed by reference into every
/// conversion, so codec registration has an explicit lifecycle instead of
/// happening as a side effect of the first encode.
pub struct HeicCodec {
    lib: LibHeif,
}

impl HeicCodec {
    pub fn new() -> Self {
        Self {
            lib: LibHeif::new(),
        }
    }
}

impl Default for HeicCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConversionOutput {
    pub input_size: u64,
    pub output_size: u64,
    pub had_exif: bool,
}

/// Convert a single source image to HEIC at `dst`.
///
/// The decoded image is dropped before the function returns on every path,
/// so no two files' decode buffers are ever held at the same time.
pub fn convert_to_heic(
    codec: &HeicCodec,
    src: &Path,
    dst: &Path,
    quality: u8,
) -> Result<ConversionOutput> {
    let input_size = std::fs::metadata(src)?.len();

    let (img, exif) = decode_source(src)?;
    debug!(
        src = %src.display(),
        width = img.width(),
        height = img.height(),
        has_exif = exif.is_some(),
        "decoded source image"
    );
    encode_heic(codec, &img, exif.as_deref(), dst, quality)?;

    let output_size = std::fs::metadata(dst)?.len();
    apply_file_timestamps(src, dst);

    Ok(ConversionOutput {
        input_size,
        output_size,
        had_exif: exif.is_some(),
    })
}

/// Decode `src`, returning the image and its raw EXIF blob if one exists.
///
/// The format is guessed from the file content, not the extension. JPEG
/// content goes through `JpegDecoder` so the EXIF segment can be pulled out
/// before pixel decode; other recognized formats (the extension lied) take
/// the generic decode path and carry no EXIF.
fn decode_source(src: &Path) -> Result<(DynamicImage, Option<Vec<u8>>)> {
    let file = BufReader::new(File::open(src)?);
    let reader = ImageReader::new(file).with_guessed_format()?;

    match reader.format() {
        Some(ImageFormat::Jpeg) => {
            let mut decoder = JpegDecoder::new(reader.into_inner()).map_err(|e| decode_error(src, e))?;
            let exif = decoder.exif_metadata().unwrap_or(None);
            let img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(src, e))?;
            Ok((img, exif))
        }
        Some(_) => {
            let img = reader.decode().map_err(|e| decode_error(src, e))?;
            Ok((img, None))
        }
        None => Err(ImgHeicError::UnreadableImage {
            path: src.to_path_buf(),
        }),
    }
}

fn decode_error(src: &Path, err: ImageError) -> ImgHeicError {
    match err {
        ImageError::Unsupported(_) => ImgHeicError::UnreadableImage {
            path: src.to_path_buf(),
        },
        ImageError::IoError(e) => ImgHeicError::IoError(e),
        other => ImgHeicError::DecodeError(other.to_string()),
    }
}

fn encode_heic(
    codec: &HeicCodec,
    img: &DynamicImage,
    exif: Option<&[u8]>,
    dst: &Path,
    quality: u8,
) -> Result<()> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut heif_image = HeifImage::new(width, height, ColorSpace::Rgb(RgbChroma::Rgb))
        .map_err(|e| ImgHeicError::EncodeError(e.to_string()))?;
    heif_image
        .create_plane(Channel::Interleaved, width, height, 8)
        .map_err(|e| ImgHeicError::EncodeError(e.to_string()))?;

    let planes = heif_image.planes_mut();
    let plane = planes
        .interleaved
        .ok_or_else(|| ImgHeicError::EncodeError("No interleaved RGB plane".to_string()))?;
    // The plane stride may be wider than the pixel rows; copy row by row.
    let row_bytes = width as usize * 3;
    for (row, src_row) in rgb.as_raw().chunks_exact(row_bytes).enumerate() {
        let start = row * plane.stride;
        plane.data[start..start + row_bytes].copy_from_slice(src_row);
    }

    let mut encoder = codec
        .lib
        .encoder_for_format(CompressionFormat::Hevc)
        .map_err(|e| ImgHeicError::EncodeError(e.to_string()))?;
    // libheif rejects quality levels above 100
    encoder
        .set_quality(EncoderQuality::Lossy(quality.min(100)))
        .map_err(|e| ImgHeicError::EncodeError(e.to_string()))?;

    let mut ctx = HeifContext::new().map_err(|e| ImgHeicError::EncodeError(e.to_string()))?;
    let handle = ctx
        .encode_image(&heif_image, &mut encoder, None)
        .map_err(|e| ImgHeicError::EncodeError(e.to_string()))?;

    if let Some(exif) = exif {
        ctx.add_exif_metadata(&handle, exif)
            .map_err(|e| ImgHeicError::EncodeError(e.to_string()))?;
    }

    ctx.write_to_file(dst.to_string_lossy().as_ref())
        .map_err(|e| ImgHeicError::EncodeError(e.to_string()))?;

    Ok(())
}

/// Carry the source file's access/modification times over to the output.
/// Best effort: a failure here never fails the conversion.
fn apply_file_timestamps(src: &Path, dst: &Path) {
    let Ok(m) = std::fs::metadata(src) else {
        return;
    };
    let atime = filetime::FileTime::from_last_access_time(&m);
    let mtime = filetime::FileTime::from_last_modification_time(&m);
    if let Err(e) = filetime::set_file_times(dst, atime, mtime) {
        warn!("Failed to set file times on {}: {}", dst.display(), e);
    }
}
