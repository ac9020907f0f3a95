/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

#![doc = include_str!("../README.md")]
// Don't allow any unsafe code by default. Since this code has to potentially deal with
// badly/maliciously formatted images, we want this extra level of safety.
#![forbid(unsafe_code)]
#![forbid(non_ascii_idents)]
#![forbid(unused_extern_crates)]
#![forbid(unused_import_braces)]
#![forbid(macro_use_extern_crate)]
#![deny(missing_docs)]

mod consts;
mod helpers;
mod jpeg_code;
mod structs;

mod enabled_features;
mod jpeg_error;
mod metrics;

use std::io::Write;

pub use enabled_features::EnabledFeatures;
pub use jpeg_error::{ExitCode, JpegError};
pub use metrics::{CpuTimeMeasure, DecodeStage, Metrics};
pub use structs::jpeg_decoder::{ColorType, DecodedImage};

use crate::jpeg_error::AddContext;

static PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

static GIT_VERSION: &str = git_version::git_version!(
    args = ["--abbrev=40", "--always", "--dirty=M"],
    fallback = "0"
);

/// Returns the git version used to build this library as a static string.
pub fn get_git_version() -> &'static str {
    GIT_VERSION
}

/// Returns the version string of the library, which includes the package version and the git version.
/// This is useful for debugging and logging purposes to know the exact version of the library is being used
pub fn get_version_string() -> String {
    format!("{}-{}", PACKAGE_VERSION, get_git_version())
}

/// Decodes a complete baseline JPEG file held in memory into grayscale or RGB pixels.
///
/// The input must start with SOI and end with EOI. Any error is fatal and no partial
/// image is returned.
pub fn decode_jpeg(
    input: &[u8],
    enabled_features: &EnabledFeatures,
) -> core::result::Result<DecodedImage, JpegError> {
    let mut metrics = Metrics::default();
    structs::jpeg_decoder::decode_jpeg_internal(input, enabled_features, &mut metrics).context()
}

/// Same as [`decode_jpeg`], but also returns the time spent in each decoding stage
/// and some counters about the image.
pub fn decode_jpeg_with_metrics(
    input: &[u8],
    enabled_features: &EnabledFeatures,
) -> core::result::Result<(DecodedImage, Metrics), JpegError> {
    let mut metrics = Metrics::default();
    let image = structs::jpeg_decoder::decode_jpeg_internal(input, enabled_features, &mut metrics)
        .context()?;
    Ok((image, metrics))
}

/// Parses the segments preceding the scan and returns a human readable description of
/// the frame, the components and all quantization and Huffman tables.
pub fn dump_jpeg(
    input: &[u8],
    enabled_features: &EnabledFeatures,
) -> core::result::Result<String, JpegError> {
    structs::jpeg_decoder::dump_jpeg_internal(input, enabled_features).context()
}

/// Writes a decoded image as binary PGM (grayscale) or PPM (RGB).
pub fn write_pnm<W: Write>(
    image: &DecodedImage,
    writer: &mut W,
) -> core::result::Result<(), JpegError> {
    structs::pnm_writer::write_pnm(image, writer).context()
}

/// Decodes a JPEG and writes it out as PNM in one step.
pub fn convert_jpeg_to_pnm<W: Write>(
    input: &[u8],
    writer: &mut W,
    enabled_features: &EnabledFeatures,
) -> core::result::Result<Metrics, JpegError> {
    let (image, metrics) = decode_jpeg_with_metrics(input, enabled_features)?;
    write_pnm(&image, writer)?;
    Ok(metrics)
}
