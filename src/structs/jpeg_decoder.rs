/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use log::{debug, warn};

use crate::enabled_features::EnabledFeatures;
use crate::jpeg_error::{err_exit_code, AddContext, ExitCode, Result};
use crate::metrics::{CpuTimeMeasure, DecodeStage, Metrics};

use super::bit_reader::BitReader;
use super::color_conversion::convert_planes_to_rgb;
use super::component_plane::ComponentPlane;
use super::jpeg_header::{JpegHeader, ParseSegmentResult};
use super::jpeg_read::read_scan;

/// Layout of the decoded pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    /// one luma byte per pixel
    Grayscale,
    /// red, green and blue bytes per pixel
    Rgb,
}

impl ColorType {
    /// bytes per pixel
    pub fn channels(&self) -> usize {
        match self {
            ColorType::Grayscale => 1,
            ColorType::Rgb => 3,
        }
    }
}

/// A fully decoded image, rows top to bottom, pixels left to right
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// layout of each pixel
    pub color: ColorType,
    /// `width * height * color.channels()` bytes
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// returns the bytes of the pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.color.channels();
        let start = (y as usize * self.width as usize + x as usize) * c;
        &self.pixels[start..start + c]
    }
}

fn check_file_size(input: &[u8], enabled_features: &EnabledFeatures) -> Result<()> {
    if input.len() as u64 > u64::from(enabled_features.max_jpeg_file_size) {
        return err_exit_code(
            ExitCode::MalformedContainer,
            format!(
                "input of {0} bytes is larger than the limit of {1} bytes",
                input.len(),
                enabled_features.max_jpeg_file_size
            ),
        );
    }
    Ok(())
}

/// Decodes a complete baseline JPEG held in memory.
pub fn decode_jpeg_internal(
    input: &[u8],
    enabled_features: &EnabledFeatures,
    metrics: &mut Metrics,
) -> Result<DecodedImage> {
    check_file_size(input, enabled_features)?;

    let mut reader = BitReader::new(input);
    let mut header = JpegHeader::new();
    let mut planes: Option<Vec<ComponentPlane>> = None;

    let mut timer = CpuTimeMeasure::new();

    header.parse_start_of_image(&mut reader).context()?;

    loop {
        match header
            .parse_next_segment(&mut reader, enabled_features)
            .context()?
        {
            ParseSegmentResult::Continue => {}
            ParseSegmentResult::EOI => break,
            ParseSegmentResult::SOS => {
                metrics.record_stage_time(DecodeStage::ParseHeader, timer.elapsed());

                // the scan runs up to the next marker that isn't a stuffed 0xff
                let scan_start = reader.get_byte_position();
                let scan_end = reader.find_next_marker().context()? / 8;

                let mut scan_data = vec![0u8; scan_end - scan_start];
                reader.copy_raw_bytes(&mut scan_data).context()?;

                let scan_timer = CpuTimeMeasure::new();
                planes = Some(read_scan(&header, &scan_data, metrics).context()?);
                metrics.record_stage_time(DecodeStage::DecodeScan, scan_timer.elapsed());

                timer = CpuTimeMeasure::new();
            }
        }
    }

    metrics.record_stage_time(DecodeStage::ParseHeader, timer.elapsed());

    let planes = match planes {
        Some(p) => p,
        None => {
            return err_exit_code(
                ExitCode::MalformedContainer,
                "end of image reached without any scan",
            )
        }
    };

    if !reader.is_eof() {
        let garbage = reader.bits_left() / 8;
        if enabled_features.accept_trailing_data {
            warn!("ignoring {0} bytes after the end of image", garbage);
        } else {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!("{0} bytes of trailing data after the end of image", garbage),
            );
        }
    }

    let image = assemble_image(&header, planes, metrics).context()?;
    metrics.record_image();

    Ok(image)
}

/// upsamples the component planes to the frame size and converts them to output pixels
fn assemble_image(
    header: &JpegHeader,
    planes: Vec<ComponentPlane>,
    metrics: &mut Metrics,
) -> Result<DecodedImage> {
    let frame = header.get_frame()?;
    let (width, height) = (frame.img_width, frame.img_height);

    let timer = CpuTimeMeasure::new();
    let mut planes: Vec<ComponentPlane> = planes
        .into_iter()
        .zip(header.cmp_info.iter())
        .map(|(p, ci)| {
            if ci.is_subsampled(width, height) {
                debug!(
                    "upsampling component {0} from {1}x{2} to {3}x{4}",
                    ci.jid,
                    p.get_width(),
                    p.get_height(),
                    width,
                    height
                );
            }
            p.upsample(width, height)
        })
        .collect();
    metrics.record_stage_time(DecodeStage::Upsample, timer.elapsed());

    let timer = CpuTimeMeasure::new();
    let image = match planes.len() {
        1 => DecodedImage {
            width,
            height,
            color: ColorType::Grayscale,
            pixels: planes.remove(0).into_samples(),
        },
        3 => DecodedImage {
            width,
            height,
            color: ColorType::Rgb,
            pixels: convert_planes_to_rgb(
                planes[0].get_samples(),
                planes[1].get_samples(),
                planes[2].get_samples(),
            ),
        },
        n => {
            return err_exit_code(
                ExitCode::GeneralFailure,
                format!("unexpected number of planes {0}", n),
            )
        }
    };
    metrics.record_stage_time(DecodeStage::ColorConvert, timer.elapsed());

    Ok(image)
}

/// Parses everything up to the first scan and returns a description of the tables
/// and geometry found
pub fn dump_jpeg_internal(input: &[u8], enabled_features: &EnabledFeatures) -> Result<String> {
    check_file_size(input, enabled_features)?;

    let mut reader = BitReader::new(input);
    let mut header = JpegHeader::new();

    header.parse_start_of_image(&mut reader).context()?;
    let has_scan = header.parse(&mut reader, enabled_features).context()?;

    let mut s = header.describe();
    if has_scan {
        s += &format!(
            "scan data starts at byte offset {0}\n",
            reader.get_byte_position()
        );
    } else {
        s += "no scan found\n";
    }

    Ok(s)
}
