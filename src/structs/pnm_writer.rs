/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use std::io::Write;

use crate::jpeg_error::{err_exit_code, AddContext, ExitCode, Result};

use super::jpeg_decoder::{ColorType, DecodedImage};

/// Writes the image as binary PGM (P5) for grayscale or PPM (P6) for RGB
pub fn write_pnm<W: Write>(image: &DecodedImage, writer: &mut W) -> Result<()> {
    let expected = image.width as usize * image.height as usize * image.color.channels();
    if image.pixels.len() != expected {
        return err_exit_code(
            ExitCode::SyntaxError,
            format!(
                "image of {0}x{1} should have {2} bytes of pixels, but has {3}",
                image.width,
                image.height,
                expected,
                image.pixels.len()
            ),
        );
    }

    let magic = match image.color {
        ColorType::Grayscale => "P5",
        ColorType::Rgb => "P6",
    };

    write!(writer, "{0}\n{1} {2}\n255\n", magic, image.width, image.height).context()?;
    writer.write_all(&image.pixels).context()?;

    Ok(())
}

#[test]
fn test_pnm_headers() {
    let gray = DecodedImage {
        width: 2,
        height: 1,
        color: ColorType::Grayscale,
        pixels: vec![1, 2],
    };

    let mut out = Vec::new();
    write_pnm(&gray, &mut out).unwrap();
    assert_eq!(b"P5\n2 1\n255\n\x01\x02", out.as_slice());

    let rgb = DecodedImage {
        width: 1,
        height: 2,
        color: ColorType::Rgb,
        pixels: vec![1, 2, 3, 4, 5, 6],
    };

    let mut out = Vec::new();
    write_pnm(&rgb, &mut out).unwrap();
    assert_eq!(b"P6\n1 2\n255\n\x01\x02\x03\x04\x05\x06", out.as_slice());
}

#[test]
fn test_pnm_size_mismatch() {
    let bad = DecodedImage {
        width: 2,
        height: 2,
        color: ColorType::Rgb,
        pixels: vec![0; 4],
    };

    let e = write_pnm(&bad, &mut Vec::new()).unwrap_err();
    assert_eq!(ExitCode::SyntaxError, e.exit_code());
}
