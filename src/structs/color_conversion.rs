/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use crate::helpers::clamp_to_u8;

/// JFIF YCbCr to RGB conversion of a single pixel
#[inline(always)]
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = f32::from(y);
    let cb = f32::from(cb) - 128.0;
    let cr = f32::from(cr) - 128.0;

    let r = y + 1.402 * cr;
    let g = y - 0.344136 * cb - 0.714136 * cr;
    let b = y + 1.772 * cb;

    [
        clamp_to_u8(r.round() as i32),
        clamp_to_u8(g.round() as i32),
        clamp_to_u8(b.round() as i32),
    ]
}

/// Interleaves three full resolution planes into packed RGB
pub fn convert_planes_to_rgb(y: &[u8], cb: &[u8], cr: &[u8]) -> Vec<u8> {
    debug_assert!(y.len() == cb.len() && y.len() == cr.len());

    let mut rgb = Vec::with_capacity(y.len() * 3);
    for ((&y, &cb), &cr) in y.iter().zip(cb).zip(cr) {
        rgb.extend_from_slice(&ycbcr_to_rgb(y, cb, cr));
    }
    rgb
}

#[test]
fn test_neutral_chroma_is_gray() {
    for y in [0u8, 1, 64, 128, 200, 255] {
        assert_eq!([y, y, y], ycbcr_to_rgb(y, 128, 128));
    }
}

#[test]
fn test_primaries() {
    // pure red, green and blue as produced by the forward JFIF transform
    assert_eq!([254, 0, 0], ycbcr_to_rgb(76, 85, 255));
    assert_eq!([0, 255, 1], ycbcr_to_rgb(150, 44, 21));
    assert_eq!([0, 0, 254], ycbcr_to_rgb(29, 255, 107));
}

#[test]
fn test_clamping() {
    assert_eq!([255, 255, 255], ycbcr_to_rgb(255, 128, 128));
    // large Cr pushes red over and green under
    let [r, g, _] = ycbcr_to_rgb(200, 128, 255);
    assert_eq!(255, r);
    assert_eq!(109, g);
    let [_, _, b] = ycbcr_to_rgb(10, 0, 128);
    assert_eq!(0, b);
}

#[test]
fn test_convert_planes() {
    let rgb = convert_planes_to_rgb(&[10, 20], &[128, 128], &[128, 128]);
    assert_eq!(vec![10, 10, 10, 20, 20, 20], rgb);
}
