/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::*;

/// Decoded samples of a single component at its own (possibly subsampled) resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentPlane {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

/// for one output coordinate, the two source coordinates and the weight of the second one
#[derive(Debug, Clone, Copy)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f32,
}

/// Maps each output coordinate to the input grid with centers aligned, that is
/// `src = (o + 0.5) * in / out - 0.5`, clamping neighbours at the edges.
fn compute_taps(input: u32, output: u32) -> Vec<Tap> {
    let scale = input as f32 / output as f32;
    let last = input as usize - 1;

    (0..output)
        .map(|o| {
            let src = ((o as f32 + 0.5) * scale - 0.5).max(0.0);
            let i0 = (src.floor() as usize).min(last);
            Tap {
                i0,
                i1: (i0 + 1).min(last),
                frac: src - i0 as f32,
            }
        })
        .collect()
}

impl ComponentPlane {
    pub fn new(width: u32, height: u32) -> Self {
        ComponentPlane {
            width,
            height,
            samples: vec![0; width as usize * height as usize],
        }
    }

    pub fn get_width(&self) -> u32 {
        self.width
    }

    pub fn get_height(&self) -> u32 {
        self.height
    }

    pub fn get_samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    #[cfg(test)]
    pub fn get_sample(&self, x: u32, y: u32) -> u8 {
        self.samples[y as usize * self.width as usize + x as usize]
    }

    /// Stores an 8x8 block of samples with its top left corner at block coordinates
    /// (`bx`, `by`). The block has to lie within the plane.
    pub fn write_block(&mut self, bx: u32, by: u32, block: &[u8; 64]) {
        let x = bx as usize * BLOCK_DIM;
        let y = by as usize * BLOCK_DIM;
        let stride = self.width as usize;

        for (row, src) in block.chunks_exact(BLOCK_DIM).enumerate() {
            let start = (y + row) * stride + x;
            self.samples[start..start + BLOCK_DIM].copy_from_slice(src);
        }
    }

    /// Resamples the plane to `width` x `height` with bilinear interpolation. Returns
    /// the plane itself if it already has that size.
    pub fn upsample(self, width: u32, height: u32) -> ComponentPlane {
        if self.width == width && self.height == height {
            return self;
        }

        let x_taps = compute_taps(self.width, width);
        let y_taps = compute_taps(self.height, height);

        let stride = self.width as usize;
        let mut samples = Vec::with_capacity(width as usize * height as usize);

        for ty in &y_taps {
            let row0 = &self.samples[ty.i0 * stride..(ty.i0 + 1) * stride];
            let row1 = &self.samples[ty.i1 * stride..(ty.i1 + 1) * stride];

            for tx in &x_taps {
                let top = lerp(f32::from(row0[tx.i0]), f32::from(row0[tx.i1]), tx.frac);
                let bottom = lerp(f32::from(row1[tx.i0]), f32::from(row1[tx.i1]), tx.frac);

                samples.push(lerp(top, bottom, ty.frac).round().clamp(0.0, 255.0) as u8);
            }
        }

        ComponentPlane {
            width,
            height,
            samples,
        }
    }
}

#[inline(always)]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[test]
fn test_write_block() {
    let mut plane = ComponentPlane::new(16, 16);

    let mut block = [0u8; 64];
    for (i, b) in block.iter_mut().enumerate() {
        *b = i as u8;
    }

    plane.write_block(1, 1, &block);

    assert_eq!(0, plane.get_sample(7, 7));
    assert_eq!(0, plane.get_sample(8, 8));
    assert_eq!(7, plane.get_sample(15, 8));
    assert_eq!(8, plane.get_sample(8, 9));
    assert_eq!(63, plane.get_sample(15, 15));
}

#[test]
fn test_upsample_constant_and_identity() {
    let mut plane = ComponentPlane::new(8, 8);
    plane.write_block(0, 0, &[77; 64]);

    let same = plane.clone().upsample(8, 8);
    assert_eq!(plane, same);

    let up = plane.clone().upsample(16, 8);
    assert_eq!(16, up.get_width());
    assert!(up.get_samples().iter().all(|&s| s == 77));

    // 2:1 in both directions
    let up = plane.upsample(16, 16);
    assert_eq!((16, 16), (up.get_width(), up.get_height()));
    assert_eq!(256, up.get_samples().len());
    assert!(up.get_samples().iter().all(|&s| s == 77));
}

#[test]
fn test_upsample_doubles_with_centers_aligned() {
    // 2x1 plane of 0 and 100, stretched to 4x1
    let plane = ComponentPlane {
        width: 2,
        height: 1,
        samples: vec![0, 100],
    };

    let up = plane.upsample(4, 1);

    // sources at -0.25 (clamped to 0), 0.25, 0.75, 1.25 (clamped neighbour)
    assert_eq!(&[0, 25, 75, 100], up.get_samples());
}

#[test]
fn test_upsample_vertical() {
    let plane = ComponentPlane {
        width: 1,
        height: 2,
        samples: vec![200, 40],
    };

    let up = plane.upsample(2, 4);
    assert_eq!(&[200, 200, 160, 160, 80, 80, 40, 40], up.get_samples());
}
