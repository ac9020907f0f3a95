/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use bytemuck::cast;
use wide::f32x8;

use crate::consts::*;
use crate::helpers::clamp_to_u8;

/// Separable floating point 8x8 inverse DCT.
///
/// `basis[u]` holds `C(u) * cos((2x+1)uπ/16)` for x = 0..8 in one vector, where
/// `C(0) = 1/√2` and `C(u) = 1` otherwise. The row pass accumulates whole output rows as
/// vectors, the column pass then mixes those rows with scalar weights, so no transpose is needed.
pub struct IdctTable {
    basis: [f32x8; 8],
    weights: [[f32; 8]; 8],
}

impl IdctTable {
    /// computes the cosine table, done once per image
    pub fn new() -> Self {
        let mut weights = [[0f32; 8]; 8];

        for u in 0..BLOCK_DIM {
            let cu = if u == 0 {
                std::f64::consts::FRAC_1_SQRT_2
            } else {
                1.0
            };

            for x in 0..BLOCK_DIM {
                let angle = ((2 * x + 1) * u) as f64 * std::f64::consts::PI / 16.0;
                weights[u][x] = (cu * angle.cos()) as f32;
            }
        }

        IdctTable {
            basis: weights.map(f32x8::from),
            weights,
        }
    }

    /// Transforms a dequantized raster order block back into samples, rounding to the
    /// nearest integer, adding the level shift and clamping to 0..=255.
    #[inline(always)]
    pub fn run_idct(&self, block: &[i32; 64]) -> [u8; 64] {
        // horizontal pass: tmp[v] = Σu F[v][u] * basis[u]
        let mut tmp = [f32x8::ZERO; 8];
        for v in 0..BLOCK_DIM {
            let row = &block[v * BLOCK_DIM..(v + 1) * BLOCK_DIM];
            let mut acc = f32x8::ZERO;
            for u in 0..BLOCK_DIM {
                if row[u] != 0 {
                    acc += f32x8::splat(row[u] as f32) * self.basis[u];
                }
            }
            tmp[v] = acc;
        }

        // vertical pass: out[y] = Σv (C(v) cos((2y+1)vπ/16) / 4) * tmp[v]
        let mut out = [f32x8::ZERO; 8];
        for y in 0..BLOCK_DIM {
            let mut acc = f32x8::ZERO;
            for v in 0..BLOCK_DIM {
                acc += f32x8::splat(self.weights[v][y] * 0.25) * tmp[v];
            }
            out[y] = acc;
        }

        let samples: [f32; 64] = cast(out);

        let mut retval = [0u8; 64];
        for i in 0..BLOCK_SIZE {
            retval[i] = clamp_to_u8(samples[i].round() as i32 + SAMPLE_BIAS);
        }
        retval
    }
}

impl Default for IdctTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
fn test_idct(block: &[i32; 64]) {
    // direct evaluation of the 2D formula in double precision
    fn reference(block: &[i32; 64]) -> [u8; 64] {
        let c = |u: usize| {
            if u == 0 {
                std::f64::consts::FRAC_1_SQRT_2
            } else {
                1.0
            }
        };

        let mut out = [0u8; 64];
        for y in 0..8 {
            for x in 0..8 {
                let mut sum = 0f64;
                for v in 0..8 {
                    for u in 0..8 {
                        sum += c(u)
                            * c(v)
                            * f64::from(block[v * 8 + u])
                            * (((2 * x + 1) * u) as f64 * std::f64::consts::PI / 16.0).cos()
                            * (((2 * y + 1) * v) as f64 * std::f64::consts::PI / 16.0).cos();
                    }
                }
                out[y * 8 + x] = clamp_to_u8((sum / 4.0).round() as i32 + 128);
            }
        }
        out
    }

    let table = IdctTable::new();
    let output = table.run_idct(block);
    let expected = reference(block);

    for i in 0..64 {
        // single precision may land on the other side of a .5
        assert!(
            (i32::from(output[i]) - i32::from(expected[i])).abs() <= 1,
            "sample {0}: {1} vs {2}",
            i,
            output[i],
            expected[i]
        );
    }
}

#[test]
fn test_idct_dc_only() {
    let table = IdctTable::new();

    let mut block = [0i32; 64];
    block[0] = 80;
    assert_eq!([138u8; 64], table.run_idct(&block));

    block[0] = -80;
    assert_eq!([118u8; 64], table.run_idct(&block));

    // saturates on both ends
    block[0] = 2000;
    assert_eq!([255u8; 64], table.run_idct(&block));
    block[0] = -2000;
    assert_eq!([0u8; 64], table.run_idct(&block));

    block[0] = 0;
    assert_eq!([128u8; 64], table.run_idct(&block));
}

#[test]
fn test_idct_single_frequencies() {
    for i in 0..64 {
        let mut block = [0i32; 64];
        block[i] = 120;
        test_idct(&block);

        block[i] = -77;
        test_idct(&block);
    }
}

#[test]
fn test_idct_with_random_blocks() {
    use crate::helpers::get_rand_from_seed;
    use rand::Rng;

    let mut rng = get_rand_from_seed([3u8; 32]);

    for _ in 0..64 {
        let mut block = [0i32; 64];
        block[0] = rng.gen_range(-1024..1024);
        for c in block.iter_mut().skip(1) {
            // mostly small coefficients like real images have
            *c = if rng.gen_range(0..4) == 0 {
                rng.gen_range(-200..200)
            } else {
                0
            };
        }
        test_idct(&block);
    }
}
