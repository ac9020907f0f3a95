/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

/// width and height of a DCT block
pub const BLOCK_DIM: usize = 8;

/// number of coefficients (or samples) in a DCT block
pub const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;

/// maximum length of a huffman code in bits
pub const MAX_HUFFMAN_CODE_LEN: usize = 16;

/// largest magnitude category a DC difference can have for 8 bit samples
pub const MAX_DC_CATEGORY: u8 = 11;

/// largest magnitude category an AC coefficient can have for 8 bit samples
pub const MAX_AC_CATEGORY: u8 = 10;

/// maximum number of quantization and huffman tables of each kind
pub const MAX_TABLES: usize = 4;

/// maximum sampling factor a component can declare
pub const MAX_SAMPLING_FACTOR: u8 = 4;

/// level shift applied to IDCT output samples
pub const SAMPLE_BIAS: i32 = 128;

/// for each raster (row-major) position, the index of the coefficient in zigzag order
pub const RASTER_TO_ZIGZAG: [u8; 64] = [
    0, 1, 5, 6, 14, 15, 27, 28, 2, 4, 7, 13, 16, 26, 29, 42, 3, 8, 12, 17, 25, 30, 41, 43, 9, 11,
    18, 24, 31, 40, 44, 53, 10, 19, 23, 32, 39, 45, 52, 54, 20, 22, 33, 38, 46, 51, 55, 60, 21, 34,
    37, 47, 50, 56, 59, 61, 35, 36, 48, 49, 57, 58, 62, 63,
];

/// for each coefficient in zigzag order, its raster (row-major) position
pub const ZIGZAG_TO_RASTER: [u8; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

pub const SOI: [u8; 2] = [0xFF, crate::jpeg_code::SOI]; // SOI segment
#[cfg(test)]
pub const EOI: [u8; 2] = [0xFF, crate::jpeg_code::EOI]; // EOI segment

#[cfg(test)]
mod tests {
    use super::*;

    use crate::helpers::get_rand_from_seed;
    use rand::Rng;

    #[test]
    fn zigzag_tables_are_inverse() {
        for i in 0..64 {
            assert_eq!(RASTER_TO_ZIGZAG[usize::from(ZIGZAG_TO_RASTER[i])] as usize, i);
            assert_eq!(ZIGZAG_TO_RASTER[usize::from(RASTER_TO_ZIGZAG[i])] as usize, i);
        }
    }

    #[test]
    fn zigzag_round_trip_is_identity() {
        let mut rng = get_rand_from_seed([7u8; 32]);

        for _ in 0..16 {
            let mut original = [0i32; 64];
            rng.fill(&mut original[..]);

            // serialize in zigzag order, then put everything back at its raster position
            let zigzag: Vec<i32> = ZIGZAG_TO_RASTER
                .iter()
                .map(|&r| original[usize::from(r)])
                .collect();

            let mut restored = [0i32; 64];
            for (z, v) in zigzag.iter().enumerate() {
                restored[usize::from(ZIGZAG_TO_RASTER[z])] = *v;
            }

            assert_eq!(original, restored);
        }
    }

    #[test]
    fn zigzag_walks_the_anti_diagonals() {
        // the anti-diagonal index (row + column) never decreases and grows by at most one
        let mut last = 0;
        for &r in ZIGZAG_TO_RASTER.iter() {
            let d = usize::from(r) / 8 + usize::from(r) % 8;
            assert!(d == last || d == last + 1);
            last = d;
        }
        assert_eq!(last, 14);
    }
}
