/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::*;

/// Quantization factors of one DQT table, stored in raster (row-major) order.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantizationTable {
    quantization_table: [u16; 64],
}

impl QuantizationTable {
    /// builds the table from the 64 entries in the zigzag order they are stored in the file
    pub fn new_from_zigzag(zigzag: &[u16; 64]) -> Self {
        let mut retval = QuantizationTable {
            quantization_table: [0; 64],
        };

        for coord in 0..64 {
            retval.quantization_table[coord] = zigzag[usize::from(RASTER_TO_ZIGZAG[coord])];
        }

        retval
    }

    pub fn get_quantization_table(&self) -> &[u16; 64] {
        &self.quantization_table
    }

    /// multiplies each raster order coefficient with its quantization factor
    #[inline(always)]
    pub fn dequantize(&self, block: &[i16; 64]) -> [i32; 64] {
        let mut out = [0i32; 64];
        for i in 0..64 {
            out[i] = i32::from(block[i]) * i32::from(self.quantization_table[i]);
        }
        out
    }
}

#[test]
fn test_dezigzag() {
    let mut zigzag = [0u16; 64];
    for i in 0..64 {
        zigzag[i] = i as u16 + 1;
    }

    let q = QuantizationTable::new_from_zigzag(&zigzag);
    let t = q.get_quantization_table();

    // first row starts 0, 1, 5, 6 in zigzag order
    assert_eq!(&t[0..4], &[1, 2, 6, 7]);

    // first column starts 0, 2, 3, 9 in zigzag order
    assert_eq!([t[0], t[8], t[16], t[24]], [1, 3, 4, 10]);

    assert_eq!(t[63], 64);
}

#[test]
fn test_dequantize() {
    let mut zigzag = [1u16; 64];
    zigzag[0] = 16;
    zigzag[1] = 3; // raster position 1
    zigzag[2] = 5; // raster position 8

    let q = QuantizationTable::new_from_zigzag(&zigzag);

    let mut block = [0i16; 64];
    block[0] = -2;
    block[1] = 7;
    block[8] = -1;
    block[63] = 9;

    let d = q.dequantize(&block);
    assert_eq!(d[0], -32);
    assert_eq!(d[1], 21);
    assert_eq!(d[8], -5);
    assert_eq!(d[63], 9);
    assert_eq!(d[2], 0);
}
