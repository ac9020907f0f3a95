/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

//! Minimal baseline JPEG encoder used to generate test and benchmark inputs.

#![allow(dead_code)]

/// standard tables from Annex K of ITU-T T.81
pub const DC_LUM_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
pub const DC_LUM_VALS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

pub const DC_CHROM_BITS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
pub const DC_CHROM_VALS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

pub const AC_LUM_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 125];
pub const AC_LUM_VALS: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

pub const AC_CHROM_BITS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 119];
pub const AC_CHROM_VALS: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// for each coefficient in zigzag order, its raster (row-major) position
pub const ZIGZAG_TO_RASTER: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// MSB-first bit writer that escapes every 0xff byte it emits with a 0x00
pub struct BitWriter {
    data_buffer: Vec<u8>,
    fill_register: u32,
    num_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        BitWriter {
            data_buffer: Vec::new(),
            fill_register: 0,
            num_bits: 0,
        }
    }

    pub fn write(&mut self, val: u32, new_bits: u32) {
        debug_assert!(new_bits <= 16);
        debug_assert!(val < (1 << new_bits) || new_bits == 0);

        self.fill_register = (self.fill_register << new_bits) | val;
        self.num_bits += new_bits;

        while self.num_bits >= 8 {
            let b = (self.fill_register >> (self.num_bits - 8)) as u8;
            self.data_buffer.push(b);
            if b == 0xff {
                self.data_buffer.push(0);
            }
            self.num_bits -= 8;
        }

        self.fill_register &= (1 << self.num_bits) - 1;
    }

    /// pads the last byte with one bits
    pub fn pad(&mut self) {
        let remainder = (8 - self.num_bits % 8) % 8;
        self.write((1 << remainder) - 1, remainder);
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.pad();
        self.data_buffer
    }
}

/// canonical code for every symbol of a table, as (code, length)
pub struct HuffmanEncoder {
    codes: [(u16, u8); 256],
}

impl HuffmanEncoder {
    pub fn new(bits: &[u8; 16], vals: &[u8]) -> Self {
        let mut codes = [(0u16, 0u8); 256];
        let mut code = 0u16;
        let mut k = 0;

        for (i, &count) in bits.iter().enumerate() {
            for _ in 0..count {
                codes[usize::from(vals[k])] = (code, i as u8 + 1);
                code += 1;
                k += 1;
            }
            code <<= 1;
        }

        HuffmanEncoder { codes }
    }

    pub fn emit(&self, writer: &mut BitWriter, symbol: u8) {
        let (code, len) = self.codes[usize::from(symbol)];
        assert!(len > 0, "symbol {0:02X} has no code", symbol);
        writer.write(u32::from(code), u32::from(len));
    }
}

/// magnitude category and the bits that are written for a coefficient
fn category(v: i32) -> (u8, u32) {
    let s = 32 - v.unsigned_abs().leading_zeros();
    let bits = if v < 0 { v - 1 } else { v };
    (s as u8, (bits as u32) & ((1u32 << s) - 1))
}

/// forward DCT of a raster order block of samples, rounded and quantized with a raster
/// order table
pub fn forward_dct(samples: &[u8; 64], q: &[u16; 64]) -> [i32; 64] {
    let c = |u: usize| {
        if u == 0 {
            std::f64::consts::FRAC_1_SQRT_2
        } else {
            1.0
        }
    };

    let mut out = [0i32; 64];
    for v in 0..8 {
        for u in 0..8 {
            let mut sum = 0f64;
            for y in 0..8 {
                for x in 0..8 {
                    sum += (f64::from(samples[y * 8 + x]) - 128.0)
                        * (((2 * x + 1) * u) as f64 * std::f64::consts::PI / 16.0).cos()
                        * (((2 * y + 1) * v) as f64 * std::f64::consts::PI / 16.0).cos();
                }
            }
            let f = 0.25 * c(u) * c(v) * sum;
            out[v * 8 + u] = (f / f64::from(q[v * 8 + u])).round() as i32;
        }
    }
    out
}

/// Huffman codes a block of quantized raster order coefficients
pub fn encode_block(
    writer: &mut BitWriter,
    block: &[i32; 64],
    last_dc: &mut i32,
    dc: &HuffmanEncoder,
    ac: &HuffmanEncoder,
) {
    let diff = block[0] - *last_dc;
    *last_dc = block[0];

    let (s, bits) = category(diff);
    dc.emit(writer, s);
    writer.write(bits, u32::from(s));

    let mut run = 0;
    for z in 1..64 {
        let v = block[ZIGZAG_TO_RASTER[z]];
        if v == 0 {
            run += 1;
            continue;
        }

        while run > 15 {
            ac.emit(writer, 0xf0);
            run -= 16;
        }

        let (s, bits) = category(v);
        ac.emit(writer, (run << 4) | s);
        writer.write(bits, u32::from(s));
        run = 0;
    }

    if run > 0 {
        ac.emit(writer, 0x00);
    }
}

/// One component of an image to encode, with its samples at the component's own resolution
pub struct ComponentSpec {
    pub sfh: u8,
    pub sfv: u8,
    /// raster order quantization factors
    pub q_table: [u16; 64],
    pub samples: Vec<u8>,
}

impl ComponentSpec {
    pub fn new(sfh: u8, sfv: u8, q: u16, samples: Vec<u8>) -> Self {
        ComponentSpec {
            sfh,
            sfv,
            q_table: [q; 64],
            samples,
        }
    }
}

fn segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.extend_from_slice(&[0xff, marker]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
}

fn dht_payload(class_id: u8, bits: &[u8; 16], vals: &[u8]) -> Vec<u8> {
    let mut p = vec![class_id];
    p.extend_from_slice(bits);
    p.extend_from_slice(vals);
    p
}

/// Encodes a baseline JPEG of one (grayscale) or three (YCbCr) components. Component
/// zero uses the luminance tables, the others the chrominance tables.
pub fn encode_jpeg(width: u32, height: u32, components: &[ComponentSpec]) -> Vec<u8> {
    let sfhm = components.iter().map(|c| u32::from(c.sfh)).max().unwrap();
    let sfvm = components.iter().map(|c| u32::from(c.sfv)).max().unwrap();

    let mut out = vec![0xff, 0xd8];

    segment(&mut out, 0xe0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
    segment(&mut out, 0xfe, b"generated for testing");

    for (i, c) in components.iter().enumerate() {
        let wide = c.q_table.iter().any(|&q| q > 255);
        let mut p = vec![((wide as u8) << 4) | i as u8];
        for z in 0..64 {
            let q = c.q_table[ZIGZAG_TO_RASTER[z]];
            if wide {
                p.extend_from_slice(&q.to_be_bytes());
            } else {
                p.push(q as u8);
            }
        }
        segment(&mut out, 0xdb, &p);
    }

    let mut sof = vec![8];
    sof.extend_from_slice(&(height as u16).to_be_bytes());
    sof.extend_from_slice(&(width as u16).to_be_bytes());
    sof.push(components.len() as u8);
    for (i, c) in components.iter().enumerate() {
        sof.extend_from_slice(&[i as u8 + 1, (c.sfh << 4) | c.sfv, i as u8]);
    }
    segment(&mut out, 0xc0, &sof);

    segment(&mut out, 0xc4, &dht_payload(0x00, &DC_LUM_BITS, &DC_LUM_VALS));
    segment(&mut out, 0xc4, &dht_payload(0x10, &AC_LUM_BITS, &AC_LUM_VALS));
    if components.len() > 1 {
        segment(&mut out, 0xc4, &dht_payload(0x01, &DC_CHROM_BITS, &DC_CHROM_VALS));
        segment(&mut out, 0xc4, &dht_payload(0x11, &AC_CHROM_BITS, &AC_CHROM_VALS));
    }

    let mut sos = vec![components.len() as u8];
    for i in 0..components.len() {
        let t = if i == 0 { 0x00 } else { 0x11 };
        sos.extend_from_slice(&[i as u8 + 1, t]);
    }
    sos.extend_from_slice(&[0, 63, 0]);
    segment(&mut out, 0xda, &sos);

    let tables = [
        (
            HuffmanEncoder::new(&DC_LUM_BITS, &DC_LUM_VALS),
            HuffmanEncoder::new(&AC_LUM_BITS, &AC_LUM_VALS),
        ),
        (
            HuffmanEncoder::new(&DC_CHROM_BITS, &DC_CHROM_VALS),
            HuffmanEncoder::new(&AC_CHROM_BITS, &AC_CHROM_VALS),
        ),
    ];

    let mut writer = BitWriter::new();
    let mut last_dc = vec![0i32; components.len()];

    let mcuh = width / (8 * sfhm);
    let mcuv = height / (8 * sfvm);

    for mcu_y in 0..mcuv {
        for mcu_x in 0..mcuh {
            for (i, c) in components.iter().enumerate() {
                let plane_width = (width * u32::from(c.sfh) / sfhm) as usize;
                let (dc, ac) = &tables[if i == 0 { 0 } else { 1 }];

                for by in 0..u32::from(c.sfv) {
                    for bx in 0..u32::from(c.sfh) {
                        let x0 = ((mcu_x * u32::from(c.sfh) + bx) * 8) as usize;
                        let y0 = ((mcu_y * u32::from(c.sfv) + by) * 8) as usize;

                        let mut samples = [0u8; 64];
                        for y in 0..8 {
                            for x in 0..8 {
                                samples[y * 8 + x] = c.samples[(y0 + y) * plane_width + x0 + x];
                            }
                        }

                        let block = forward_dct(&samples, &c.q_table);
                        encode_block(&mut writer, &block, &mut last_dc[i], dc, ac);
                    }
                }
            }
        }
    }

    out.extend_from_slice(&writer.finish());
    out.extend_from_slice(&[0xff, 0xd9]);
    out
}

/// fills a plane from a function of the coordinates
pub fn make_plane(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Vec<u8> {
    let mut v = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            v.push(f(x, y));
        }
    }
    v
}

/// JFIF YCbCr to RGB without any rounding, used to compute expected colors
pub fn ycbcr_to_rgb_exact(y: u8, cb: u8, cr: u8) -> [f64; 3] {
    let y = f64::from(y);
    let cb = f64::from(cb) - 128.0;
    let cr = f64::from(cr) - 128.0;
    [
        y + 1.402 * cr,
        y - 0.344136 * cb - 0.714136 * cr,
        y + 1.772 * cb,
    ]
}

/// counts the 0xff 0x00 pairs in a buffer
pub fn count_stuffed_bytes(data: &[u8]) -> usize {
    data.windows(2).filter(|w| w[0] == 0xff && w[1] == 0).count()
}
