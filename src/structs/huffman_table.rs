/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use log::trace;

use crate::consts::MAX_HUFFMAN_CODE_LEN;
use crate::jpeg_error::{err_exit_code, ExitCode, Result};

use super::bit_reader::BitReader;

/// Canonical huffman decoding table as defined by a DHT segment.
///
/// Instead of a tree, the table keeps for every code length the first code of that
/// length and where its symbols start in the symbol list. Since canonical codes of the
/// same length are consecutive, a code of length `l` is valid if it falls in
/// `[min_code[l], min_code[l] + num_codes[l])`.
#[derive(Clone, Debug)]
pub struct HuffmanTable {
    /// code value for each symbol (only valid if c_len is non-zero)
    c_val: [u16; 256],

    /// code length for each symbol, zero if the symbol isn't in the table
    c_len: [u8; 256],

    /// first code of each length, indexed by length (index 0 unused)
    min_code: [u32; MAX_HUFFMAN_CODE_LEN + 1],

    /// number of codes of each length
    num_codes: [u16; MAX_HUFFMAN_CODE_LEN + 1],

    /// index into `symbols` of the first symbol of each length
    val_offset: [u16; MAX_HUFFMAN_CODE_LEN + 1],

    /// symbols in order of increasing code length
    symbols: Vec<u8>,
}

impl HuffmanTable {
    /// Constructs the table from the format encoded by JPEG: the number of codes for
    /// each bit length 1..16, followed by the symbols for those codes ordered by code length.
    pub fn construct_from_counts(counts: &[u8; 16], symbols: &[u8]) -> Result<Self> {
        let total: usize = counts.iter().map(|&c| usize::from(c)).sum();

        if total > 256 {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!("huffman table defines {0} codes, at most 256 allowed", total),
            );
        }

        if symbols.len() < total {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!(
                    "huffman table needs {0} symbols but only {1} were provided",
                    total,
                    symbols.len()
                ),
            );
        }

        let mut ht = HuffmanTable {
            c_val: [0; 256],
            c_len: [0; 256],
            min_code: [0; MAX_HUFFMAN_CODE_LEN + 1],
            num_codes: [0; MAX_HUFFMAN_CODE_LEN + 1],
            val_offset: [0; MAX_HUFFMAN_CODE_LEN + 1],
            symbols: symbols[..total].to_vec(),
        };

        let mut code: u32 = 0;
        let mut k = 0;

        for i in 0..MAX_HUFFMAN_CODE_LEN {
            let len = i + 1;

            ht.min_code[len] = code;
            ht.num_codes[len] = u16::from(counts[i]);
            ht.val_offset[len] = k as u16;

            for _ in 0..counts[i] {
                if code >= (1u32 << len) {
                    return err_exit_code(
                        ExitCode::MalformedContainer,
                        "invalid huffman code layout, too many codes for a given length",
                    );
                }

                let symbol = usize::from(ht.symbols[k]);
                ht.c_val[symbol] = code as u16;
                ht.c_len[symbol] = len as u8;

                k += 1;
                code += 1;
            }

            code <<= 1;
        }

        if log::log_enabled!(log::Level::Trace) {
            for &s in &ht.symbols {
                let (val, len) = (ht.c_val[usize::from(s)], ht.c_len[usize::from(s)]);
                trace!(
                    "symbol {0:02X}: {1:0width$b}",
                    s,
                    val,
                    width = usize::from(len)
                );
            }
        }

        Ok(ht)
    }

    /// returns the (code, length) assigned to a symbol, or None if the symbol isn't coded
    pub fn get_code(&self, symbol: u8) -> Option<(u16, u8)> {
        let len = self.c_len[usize::from(symbol)];
        if len == 0 {
            None
        } else {
            Some((self.c_val[usize::from(symbol)], len))
        }
    }

    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Decodes the next symbol by peeking at one more bit at a time until the bits seen so
    /// far form a code of exactly that length.
    #[inline(always)]
    pub fn decode(&self, bit_reader: &mut BitReader) -> Result<u8> {
        for len in 1..=MAX_HUFFMAN_CODE_LEN {
            let code = u32::from(bit_reader.show_bits(len as u32)?);
            let count = u32::from(self.num_codes[len]);
            let min = self.min_code[len];

            if code >= min && code - min < count {
                bit_reader.skip_bits(len)?;
                let index = usize::from(self.val_offset[len]) + (code - min) as usize;
                return Ok(self.symbols[index]);
            }
        }

        self.invalid_code(bit_reader)
    }

    #[cold]
    fn invalid_code(&self, bit_reader: &BitReader) -> Result<u8> {
        err_exit_code(
            ExitCode::InvalidHuffmanCode,
            format!(
                "no huffman code matched within {0} bits at bit offset {1}",
                MAX_HUFFMAN_CODE_LEN,
                bit_reader.get_position()
            ),
        )
    }
}
