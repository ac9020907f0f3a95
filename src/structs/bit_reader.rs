/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::MAX_HUFFMAN_CODE_LEN;
use crate::jpeg_error::{err_exit_code, ExitCode, Result};

/// MSB-first bit reader over a borrowed in-memory buffer.
///
/// The same reader is used for walking the marker segments of the container (where
/// everything is byte aligned) and for the entropy coded data of a scan, in which case
/// it operates on a buffer that has already had the 0xff byte stuffing removed.
pub struct BitReader<'a> {
    buffer: &'a [u8],
    index: usize,
    bits_size: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        BitReader {
            buffer,
            index: 0,
            bits_size: buffer.len() * 8,
        }
    }

    /// current position in bits from the start of the buffer
    pub fn get_position(&self) -> usize {
        self.index
    }

    /// current position in bytes, only meaningful if we are byte aligned
    pub fn get_byte_position(&self) -> usize {
        self.index >> 3
    }

    pub fn bits_left(&self) -> usize {
        self.bits_size - self.index
    }

    pub fn is_byte_aligned(&self) -> bool {
        (self.index & 7) == 0
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.bits_size
    }

    #[cold]
    fn truncated<T>(&self, bits: u32) -> Result<T> {
        err_exit_code(
            ExitCode::TruncatedStream,
            format!(
                "tried to read {0} bits at bit offset {1}, but only {2} bits are available",
                bits, self.index, self.bits_size
            ),
        )
    }

    /// returns the next `bits_to_read` bits (1 to 16) without advancing
    #[inline(always)]
    pub fn show_bits(&self, bits_to_read: u32) -> Result<u16> {
        debug_assert!(bits_to_read >= 1 && bits_to_read as usize <= MAX_HUFFMAN_CODE_LEN);

        if self.index + bits_to_read as usize > self.bits_size {
            return self.truncated(bits_to_read);
        }

        // at most 3 bytes can be touched by a 16 bit read at any bit offset
        let byte = self.index >> 3;
        let mut window = 0u32;
        for i in 0..3 {
            window <<= 8;
            if let Some(b) = self.buffer.get(byte + i) {
                window |= u32::from(*b);
            }
        }

        let offset = (self.index & 7) as u32;
        let value = (window >> (24 - offset - bits_to_read)) & ((1u32 << bits_to_read) - 1);

        Ok(value as u16)
    }

    /// returns the next `bits_to_read` bits (1 to 16) and advances past them
    #[inline(always)]
    pub fn read_bits(&mut self, bits_to_read: u32) -> Result<u16> {
        let value = self.show_bits(bits_to_read)?;
        self.index += bits_to_read as usize;
        Ok(value)
    }

    pub fn skip_bits(&mut self, bits: usize) -> Result<()> {
        if self.index + bits > self.bits_size {
            return self.truncated(bits as u32);
        }

        self.index += bits;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bits(16)
    }

    /// copies `dst.len()` raw bytes from the current (byte aligned) position
    pub fn copy_raw_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        let src = self.read_raw_bytes(dst.len())?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// returns a slice of the next `size` raw bytes and advances past them
    pub fn read_raw_bytes(&mut self, size: usize) -> Result<&'a [u8]> {
        if !self.is_byte_aligned() {
            return err_exit_code(
                ExitCode::GeneralFailure,
                format!("raw byte access at unaligned bit offset {0}", self.index),
            );
        }

        let start = self.get_byte_position();
        if start + size > self.buffer.len() {
            return self.truncated((size * 8) as u32);
        }

        self.index += size * 8;
        Ok(&self.buffer[start..start + size])
    }

    /// Scans forward from the current (byte aligned) position for the next marker, which
    /// is a 0xff followed by anything other than a zero stuffing byte. Returns the bit
    /// position of the 0xff, or the end of the buffer if there is no further marker.
    ///
    /// The reader itself doesn't move.
    pub fn find_next_marker(&self) -> Result<usize> {
        if !self.is_byte_aligned() {
            return err_exit_code(
                ExitCode::GeneralFailure,
                format!("marker search at unaligned bit offset {0}", self.index),
            );
        }

        let start = self.get_byte_position();
        let pos = self.buffer[start..]
            .windows(2)
            .position(|w| w[0] == 0xff && w[1] != 0x00)
            .map_or(self.buffer.len(), |p| start + p);

        Ok(pos * 8)
    }
}

/// Removes the byte stuffing from entropy coded data: every 0xff 0x00 pair becomes a
/// single 0xff. Returns the compacted data and the number of stuffing bytes removed.
pub fn remove_byte_stuffing(data: &[u8]) -> (Vec<u8>, usize) {
    let mut output = Vec::with_capacity(data.len());
    let mut removed = 0;

    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        output.push(b);

        if b == 0xff && data.get(i + 1) == Some(&0x00) {
            removed += 1;
            i += 1;
        }

        i += 1;
    }

    (output, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_across_byte_boundary() {
        let arr = [0xab, 0xcd, 0xef];

        let mut b = BitReader::new(&arr);
        b.skip_bits(4).unwrap();

        // 12 bits starting at bit offset 4
        assert_eq!(0xbcd, b.show_bits(12).unwrap());
        assert_eq!(4, b.get_position());
        assert_eq!(0xbcd, b.read_bits(12).unwrap());
        assert_eq!(16, b.get_position());
        assert!(b.is_byte_aligned());

        assert_eq!(0xe, b.read_bits(4).unwrap());
        assert_eq!(0xf, b.read_bits(4).unwrap());
        assert!(b.is_eof());
    }

    #[test]
    fn read_all_widths() {
        let arr = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc];
        let all = 0x123456789abcu64;

        for offset in 0..8 {
            for n in 1..=16u32 {
                let mut b = BitReader::new(&arr);
                b.skip_bits(offset).unwrap();

                let expected = (all >> (48 - offset as u32 - n)) & ((1 << n) - 1);
                assert_eq!(
                    expected as u16,
                    b.read_bits(n).unwrap(),
                    "offset {0} width {1}",
                    offset,
                    n
                );
            }
        }
    }

    #[test]
    fn read_past_end_is_truncated() {
        let arr = [0xff, 0x01];

        let mut b = BitReader::new(&arr);
        assert_eq!(0x7f, b.read_bits(7).unwrap());

        let e = b.read_bits(10).unwrap_err();
        assert_eq!(e.exit_code(), ExitCode::TruncatedStream);

        // failed reads don't move the reader
        assert_eq!(7, b.get_position());
        assert_eq!(0x101, b.read_bits(9).unwrap());

        assert_eq!(
            b.skip_bits(1).unwrap_err().exit_code(),
            ExitCode::TruncatedStream
        );
    }

    #[test]
    fn copy_raw_bytes_requires_alignment() {
        let arr = [1, 2, 3, 4];

        let mut b = BitReader::new(&arr);
        b.skip_bits(8).unwrap();

        let mut dst = [0u8; 2];
        b.copy_raw_bytes(&mut dst).unwrap();
        assert_eq!([2, 3], dst);
        assert_eq!(24, b.get_position());

        b.skip_bits(3).unwrap();
        assert!(b.copy_raw_bytes(&mut dst[..1]).is_err());

        let mut b = BitReader::new(&arr);
        let mut too_big = [0u8; 5];
        assert_eq!(
            b.copy_raw_bytes(&mut too_big).unwrap_err().exit_code(),
            ExitCode::TruncatedStream
        );
    }

    #[test]
    fn find_marker_skips_stuffed_bytes() {
        let arr = [0x12, 0xff, 0x00, 0x34, 0xff, 0xd9];

        let b = BitReader::new(&arr);
        assert_eq!(4 * 8, b.find_next_marker().unwrap());

        // no marker at all returns the end of the buffer
        let arr = [0x12, 0xff, 0x00, 0x34];
        let b = BitReader::new(&arr);
        assert_eq!(4 * 8, b.find_next_marker().unwrap());

        // a trailing 0xff without a following byte is not a marker
        let arr = [0x12, 0xff];
        let b = BitReader::new(&arr);
        assert_eq!(2 * 8, b.find_next_marker().unwrap());
    }

    #[test]
    fn stuffing_removal() {
        let (data, removed) = remove_byte_stuffing(&[0x12, 0xff, 0x00, 0xff, 0x00, 0x34, 0xff]);
        assert_eq!(vec![0x12, 0xff, 0xff, 0x34, 0xff], data);
        assert_eq!(2, removed);

        // 0xff 0x00 0x00 only collapses the first pair
        let (data, removed) = remove_byte_stuffing(&[0xff, 0x00, 0x00]);
        assert_eq!(vec![0xff, 0x00], data);
        assert_eq!(1, removed);
    }
}
