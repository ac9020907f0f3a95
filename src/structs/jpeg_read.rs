/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

#[cfg(feature = "detailed_tracing")]
use log::info;

use log::debug;

use crate::consts::*;
use crate::helpers::*;
use crate::jpeg_error::{err_exit_code, AddContext, ExitCode, Result};
use crate::metrics::Metrics;

use super::bit_reader::{remove_byte_stuffing, BitReader};
use super::component_plane::ComponentPlane;
use super::huffman_table::HuffmanTable;
use super::idct::IdctTable;
use super::jpeg_header::JpegHeader;

/// Decodes the entropy coded data of a baseline scan and returns one plane per
/// component (in frame order) at the component's own resolution.
///
/// `scan_data` is the raw data between the SOS segment and the next marker, still
/// containing the 0xff 0x00 stuffing.
pub fn read_scan(
    jf: &JpegHeader,
    scan_data: &[u8],
    metrics: &mut Metrics,
) -> Result<Vec<ComponentPlane>> {
    let frame = jf.get_frame().context()?;

    let (data, stuffing_bytes) = remove_byte_stuffing(scan_data);
    metrics.record_scan(scan_data.len(), stuffing_bytes);

    debug!(
        "scan of {0} bytes ({1} stuffing bytes removed)",
        scan_data.len(),
        stuffing_bytes
    );

    let mut bit_reader = BitReader::new(&data);
    let idct = IdctTable::new();

    let mut planes: Vec<ComponentPlane> = jf
        .cmp_info
        .iter()
        .map(|ci| ComponentPlane::new(ci.plane_width, ci.plane_height))
        .collect();

    // resolve the tables up front, they don't change during the scan
    let mut scan_components = Vec::with_capacity(jf.cs_cmp.len());
    for &cmp in &jf.cs_cmp {
        scan_components.push((
            cmp,
            jf.get_huff_dc_table(cmp).context()?,
            jf.get_huff_ac_table(cmp).context()?,
            jf.get_quantization_table(cmp).context()?,
        ));
    }

    let blocks_per_mcu: u32 = jf.cmp_info.iter().map(|c| c.blocks_per_mcu()).sum();

    let mut last_dc = [0i16; 4];
    let mut block = [0i16; 64];

    for mcu_y in 0..frame.mcuv {
        for mcu_x in 0..frame.mcuh {
            for &(cmp, dctbl, actbl, qtbl) in &scan_components {
                let ci = &jf.cmp_info[cmp];

                for by in 0..ci.sfv {
                    for bx in 0..ci.sfh {
                        let _eob = decode_block_seq(&mut bit_reader, dctbl, actbl, &mut block)
                            .context()?;

                        let dc = block[0].wrapping_add(last_dc[cmp]);
                        last_dc[cmp] = dc;
                        block[0] = dc;

                        #[cfg(feature = "detailed_tracing")]
                        info!(
                            "mcu ({0},{1}) cmp {2} block ({3},{4}) eob={5}: {6:?}",
                            mcu_x, mcu_y, cmp, bx, by, _eob, block
                        );

                        let samples = idct.run_idct(&qtbl.dequantize(&block));

                        planes[cmp].write_block(mcu_x * ci.sfh + bx, mcu_y * ci.sfv + by, &samples);
                    }
                }
            }

            metrics.record_mcu(blocks_per_mcu);
        }
    }

    if bit_reader.bits_left() >= 8 {
        debug!(
            "{0} bits left over at the end of the scan",
            bit_reader.bits_left()
        );
    }

    Ok(planes)
}

/// Decodes one block of a sequential scan into raster order coefficients. The DC
/// coefficient is left as the difference to the previous block of the component.
///
/// Returns the zigzag position one past the last coefficient that was coded.
pub fn decode_block_seq(
    bit_reader: &mut BitReader,
    dctbl: &HuffmanTable,
    actbl: &HuffmanTable,
    block: &mut [i16; 64],
) -> Result<usize> {
    *block = [0; 64];

    // decode dc
    block[0] = read_dc(bit_reader, dctbl)?;

    // decode ac
    let mut bpos: usize = 1;
    while bpos < 64 {
        match read_coef(bit_reader, actbl)? {
            Some((z, coef)) => {
                if z + bpos >= 64 {
                    return err_exit_code(
                        ExitCode::MalformedContainer,
                        format!(
                            "run of {0} zeros at position {1} goes past the end of the block",
                            z, bpos
                        ),
                    );
                }

                // the block is already zeroed, skip over the run
                bpos += z;
                block[usize::from(ZIGZAG_TO_RASTER[bpos])] = coef;
                bpos += 1;
            }
            None => {
                // EOB
                break;
            }
        }
    }

    Ok(bpos)
}

#[inline(always)]
fn read_dc(bit_reader: &mut BitReader, tbl: &HuffmanTable) -> Result<i16> {
    let s = tbl.decode(bit_reader)?;

    if s > MAX_DC_CATEGORY {
        return err_exit_code(
            ExitCode::MalformedContainer,
            format!("DC magnitude category {0} is out of range", s),
        );
    }

    if s == 0 {
        return Ok(0);
    }

    Ok(devli(s, bit_reader.read_bits(u32::from(s))?))
}

/// Reads the next AC symbol. Returns None for end of block, otherwise the number of
/// zeros to skip and the coefficient that follows them.
#[inline(always)]
fn read_coef(bit_reader: &mut BitReader, tbl: &HuffmanTable) -> Result<Option<(usize, i16)>> {
    let hc = tbl.decode(bit_reader)?;

    let z = usize::from(lbits(hc, 4));
    let s = rbits(hc, 4);

    if s == 0 {
        // 0x00 is EOB, anything else is a run followed by a zero coefficient (0xF0 is ZRL)
        return match z {
            0 => Ok(None),
            _ => Ok(Some((z, 0))),
        };
    }

    if s > MAX_AC_CATEGORY {
        return err_exit_code(
            ExitCode::MalformedContainer,
            format!("AC magnitude category {0} is out of range", s),
        );
    }

    let value = bit_reader.read_bits(u32::from(s))?;
    Ok(Some((z, devli(s, value))))
}
