/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, warn};

use crate::consts::*;
use crate::enabled_features::EnabledFeatures;
use crate::helpers::*;
use crate::jpeg_code;
use crate::jpeg_error::{err_exit_code, AddContext, ExitCode, Result};

use super::bit_reader::BitReader;
use super::component_info::ComponentInfo;
use super::huffman_table::HuffmanTable;
use super::quantization_tables::QuantizationTable;

/// Size of the frame and of the MCU grid, fixed by the SOF0 segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub img_width: u32,  // width of image
    pub img_height: u32, // height of image
    pub sfhm: u32,       // max horizontal sample factor
    pub sfvm: u32,       // max vertical sample factor
    pub mcuh: u32,       // mcus per line
    pub mcuv: u32,       // mcus per column
}

impl FrameGeometry {
    pub fn mcu_width(&self) -> u32 {
        self.sfhm * BLOCK_DIM as u32
    }

    pub fn mcu_height(&self) -> u32 {
        self.sfvm * BLOCK_DIM as u32
    }
}

/// Everything the segments preceding the scan tell us about the image. Owned by a
/// single decode, nothing here outlives it.
#[derive(Debug, Clone, Default)]
pub struct JpegHeader {
    pub q_tables: [Option<QuantizationTable>; MAX_TABLES], // quantization tables
    h_tables: [[Option<HuffmanTable>; MAX_TABLES]; 2],     // huffman tables [DC, AC][id]
    pub cmp_info: Vec<ComponentInfo>,                      // components in frame order
    pub frame: Option<FrameGeometry>,                      // set once SOF0 is parsed

    pub cs_cmp: Vec<usize>, // component numbers in scan order
    pub scnc: usize,        // count of scans encountered so far
}

#[derive(Debug, PartialEq)]
pub enum ParseSegmentResult {
    Continue,
    EOI,
    SOS,
}

impl JpegHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// component count
    pub fn cmpc(&self) -> usize {
        self.cmp_info.len()
    }

    pub fn get_frame(&self) -> Result<&FrameGeometry> {
        match &self.frame {
            Some(f) => Ok(f),
            None => err_exit_code(ExitCode::MalformedContainer, "frame header (SOF0) missing"),
        }
    }

    pub fn get_huff_dc_table(&self, cmp: usize) -> Result<&HuffmanTable> {
        let id = usize::from(self.cmp_info[cmp].huff_dc);
        match self.h_tables[0].get(id) {
            Some(Some(t)) => Ok(t),
            _ => err_exit_code(
                ExitCode::MalformedContainer,
                format!("DC huffman table {0} missing for component {1}", id, cmp),
            ),
        }
    }

    pub fn get_huff_ac_table(&self, cmp: usize) -> Result<&HuffmanTable> {
        let id = usize::from(self.cmp_info[cmp].huff_ac);
        match self.h_tables[1].get(id) {
            Some(Some(t)) => Ok(t),
            _ => err_exit_code(
                ExitCode::MalformedContainer,
                format!("AC huffman table {0} missing for component {1}", id, cmp),
            ),
        }
    }

    pub fn get_quantization_table(&self, cmp: usize) -> Result<&QuantizationTable> {
        let id = usize::from(self.cmp_info[cmp].q_table_index);
        match self.q_tables.get(id) {
            Some(Some(t)) => Ok(t),
            _ => err_exit_code(
                ExitCode::MalformedContainer,
                format!("quantization table {0} missing for component {1}", id, cmp),
            ),
        }
    }

    /// the stream has to start with SOI, anything else isn't a JPEG
    pub fn parse_start_of_image(&mut self, reader: &mut BitReader) -> Result<()> {
        let marker = reader.read_u16().context()?;
        if marker != b_short(SOI[0], SOI[1]) {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!("stream starts with {0:04X} instead of the SOI marker", marker),
            );
        }

        debug!("start of image");
        Ok(())
    }

    /// Parses segments up to the start of the scan data, returns false if EOI was reached first
    pub fn parse(&mut self, reader: &mut BitReader, enabled_features: &EnabledFeatures) -> Result<bool> {
        loop {
            match self.parse_next_segment(reader, enabled_features).context()? {
                ParseSegmentResult::EOI => return Ok(false),
                ParseSegmentResult::SOS => return Ok(true),
                ParseSegmentResult::Continue => {}
            }
        }
    }

    /// Reads the next marker and its segment. Returns SOS when the entropy coded data of a
    /// scan follows, at which point the reader is positioned on the first byte of that data.
    pub fn parse_next_segment(
        &mut self,
        reader: &mut BitReader,
        enabled_features: &EnabledFeatures,
    ) -> Result<ParseSegmentResult> {
        let btype = read_marker(reader).context()?;

        match btype {
            jpeg_code::EOI => {
                debug!("end of image");
                return Ok(ParseSegmentResult::EOI);
            }
            jpeg_code::SOI => {
                return err_exit_code(ExitCode::UnsupportedMarker, "soi marker found out of place");
            }
            jpeg_code::RST0..=jpeg_code::RST7 => {
                return err_exit_code(
                    ExitCode::UnsupportedMarker,
                    format!("restart marker RST{0} is not supported", btype - jpeg_code::RST0),
                );
            }
            _ => {}
        }

        // everything else has a length prefixed payload
        let segment_size = reader.read_u16().context()?;
        if segment_size < 2 {
            return err_exit_code(ExitCode::MalformedContainer, "segment is too short");
        }

        let segment = reader
            .read_raw_bytes(usize::from(segment_size) - 2)
            .context()?;

        match self.parse_segment_payload(btype, segment, enabled_features) {
            Err(e) if e.exit_code() == ExitCode::TruncatedStream => err_exit_code(
                ExitCode::MalformedContainer,
                format!(
                    "segment FF{0:02X} of {1} bytes is shorter than its contents: {2}",
                    btype,
                    segment.len(),
                    e.message()
                ),
            ),
            r => r,
        }
    }

    fn parse_segment_payload(
        &mut self,
        btype: u8,
        segment: &[u8],
        enabled_features: &EnabledFeatures,
    ) -> Result<ParseSegmentResult> {
        let mut cursor = Cursor::new(segment);

        match btype {
            jpeg_code::DHT => self.parse_dht(&mut cursor).context()?,
            jpeg_code::DQT => self.parse_dqt(&mut cursor).context()?,
            jpeg_code::SOF0 => self.parse_sof0(&mut cursor, enabled_features).context()?,
            jpeg_code::SOS => {
                self.parse_sos(&mut cursor).context()?;
                return Ok(ParseSegmentResult::SOS);
            }
            jpeg_code::DRI => {
                let rsti = cursor.read_u16::<BigEndian>().context()?;
                return err_exit_code(
                    ExitCode::UnsupportedMarker,
                    format!("restart intervals are not supported (DRI of {0} MCUs)", rsti),
                );
            }
            jpeg_code::SOF2 => {
                return err_exit_code(
                    ExitCode::UnsupportedMarker,
                    "progressive (SOF2) images are not supported",
                );
            }
            jpeg_code::SOF1..=jpeg_code::SOF15
                if btype != jpeg_code::DHT && btype != jpeg_code::DAC =>
            {
                // SOF1..SOF15 except the DHT and DAC codes that live in the same range
                return err_exit_code(
                    ExitCode::UnsupportedMarker,
                    format!(
                        "SOF{0} frame found, only baseline (SOF0) images are supported",
                        btype - jpeg_code::SOF0
                    ),
                );
            }
            jpeg_code::APP0..=jpeg_code::APP15 => {
                debug!(
                    "skipping APP{0} segment of {1} bytes",
                    btype - jpeg_code::APP0,
                    segment.len()
                );
            }
            jpeg_code::COM => {
                debug!("skipping COM segment of {0} bytes", segment.len());
            }
            _ => {
                return err_exit_code(
                    ExitCode::UnsupportedMarker,
                    format!("unknown marker found: FF {0:X}", btype),
                );
            }
        }

        Ok(ParseSegmentResult::Continue)
    }

    fn parse_dqt(&mut self, cursor: &mut Cursor<&[u8]>) -> Result<()> {
        let len = cursor.get_ref().len() as u64;

        while cursor.position() < len {
            let pq_tq = cursor.read_u8()?;
            let precision = lbits(pq_tq, 4);
            let id = usize::from(rbits(pq_tq, 4));

            if id >= MAX_TABLES {
                return err_exit_code(
                    ExitCode::MalformedContainer,
                    format!("DQT has invalid index {0}", id),
                );
            }

            let mut zigzag = [0u16; 64];
            match precision {
                0 => {
                    for q in zigzag.iter_mut() {
                        *q = u16::from(cursor.read_u8()?);
                    }
                }
                1 => {
                    for q in zigzag.iter_mut() {
                        *q = cursor.read_u16::<BigEndian>()?;
                    }
                }
                _ => {
                    return err_exit_code(
                        ExitCode::MalformedContainer,
                        format!("DQT has invalid precision {0}", precision),
                    );
                }
            }

            let table = QuantizationTable::new_from_zigzag(&zigzag);
            debug!(
                "quantization table {0} ({1} bit): {2:?}",
                id,
                if precision == 0 { 8 } else { 16 },
                table.get_quantization_table()
            );

            self.q_tables[id] = Some(table);
        }

        Ok(())
    }

    fn parse_dht(&mut self, cursor: &mut Cursor<&[u8]>) -> Result<()> {
        let len = cursor.get_ref().len() as u64;

        while cursor.position() < len {
            let tc_th = cursor.read_u8()?;
            let class = usize::from(lbits(tc_th, 4));
            let id = usize::from(rbits(tc_th, 4));

            if class >= 2 || id >= MAX_TABLES {
                return err_exit_code(
                    ExitCode::MalformedContainer,
                    format!("DHT has invalid class {0} or index {1}", class, id),
                );
            }

            let mut counts = [0u8; 16];
            std::io::Read::read_exact(cursor, &mut counts)?;

            let total: usize = counts.iter().map(|&c| usize::from(c)).sum();
            let mut symbols = vec![0u8; total];
            std::io::Read::read_exact(cursor, &mut symbols)?;

            debug!(
                "{0} huffman table {1}: counts {2:?}, {3} symbols",
                if class == 0 { "DC" } else { "AC" },
                id,
                counts,
                total
            );

            self.h_tables[class][id] =
                Some(HuffmanTable::construct_from_counts(&counts, &symbols).context()?);
        }

        Ok(())
    }

    fn parse_sof0(
        &mut self,
        cursor: &mut Cursor<&[u8]>,
        enabled_features: &EnabledFeatures,
    ) -> Result<()> {
        if self.frame.is_some() {
            return err_exit_code(
                ExitCode::MalformedContainer,
                "image cannot have multiple SOF blocks",
            );
        }

        // check data precision, only 8 bit is allowed
        let precision = cursor.read_u8()?;
        if precision != 8 {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!("{0} bit data precision is not supported", precision),
            );
        }

        let img_height = u32::from(cursor.read_u16::<BigEndian>()?);
        let img_width = u32::from(cursor.read_u16::<BigEndian>()?);

        if img_height == 0 || img_width == 0 {
            return err_exit_code(ExitCode::MalformedContainer, "image dimensions can't be zero");
        }

        if img_height > enabled_features.max_jpeg_height
            || img_width > enabled_features.max_jpeg_width
        {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!(
                    "image dimensions {0}x{1} larger than {2}x{3}",
                    img_width,
                    img_height,
                    enabled_features.max_jpeg_width,
                    enabled_features.max_jpeg_height
                ),
            );
        }

        let cmpc = usize::from(cursor.read_u8()?);
        if cmpc != 1 && cmpc != 3 {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!("image has {0} components, only 1 or 3 are supported", cmpc),
            );
        }

        let mut cmp_info = Vec::with_capacity(cmpc);
        for _ in 0..cmpc {
            let mut ci = ComponentInfo::default();

            ci.jid = cursor.read_u8()?;
            let hv = cursor.read_u8()?;
            ci.sfh = u32::from(lbits(hv, 4));
            ci.sfv = u32::from(rbits(hv, 4));
            ci.q_table_index = cursor.read_u8()?;

            if ci.sfh == 0
                || ci.sfv == 0
                || ci.sfh > u32::from(MAX_SAMPLING_FACTOR)
                || ci.sfv > u32::from(MAX_SAMPLING_FACTOR)
            {
                return err_exit_code(
                    ExitCode::MalformedContainer,
                    format!("invalid sampling factors {0}x{1}", ci.sfh, ci.sfv),
                );
            }

            if usize::from(ci.q_table_index) >= MAX_TABLES {
                return err_exit_code(
                    ExitCode::MalformedContainer,
                    format!("quantization table index {0} too big", ci.q_table_index),
                );
            }

            if cmp_info.iter().any(|c: &ComponentInfo| c.jid == ci.jid) {
                return err_exit_code(
                    ExitCode::MalformedContainer,
                    format!("duplicate component id {0}", ci.jid),
                );
            }

            cmp_info.push(ci);
        }

        let sfhm = cmp_info.iter().map(|c| c.sfh).max().unwrap_or(1);
        let sfvm = cmp_info.iter().map(|c| c.sfv).max().unwrap_or(1);

        for ci in cmp_info.iter_mut() {
            if sfhm % ci.sfh != 0 || sfvm % ci.sfv != 0 {
                return err_exit_code(
                    ExitCode::MalformedContainer,
                    format!(
                        "sampling factors {0}x{1} are not an integer fraction of {2}x{3}",
                        ci.sfh, ci.sfv, sfhm, sfvm
                    ),
                );
            }

            ci.plane_width = img_width * ci.sfh / sfhm;
            ci.plane_height = img_height * ci.sfv / sfvm;
        }

        let geometry = FrameGeometry {
            img_width,
            img_height,
            sfhm,
            sfvm,
            mcuh: img_width / (sfhm * BLOCK_DIM as u32),
            mcuv: img_height / (sfvm * BLOCK_DIM as u32),
        };

        if img_width % geometry.mcu_width() != 0 || img_height % geometry.mcu_height() != 0 {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!(
                    "image dimensions {0}x{1} are not a multiple of the {2}x{3} MCU size",
                    img_width,
                    img_height,
                    geometry.mcu_width(),
                    geometry.mcu_height()
                ),
            );
        }

        debug!(
            "frame {0}x{1}, {2} components, {3}x{4} MCUs of {5}x{6}",
            img_width,
            img_height,
            cmpc,
            geometry.mcuh,
            geometry.mcuv,
            geometry.mcu_width(),
            geometry.mcu_height()
        );
        for (i, ci) in cmp_info.iter().enumerate() {
            debug!(
                "component {0}: id={1} H={2} V={3} qtable={4} plane={5}x{6}",
                i, ci.jid, ci.sfh, ci.sfv, ci.q_table_index, ci.plane_width, ci.plane_height
            );
        }

        self.cmp_info = cmp_info;
        self.frame = Some(geometry);

        Ok(())
    }

    fn parse_sos(&mut self, cursor: &mut Cursor<&[u8]>) -> Result<()> {
        if self.frame.is_none() {
            return err_exit_code(
                ExitCode::MalformedContainer,
                "start of scan found before the frame header",
            );
        }

        if self.scnc > 0 {
            return err_exit_code(
                ExitCode::UnsupportedMarker,
                "images with more than one scan are not supported",
            );
        }

        let cs_cmpc = usize::from(cursor.read_u8()?);
        if cs_cmpc != self.cmpc() {
            return err_exit_code(
                ExitCode::MalformedContainer,
                format!(
                    "{0} components in scan, but the frame has {1}",
                    cs_cmpc,
                    self.cmpc()
                ),
            );
        }

        let mut cs_cmp = Vec::with_capacity(cs_cmpc);
        for _ in 0..cs_cmpc {
            let cs = cursor.read_u8()?;
            let td_ta = cursor.read_u8()?;

            let cmp = match self.cmp_info.iter().position(|c| c.jid == cs) {
                Some(c) => c,
                None => {
                    return err_exit_code(
                        ExitCode::MalformedContainer,
                        format!("component id {0} in scan isn't in the frame", cs),
                    )
                }
            };

            if cs_cmp.contains(&cmp) {
                return err_exit_code(
                    ExitCode::MalformedContainer,
                    format!("component id {0} appears twice in scan", cs),
                );
            }

            let ci = &mut self.cmp_info[cmp];
            ci.huff_dc = lbits(td_ta, 4);
            ci.huff_ac = rbits(td_ta, 4);

            debug!(
                "scan component id={0}: DC table {1}, AC table {2}",
                cs, ci.huff_dc, ci.huff_ac
            );

            cs_cmp.push(cmp);
        }

        let cs_from = cursor.read_u8()?;
        let cs_to = cursor.read_u8()?;
        let ah_al = cursor.read_u8()?;

        // sequential scans always cover the whole spectrum with no successive approximation
        if cs_from != 0 || cs_to != 63 || ah_al != 0 {
            return err_exit_code(
                ExitCode::UnsupportedMarker,
                format!(
                    "scan parameters Ss={0} Se={1} Ah={2} Al={3} are not baseline",
                    cs_from,
                    cs_to,
                    lbits(ah_al, 4),
                    rbits(ah_al, 4)
                ),
            );
        }

        self.cs_cmp = cs_cmp;
        self.scnc += 1;

        self.verify_scan_tables().context()
    }

    /// verifies that every table the scan refers to was defined
    pub fn verify_scan_tables(&self) -> Result<()> {
        for &cmp in &self.cs_cmp {
            self.get_huff_dc_table(cmp)?;
            self.get_huff_ac_table(cmp)?;
            self.get_quantization_table(cmp)?;
        }

        Ok(())
    }

    /// human readable summary of the parsed tables and geometry
    pub fn describe(&self) -> String {
        let mut s = String::new();

        if let Some(f) = &self.frame {
            s += &format!(
                "frame: {0}x{1} sampling max {2}x{3}, {4}x{5} MCUs\n",
                f.img_width, f.img_height, f.sfhm, f.sfvm, f.mcuh, f.mcuv
            );
        }

        for (i, c) in self.cmp_info.iter().enumerate() {
            s += &format!(
                "component {0}: id={1} H={2} V={3} qtable={4} dc={5} ac={6} plane={7}x{8}\n",
                i, c.jid, c.sfh, c.sfv, c.q_table_index, c.huff_dc, c.huff_ac, c.plane_width, c.plane_height
            );
        }

        for (id, q) in self.q_tables.iter().enumerate() {
            if let Some(q) = q {
                s += &format!("quantization table {0}:\n", id);
                for row in q.get_quantization_table().chunks(BLOCK_DIM) {
                    s += &format!("  {0:?}\n", row);
                }
            }
        }

        for (class, name) in [(0, "DC"), (1, "AC")] {
            for id in 0..MAX_TABLES {
                if let Some(ht) = &self.h_tables[class][id] {
                    s += &format!("{0} huffman table {1}: {2} symbols\n", name, id, ht.num_symbols());
                    for symbol in 0..=255u8 {
                        if let Some((code, len)) = ht.get_code(symbol) {
                            s += &format!(
                                "  {0:02X}: {1:0width$b}\n",
                                symbol,
                                code,
                                width = usize::from(len)
                            );
                        }
                    }
                }
            }
        }

        s
    }
}

/// reads a marker, skipping any 0xff fill bytes that may precede it
fn read_marker(reader: &mut BitReader) -> Result<u8> {
    let prefix = reader.read_u8().context()?;
    if prefix != 0xff {
        return err_exit_code(
            ExitCode::MalformedContainer,
            format!(
                "expected a marker at byte offset {0} but found {1:02X}",
                reader.get_byte_position() - 1,
                prefix
            ),
        );
    }

    let mut btype = reader.read_u8().context()?;
    while btype == 0xff {
        warn!("skipping fill byte before marker");
        btype = reader.read_u8().context()?;
    }

    if btype == 0 {
        return err_exit_code(ExitCode::MalformedContainer, "stuffed zero found outside of scan data");
    }

    Ok(btype)
}
