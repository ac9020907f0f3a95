/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

/// One color component as declared in the frame header, with the table
/// assignments of the scan filled in once the SOS segment is read.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// jpeg internal id
    pub jid: u8,

    /// sample factor horizontal
    pub sfh: u32,

    /// sample factor vertical
    pub sfv: u32,

    /// quantization table
    pub q_table_index: u8,

    /// no of huffman table (DC)
    pub huff_dc: u8,

    /// no of huffman table (AC)
    pub huff_ac: u8,

    /// width of the component plane in samples
    pub plane_width: u32,

    /// height of the component plane in samples
    pub plane_height: u32,
}

impl Default for ComponentInfo {
    fn default() -> ComponentInfo {
        return ComponentInfo {
            jid: 0xff,
            sfh: 0,
            sfv: 0,
            q_table_index: 0xff,
            huff_dc: 0xff,
            huff_ac: 0xff,
            plane_width: 0,
            plane_height: 0,
        };
    }
}

impl ComponentInfo {
    /// number of blocks this component contributes to each MCU
    pub fn blocks_per_mcu(&self) -> u32 {
        self.sfh * self.sfv
    }

    /// true if the component is stored at a lower resolution than the frame
    pub fn is_subsampled(&self, img_width: u32, img_height: u32) -> bool {
        self.plane_width < img_width || self.plane_height < img_height
    }
}
