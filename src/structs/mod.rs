/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

mod bit_reader;
mod color_conversion;
mod component_info;
mod component_plane;
mod huffman_table;
mod idct;
pub mod jpeg_decoder;
mod jpeg_header;
mod jpeg_read;
pub mod pnm_writer;
mod quantization_tables;
