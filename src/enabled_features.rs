/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

/// Limits and behaviors of the decoder. Tighten for untrusted input.
#[derive(Debug, Clone)]
pub struct EnabledFeatures {
    /// maximum jpeg width
    pub max_jpeg_width: u32,

    /// maximum jpeg height
    pub max_jpeg_height: u32,

    /// maximum size of a jpeg file
    pub max_jpeg_file_size: u32,

    /// ignore any bytes that follow the EOI marker instead of failing.
    pub accept_trailing_data: bool,
}

impl Default for EnabledFeatures {
    fn default() -> Self {
        Self {
            max_jpeg_width: 16386,
            max_jpeg_height: 16386,
            max_jpeg_file_size: 128 * 1024 * 1024,
            accept_trailing_data: false,
        }
    }
}

impl EnabledFeatures {
    /// parameters that allow everything
    pub fn all() -> Self {
        Self {
            max_jpeg_width: u32::MAX,
            max_jpeg_height: u32::MAX,
            max_jpeg_file_size: u32::MAX,
            accept_trailing_data: true,
        }
    }
}
