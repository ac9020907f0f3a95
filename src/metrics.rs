/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use std::collections::HashMap;
use std::time::Duration;

#[cfg(windows)]
use cpu_time::ThreadTime;

/// platform independent threadtime measurement
pub struct CpuTimeMeasure {
    #[cfg(windows)]
    start: ThreadTime,
    #[cfg(not(windows))]
    start: std::time::SystemTime,
}

impl CpuTimeMeasure {
    /// starts measuring from now
    pub fn new() -> Self {
        Self {
            #[cfg(windows)]
            start: ThreadTime::now(),
            #[cfg(not(windows))]
            start: std::time::SystemTime::now(),
        }
    }

    /// time spent since the measure was created
    pub fn elapsed(&self) -> Duration {
        #[cfg(windows)]
        {
            self.start.elapsed()
        }
        #[cfg(not(windows))]
        {
            // the wall clock may go backwards, count that as no time spent
            self.start.elapsed().unwrap_or_default()
        }
    }
}

/// The phases of a decode that are timed separately
#[derive(Debug, PartialEq, Copy, Clone, Hash, Eq, PartialOrd, Ord)]
pub enum DecodeStage {
    /// walking the marker segments and building tables
    ParseHeader,
    /// huffman decoding, dequantization and IDCT of all blocks
    DecodeScan,
    /// resampling subsampled planes to the frame size
    Upsample,
    /// YCbCr to RGB conversion
    ColorConvert,
}

/// Timing and counters collected while decoding one or more images
#[derive(Default, Debug, Clone)]
pub struct Metrics {
    stage_time: HashMap<DecodeStage, Duration>,
    images: u64,
    mcus: u64,
    blocks: u64,
    scan_bytes: u64,
    stuffing_bytes: u64,
}

impl Metrics {
    /// adds time spent in a stage
    pub fn record_stage_time(&mut self, stage: DecodeStage, duration: Duration) {
        *self.stage_time.entry(stage).or_default() += duration;
    }

    /// counts the bytes of a scan and the stuffing bytes removed from it
    pub fn record_scan(&mut self, scan_bytes: usize, stuffing_bytes: usize) {
        self.scan_bytes += scan_bytes as u64;
        self.stuffing_bytes += stuffing_bytes as u64;
    }

    /// counts one decoded MCU made of `blocks` blocks
    pub fn record_mcu(&mut self, blocks: u32) {
        self.mcus += 1;
        self.blocks += u64::from(blocks);
    }

    /// counts one fully decoded image
    pub fn record_image(&mut self) {
        self.images += 1;
    }

    /// total time spent in a stage
    pub fn get_stage_time(&self, stage: DecodeStage) -> Duration {
        self.stage_time.get(&stage).copied().unwrap_or_default()
    }

    /// total time over all stages
    pub fn get_total_time(&self) -> Duration {
        self.stage_time.values().sum()
    }

    /// number of images decoded
    pub fn get_images(&self) -> u64 {
        self.images
    }

    /// number of MCUs decoded
    pub fn get_mcus(&self) -> u64 {
        self.mcus
    }

    /// number of 8x8 blocks decoded
    pub fn get_blocks(&self) -> u64 {
        self.blocks
    }

    /// number of 0x00 stuffing bytes removed from scan data
    pub fn get_stuffing_bytes(&self) -> u64 {
        self.stuffing_bytes
    }

    /// prints a summary to stdout
    pub fn print_metrics(&self) {
        let mut stages: Vec<_> = self.stage_time.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));

        let total = self.get_total_time();

        for (stage, duration) in stages {
            let name = format!("{0:?}", stage);
            println!(
                "{0:16} cpu={1:8}us share={2:0.1}%",
                name,
                duration.as_micros(),
                if total.is_zero() {
                    0f64
                } else {
                    duration.as_secs_f64() * 100f64 / total.as_secs_f64()
                }
            );
        }

        println!(
            "images={0} mcus={1} blocks={2} scan_bytes={3} stuffing_bytes={4}",
            self.images, self.mcus, self.blocks, self.scan_bytes, self.stuffing_bytes
        );
        println!("total_cpu={0}ms", total.as_millis());
    }

    /// accumulates the metrics of another decode into this one
    pub fn merge_from(&mut self, source_metrics: Metrics) {
        for (stage, duration) in source_metrics.stage_time {
            self.record_stage_time(stage, duration);
        }

        self.images += source_metrics.images;
        self.mcus += source_metrics.mcus;
        self.blocks += source_metrics.blocks;
        self.scan_bytes += source_metrics.scan_bytes;
        self.stuffing_bytes += source_metrics.stuffing_bytes;
    }
}

#[test]
fn test_merge_metrics() {
    let mut a = Metrics::default();
    a.record_stage_time(DecodeStage::DecodeScan, Duration::from_millis(5));
    a.record_mcu(6);
    a.record_image();

    let mut b = Metrics::default();
    b.record_stage_time(DecodeStage::DecodeScan, Duration::from_millis(7));
    b.record_stage_time(DecodeStage::Upsample, Duration::from_millis(1));
    b.record_mcu(6);
    b.record_mcu(6);
    b.record_scan(100, 3);
    b.record_image();

    a.merge_from(b);

    assert_eq!(
        Duration::from_millis(12),
        a.get_stage_time(DecodeStage::DecodeScan)
    );
    assert_eq!(Duration::from_millis(13), a.get_total_time());
    assert_eq!(Duration::ZERO, a.get_stage_time(DecodeStage::ColorConvert));
    assert_eq!(3, a.get_mcus());
    assert_eq!(18, a.get_blocks());
    assert_eq!(3, a.get_stuffing_bytes());
    assert_eq!(2, a.get_images());
}
