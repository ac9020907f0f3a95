/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{stdout, BufWriter, IsTerminal, Read, Write};
use std::time::Duration;

use baseline_jpeg::{
    decode_jpeg_with_metrics, dump_jpeg, get_version_string, write_pnm, CpuTimeMeasure,
    EnabledFeatures, ExitCode, JpegError, Metrics,
};
use log::info;
use simple_logger::SimpleLogger;

type Result<T> = core::result::Result<T, JpegError>;

fn syntax_error<T>(message: impl AsRef<str>) -> Result<T> {
    Err(JpegError::new(ExitCode::SyntaxError, message))
}

fn arg_error(e: pico_args::Error) -> JpegError {
    JpegError::new(ExitCode::SyntaxError, e.to_string())
}

const USAGE: &str = "usage: baseline_jpeg_util [options] <input.jpg> <output.pnm>

options:
  --overwrite              replace the output file if it already exists
  --max-width <n>          reject images wider than n pixels
  --max-height <n>         reject images taller than n pixels
  --accept-trailing-data   ignore bytes after the end of image marker
  --iter <n>               decode n times and report the average cpu time
  --dump                   print the parsed header and tables instead of decoding
  --version                print the version and exit";

struct Options {
    overwrite: bool,
    dump: bool,
    iterations: u32,
    enabled_features: EnabledFeatures,
    filenames: Vec<OsString>,
}

fn parse_options() -> Result<Option<Options>> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        println!("{0}", USAGE);
        return Ok(None);
    }

    if args.contains("--version") {
        println!("baseline_jpeg_util {0}", get_version_string());
        return Ok(None);
    }

    let mut enabled_features = EnabledFeatures::default();

    let overwrite = args.contains("--overwrite");
    let dump = args.contains("--dump");
    if args.contains("--accept-trailing-data") {
        enabled_features.accept_trailing_data = true;
    }

    if let Some(x) = args
        .opt_value_from_str::<_, u32>("--max-width")
        .map_err(arg_error)?
    {
        enabled_features.max_jpeg_width = x;
    }

    if let Some(x) = args
        .opt_value_from_str::<_, u32>("--max-height")
        .map_err(arg_error)?
    {
        enabled_features.max_jpeg_height = x;
    }

    let iterations = args
        .opt_value_from_str::<_, u32>("--iter")
        .map_err(arg_error)?
        .unwrap_or(1)
        .max(1);

    let filenames = args.finish();
    if let Some(unknown) = filenames.iter().find(|f| f.to_string_lossy().starts_with('-')) {
        return syntax_error(format!("unknown switch {0}\n{1}", unknown.to_string_lossy(), USAGE));
    }

    Ok(Some(Options {
        overwrite,
        dump,
        iterations,
        enabled_features,
        filenames,
    }))
}

fn read_input(filename: &OsString) -> Result<Vec<u8>> {
    let mut file_in = File::open(filename).map_err(|e| {
        JpegError::new(
            ExitCode::FileNotFound,
            format!("{0}: {1}", filename.to_string_lossy(), e),
        )
    })?;

    let mut input_data = Vec::new();
    file_in.read_to_end(&mut input_data)?;
    Ok(input_data)
}

// wrap main so that errors get printed nicely without a panic
fn main_with_result() -> Result<()> {
    let options = match parse_options()? {
        Some(o) => o,
        None => return Ok(()),
    };

    // only output the log if we are connected to a console (otherwise if there is redirection we would corrupt the file)
    if stdout().is_terminal() {
        if let Err(e) = SimpleLogger::new().init() {
            eprintln!("unable to initialize logging: {0}", e);
        }
    }

    if options.dump {
        if options.filenames.len() != 1 {
            return syntax_error(format!("--dump needs exactly one input file\n{0}", USAGE));
        }

        let input_data = read_input(&options.filenames[0])?;
        println!("parsed header:");
        print!("{0}", dump_jpeg(&input_data, &options.enabled_features)?);
        return Ok(());
    }

    if options.filenames.len() != 2 {
        return syntax_error(format!(
            "source and destination filename are needed\n{0}",
            USAGE
        ));
    }

    let input_data = read_input(&options.filenames[0])?;

    let mut overall_cpu = Duration::ZERO;
    let mut overall_metrics = Metrics::default();
    let mut image = None;

    for _ in 0..options.iterations {
        let thread_cpu = CpuTimeMeasure::new();

        let (decoded, metrics) = decode_jpeg_with_metrics(&input_data, &options.enabled_features)?;

        let iter_duration = thread_cpu.elapsed();
        info!(
            "decoded {0}x{1} {2:?} image in {3}ms",
            decoded.width,
            decoded.height,
            decoded.color,
            iter_duration.as_millis()
        );

        overall_cpu += iter_duration;
        overall_metrics.merge_from(metrics);
        image = Some(decoded);
    }

    let image = match image {
        Some(i) => i,
        None => return syntax_error("no iterations were run"),
    };

    let fileout = OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(options.overwrite)
        .create_new(!options.overwrite)
        .open(&options.filenames[1])?;

    let mut writer = BufWriter::new(fileout);
    write_pnm(&image, &mut writer)?;
    writer.flush()?;

    if options.iterations > 1 {
        info!(
            "Overall average CPU consumed per iteration {0}ms ",
            overall_cpu.as_millis() / u128::from(options.iterations)
        );

        if stdout().is_terminal() {
            overall_metrics.print_metrics();
        }
    }

    Ok(())
}

fn main() {
    match main_with_result() {
        Ok(_) => {}
        Err(e) => {
            eprintln!(
                "error code: {0} {1} {2}",
                e.exit_code(),
                e.exit_code().as_integer_error_code(),
                e.message()
            );
            std::process::exit(e.exit_code().as_integer_error_code());
        }
    }
}
