#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{fmt::Display, path::PathBuf};

use clap::{Parser, ValueEnum};
use densendither::{DitherMethod, DitherPipeline, Grid, Palette};
use image::ImageFormat;

/// The most colors a palette may hold.
const MAX_PALETTE_COLORS: usize = 10;

#[derive(Copy, Clone, ValueEnum)]
enum CliDitherMethod {
    Ordered,
    FloydSteinberg,
    None,
}

impl From<CliDitherMethod> for Option<DitherMethod> {
    fn from(value: CliDitherMethod) -> Self {
        match value {
            CliDitherMethod::Ordered => Some(DitherMethod::Ordered),
            CliDitherMethod::FloydSteinberg => Some(DitherMethod::FloydSteinberg),
            CliDitherMethod::None => None,
        }
    }
}

impl Display for CliDitherMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CliDitherMethod::Ordered => "ordered",
                CliDitherMethod::FloydSteinberg => "floyd-steinberg",
                CliDitherMethod::None => "none",
            }
        )
    }
}

#[derive(Parser)]
pub struct Options {
    /// Comma separated hex colors, e.g. '#000000,#FFFFFF'
    #[arg(short, long, value_parser = parse_palette)]
    palette: Palette,

    #[arg(short, long, default_value_t = CliDitherMethod::FloydSteinberg)]
    method: CliDitherMethod,

    #[arg(long, requires = "height", value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    #[arg(long, requires = "width", value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,

    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    #[arg(long)]
    verbose: bool,

    input: PathBuf,

    output: PathBuf,
}

fn parse_palette(s: &str) -> Result<Palette, String> {
    let colors = s.split(',').map(str::trim).collect::<Vec<_>>();
    if colors.len() > MAX_PALETTE_COLORS {
        return Err(format!(
            "a palette holds at most {MAX_PALETTE_COLORS} colors, got {}",
            colors.len()
        ));
    }
    Palette::from_hex(&colors).map_err(|e| format!("{e}"))
}

fn main() {
    let Options {
        palette,
        method,
        width,
        height,
        threads,
        verbose,
        input,
        output,
    } = Options::parse();

    macro_rules! log {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let image = log!("read image", image::open(input).unwrap().into_rgba8());
    let grid = Grid::from(&image);

    let mut pipeline = DitherPipeline::new(&grid, &palette);
    pipeline.dither(method.into());
    if let (Some(width), Some(height)) = (width, height) {
        pipeline.resize(width, height);
    }

    let image = log!(
        "resize and dither",
        match threads {
            0 => pipeline.rgbaimage_par(),
            1 => pipeline.rgbaimage(),
            t => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(t.into())
                    .build()
                    .unwrap();

                pool.install(|| pipeline.rgbaimage_par())
            }
        }
    )
    .unwrap();

    log!(
        "write image",
        image.save_with_format(output, ImageFormat::Png).unwrap()
    );
}
