//! A library for dithering images against a fixed color palette and for high quality resizing.
//!
//! `densendither` quantizes an image to the colors of a small, user supplied palette using either
//! ordered (Bayer) dithering or Floyd–Steinberg error diffusion. Nearest colors are found
//! using plain euclidean distance over the red, green, and blue channels.
//! It also provides a separable Lanczos-3 resampler to resize images before (or after) dithering.
//!
//! # Features
//! To reduce dependencies and compile times, `densendither` has several `cargo` features
//! that can be turned off or on:
//! - `pipelines`: exposes the [`DitherPipeline`] builder struct which serves as the high-level API.
//! - `threads`: exposes parallel versions of the ordered ditherer and the resampler via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # Core Operations
//! Palettes are given as hex strings (`#RRGGBB` or `#RRGGBBAA`).
//! Note that colors given with only 6 digits are assigned an alpha of [`DEFAULT_ALPHA`] (`244`).
//! ```
//! # use densendither::{closest_color, ordered_dither, diffusion_dither, resize_lanczos3, Grid, Pixel};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let palette = ["#000000", "#FF0000", "#FFFFFF"];
//!
//! let nearest = closest_color(Pixel::new(200, 30, 20, 255), &palette)?;
//! assert_eq!(nearest, Pixel::new(255, 0, 0, 244));
//!
//! let grid = Grid::filled(4, 4, Pixel::new(128, 64, 64, 255)).unwrap();
//! let ordered = ordered_dither(&grid, &palette)?;
//! let diffused = diffusion_dither(&grid, &palette)?;
//! let resized = resize_lanczos3(&grid, 8, 2).unwrap();
//! # Ok(())
//! # }
//! ```
//!
//! To dither many images against the same palette, parse it once into a [`Palette`]
//! and use [`Ordered`] or [`FloydSteinberg`] directly.
//!
//! # High-Level API
//! The [`DitherPipeline`] builder resizes and then dithers an image:
//! ```no_run
//! # use densendither::{DitherMethod, DitherPipeline, Grid, Palette};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgba8();
//! let grid = Grid::from(&img);
//! let palette = Palette::from_hex(&["#1D2B53", "#7E2553", "#FFF1E8"])?;
//!
//! let output = DitherPipeline::new(&grid, &palette)
//!     .resize(320, 240)
//!     .dither(Some(DitherMethod::Ordered))
//!     .rgbaimage_par()?;
//! # Ok(())
//! # }
//! ```
//!
//! Note that some of the options and functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod color_match;
mod dither;
mod resize;
mod types;

#[cfg(feature = "pipelines")]
mod api;

pub use color_match::*;
pub use dither::*;
pub use resize::*;
pub use types::*;

#[cfg(feature = "pipelines")]
pub use api::*;
