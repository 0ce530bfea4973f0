//! Contains the separable Lanczos-3 resampler.
//!
//! Resizing is done in two passes: one along each axis.
//! Each pass computes, for every output coordinate, the position in the source image
//! that the output pixel is centered on and takes a weighted average of the source pixels
//! within a window of radius [`Lanczos3::RADIUS`] around that position.
//! Taps that fall outside of the source image are clamped to the nearest edge pixel.
//!
//! The weighted average is always normalized by the sum of the weights actually used,
//! so a uniformly colored image stays uniformly colored.
//! All four channels, including alpha, are filtered the same way.

use crate::{dither::clamp_round, Grid, Pixel};
#[cfg(feature = "threads")]
use rayon::prelude::*;
use wide::f64x4;

/// A fully transparent black pixel.
const TRANSPARENT: Pixel = Pixel::new(0, 0, 0, 0);

/// The windowed sinc (Lanczos) kernel with a support radius of `a`.
///
/// # Examples
/// ```
/// # use densendither::lanczos;
/// assert_eq!(lanczos(0.0, 3.0), 1.0);
/// assert_eq!(lanczos(3.0, 3.0), 0.0);
/// assert!((lanczos(0.5, 3.0) - lanczos(-0.5, 3.0)).abs() < 1e-12);
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn lanczos(x: f64, a: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pix = std::f64::consts::PI * x;
    let pix_a = pix / a;
    (pix.sin() / pix) * (pix_a.sin() / pix_a)
}

/// The order in which the two resampling passes are applied.
///
/// The Lanczos filter is separable, so both orders compute the same result
/// up to rounding. Since the intermediate image is rounded to 8 bits per channel,
/// the order can change the output by a small amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassOrder {
    /// Resample each row to the new width first, then each column to the new height.
    #[default]
    HorizontalFirst,
    /// Resample each column to the new height first, then each row to the new width.
    VerticalFirst,
}

/// The source window and weights for a single output coordinate along one axis.
#[derive(Debug, Clone)]
struct Taps {
    /// The (possibly negative) source index of the first weight.
    start: i64,
    /// The kernel weight for each source index starting at `start`.
    weights: Vec<f64>,
    /// The sum of `weights`.
    sum: f64,
}

impl Taps {
    /// Computes the taps for every output coordinate when resampling an axis
    /// of length `src_len` to length `dst_len`.
    fn for_axis(src_len: u32, dst_len: u32) -> Vec<Self> {
        let a = Lanczos3::RADIUS;
        let ratio = f64::from(src_len) / f64::from(dst_len);

        (0..dst_len)
            .map(|dst| {
                let src = (f64::from(dst) + 0.5) * ratio - 0.5;

                #[allow(clippy::cast_possible_truncation)]
                let (min, max) = ((src - a + 1.0).floor() as i64, (src + a).floor() as i64);

                #[allow(clippy::cast_precision_loss)]
                let weights = (min..=max)
                    .map(|tap| lanczos(src - tap as f64, a))
                    .collect::<Vec<_>>();

                let sum = weights.iter().sum();
                Self { start: min, weights, sum }
            })
            .collect()
    }

    /// Computes the filtered pixel for this output coordinate,
    /// where `pixel_at(i)` returns the `i`-th source pixel along the axis.
    #[inline]
    #[allow(clippy::float_cmp)]
    fn sample(&self, len: usize, pixel_at: impl Fn(usize) -> Pixel) -> Pixel {
        if self.sum == 0.0 {
            return TRANSPARENT;
        }

        let last = len - 1;
        let mut acc = f64x4::splat(0.0);
        for (tap, &weight) in (self.start..).zip(&self.weights) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let i = if tap < 0 { 0 } else { (tap as usize).min(last) };

            let p = pixel_at(i);
            let p = f64x4::new([p.red, p.green, p.blue, p.alpha].map(f64::from));
            acc = acc + p * f64x4::splat(weight);
        }

        let [r, g, b, a] = (acc / f64x4::splat(self.sum)).to_array().map(clamp_round);
        Pixel::new(r, g, b, a)
    }
}

/// Resamples a single row of `src_row` into `out` along the horizontal axis.
#[inline]
fn horizontal_row(taps: &[Taps], src_row: &[Pixel], out: &mut [Pixel]) {
    for (out, taps) in out.iter_mut().zip(taps) {
        *out = taps.sample(src_row.len(), |x| src_row[x]);
    }
}

/// Computes an output row of the vertical pass, where `taps` are the taps for that row.
#[inline]
fn vertical_row(taps: &Taps, src: &Grid, out: &mut [Pixel]) {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let pixels = src.pixels();
    for (x, out) in out.iter_mut().enumerate() {
        *out = taps.sample(height, |y| pixels[y * width + x]);
    }
}

/// Lanczos-3 resampling.
///
/// # Examples
/// ```
/// # use densendither::{Grid, Lanczos3, PassOrder, Pixel};
/// let red = Pixel::new(255, 0, 0, 255);
/// let grid = Grid::filled(1, 1, red).unwrap();
///
/// let resized = Lanczos3::new()
///     .pass_order(PassOrder::VerticalFirst)
///     .resize(&grid, 4, 4)
///     .unwrap();
///
/// assert_eq!(resized.dimensions(), (4, 4));
/// assert!(resized.pixels().iter().all(|&p| p == red));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Lanczos3 {
    /// The order of the two resampling passes.
    pass_order: PassOrder,
}

impl Lanczos3 {
    /// The support radius (`a`) of the kernel.
    pub const RADIUS: f64 = 3.0;

    /// Creates a new [`Lanczos3`] resampler that resizes horizontally first.
    #[must_use]
    pub const fn new() -> Self {
        Self { pass_order: PassOrder::HorizontalFirst }
    }

    /// Sets the order in which the two passes are applied.
    ///
    /// The default is [`PassOrder::HorizontalFirst`].
    #[must_use]
    pub const fn pass_order(mut self, pass_order: PassOrder) -> Self {
        self.pass_order = pass_order;
        self
    }

    /// Gets the pass order for this [`Lanczos3`].
    #[must_use]
    pub const fn get_pass_order(&self) -> PassOrder {
        self.pass_order
    }

    /// Resizes `grid` to `width` by `height`, returning a new grid.
    ///
    /// Returns `None` if `grid` is degenerate (has a width or height of `0`).
    /// A `width` or `height` of `0` results in an empty grid.
    #[must_use]
    pub fn resize(&self, grid: &Grid, width: u32, height: u32) -> Option<Grid> {
        if grid.is_empty() {
            return None;
        }
        if width == 0 || height == 0 {
            return Some(Grid::new_unchecked(Vec::new(), width, height));
        }

        Some(match self.pass_order {
            PassOrder::HorizontalFirst => vertical(&horizontal(grid, width), height),
            PassOrder::VerticalFirst => horizontal(&vertical(grid, height), width),
        })
    }
}

/// Resamples every row of `src` to `width`.
fn horizontal(src: &Grid, width: u32) -> Grid {
    let taps = Taps::for_axis(src.width(), width);
    let height = src.height();
    let mut pixels = vec![TRANSPARENT; width as usize * height as usize];

    for (row, out) in src.rows().zip(pixels.chunks_exact_mut(width as usize)) {
        horizontal_row(&taps, row, out);
    }

    Grid::new_unchecked(pixels, width, height)
}

/// Resamples every column of `src` to `height`.
fn vertical(src: &Grid, height: u32) -> Grid {
    let taps = Taps::for_axis(src.height(), height);
    let width = src.width();
    let mut pixels = vec![TRANSPARENT; width as usize * height as usize];

    for (taps, out) in taps.iter().zip(pixels.chunks_exact_mut(width as usize)) {
        vertical_row(taps, src, out);
    }

    Grid::new_unchecked(pixels, width, height)
}

#[cfg(feature = "threads")]
impl Lanczos3 {
    /// Resizes `grid` to `width` by `height` in parallel.
    ///
    /// The result is identical to [`Lanczos3::resize`].
    #[must_use]
    pub fn resize_par(&self, grid: &Grid, width: u32, height: u32) -> Option<Grid> {
        if grid.is_empty() {
            return None;
        }
        if width == 0 || height == 0 {
            return Some(Grid::new_unchecked(Vec::new(), width, height));
        }

        Some(match self.pass_order {
            PassOrder::HorizontalFirst => vertical_par(&horizontal_par(grid, width), height),
            PassOrder::VerticalFirst => horizontal_par(&vertical_par(grid, height), width),
        })
    }
}

/// Resamples every row of `src` to `width` in parallel.
#[cfg(feature = "threads")]
fn horizontal_par(src: &Grid, width: u32) -> Grid {
    let taps = Taps::for_axis(src.width(), width);
    let height = src.height();
    let mut pixels = vec![TRANSPARENT; width as usize * height as usize];

    src.pixels()
        .par_chunks_exact(src.width() as usize)
        .zip(pixels.par_chunks_exact_mut(width as usize))
        .for_each(|(row, out)| horizontal_row(&taps, row, out));

    Grid::new_unchecked(pixels, width, height)
}

/// Resamples every column of `src` to `height` in parallel.
#[cfg(feature = "threads")]
fn vertical_par(src: &Grid, height: u32) -> Grid {
    let taps = Taps::for_axis(src.height(), height);
    let width = src.width();
    let mut pixels = vec![TRANSPARENT; width as usize * height as usize];

    taps.par_iter()
        .zip(pixels.par_chunks_exact_mut(width as usize))
        .for_each(|(taps, out)| vertical_row(taps, src, out));

    Grid::new_unchecked(pixels, width, height)
}

/// Resizes `grid` to `width` by `height` using [`Lanczos3`] with the default pass order.
///
/// Returns `None` if `grid` is degenerate (has a width or height of `0`).
#[must_use]
pub fn resize_lanczos3(grid: &Grid, width: u32, height: u32) -> Option<Grid> {
    Lanczos3::new().resize(grid, width, height)
}

/// Resizes `grid` to `width` by `height` in parallel using [`Lanczos3`] with the default pass order.
///
/// Returns `None` if `grid` is degenerate (has a width or height of `0`).
#[cfg(feature = "threads")]
#[must_use]
pub fn resize_lanczos3_par(grid: &Grid, width: u32, height: u32) -> Option<Grid> {
    Lanczos3::new().resize_par(grid, width, height)
}
