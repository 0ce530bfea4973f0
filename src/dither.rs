//! Contains the ordered and error diffusion dither implementations.

use crate::{Grid, Palette, PaletteError, Pixel};
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::{
    error::Error,
    fmt::{self, Display},
};

/// The 8x8 Bayer threshold matrix used by [`Ordered`] dithering.
///
/// Each value in `0..64` appears exactly once.
pub const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// The width of the range that the ordered dither threshold can shift a channel across.
const ORDERED_SPREAD: f64 = 64.0;

/// An error type for when dithering cannot produce an output image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DitherError {
    /// The palette is empty or contains a malformed color.
    Palette(PaletteError),
    /// The input grid has a width or height of `0`.
    DegenerateGrid {
        /// The width of the input grid.
        width: u32,
        /// The height of the input grid.
        height: u32,
    },
}

impl From<PaletteError> for DitherError {
    fn from(err: PaletteError) -> Self {
        DitherError::Palette(err)
    }
}

impl Display for DitherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DitherError::Palette(err) => write!(f, "{err}"),
            DitherError::DegenerateGrid { width, height } => {
                write!(f, "cannot dither a {width}x{height} image")
            }
        }
    }
}

impl Error for DitherError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DitherError::Palette(err) => Some(err),
            DitherError::DegenerateGrid { .. } => None,
        }
    }
}

/// Rounds to the nearest integer and saturates to the range of a `u8`.
#[inline]
pub(crate) fn clamp_round(value: f64) -> u8 {
    if value < 0.0 {
        0
    } else if value > 255.0 {
        u8::MAX
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            (value + 0.5) as u8
        }
    }
}

/// Ordered (Bayer) dithering using the fixed [`BAYER_8X8`] matrix.
///
/// Each pixel is perturbed by a position dependent threshold and then matched against the palette.
/// Pixels do not depend on one another, so this can be run in parallel.
///
/// The output pixels are the matched palette colors as is.
/// In particular, the alpha of each output pixel is the alpha of its palette color
/// (`244` for 6-digit hex entries) and not the alpha of the input pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ordered;

impl Ordered {
    /// Creates a new [`Ordered`] ditherer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The amount added to each color channel for the pixel at column `x` and row `y`.
    #[inline]
    fn offset(x: usize, y: usize) -> f64 {
        let threshold = f64::from(BAYER_8X8[y % 8][x % 8] + 1) / 65.0;
        (threshold - 0.5) * ORDERED_SPREAD
    }

    /// Dithers a single row of pixels into `out`.
    #[inline]
    fn dither_row(palette: &Palette, y: usize, row: &[Pixel], out: &mut [Pixel]) {
        for (x, (out, &pixel)) in out.iter_mut().zip(row).enumerate() {
            let offset = Self::offset(x, y);
            let perturb = |c: u8| clamp_round(f64::from(c) + offset);
            let perturbed = Pixel::new(
                perturb(pixel.red),
                perturb(pixel.green),
                perturb(pixel.blue),
                pixel.alpha,
            );
            *out = palette.nearest(perturbed);
        }
    }

    /// Performs ordered dithering on `grid`, returning a new grid with the same dimensions.
    ///
    /// # Errors
    /// Returns [`DitherError::DegenerateGrid`] if `grid` has a width or height of `0`.
    pub fn dither(&self, palette: &Palette, grid: &Grid) -> Result<Grid, DitherError> {
        let (width, height) = check_dimensions(grid)?;

        let mut pixels = vec![Pixel::default(); grid.pixels().len()];
        for (y, (row, out)) in grid
            .pixels()
            .chunks_exact(width as usize)
            .zip(pixels.chunks_exact_mut(width as usize))
            .enumerate()
        {
            Self::dither_row(palette, y, row, out);
        }

        Ok(Grid::new_unchecked(pixels, width, height))
    }
}

#[cfg(feature = "threads")]
impl Ordered {
    /// Performs ordered dithering on `grid` in parallel.
    ///
    /// The result is identical to [`Ordered::dither`].
    ///
    /// # Errors
    /// Returns [`DitherError::DegenerateGrid`] if `grid` has a width or height of `0`.
    pub fn dither_par(&self, palette: &Palette, grid: &Grid) -> Result<Grid, DitherError> {
        let (width, height) = check_dimensions(grid)?;

        let mut pixels = vec![Pixel::default(); grid.pixels().len()];
        grid.pixels()
            .par_chunks_exact(width as usize)
            .zip(pixels.par_chunks_exact_mut(width as usize))
            .enumerate()
            .for_each(|(y, (row, out))| Self::dither_row(palette, y, row, out));

        Ok(Grid::new_unchecked(pixels, width, height))
    }
}

/// Returns the dimensions of `grid`, or an error if it is degenerate.
fn check_dimensions(grid: &Grid) -> Result<(u32, u32), DitherError> {
    let (width, height) = grid.dimensions();
    if grid.is_empty() {
        Err(DitherError::DegenerateGrid { width, height })
    } else {
        Ok((width, height))
    }
}

/// Multiplies `other` by a scalar, `alpha`, and adds the result to `arr`.
#[inline]
fn arr_mul_add_assign<const N: usize>(arr: &mut [f64; N], alpha: f64, other: [f64; N]) {
    for i in 0..N {
        arr[i] += alpha * other[i];
    }
}

/// Floyd–Steinberg error diffusion dithering.
///
/// Pixels are processed in raster order (top to bottom, left to right),
/// and the quantization error of each pixel is pushed onto its unprocessed neighbors:
///
/// ```text
///          *   7/16
///  3/16  5/16  1/16
/// ```
///
/// Error that would land outside of the grid is dropped.
/// The alpha of each output pixel is the alpha of the corresponding input pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloydSteinberg;

/// The error accumulator for a pixel.
type Accum = [f64; 3];

impl FloydSteinberg {
    /// Creates a new [`FloydSteinberg`] ditherer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Performs error diffusion dithering on `grid`, returning a new grid with the same dimensions.
    ///
    /// A degenerate input grid is returned as is.
    #[must_use]
    pub fn dither(&self, palette: &Palette, grid: &Grid) -> Grid {
        if grid.is_empty() {
            return grid.clone();
        }

        let mut accum = grid
            .pixels()
            .iter()
            .map(|p| [p.red, p.green, p.blue].map(f64::from))
            .collect::<Vec<Accum>>();

        let pixels = diffuse(palette, grid, &mut accum);
        let (width, height) = grid.dimensions();
        Grid::new_unchecked(pixels, width, height)
    }
}

/// Runs the raster scan over a non-empty `grid`, returning the output pixels.
///
/// `accum` starts as the channels of `grid` and ends holding the error adjusted
/// value of each pixel at the time it was matched.
fn diffuse(palette: &Palette, grid: &Grid, accum: &mut [Accum]) -> Vec<Pixel> {
    let (w, h) = (grid.width() as usize, grid.height() as usize);

    let mut pixels = vec![Pixel::default(); grid.pixels().len()];

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let [r, g, b] = accum[i].map(clamp_round);
            let old = Pixel::new(r, g, b, grid.pixels()[i].alpha);

            let mut new = palette.nearest(old);
            new.alpha = old.alpha;
            pixels[i] = new;

            let err = [
                f64::from(r) - f64::from(new.red),
                f64::from(g) - f64::from(new.green),
                f64::from(b) - f64::from(new.blue),
            ];

            if x + 1 < w {
                arr_mul_add_assign(&mut accum[i + 1], 7.0 / 16.0, err);
            }
            if y + 1 < h {
                let below = i + w;
                if x > 0 {
                    arr_mul_add_assign(&mut accum[below - 1], 3.0 / 16.0, err);
                }
                arr_mul_add_assign(&mut accum[below], 5.0 / 16.0, err);
                if x + 1 < w {
                    arr_mul_add_assign(&mut accum[below + 1], 1.0 / 16.0, err);
                }
            }
        }
    }

    pixels
}

/// Performs [`Ordered`] dithering on `grid` using the given hex color `palette`.
///
/// # Errors
/// Returns a [`DitherError`] if the palette is empty or malformed, or if `grid` is degenerate.
pub fn ordered_dither<S: AsRef<str>>(grid: &Grid, palette: &[S]) -> Result<Grid, DitherError> {
    let palette = Palette::from_hex(palette)?;
    Ordered::new().dither(&palette, grid)
}

/// Performs [`Ordered`] dithering on `grid` in parallel using the given hex color `palette`.
///
/// # Errors
/// Returns a [`DitherError`] if the palette is empty or malformed, or if `grid` is degenerate.
#[cfg(feature = "threads")]
pub fn ordered_dither_par<S: AsRef<str>>(grid: &Grid, palette: &[S]) -> Result<Grid, DitherError> {
    let palette = Palette::from_hex(palette)?;
    Ordered::new().dither_par(&palette, grid)
}

/// Performs [`FloydSteinberg`] dithering on `grid` using the given hex color `palette`.
///
/// A degenerate `grid` is returned as is, as long as the palette is valid.
///
/// # Errors
/// Returns a [`DitherError`] if the palette is empty or malformed.
pub fn diffusion_dither<S: AsRef<str>>(grid: &Grid, palette: &[S]) -> Result<Grid, DitherError> {
    let palette = Palette::from_hex(palette)?;
    Ok(FloydSteinberg::new().dither(&palette, grid))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, HexError};

    fn gray(v: u8, alpha: u8) -> Pixel {
        Pixel::new(v, v, v, alpha)
    }

    fn black_white() -> Palette {
        Palette::from_hex(&["#000000", "#FFFFFF"]).unwrap()
    }

    fn assert_in_palette(palette: &Palette, grid: &Grid) {
        for p in grid.pixels() {
            assert!(
                palette
                    .colors()
                    .iter()
                    .any(|c| (c.red, c.green, c.blue) == (p.red, p.green, p.blue)),
                "{p:?} is not a palette color"
            );
        }
    }

    #[test]
    fn bayer_matrix_is_a_permutation() {
        let mut seen = [false; 64];
        for &v in BAYER_8X8.iter().flatten() {
            assert!(!seen[usize::from(v)]);
            seen[usize::from(v)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn clamp_round_saturates() {
        assert_eq!(clamp_round(-3.2), 0);
        assert_eq!(clamp_round(0.49), 0);
        assert_eq!(clamp_round(0.5), 1);
        assert_eq!(clamp_round(127.5), 128);
        assert_eq!(clamp_round(254.6), 255);
        assert_eq!(clamp_round(255.0), 255);
        assert_eq!(clamp_round(1000.0), 255);
    }

    #[test]
    fn ordered_offsets_stay_within_spread() {
        for y in 0..8 {
            for x in 0..8 {
                let offset = Ordered::offset(x, y);
                assert!(offset > -ORDERED_SPREAD / 2.0 && offset < ORDERED_SPREAD / 2.0);
                #[allow(clippy::float_cmp)]
                {
                    assert_eq!(offset, Ordered::offset(x + 8, y + 16));
                }
            }
        }
    }

    #[test]
    fn ordered_checkerboard_scenario() {
        let black = gray(0, 255);
        let white = gray(255, 255);
        let grid = Grid::from_rows(&[vec![black, white], vec![white, black]]).unwrap();

        let result = ordered_dither(&grid, &["#000000", "#FFFFFF"]).unwrap();

        let black = gray(0, 244);
        let white = gray(255, 244);
        assert_eq!(result.pixels(), &[black, white, white, black]);
    }

    #[test]
    fn ordered_alpha_comes_from_palette() {
        let palette = Palette::from_hex(&["#00000080", "#FFFFFF"]).unwrap();
        let grid = Grid::from_rows(&[vec![gray(10, 3), gray(240, 99)]]).unwrap();

        let result = Ordered::new().dither(&palette, &grid).unwrap();
        assert_eq!(result.pixels(), &[gray(0, 128), gray(255, 244)]);
    }

    #[test]
    fn ordered_produces_pattern_on_midtone() {
        let grid = Grid::filled(8, 8, gray(128, 255)).unwrap();
        let result = Ordered::new().dither(&black_white(), &grid).unwrap();

        // 128 + offset rounds to 128 or more (closer to white) once the rank reaches 31
        for (y, row) in result.rows().enumerate() {
            for (x, p) in row.iter().enumerate() {
                let expected = if BAYER_8X8[y][x] >= 31 { 255 } else { 0 };
                assert_eq!(p.red, expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn ordered_rejects_degenerate_grids() {
        let palette = black_white();
        for (width, height) in [(0, 0), (0, 4), (4, 0)] {
            let grid = Grid::filled(width, height, gray(0, 255)).unwrap();
            assert_eq!(
                Ordered::new().dither(&palette, &grid),
                Err(DitherError::DegenerateGrid { width, height })
            );
            #[cfg(feature = "threads")]
            {
                assert_eq!(
                    Ordered::new().dither_par(&palette, &grid),
                    Err(DitherError::DegenerateGrid { width, height })
                );
            }
        }
    }

    #[test]
    fn palette_errors_are_fatal() {
        let grid = Grid::filled(2, 2, gray(50, 255)).unwrap();

        assert_eq!(
            ordered_dither::<&str>(&grid, &[]),
            Err(DitherError::Palette(PaletteError::Empty))
        );
        assert_eq!(
            diffusion_dither(&grid, &["#000000", "white"]),
            Err(DitherError::Palette(PaletteError::ColorFormat {
                position: 1,
                color: "white".to_owned(),
                source: HexError::InvalidLength(5),
            }))
        );

        // the palette is checked even when there is nothing to dither
        let empty = Grid::filled(0, 0, gray(0, 0)).unwrap();
        assert!(diffusion_dither(&empty, &["#12"]).is_err());
    }

    #[test]
    fn diffusion_returns_degenerate_grid_unchanged() {
        let palette = black_white();
        for (width, height) in [(0, 0), (0, 4), (4, 0)] {
            let grid = Grid::filled(width, height, gray(0, 255)).unwrap();
            assert_eq!(FloydSteinberg::new().dither(&palette, &grid), grid);
        }
    }

    #[test]
    fn diffusion_preserves_input_alpha() {
        let palette = Palette::from_hex(&["#00000010", "#FFFFFF20"]).unwrap();
        let grid = Grid::from_rows(&[
            vec![gray(10, 0), gray(200, 77)],
            vec![gray(90, 255), gray(180, 1)],
        ])
        .unwrap();

        let result = FloydSteinberg::new().dither(&palette, &grid);
        let alphas = result.pixels().iter().map(|p| p.alpha).collect::<Vec<_>>();
        assert_eq!(alphas, [0, 77, 255, 1]);
    }

    #[test]
    fn diffusion_row_propagates_right() {
        // 100 -> black (error 100), 100 + 43.75 -> 144 -> white (error -111),
        // 100 - 48.5625 -> 51 -> black
        let grid = Grid::filled(3, 1, gray(100, 255)).unwrap();
        let result = FloydSteinberg::new().dither(&black_white(), &grid);
        assert_eq!(result.pixels(), &[gray(0, 255), gray(255, 255), gray(0, 255)]);
    }

    #[test]
    fn diffusion_column_propagates_down() {
        // 100 -> black (error 100), 100 + 31.25 -> 131 -> white (error -124),
        // 100 - 38.75 -> 61 -> black
        let grid = Grid::filled(1, 3, gray(100, 255)).unwrap();
        let result = FloydSteinberg::new().dither(&black_white(), &grid);
        assert_eq!(result.pixels(), &[gray(0, 255), gray(255, 255), gray(0, 255)]);
    }

    #[test]
    fn diffusion_drops_error_past_right_edge() {
        // With only the 5/16 share going down, every pixel stays black:
        // 60 -> 78.75 -> 84.69. If the 7/16 and 1/16 shares wrapped around to
        // the next row instead, the last pixel would cross over to white.
        let grid = Grid::filled(1, 3, gray(60, 255)).unwrap();
        let result = FloydSteinberg::new().dither(&black_white(), &grid);
        assert!(result.pixels().iter().all(|&p| p == gray(0, 255)));
    }

    #[test]
    fn diffusion_skips_out_of_bounds_neighbors() {
        let grid = Grid::filled(2, 2, gray(100, 255)).unwrap();
        let mut accum = vec![[100.0; 3]; 4];

        let pixels = diffuse(&black_white(), &grid, &mut accum);

        // (0, 0): 100 -> black, error 100; no 3/16 share past x = 0
        // (1, 0): 143.75 -> white, error -111; no 7/16 or 1/16 share past x = width - 1
        // (0, 1): 131.25 - 20.8125 -> black, error 110; nothing below y = height - 1
        // (1, 1): 106.25 - 34.6875 + 48.125
        #[allow(clippy::float_cmp)]
        {
            assert_eq!(
                accum.iter().map(|a| a[0]).collect::<Vec<_>>(),
                [100.0, 143.75, 110.4375, 119.6875]
            );
            assert!(accum.iter().all(|a| a[0] == a[1] && a[1] == a[2]));
        }
        assert_eq!(pixels, [gray(0, 255), gray(255, 255), gray(0, 255), gray(0, 255)]);
    }

    /// Floyd–Steinberg on nested rows, following the raster scan directly.
    fn reference_diffusion(palette: &Palette, grid: &Grid) -> Vec<Pixel> {
        let (w, h) = (grid.width() as i64, grid.height() as i64);
        let mut work = grid
            .rows()
            .map(|row| {
                row.iter()
                    .map(|p| [p.red, p.green, p.blue].map(f64::from))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let mut out = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let [r, g, b] = work[y as usize][x as usize].map(clamp_round);
                let input = grid.get(x as u32, y as u32).unwrap();
                let mut new = palette.nearest(Pixel::new(r, g, b, input.alpha));
                new.alpha = input.alpha;
                out.push(new);

                let err = [
                    f64::from(r) - f64::from(new.red),
                    f64::from(g) - f64::from(new.green),
                    f64::from(b) - f64::from(new.blue),
                ];

                for (dx, dy, weight) in [(1, 0, 7.0), (-1, 1, 3.0), (0, 1, 5.0), (1, 1, 1.0)] {
                    let (nx, ny) = (x + dx, y + dy);
                    if (0..w).contains(&nx) && (0..h).contains(&ny) {
                        let cell = &mut work[ny as usize][nx as usize];
                        for c in 0..3 {
                            cell[c] += weight / 16.0 * err[c];
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn diffusion_matches_reference_scan() {
        let palette = Palette::new(test_data_256()[..8].to_vec()).unwrap();
        let grid = test_grid(37, 23);

        let result = FloydSteinberg::new().dither(&palette, &grid);
        assert_eq!(result.dimensions(), grid.dimensions());
        assert_eq!(result.pixels(), reference_diffusion(&palette, &grid));
    }

    #[test]
    fn outputs_are_palette_colors() {
        let palette = Palette::new(test_data_256()[..5].to_vec()).unwrap();
        let grid = test_grid(32, 32);

        assert_in_palette(&palette, &Ordered::new().dither(&palette, &grid).unwrap());
        assert_in_palette(&palette, &FloydSteinberg::new().dither(&palette, &grid));
    }

    #[test]
    fn exact_match_image_unaffected() {
        let palette = Palette::new(test_data_256()[..16].to_vec()).unwrap();
        let grid = {
            let pixels = (0..(32 * 32))
                .map(|i| palette.colors()[(i * 7) % palette.len()])
                .collect();
            Grid::new(pixels, 32, 32).unwrap()
        };

        let result = FloydSteinberg::new().dither(&palette, &grid);
        assert_eq!(result, grid);
        assert_eq!(FloydSteinberg::new().dither(&palette, &result), result);

        // the ordered threshold cannot move a channel across a gap of more than 64
        let palette = black_white();
        let grid = Ordered::new()
            .dither(&palette, &test_grid(16, 16))
            .unwrap();
        let again = Ordered::new().dither(&palette, &grid).unwrap();
        assert_eq!(again, grid);
    }

    #[test]
    #[cfg(feature = "threads")]
    fn parallel_matches_serial() {
        let palette = Palette::new(test_data_256()[..12].to_vec()).unwrap();
        let grid = test_grid(61, 47);

        assert_eq!(
            Ordered::new().dither_par(&palette, &grid),
            Ordered::new().dither(&palette, &grid)
        );
    }
}
