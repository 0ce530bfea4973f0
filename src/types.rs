//! Contains the pixel and grid types shared across the crate.

use palette::Srgba;
#[cfg(feature = "image")]
use {
    image::RgbaImage,
    palette::cast::{ComponentsAs, IntoComponents},
};

/// A single pixel with four independent 8-bit channels (red, green, blue, alpha).
///
/// Equality is exact channel equality.
pub type Pixel = Srgba<u8>;

/// A rectangular, row-major grid of [`Pixel`]s.
///
/// The pixels are stored in a single flat buffer alongside the width and height,
/// and it is guaranteed that `pixels.len() == width * height`.
/// A grid with a width or height of `0` is the degenerate empty grid.
///
/// # Examples
/// ```
/// # use densendither::{Grid, Pixel};
/// let black = Pixel::new(0, 0, 0, 255);
/// let grid = Grid::new(vec![black; 6], 3, 2).unwrap();
/// assert_eq!(grid.dimensions(), (3, 2));
/// assert_eq!(grid.get(2, 1), Some(black));
///
/// // the buffer length must match the dimensions
/// assert!(Grid::new(vec![black; 5], 3, 2).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// The pixels in row-major order.
    pixels: Vec<Pixel>,
    /// The number of pixels in each row.
    width: u32,
    /// The number of rows.
    height: u32,
}

/// The number of pixels in a `width` by `height` grid, if it fits in a `usize`.
fn area(width: u32, height: u32) -> Option<usize> {
    usize::try_from(u64::from(width) * u64::from(height)).ok()
}

impl Grid {
    /// Creates a [`Grid`] without checking that the buffer length matches the dimensions.
    pub(crate) fn new_unchecked(pixels: Vec<Pixel>, width: u32, height: u32) -> Self {
        debug_assert_eq!(area(width, height), Some(pixels.len()));
        Self { pixels, width, height }
    }

    /// Creates a new [`Grid`] from a flat, row-major buffer of pixels.
    ///
    /// Returns `None` if the length of `pixels` is not equal to `width * height`.
    #[must_use]
    pub fn new(pixels: Vec<Pixel>, width: u32, height: u32) -> Option<Self> {
        if area(width, height) == Some(pixels.len()) {
            Some(Self { pixels, width, height })
        } else {
            None
        }
    }

    /// Creates a new [`Grid`] where every pixel is `pixel`.
    ///
    /// Returns `None` if the grid would not fit in memory addressable by a `usize`.
    #[must_use]
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Option<Self> {
        area(width, height).map(|len| Self::new_unchecked(vec![pixel; len], width, height))
    }

    /// Creates a new [`Grid`] from nested rows of pixels.
    ///
    /// Returns `None` if the rows do not all have the same length
    /// or if the number of rows or the row length does not fit in a `u32`.
    #[must_use]
    pub fn from_rows(rows: &[Vec<Pixel>]) -> Option<Self> {
        let height = u32::try_from(rows.len()).ok()?;
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        let width = u32::try_from(width).ok()?;
        Some(Self::new_unchecked(rows.concat(), width, height))
    }

    /// Returns the width of the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the `(width, height)` of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns whether this grid is degenerate (a width or height of `0`).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the pixels as a flat, row-major slice.
    #[must_use]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Consumes the grid, returning the flat, row-major pixel buffer.
    #[must_use]
    pub fn into_pixels(self) -> Vec<Pixel> {
        self.pixels
    }

    /// Returns the pixel at column `x` and row `y`, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Returns the `y`-th row of pixels.
    ///
    /// # Panics
    /// Panics if `y` is not less than the height of the grid.
    #[must_use]
    pub fn row(&self, y: u32) -> &[Pixel] {
        assert!(y < self.height, "row {y} is out of bounds");
        let width = self.width as usize;
        let start = y as usize * width;
        &self.pixels[start..(start + width)]
    }

    /// Returns an iterator over the rows of the grid.
    ///
    /// A grid with a width of `0` still yields `height` empty rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> + '_ {
        (0..self.height).map(|y| self.row(y))
    }
}

#[cfg(feature = "image")]
impl From<&RgbaImage> for Grid {
    fn from(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let len = image.pixels().len();
        let pixels: &[Pixel] = image.as_raw()[..(len * 4)].components_as();
        Self::new_unchecked(pixels.to_vec(), width, height)
    }
}

#[cfg(feature = "image")]
impl From<Grid> for RgbaImage {
    fn from(grid: Grid) -> Self {
        let (width, height) = grid.dimensions();
        let buf: Vec<u8> = grid.into_pixels().into_components();

        #[allow(clippy::expect_used)]
        {
            // the grid invariant guarantees buf.len() == width * height * 4
            RgbaImage::from_vec(width, height, buf).expect("large enough buffer")
        }
    }
}
