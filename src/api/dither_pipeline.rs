//! Contains the [`DitherPipeline`] builder struct for the high level API.

use crate::{DitherError, FloydSteinberg, Grid, Lanczos3, Ordered, Palette, PassOrder};
#[cfg(feature = "image")]
use image::RgbaImage;
use std::borrow::Cow;

/// The supported dither methods.
///
/// See the documentation of [`Ordered`] and [`FloydSteinberg`] for more details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMethod {
    /// Ordered dithering using an 8x8 Bayer matrix.
    ///
    /// This produces a regular dot pattern and each pixel is dithered independently.
    Ordered,
    /// Floyd–Steinberg error diffusion.
    ///
    /// This produces a smoother, less regular pattern but must be run sequentially.
    #[default]
    FloydSteinberg,
}

/// A builder struct to specify options to resize and dither an image.
///
/// # Examples
/// ```
/// # use densendither::{DitherMethod, DitherPipeline, Grid, Palette, Pixel};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let palette = Palette::from_hex(&["#000000", "#FFFFFF"])?;
/// let grid = Grid::filled(16, 16, Pixel::new(100, 100, 100, 255)).unwrap();
///
/// let output = DitherPipeline::new(&grid, &palette)
///     .resize(32, 8)
///     .dither(Some(DitherMethod::Ordered))
///     .run()?;
///
/// assert_eq!(output.dimensions(), (32, 8));
/// # Ok(())
/// # }
/// ```
///
/// The image is always resized before it is dithered.
#[must_use]
#[derive(Debug, Clone)]
pub struct DitherPipeline<'a> {
    /// The input image.
    grid: &'a Grid,
    /// The palette to dither against.
    palette: &'a Palette,
    /// The dimensions to resize to, if any.
    resize: Option<(u32, u32)>,
    /// The Lanczos resampler to use when resizing.
    resampler: Lanczos3,
    /// The dither method to use, if any.
    dither: Option<DitherMethod>,
}

impl<'a> DitherPipeline<'a> {
    /// Creates a new [`DitherPipeline`] with default options.
    ///
    /// By default, the image is not resized and is dithered using [`DitherMethod::FloydSteinberg`].
    pub fn new(grid: &'a Grid, palette: &'a Palette) -> Self {
        Self {
            grid,
            palette,
            resize: None,
            resampler: Lanczos3::new(),
            dither: Some(DitherMethod::default()),
        }
    }

    /// Sets the dimensions to resize the image to before dithering.
    pub fn resize(&mut self, width: u32, height: u32) -> &mut Self {
        self.resize = Some((width, height));
        self
    }

    /// Sets the order of the resampling passes.
    ///
    /// The default is [`PassOrder::HorizontalFirst`].
    pub fn pass_order(&mut self, pass_order: PassOrder) -> &mut Self {
        self.resampler = self.resampler.pass_order(pass_order);
        self
    }

    /// Sets the dither method to use, or `None` to skip dithering.
    ///
    /// The default is [`DitherMethod::FloydSteinberg`].
    pub fn dither(&mut self, method: Option<DitherMethod>) -> &mut Self {
        self.dither = method;
        self
    }

    /// Returns the error for a degenerate input grid.
    fn degenerate(&self) -> DitherError {
        let (width, height) = self.grid.dimensions();
        DitherError::DegenerateGrid { width, height }
    }

    /// Runs the pipeline and returns the output image.
    ///
    /// # Errors
    /// Returns [`DitherError::DegenerateGrid`] if the input grid (or the resized grid) is degenerate,
    /// except that a degenerate grid is returned as is when only Floyd–Steinberg dithering is applied.
    pub fn run(&self) -> Result<Grid, DitherError> {
        let grid = match self.resize {
            Some((width, height)) => Cow::Owned(
                self.resampler
                    .resize(self.grid, width, height)
                    .ok_or_else(|| self.degenerate())?,
            ),
            None => Cow::Borrowed(self.grid),
        };

        match self.dither {
            Some(DitherMethod::Ordered) => Ordered::new().dither(self.palette, &grid),
            Some(DitherMethod::FloydSteinberg) => {
                Ok(FloydSteinberg::new().dither(self.palette, &grid))
            }
            None => Ok(grid.into_owned()),
        }
    }
}

#[cfg(feature = "threads")]
impl<'a> DitherPipeline<'a> {
    /// Runs the pipeline in parallel and returns the output image.
    ///
    /// Floyd–Steinberg dithering is always run on the current thread,
    /// but resizing and ordered dithering are run in parallel.
    ///
    /// # Errors
    /// See [`DitherPipeline::run`].
    pub fn run_par(&self) -> Result<Grid, DitherError> {
        let grid = match self.resize {
            Some((width, height)) => Cow::Owned(
                self.resampler
                    .resize_par(self.grid, width, height)
                    .ok_or_else(|| self.degenerate())?,
            ),
            None => Cow::Borrowed(self.grid),
        };

        match self.dither {
            Some(DitherMethod::Ordered) => Ordered::new().dither_par(self.palette, &grid),
            Some(DitherMethod::FloydSteinberg) => {
                Ok(FloydSteinberg::new().dither(self.palette, &grid))
            }
            None => Ok(grid.into_owned()),
        }
    }
}

#[cfg(feature = "image")]
impl<'a> DitherPipeline<'a> {
    /// Runs the pipeline and returns the output as an [`RgbaImage`].
    ///
    /// # Errors
    /// See [`DitherPipeline::run`].
    pub fn rgbaimage(&self) -> Result<RgbaImage, DitherError> {
        self.run().map(RgbaImage::from)
    }
}

#[cfg(all(feature = "image", feature = "threads"))]
impl<'a> DitherPipeline<'a> {
    /// Runs the pipeline in parallel and returns the output as an [`RgbaImage`].
    ///
    /// # Errors
    /// See [`DitherPipeline::run`].
    pub fn rgbaimage_par(&self) -> Result<RgbaImage, DitherError> {
        self.run_par().map(RgbaImage::from)
    }
}
