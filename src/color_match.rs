//! Contains hex color parsing, the decoded [`Palette`] type, and nearest color matching.

use crate::Pixel;
use std::{
    error::Error,
    fmt::{self, Display},
};

/// The alpha value assigned to colors parsed from 6-digit hex strings.
///
/// Note that this is `244` and not `255`.
pub const DEFAULT_ALPHA: u8 = 244;

/// An error type for when a string is not a valid 6 or 8 digit hex color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexError {
    /// The number of digits (after stripping an optional leading `#`) was not 6 or 8.
    ///
    /// The inner value is the number of bytes that were found.
    InvalidLength(usize),
    /// A non-hexadecimal character was encountered.
    InvalidDigit,
}

impl Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexError::InvalidLength(len) => {
                write!(f, "invalid hex color length of {len} (expected 6 or 8 digits)")
            }
            HexError::InvalidDigit => write!(f, "invalid hex digit"),
        }
    }
}

impl Error for HexError {}

/// An error type for when a palette cannot be used for color matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    /// The palette has no colors.
    Empty,
    /// A palette entry is not a valid 6 or 8 digit hex color.
    ColorFormat {
        /// The index of the offending entry in the palette.
        position: usize,
        /// The offending entry.
        color: String,
        /// Why the entry could not be parsed.
        source: HexError,
    },
}

impl Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteError::Empty => write!(f, "palette cannot be empty"),
            PaletteError::ColorFormat { position, color, .. } => {
                write!(f, "invalid color at position {position}: {color:?}")
            }
        }
    }
}

impl Error for PaletteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PaletteError::Empty => None,
            PaletteError::ColorFormat { source, .. } => Some(source),
        }
    }
}

/// Parses a single pair of hex digits.
fn hex_byte(pair: &[u8]) -> u8 {
    /// The value of a single hex digit that is already known to be valid.
    fn nibble(digit: u8) -> u8 {
        match digit {
            b'0'..=b'9' => digit - b'0',
            b'a'..=b'f' => digit - b'a' + 10,
            _ => digit - b'A' + 10,
        }
    }

    (nibble(pair[0]) << 4) | nibble(pair[1])
}

/// Parses a hex color string of the form `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
///
/// A 6-digit string is given an alpha of [`DEFAULT_ALPHA`].
///
/// # Examples
/// ```
/// # use densendither::{parse_hex, HexError, Pixel};
/// assert_eq!(parse_hex("#FF0000"), Ok(Pixel::new(255, 0, 0, 244)));
/// assert_eq!(parse_hex("#FF000080"), Ok(Pixel::new(255, 0, 0, 128)));
/// assert_eq!(parse_hex("#F00"), Err(HexError::InvalidLength(3)));
/// ```
///
/// # Errors
/// Returns a [`HexError`] if the string has the wrong length or contains a non-hex digit.
pub fn parse_hex(hex: &str) -> Result<Pixel, HexError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex).as_bytes();

    if digits.len() != 6 && digits.len() != 8 {
        return Err(HexError::InvalidLength(digits.len()));
    }

    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(HexError::InvalidDigit);
    }

    let mut bytes = digits.chunks_exact(2).map(hex_byte);
    let mut next = || bytes.next().unwrap_or(DEFAULT_ALPHA);
    let (red, green, blue, alpha) = (next(), next(), next(), next());
    Ok(Pixel::new(red, green, blue, alpha))
}

/// Squared euclidean distance between the red, green, and blue channels of two pixels.
///
/// Alpha does not contribute to the distance.
#[inline]
pub(crate) fn squared_rgb_distance(x: Pixel, y: Pixel) -> u32 {
    let d = |a: u8, b: u8| {
        let d = u32::from(a.abs_diff(b));
        d * d
    };
    d(x.red, y.red) + d(x.green, y.green) + d(x.blue, y.blue)
}

/// A non-empty, ordered list of decoded palette colors.
///
/// Hex strings are parsed once when creating the palette,
/// so that color matching works directly on [`Pixel`]s.
///
/// # Examples
/// ```
/// # use densendither::{Palette, Pixel};
/// # fn main() -> Result<(), densendither::PaletteError> {
/// let palette = Palette::from_hex(&["#000000", "#FFFFFF"])?;
/// let nearest = palette.nearest(Pixel::new(200, 180, 220, 255));
/// assert_eq!(nearest, Pixel::new(255, 255, 255, 244));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// The palette colors in their original order.
    colors: Vec<Pixel>,
}

impl Palette {
    /// Creates a new [`Palette`] from already decoded colors.
    ///
    /// # Errors
    /// Returns [`PaletteError::Empty`] if `colors` is empty.
    pub fn new(colors: Vec<Pixel>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            Err(PaletteError::Empty)
        } else {
            Ok(Self { colors })
        }
    }

    /// Creates a new [`Palette`] by parsing each hex color string (see [`parse_hex`]).
    ///
    /// # Errors
    /// Returns [`PaletteError::ColorFormat`] for the first entry that fails to parse,
    /// or [`PaletteError::Empty`] if there are no entries.
    pub fn from_hex<S: AsRef<str>>(hex: &[S]) -> Result<Self, PaletteError> {
        let colors = hex
            .iter()
            .enumerate()
            .map(|(position, color)| {
                let color = color.as_ref();
                parse_hex(color).map_err(|source| PaletteError::ColorFormat {
                    position,
                    color: color.to_owned(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(colors)
    }

    /// Returns the palette colors in their original order.
    #[must_use]
    pub fn colors(&self) -> &[Pixel] {
        &self.colors
    }

    /// Returns the number of colors in the palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always returns `false`, since a [`Palette`] cannot be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Returns the index of the palette color closest to `color`.
    ///
    /// Distance is the squared euclidean distance over red, green, and blue.
    /// If multiple palette colors are equally close, the first one is chosen.
    #[must_use]
    pub fn nearest_index(&self, color: Pixel) -> usize {
        // min_by_key returns the first of several equal minimums
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|&(_, &candidate)| squared_rgb_distance(color, candidate))
            .map_or(0, |(i, _)| i)
    }

    /// Returns the palette color closest to `color` (see [`Palette::nearest_index`]).
    ///
    /// The palette color is returned as is, including its alpha.
    #[must_use]
    pub fn nearest(&self, color: Pixel) -> Pixel {
        self.colors[self.nearest_index(color)]
    }
}

/// Returns the color in the hex `palette` that is closest to `color`.
///
/// # Errors
/// Returns a [`PaletteError`] if the palette is empty or has a malformed entry.
pub fn closest_color<S: AsRef<str>>(color: Pixel, palette: &[S]) -> Result<Pixel, PaletteError> {
    Palette::from_hex(palette).map(|palette| palette.nearest(color))
}
