#![allow(dead_code)]

use std::sync::OnceLock;

use densendither::{Grid, Palette, Pixel};

/// Benchmark grid sizes as `(name, width, height)`.
pub const SIZES: [(&str, u32, u32); 3] = [
    ("small", 160, 120),
    ("medium", 640, 480),
    ("large", 1920, 1080),
];

/// A diagonal gradient with a different ramp on each channel.
pub fn gradient(width: u32, height: u32) -> Grid {
    let w = u64::from(width.max(2) - 1);
    let h = u64::from(height.max(2) - 1);

    #[allow(clippy::cast_possible_truncation)]
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let (x, y) = (u64::from(x), u64::from(y));
                Pixel::new(
                    (x * 255 / w) as u8,
                    (y * 255 / h) as u8,
                    ((x + y) * 255 / (w + h)) as u8,
                    255,
                )
            })
        })
        .collect();

    Grid::new(pixels, width, height).unwrap()
}

pub fn gradients() -> &'static [(String, Grid)] {
    static GRADIENTS: OnceLock<Vec<(String, Grid)>> = OnceLock::new();
    GRADIENTS.get_or_init(|| {
        SIZES
            .iter()
            .map(|&(name, width, height)| (name.to_owned(), gradient(width, height)))
            .collect()
    })
}

/// Palettes of increasing size, up to the ten colors the CLI allows.
pub fn palettes() -> Vec<(String, Palette)> {
    let hex = [
        "#000000", "#FFFFFF", "#FF004D", "#29ADFF", "#00E436", "#FFEC27", "#7E2553", "#1D2B53",
        "#AB5236", "#C2C3C7",
    ];

    [2, 4, 10]
        .into_iter()
        .map(|n| (n.to_string(), Palette::from_hex(&hex[..n]).unwrap()))
        .collect()
}
