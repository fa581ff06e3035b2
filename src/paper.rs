//! Supported paper sizes.
//!
//! Pages are always laid out in landscape orientation, so every profile
//! stores the long edge as its width.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::FlipbookError;
use crate::geometry::Size;

/// A named physical page size.
///
/// # Example
///
/// ```
/// use flipbook::PaperSize;
///
/// let paper: PaperSize = "A4".parse()?;
/// assert_eq!(paper.dimensions().width, 297.0);
/// # Ok::<(), flipbook::FlipbookError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaperSize {
    /// ISO A5, 210 x 148 mm.
    A5,
    /// ISO A4, 297 x 210 mm. This is the default.
    #[default]
    A4,
    /// ISO A3, 420 x 297 mm.
    A3,
    /// US Letter, 279.4 x 215.9 mm.
    Letter,
    /// US Legal, 355.6 x 215.9 mm.
    Legal,
}

impl PaperSize {
    /// Every supported size, in the order they are listed to users.
    pub const ALL: [PaperSize; 5] = [
        PaperSize::A5,
        PaperSize::A4,
        PaperSize::A3,
        PaperSize::Letter,
        PaperSize::Legal,
    ];

    /// Landscape page dimensions in millimetres.
    pub const fn dimensions(self) -> Size {
        match self {
            PaperSize::A5 => Size::new(210.0, 148.0),
            PaperSize::A4 => Size::new(297.0, 210.0),
            PaperSize::A3 => Size::new(420.0, 297.0),
            PaperSize::Letter => Size::new(279.4, 215.9),
            PaperSize::Legal => Size::new(355.6, 215.9),
        }
    }

    /// The lowercase key used on the command line.
    pub const fn key(self) -> &'static str {
        match self {
            PaperSize::A5 => "a5",
            PaperSize::A4 => "a4",
            PaperSize::A3 => "a3",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
        }
    }
}

impl FromStr for PaperSize {
    type Err = FlipbookError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_ascii_lowercase();
        PaperSize::ALL
            .into_iter()
            .find(|paper| paper.key() == key)
            .ok_or_else(|| FlipbookError::UnknownPaperSize(value.to_string()))
    }
}

impl Display for PaperSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.key())
    }
}
