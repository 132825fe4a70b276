use image::Rgb;

use crate::errors::{AnnotateError, Result};

/// Per-pixel classification used by the label mask.
///
/// The discriminants are the values stored in the mask and handed to the
/// segmenter, so they must stay `0..=3` in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Label {
    #[default]
    Background = 0,
    Foreground = 1,
    ProbableBackground = 2,
    ProbableForeground = 3,
}

impl Label {
    pub const ALL: [Label; 4] = [
        Label::Background,
        Label::Foreground,
        Label::ProbableBackground,
        Label::ProbableForeground,
    ];

    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Colour used to paint strokes of this label on the input view.
    pub const fn color(self) -> Rgb<u8> {
        match self {
            Label::Background => Rgb([255, 0, 0]),
            Label::Foreground => Rgb([0, 255, 0]),
            Label::ProbableBackground => Rgb([255, 128, 128]),
            Label::ProbableForeground => Rgb([128, 255, 128]),
        }
    }

    /// Whether the pixel ends up in the extracted cut-out.
    pub const fn is_foreground(self) -> bool {
        matches!(self, Label::Foreground | Label::ProbableForeground)
    }

    /// Probable labels are the only ones a segmenter may rewrite.
    pub const fn is_probable(self) -> bool {
        matches!(self, Label::ProbableBackground | Label::ProbableForeground)
    }

    pub const fn describe(self) -> &'static str {
        match self {
            Label::Background => "red brush, marking sure background",
            Label::Foreground => "green brush, marking sure foreground",
            Label::ProbableBackground => "light red brush, marking probable background",
            Label::ProbableForeground => "light green brush, marking probable foreground",
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = AnnotateError;

    fn try_from(value: u8) -> Result<Self> {
        Label::ALL
            .into_iter()
            .find(|label| label.value() == value)
            .ok_or_else(|| AnnotateError::Validation {
                field: "label".to_string(),
                reason: format!("{value} is not one of 0, 1, 2, 3"),
            })
    }
}

/// Axis-aligned region of interest in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Placeholder rectangle a session starts with before the user drags one.
    pub const DEGENERATE: Rect = Rect {
        x: 0,
        y: 0,
        width: 1,
        height: 1,
    };

    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two corners given in any order.
    pub fn spanning(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: a.0.abs_diff(b.0),
            height: a.1.abs_diff(b.1),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with a `width` x `height` image.
    pub fn clipped(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::DEGENERATE
    }
}

/// How the segmenter should seed its colour models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    InitWithRect,
    InitWithMask,
}
