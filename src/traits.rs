use image::RgbImage;

use crate::errors::Result;
use crate::input::Event;
use crate::label::{InitMode, Rect};
use crate::mask::LabelMask;

/// Iterative foreground segmentation driven by a label mask.
///
/// Contract: with `InitMode::InitWithRect` the whole mask is first rewritten
/// to background outside `rect` and probable foreground inside. After that
/// (and always with `InitMode::InitWithMask`) only probable labels may
/// change. `image` and `mask` share dimensions.
pub trait Segmenter {
    fn segment(
        &mut self,
        image: &RgbImage,
        mask: &mut LabelMask,
        rect: Rect,
        mode: InitMode,
    ) -> Result<()>;
}

impl<S: Segmenter + ?Sized> Segmenter for Box<S> {
    fn segment(
        &mut self,
        image: &RgbImage,
        mask: &mut LabelMask,
        rect: Rect,
        mode: InitMode,
    ) -> Result<()> {
        (**self).segment(image, mask, rect, mode)
    }
}

/// Where a session is shown and where its input comes from.
pub trait Frontend {
    /// Prepare views for a new image of the given size.
    fn open(&mut self, title: &str, width: usize, height: usize) -> Result<()>;

    /// Show the annotated input view and the current cut-out.
    fn present(&mut self, input: &RgbImage, output: &RgbImage) -> Result<()>;

    /// Events that arrived since the previous call; may block briefly.
    fn poll(&mut self) -> Vec<Event>;
}
