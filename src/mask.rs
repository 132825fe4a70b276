use image::{GenericImageView, Rgb, RgbImage};
use ndarray::prelude::*;

use crate::errors::{AnnotateError, Result};
use crate::label::{Label, Rect};

/// Per-pixel label grid, indexed `[[y, x]]` and sized like the image it
/// annotates.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMask {
    labels: Array2<Label>,
}

impl LabelMask {
    /// All-background mask for a `width` x `height` image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            labels: Array2::default((height as usize, width as usize)),
        }
    }

    /// Build a mask from raw label values (`0..=3`), rows first.
    pub fn from_values(values: ArrayView2<u8>) -> Result<Self> {
        let labels = values
            .iter()
            .map(|&v| Label::try_from(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            labels: Array2::from_shape_vec(values.raw_dim(), labels)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.labels.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.labels.nrows() as u32
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn get(&self, x: u32, y: u32) -> Label {
        self.labels[[y as usize, x as usize]]
    }

    pub fn set(&mut self, x: u32, y: u32, label: Label) {
        self.labels[[y as usize, x as usize]] = label;
    }

    pub fn labels(&self) -> ArrayView2<'_, Label> {
        self.labels.view()
    }

    pub fn labels_mut(&mut self) -> ArrayViewMut2<'_, Label> {
        self.labels.view_mut()
    }

    /// Background outside `rect`, probable foreground inside.
    pub fn fill_from_rect(&mut self, rect: Rect) {
        for ((y, x), label) in self.labels.indexed_iter_mut() {
            *label = if rect.contains(x as u32, y as u32) {
                Label::ProbableForeground
            } else {
                Label::Background
            };
        }
    }

    /// Stamp a filled disc of `label` centred on `(cx, cy)`.
    pub fn paint_disc(&mut self, cx: i32, cy: i32, radius: i32, label: Label) {
        let (width, height) = self.dimensions();
        for (x, y) in disc_pixels(cx, cy, radius, width, height) {
            self.set(x, y, label);
        }
    }

    /// Binary mask: 255 where the label is foreground or probable foreground,
    /// 0 elsewhere.
    pub fn extraction_mask(&self) -> Array2<u8> {
        self.labels
            .mapv(|label| if label.is_foreground() { 255 } else { 0 })
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }
}

/// Pixels of a filled disc clipped to a `width` x `height` grid.
///
/// Shared by the label mask and the display canvas so both stay aligned.
pub fn disc_pixels(
    cx: i32,
    cy: i32,
    radius: i32,
    width: u32,
    height: u32,
) -> impl Iterator<Item = (u32, u32)> {
    let radius = radius.max(0);
    let r2 = radius * radius;
    (-radius..=radius)
        .flat_map(move |dy| (-radius..=radius).map(move |dx| (dx, dy)))
        .filter(move |&(dx, dy)| dx * dx + dy * dy <= r2)
        .map(move |(dx, dy)| (cx + dx, cy + dy))
        .filter(move |&(x, y)| x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height)
        .map(|(x, y)| (x as u32, y as u32))
}

/// Keep the pixels of `image` where `mask` is non-zero and black out the
/// rest.
pub fn composite<I>(image: &I, mask: ArrayView2<u8>) -> Result<RgbImage>
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = image.dimensions();
    if mask.dim() != (height as usize, width as usize) {
        return Err(AnnotateError::Validation {
            field: "extraction mask".to_string(),
            reason: format!(
                "is {}x{} but the image is {}x{}",
                mask.ncols(),
                mask.nrows(),
                width,
                height
            ),
        });
    }

    Ok(RgbImage::from_fn(width, height, |x, y| {
        if mask[[y as usize, x as usize]] != 0 {
            image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_extraction_mask_from_known_labels() -> Result<()> {
        let mask = LabelMask::from_values(array![[1u8, 0], [3, 2]].view())?;
        assert_eq!(mask.extraction_mask(), array![[255u8, 0], [255, 0]]);
        Ok(())
    }

    #[test]
    fn test_extraction_mask_is_idempotent() -> Result<()> {
        let mask = LabelMask::from_values(array![[0u8, 1, 2, 3], [3, 2, 1, 0]].view())?;
        let first = mask.extraction_mask();
        let second = mask.extraction_mask();
        assert_eq!(first, second);
        for (label, &value) in mask.labels().iter().zip(first.iter()) {
            assert_eq!(value == 255, label.is_foreground());
        }
        Ok(())
    }

    #[test]
    fn test_from_values_rejects_unknown_label() {
        assert!(LabelMask::from_values(array![[0u8, 7]].view()).is_err());
    }

    #[test]
    fn test_new_mask_is_background_with_image_dimensions() {
        let mask = LabelMask::new(7, 3);
        assert_eq!(mask.dimensions(), (7, 3));
        assert_eq!(mask.count(Label::Background), 21);
    }

    #[test]
    fn test_fill_from_rect() {
        let mut mask = LabelMask::new(5, 5);
        mask.fill_from_rect(Rect::new(1, 1, 3, 2));
        assert_eq!(mask.count(Label::ProbableForeground), 6);
        assert_eq!(mask.get(1, 1), Label::ProbableForeground);
        assert_eq!(mask.get(3, 2), Label::ProbableForeground);
        assert_eq!(mask.get(3, 3), Label::Background);
        assert_eq!(mask.get(0, 0), Label::Background);
    }

    #[test]
    fn test_paint_disc_clips_at_border() {
        let mut mask = LabelMask::new(4, 4);
        mask.paint_disc(0, 0, 1, Label::Foreground);
        // centre plus right and down neighbours; the rest falls outside
        assert_eq!(mask.count(Label::Foreground), 3);
        assert_eq!(mask.get(1, 0), Label::Foreground);
        assert_eq!(mask.get(0, 1), Label::Foreground);
        assert_eq!(mask.get(1, 1), Label::Background);
    }

    #[test]
    fn test_composite_zeroes_background() -> Result<()> {
        let image = RgbImage::from_fn(2, 2, |x, y| Rgb([10 * x as u8 + 1, 10 * y as u8 + 1, 7]));
        let out = composite(&image, array![[255u8, 0], [0, 255]].view())?;
        assert_eq!(out.get_pixel(0, 0), &Rgb([1, 1, 7]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(0, 1), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(1, 1), &Rgb([11, 11, 7]));
        Ok(())
    }

    #[test]
    fn test_composite_rejects_misaligned_mask() {
        let image = RgbImage::new(3, 2);
        assert!(composite(&image, Array2::<u8>::zeros((3, 2)).view()).is_err());
    }
}
