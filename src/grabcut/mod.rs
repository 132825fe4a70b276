//! Colour-model segmentation behind the `Segmenter` trait.
//!
//! Each iteration fits a background and a foreground Gaussian mixture to the
//! current labelling, then relabels probable pixels by minimising data cost
//! plus a contrast-sensitive Potts term with iterated conditional modes.
//! Definite labels act as hard constraints and are never rewritten.

mod gmm;

pub use gmm::Gmm;

use image::RgbImage;
use log::debug;
use rayon::prelude::*;

use crate::errors::{AnnotateError, Result};
use crate::label::{InitMode, Label, Rect};
use crate::mask::LabelMask;
use crate::traits::Segmenter;
use gmm::Color;

pub const COMPONENTS: usize = 5;
pub const DEFAULT_GAMMA: f64 = 50.0;
const ICM_SWEEPS: usize = 5;

// (dx, dy, 1 / distance) for the 8-neighbourhood.
const NEIGHBOURS: [(i64, i64, f64); 8] = [
    (-1, 0, 1.0),
    (1, 0, 1.0),
    (0, -1, 1.0),
    (0, 1, 1.0),
    (-1, -1, std::f64::consts::FRAC_1_SQRT_2),
    (1, -1, std::f64::consts::FRAC_1_SQRT_2),
    (-1, 1, std::f64::consts::FRAC_1_SQRT_2),
    (1, 1, std::f64::consts::FRAC_1_SQRT_2),
];

#[derive(Debug, Clone)]
pub struct GrabCut {
    iterations: usize,
    gamma: f64,
}

impl Default for GrabCut {
    fn default() -> Self {
        Self::new(1)
    }
}

impl GrabCut {
    pub const fn new(iterations: usize) -> Self {
        Self {
            iterations,
            gamma: DEFAULT_GAMMA,
        }
    }

    pub const fn iterations(&self) -> usize {
        self.iterations
    }
}

impl Segmenter for GrabCut {
    fn segment(
        &mut self,
        image: &RgbImage,
        mask: &mut LabelMask,
        rect: Rect,
        mode: InitMode,
    ) -> Result<()> {
        if image.dimensions() != mask.dimensions() {
            return Err(AnnotateError::Validation {
                field: "label mask".to_string(),
                reason: format!(
                    "is {:?} but the image is {:?}",
                    mask.dimensions(),
                    image.dimensions()
                ),
            });
        }

        if mode == InitMode::InitWithRect {
            let (width, height) = image.dimensions();
            let rect = rect.clipped(width, height);
            if rect.is_empty() {
                return Err(AnnotateError::segmentation(
                    "the rectangle does not cover any pixel",
                ));
            }
            mask.fill_from_rect(rect);
        }

        let field = ColorField::new(image, self.gamma);
        for iteration in 0..self.iterations {
            let (background, foreground) = fit_models(&field.colors, mask)?;
            debug!(
                "iteration {iteration}: {} background / {} foreground components",
                background.len(),
                foreground.len()
            );
            let costs = data_costs(&field.colors, &background, &foreground);
            let changed = field.relabel(mask, &costs);
            debug!("iteration {iteration}: {changed} pixels relabelled");
        }
        Ok(())
    }
}

fn fit_models(colors: &[Color], mask: &LabelMask) -> Result<(Gmm, Gmm)> {
    let mut background = Vec::new();
    let mut foreground = Vec::new();
    for (color, label) in colors.iter().zip(mask.labels().iter()) {
        if label.is_foreground() {
            foreground.push(*color);
        } else {
            background.push(*color);
        }
    }

    let background = Gmm::fit(&background, COMPONENTS)
        .ok_or_else(|| AnnotateError::segmentation("no background pixels to learn from"))?;
    let foreground = Gmm::fit(&foreground, COMPONENTS)
        .ok_or_else(|| AnnotateError::segmentation("no foreground pixels to learn from"))?;
    Ok((background, foreground))
}

/// `[background cost, foreground cost]` per pixel, row-major.
fn data_costs(colors: &[Color], background: &Gmm, foreground: &Gmm) -> Vec<[f64; 2]> {
    colors
        .par_iter()
        .map(|c| [background.cost(c), foreground.cost(c)])
        .collect()
}

/// Pixel colours plus the smoothness parameters derived from them.
struct ColorField {
    width: usize,
    height: usize,
    colors: Vec<Color>,
    gamma: f64,
    beta: f64,
}

impl ColorField {
    fn new(image: &RgbImage, gamma: f64) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let colors: Vec<Color> = image
            .pixels()
            .map(|p| [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])])
            .collect();
        let mut field = Self {
            width,
            height,
            colors,
            gamma,
            beta: 0.0,
        };
        field.beta = field.estimate_beta();
        field
    }

    /// `1 / (2 <|z_p - z_q|^2>)` over all neighbour pairs; 0 for flat images.
    fn estimate_beta(&self) -> f64 {
        let mut total = 0.0;
        let mut pairs = 0usize;
        for y in 0..self.height {
            for x in 0..self.width {
                // each unordered pair once: right, down-left, down, down-right
                for (dx, dy) in [(1i64, 0i64), (-1, 1), (0, 1), (1, 1)] {
                    if let Some(q) = self.neighbour(x, y, dx, dy) {
                        total += diff2(&self.colors[y * self.width + x], &self.colors[q]);
                        pairs += 1;
                    }
                }
            }
        }
        if pairs == 0 || total <= f64::EPSILON {
            0.0
        } else {
            1.0 / (2.0 * total / pairs as f64)
        }
    }

    fn neighbour(&self, x: usize, y: usize, dx: i64, dy: i64) -> Option<usize> {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        (nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height)
            .then(|| ny as usize * self.width + nx as usize)
    }

    fn edge_weight(&self, p: usize, q: usize, inv_dist: f64) -> f64 {
        self.gamma * inv_dist * (-self.beta * diff2(&self.colors[p], &self.colors[q])).exp()
    }

    /// Relabel probable pixels; returns how many changed side.
    fn relabel(&self, mask: &mut LabelMask, costs: &[[f64; 2]]) -> usize {
        let mut labels = mask.labels_mut();
        let at = |i: usize| (i / self.width, i % self.width);
        let original: Vec<bool> = labels.iter().map(|l| l.is_foreground()).collect();

        // start from the data term alone
        for (i, cost) in costs.iter().enumerate() {
            let label = &mut labels[at(i)];
            if label.is_probable() {
                *label = probable(cost[1] < cost[0]);
            }
        }

        for _ in 0..ICM_SWEEPS {
            let mut flips = 0usize;
            for y in 0..self.height {
                for x in 0..self.width {
                    let p = y * self.width + x;
                    if !labels[[y, x]].is_probable() {
                        continue;
                    }
                    let mut energy = costs[p];
                    for &(dx, dy, inv_dist) in &NEIGHBOURS {
                        if let Some(q) = self.neighbour(x, y, dx, dy) {
                            let w = self.edge_weight(p, q, inv_dist);
                            if labels[at(q)].is_foreground() {
                                energy[0] += w;
                            } else {
                                energy[1] += w;
                            }
                        }
                    }
                    let fg = energy[1] < energy[0];
                    if fg != labels[[y, x]].is_foreground() {
                        labels[[y, x]] = probable(fg);
                        flips += 1;
                    }
                }
            }
            if flips == 0 {
                break;
            }
        }

        labels
            .iter()
            .zip(original)
            .filter(|(label, was_fg)| label.is_foreground() != *was_fg)
            .count()
    }
}

fn probable(foreground: bool) -> Label {
    if foreground {
        Label::ProbableForeground
    } else {
        Label::ProbableBackground
    }
}

fn diff2(a: &Color, b: &Color) -> f64 {
    (0..3).map(|i| (a[i] - b[i]).powi(2)).sum()
}
