use clap::Parser;
use std::path::PathBuf;

use crate::errors::{AnnotateError, Result};
use crate::session::DEFAULT_THICKNESS;

/// Mark the object in each image of FOLDER, press `n` to segment and `s` to
/// save the cut-out under the results directory.
#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Folder holding the images to annotate
    pub folder: PathBuf,

    /// Resize every image to this height before annotating
    #[arg(short = 'H', long, requires = "width")]
    pub height: Option<u32>,

    /// Resize every image to this width before annotating
    #[arg(short = 'W', long, requires = "height")]
    pub width: Option<u32>,

    /// Where saved cut-outs are written, created on first save
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Brush radius in pixels
    #[arg(short, long, default_value_t = DEFAULT_THICKNESS)]
    pub thickness: u32,

    /// Segmentation iterations per `n` press
    #[arg(short, long, default_value_t = 1)]
    pub iterations: usize,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    /// Config with defaults for everything but the input folder.
    pub fn for_folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            height: None,
            width: None,
            results_dir: PathBuf::from("results"),
            thickness: DEFAULT_THICKNESS,
            iterations: 1,
        }
    }

    /// Target size when both dimensions were given.
    pub fn resize_to(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("--height", self.height == Some(0)),
            ("--width", self.width == Some(0)),
            ("--thickness", self.thickness == 0),
            ("--iterations", self.iterations == 0),
        ];
        match checks.into_iter().find(|(_, bad)| *bad) {
            Some((field, _)) => Err(AnnotateError::Validation {
                field: field.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            None => Ok(()),
        }
    }
}
