pub mod canvas;
pub mod config;
pub mod errors;
pub mod grabcut;
pub mod input;
pub mod label;
pub mod mask;
pub mod session;
pub mod traits;
pub mod window;

pub mod mocks;

use image::{imageops::FilterType, ImageFormat, ImageReader, RgbImage};
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use config::Config;
pub use errors::{AnnotateError, Result};
pub use grabcut::GrabCut;
pub use label::{InitMode, Label, Rect};
pub use mask::LabelMask;
pub use session::Session;
pub use traits::*;
pub use window::MinifbFrontend;

use session::Flow;

pub const USAGE: &str = "\
Draw a rectangle around the object with the left mouse button, then press
'n' to segment it (once or a few times). For finer touch-ups pick a brush
and paint over the regions, then press 'n' again.

Key '0' - mark sure background
Key '1' - mark sure foreground
Key '2' - mark probable background
Key '3' - mark probable foreground

Key 'n' - update the segmentation
Key 'r' - reset the setup
Key 's' - save the result and go to the next image
Key 'Esc' - go to the next image without saving
Closing a window ends the run";

/// How a single image's session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Saved(PathBuf),
    Abandoned,
    Quit,
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub saved: usize,
    pub skipped: usize,
    pub abandoned: usize,
    pub stopped_early: bool,
}

/// Batch driver: one annotation session per entry of the input folder.
pub struct Annotator<S: Segmenter> {
    segmenter: S,
    config: Config,
}

impl<S: Segmenter> Annotator<S> {
    pub const fn new(segmenter: S, config: Config) -> Self {
        Self { segmenter, config }
    }

    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    pub fn process_directory<F: Frontend>(&mut self, frontend: &mut F) -> Result<Summary> {
        let folder = self.config.folder.clone();
        if !folder.is_dir() {
            return Err(AnnotateError::FileSystem {
                path: folder,
                operation: "reading input folder".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "input folder does not exist",
                ),
            });
        }

        let mut summary = Summary::default();
        for path in self.collect_entries(&folder) {
            info!("trying to read image - {}", path.display());
            let image = match self.load_image(&path) {
                Ok(image) => image,
                Err(e) => {
                    warn!("skipped on image - {}: {e}", path.display());
                    summary.skipped += 1;
                    continue;
                }
            };

            match self.annotate(&path, image, frontend)? {
                SessionEnd::Saved(dest) => {
                    info!("result saved as {}", dest.display());
                    summary.saved += 1;
                }
                SessionEnd::Abandoned => summary.abandoned += 1,
                SessionEnd::Quit => {
                    summary.stopped_early = true;
                    break;
                }
            }
        }

        if summary.stopped_early {
            info!("stopped by the user");
        } else {
            info!("all images were processed");
        }
        debug!("{summary:?}");
        Ok(summary)
    }

    /// Every direct entry of `folder`, sorted by name. Anything that is not
    /// a decodable image is weeded out later by `load_image`.
    pub fn collect_entries(&self, folder: &Path) -> Vec<PathBuf> {
        WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .collect()
    }

    /// Decode `path` as RGB and apply the configured resize. The format is
    /// taken from the file contents, not the extension.
    pub fn load_image(&self, path: &Path) -> Result<RgbImage> {
        let reading = |e: image::ImageError| AnnotateError::ImageProcessing {
            path: path.display().to_string(),
            operation: "reading image".to_string(),
            source: Box::new(e),
        };
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| reading(e.into()))?
            .decode()
            .map_err(reading)?;

        let image = match self.config.resize_to() {
            Some((width, height)) => image.resize_exact(width, height, FilterType::CatmullRom),
            None => image,
        };
        Ok(image.into_rgb8())
    }

    /// Run one session until it is saved, abandoned or the run is stopped.
    pub fn annotate<F: Frontend>(
        &mut self,
        path: &Path,
        image: RgbImage,
        frontend: &mut F,
    ) -> Result<SessionEnd> {
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let (width, height) = image.dimensions();
        frontend.open(&title, width as usize, height as usize)?;
        info!("{USAGE}");

        let mut session = Session::new(image, self.config.thickness);
        loop {
            frontend.present(session.display(), session.output())?;
            for event in frontend.poll() {
                match session.handle_event(event, &mut self.segmenter) {
                    Flow::Continue => {}
                    Flow::Save => match self.save_result(path, session.output()) {
                        Ok(dest) => return Ok(SessionEnd::Saved(dest)),
                        Err(e) => error!("{e}"),
                    },
                    Flow::Skip => return Ok(SessionEnd::Abandoned),
                    Flow::Quit => return Ok(SessionEnd::Quit),
                }
            }
        }
    }

    /// `<results dir>/<file name of source>`.
    pub fn result_path(&self, source: &Path) -> Result<PathBuf> {
        source
            .file_name()
            .map(|name| self.config.results_dir.join(name))
            .ok_or_else(|| AnnotateError::Validation {
                field: "source path".to_string(),
                reason: format!("{} has no file name", source.display()),
            })
    }

    pub fn save_result(&self, source: &Path, output: &RgbImage) -> Result<PathBuf> {
        let results_dir = &self.config.results_dir;
        fs::create_dir_all(results_dir).map_err(|e| AnnotateError::FileSystem {
            path: results_dir.clone(),
            operation: "creating results folder".to_string(),
            source: e,
        })?;

        let dest = self.result_path(source)?;
        // unknown or missing extension: write PNG under the source's name
        let format = ImageFormat::from_path(&dest).unwrap_or(ImageFormat::Png);
        output.save_with_format(&dest, format).map_err(|e| AnnotateError::ImageProcessing {
            path: dest.display().to_string(),
            operation: "saving result".to_string(),
            source: Box::new(e),
        })?;
        Ok(dest)
    }
}
