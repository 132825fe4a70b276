use std::collections::VecDeque;

use image::RgbImage;

use crate::errors::{AnnotateError, Result};
use crate::input::Event;
use crate::label::{InitMode, Rect};
use crate::mask::LabelMask;
use crate::traits::{Frontend, Segmenter};

/// Segmenter stand-in for tests: honours the rectangle initialization and
/// otherwise leaves the mask alone, recording every call.
#[derive(Debug, Clone, Default)]
pub struct MockSegmenter {
    pub calls: Vec<(Rect, InitMode)>,
    fail: bool,
}

impl MockSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A segmenter that rejects every request.
    pub fn failing() -> Self {
        Self {
            calls: Vec::new(),
            fail: true,
        }
    }
}

impl Segmenter for MockSegmenter {
    fn segment(
        &mut self,
        _image: &RgbImage,
        mask: &mut LabelMask,
        rect: Rect,
        mode: InitMode,
    ) -> Result<()> {
        if self.fail {
            return Err(AnnotateError::segmentation("mock refuses to segment"));
        }
        self.calls.push((rect, mode));
        if mode == InitMode::InitWithRect {
            mask.fill_from_rect(rect);
        }
        Ok(())
    }
}

/// Frontend that replays a fixed script, one batch of events per frame.
///
/// Once a session's script runs out it reports the window as closed so a
/// test run can never spin forever.
#[derive(Debug, Default)]
pub struct ScriptedFrontend {
    scripts: VecDeque<Vec<Vec<Event>>>,
    current: VecDeque<Vec<Event>>,
    pub opened: Vec<(String, usize, usize)>,
    pub frames: usize,
}

impl ScriptedFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the frames to replay for the next opened image.
    pub fn with_session(mut self, frames: Vec<Vec<Event>>) -> Self {
        self.scripts.push_back(frames);
        self
    }
}

impl Frontend for ScriptedFrontend {
    fn open(&mut self, title: &str, width: usize, height: usize) -> Result<()> {
        self.opened.push((title.to_string(), width, height));
        self.current = self.scripts.pop_front().unwrap_or_default().into();
        Ok(())
    }

    fn present(&mut self, _input: &RgbImage, _output: &RgbImage) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn poll(&mut self) -> Vec<Event> {
        self.current.pop_front().unwrap_or_else(|| vec![Event::Closed])
    }
}
