use image::RgbImage;
use log::{debug, error, info, warn};

use crate::canvas::{draw_disc, draw_rect_outline, RECT_COLOR};
use crate::input::{Command, Event, PointerEvent};
use crate::label::{InitMode, Label, Rect};
use crate::mask::{composite, LabelMask};
use crate::traits::Segmenter;

pub const DEFAULT_THICKNESS: u32 = 5;

/// Pointer interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// No rectangle yet.
    Idle,
    /// Left button held since `anchor`; the rectangle follows the cursor.
    DrawingRect { anchor: (u32, u32) },
    /// Rectangle fixed, brush idle.
    RectFixed,
    /// Rectangle fixed, brush held down.
    Painting,
}

/// What the next segmentation request does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextSegmentation {
    /// Nothing to segment until a rectangle has been dragged.
    Unavailable,
    FromRect,
    FromMask,
}

/// What the driver should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Persist `Session::output` and move to the next image.
    Save,
    /// Leave the current image without saving.
    Skip,
    /// Stop the whole run.
    Quit,
}

/// Annotation state for a single image.
///
/// The label mask, the display canvas and the output all share the
/// dimensions of `original`, which never changes after construction.
pub struct Session {
    original: RgbImage,
    display: RgbImage,
    mask: LabelMask,
    output: RgbImage,
    rect: Rect,
    interaction: Interaction,
    next: NextSegmentation,
    label: Label,
    thickness: u32,
}

impl Session {
    pub fn new(original: RgbImage, thickness: u32) -> Self {
        let (width, height) = original.dimensions();
        Self {
            display: original.clone(),
            mask: LabelMask::new(width, height),
            output: RgbImage::new(width, height),
            original,
            rect: Rect::DEGENERATE,
            interaction: Interaction::Idle,
            next: NextSegmentation::Unavailable,
            label: Label::Foreground,
            thickness,
        }
    }

    pub fn original(&self) -> &RgbImage {
        &self.original
    }

    pub fn display(&self) -> &RgbImage {
        &self.display
    }

    pub fn output(&self) -> &RgbImage {
        &self.output
    }

    pub fn mask(&self) -> &LabelMask {
        &self.mask
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn next_segmentation(&self) -> NextSegmentation {
        self.next
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn rect_fixed(&self) -> bool {
        matches!(self.interaction, Interaction::RectFixed | Interaction::Painting)
    }

    pub fn handle_event<S: Segmenter + ?Sized>(&mut self, event: Event, segmenter: &mut S) -> Flow {
        match event {
            Event::Pointer(pointer) => {
                self.handle_pointer(pointer);
                Flow::Continue
            }
            Event::Key(command) => self.handle_command(command, segmenter),
            Event::Closed => Flow::Quit,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let (x, y) = event.position();
        match (self.interaction, event) {
            (Interaction::Idle, PointerEvent::Down { .. }) => {
                info!("first draw a rectangle around the object");
                self.interaction = Interaction::DrawingRect { anchor: (x, y) };
            }
            (Interaction::DrawingRect { anchor }, PointerEvent::Move { .. }) => {
                self.update_rect(anchor, (x, y));
            }
            (Interaction::DrawingRect { anchor }, PointerEvent::Up { .. }) => {
                self.update_rect(anchor, (x, y));
                self.interaction = Interaction::RectFixed;
                debug!("rectangle fixed at {:?}", self.rect);
                info!("now press 'n' a few times until no further change");
            }
            (Interaction::RectFixed | Interaction::Painting, PointerEvent::Down { .. }) => {
                self.interaction = Interaction::Painting;
                self.stamp(x, y);
            }
            (Interaction::Painting, PointerEvent::Move { .. }) => self.stamp(x, y),
            (Interaction::Painting, PointerEvent::Up { .. }) => {
                self.stamp(x, y);
                self.interaction = Interaction::RectFixed;
            }
            _ => {}
        }
    }

    pub fn handle_command<S: Segmenter + ?Sized>(&mut self, command: Command, segmenter: &mut S) -> Flow {
        match command {
            Command::SelectLabel(label) => {
                self.label = label;
                info!("using {}", label.describe());
                Flow::Continue
            }
            Command::Segment => {
                self.segment(segmenter);
                Flow::Continue
            }
            Command::Reset => {
                info!("resetting");
                info!("{}", crate::USAGE);
                self.reset();
                Flow::Continue
            }
            Command::Save => Flow::Save,
            Command::Skip => Flow::Skip,
        }
    }

    /// Drop every stroke, the rectangle and the mask.
    pub fn reset(&mut self) {
        let (width, height) = self.original.dimensions();
        self.display = self.original.clone();
        self.mask = LabelMask::new(width, height);
        self.output = RgbImage::new(width, height);
        self.rect = Rect::DEGENERATE;
        self.interaction = Interaction::Idle;
        self.next = NextSegmentation::Unavailable;
        self.label = Label::Foreground;
    }

    /// Run the segmenter once and refresh the cut-out.
    pub fn segment<S: Segmenter + ?Sized>(&mut self, segmenter: &mut S) {
        let mode = match self.next {
            NextSegmentation::Unavailable => {
                info!("draw a rectangle around the object before segmenting");
                return;
            }
            NextSegmentation::FromRect => InitMode::InitWithRect,
            NextSegmentation::FromMask => InitMode::InitWithMask,
        };

        debug!("segmenting with {:?} and rect {:?}", mode, self.rect);
        match segmenter.segment(&self.original, &mut self.mask, self.rect, mode) {
            Ok(()) => {
                self.next = NextSegmentation::FromMask;
                info!("for finer touch-ups, mark regions after pressing keys 0-3 and press 'n' again");
            }
            Err(e) => warn!("segmentation skipped: {e}"),
        }
        self.refresh_output();
    }

    fn update_rect(&mut self, anchor: (u32, u32), corner: (u32, u32)) {
        self.rect = Rect::spanning(anchor, corner);
        self.next = NextSegmentation::FromRect;
        self.display = self.original.clone();
        draw_rect_outline(&mut self.display, self.rect, RECT_COLOR);
    }

    fn stamp(&mut self, x: u32, y: u32) {
        let radius = self.thickness as i32;
        draw_disc(&mut self.display, x as i32, y as i32, radius, self.label.color());
        self.mask.paint_disc(x as i32, y as i32, radius, self.label);
        self.refresh_output();
    }

    fn refresh_output(&mut self) {
        match composite(&self.original, self.mask.extraction_mask().view()) {
            Ok(output) => self.output = output,
            Err(e) => error!("failed to refresh the output view: {e}"),
        }
    }
}
