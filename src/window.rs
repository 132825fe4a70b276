// Two minifb windows: "input" takes the mouse, both take keys.

use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::canvas::FrameBuffer;
use crate::errors::{AnnotateError, Result};
use crate::input::{Command, Event, PointerTracker};
use crate::label::Label;
use crate::traits::Frontend;

const TARGET_FPS: usize = 60;
const WINDOW_GAP: isize = 10;
const WINDOW_TOP: isize = 90;

const KEY_BINDINGS: [(Key, Command); 12] = [
    (Key::Key0, Command::SelectLabel(Label::Background)),
    (Key::Key1, Command::SelectLabel(Label::Foreground)),
    (Key::Key2, Command::SelectLabel(Label::ProbableBackground)),
    (Key::Key3, Command::SelectLabel(Label::ProbableForeground)),
    (Key::NumPad0, Command::SelectLabel(Label::Background)),
    (Key::NumPad1, Command::SelectLabel(Label::Foreground)),
    (Key::NumPad2, Command::SelectLabel(Label::ProbableBackground)),
    (Key::NumPad3, Command::SelectLabel(Label::ProbableForeground)),
    (Key::N, Command::Segment),
    (Key::R, Command::Reset),
    (Key::S, Command::Save),
    (Key::Escape, Command::Skip),
];

struct Views {
    input: Window,
    output: Window,
    input_fb: FrameBuffer,
    output_fb: FrameBuffer,
}

/// Desktop frontend. Windows are recreated per image so they match its size.
#[derive(Default)]
pub struct MinifbFrontend {
    views: Option<Views>,
    pointer: PointerTracker,
}

impl MinifbFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_window(title: &str, width: usize, height: usize) -> Result<Window> {
        let mut window = Window::new(title, width, height, WindowOptions::default()).map_err(|e| {
            AnnotateError::Window {
                operation: format!("creating window `{title}`"),
                message: e.to_string(),
            }
        })?;
        window.set_target_fps(TARGET_FPS);
        Ok(window)
    }
}

impl Frontend for MinifbFrontend {
    fn open(&mut self, title: &str, width: usize, height: usize) -> Result<()> {
        // drop the previous pair first so only two windows are ever open
        self.views = None;
        self.pointer = PointerTracker::new();

        let mut output = Self::create_window(&format!("output - {title}"), width, height)?;
        let mut input = Self::create_window(&format!("input - {title}"), width, height)?;
        output.set_position(0, WINDOW_TOP);
        input.set_position(width as isize + WINDOW_GAP, WINDOW_TOP);

        self.views = Some(Views {
            input,
            output,
            input_fb: FrameBuffer::new(width, height),
            output_fb: FrameBuffer::new(width, height),
        });
        Ok(())
    }

    fn present(&mut self, input: &RgbImage, output: &RgbImage) -> Result<()> {
        let Some(views) = self.views.as_mut() else {
            return Err(AnnotateError::Window {
                operation: "present".to_string(),
                message: "no window is open".to_string(),
            });
        };

        views.input_fb.copy_from(input);
        views.output_fb.copy_from(output);
        views
            .input
            .update_with_buffer(&views.input_fb.pixels, views.input_fb.width, views.input_fb.height)?;
        views
            .output
            .update_with_buffer(&views.output_fb.pixels, views.output_fb.width, views.output_fb.height)?;
        Ok(())
    }

    fn poll(&mut self) -> Vec<Event> {
        let Some(views) = self.views.as_ref() else {
            return vec![Event::Closed];
        };
        if !views.input.is_open() || !views.output.is_open() {
            return vec![Event::Closed];
        }

        let mut events = Vec::new();
        let position = views
            .input
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| (x.max(0.0) as u32, y.max(0.0) as u32));
        let pressed = views.input.get_mouse_down(MouseButton::Left);
        if let Some(pointer) = self.pointer.update(pressed, position) {
            events.push(Event::Pointer(pointer));
        }

        for (key, command) in KEY_BINDINGS {
            let hit = views.input.is_key_pressed(key, KeyRepeat::No)
                || views.output.is_key_pressed(key, KeyRepeat::No);
            if hit {
                events.push(Event::Key(command));
            }
        }
        events
    }
}
