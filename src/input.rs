/// Discrete user input as the session consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Pointer(PointerEvent),
    Key(Command),
    /// A window was closed; ends the whole run.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down { x: u32, y: u32 },
    Move { x: u32, y: u32 },
    Up { x: u32, y: u32 },
}

impl PointerEvent {
    pub const fn position(&self) -> (u32, u32) {
        match *self {
            PointerEvent::Down { x, y } | PointerEvent::Move { x, y } | PointerEvent::Up { x, y } => {
                (x, y)
            }
        }
    }
}

/// Single-key commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Keys `0`..`3`: select the brush label.
    SelectLabel(crate::label::Label),
    /// `n`
    Segment,
    /// `r`
    Reset,
    /// `s`
    Save,
    /// Escape
    Skip,
}

/// Turns polled button/position samples into down/move/up edges.
#[derive(Debug, Default)]
pub struct PointerTracker {
    pressed: bool,
    last: Option<(u32, u32)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample. `position` is `None` while the cursor is outside the
    /// window; the last known position is used for edges in that case.
    pub fn update(&mut self, pressed: bool, position: Option<(u32, u32)>) -> Option<PointerEvent> {
        let moved = position.is_some() && position != self.last;
        let Some((x, y)) = position.or(self.last) else {
            self.pressed = pressed;
            return None;
        };
        self.last = Some((x, y));

        let event = match (self.pressed, pressed) {
            (false, true) => Some(PointerEvent::Down { x, y }),
            (true, false) => Some(PointerEvent::Up { x, y }),
            _ if moved => Some(PointerEvent::Move { x, y }),
            _ => None,
        };
        self.pressed = pressed;
        event
    }
}
