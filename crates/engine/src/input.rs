use serde::Deserialize;

use crate::geometry::{Vec2, Viewport};

/// Discrete pointer/touch sample for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum InputEvent {
    #[default]
    None,
    SingleClick,
    DoubleClick,
    RightClick,
    LetGo,
}

impl InputEvent {
    pub fn is_left_click(self) -> bool {
        matches!(self, Self::SingleClick | Self::DoubleClick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CycleDirection {
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    pointer_px: Option<Vec2>,
    event: InputEvent,
    pointer_readable: bool,
    camera_drag_active: bool,
    drag_drop_active: bool,
    cycle: Option<CycleDirection>,
    viewport: Viewport,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            pointer_px: None,
            event: InputEvent::None,
            pointer_readable: true,
            camera_drag_active: false,
            drag_drop_active: false,
            cycle: None,
            viewport: Viewport::default(),
        }
    }
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_pointer_px(mut self, pointer_px: Option<Vec2>) -> Self {
        self.pointer_px = pointer_px;
        self
    }

    pub fn with_event(mut self, event: InputEvent) -> Self {
        self.event = event;
        self
    }

    pub fn with_pointer_readable(mut self, pointer_readable: bool) -> Self {
        self.pointer_readable = pointer_readable;
        self
    }

    pub fn with_camera_drag_active(mut self, camera_drag_active: bool) -> Self {
        self.camera_drag_active = camera_drag_active;
        self
    }

    pub fn with_drag_drop_active(mut self, drag_drop_active: bool) -> Self {
        self.drag_drop_active = drag_drop_active;
        self
    }

    pub fn with_cycle(mut self, cycle: Option<CycleDirection>) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn pointer_px(&self) -> Option<Vec2> {
        self.pointer_px
    }

    pub fn event(&self) -> InputEvent {
        self.event
    }

    /// False while the pointer is over a blocking UI surface; pointer
    /// detection then treats the pointer as absent.
    pub fn pointer_readable(&self) -> bool {
        self.pointer_readable
    }

    pub fn camera_drag_active(&self) -> bool {
        self.camera_drag_active
    }

    pub fn drag_drop_active(&self) -> bool {
        self.drag_drop_active
    }

    pub fn cycle(&self) -> Option<CycleDirection> {
        self.cycle
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Clicks landing on UI are consumed there; the engine sees no event.
    pub fn effective_event(&self) -> InputEvent {
        if self.pointer_readable {
            self.event
        } else {
            InputEvent::None
        }
    }
}
