//! Input abstraction layer.
//!
//! Pointer events arrive in stage (world) coordinates; the host converts
//! from screen space with the viewport before handing them to a tool. Node
//! editing on a placed object works in that asset's own coordinates.

use kurbo::Point;

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Multi-select chord: shift, or ctrl/cmd.
    pub fn is_multi_select(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// A normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, modifiers: Modifiers },
    PointerMove { x: f64, y: f64, modifiers: Modifiers },
    PointerUp { x: f64, y: f64, modifiers: Modifiers },
    DoubleClick { x: f64, y: f64, modifiers: Modifiers },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn double_click(x: f64, y: f64) -> Self {
        Self::DoubleClick {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Same event with different modifiers.
    pub fn with_modifiers(self, mods: Modifiers) -> Self {
        match self {
            Self::PointerDown { x, y, .. } => Self::PointerDown { x, y, modifiers: mods },
            Self::PointerMove { x, y, .. } => Self::PointerMove { x, y, modifiers: mods },
            Self::PointerUp { x, y, .. } => Self::PointerUp { x, y, modifiers: mods },
            Self::DoubleClick { x, y, .. } => Self::DoubleClick { x, y, modifiers: mods },
        }
    }

    /// Same event at another position (after a coordinate conversion).
    pub fn at(self, p: Point) -> Self {
        let (x, y) = (p.x, p.y);
        match self {
            Self::PointerDown { modifiers, .. } => Self::PointerDown { x, y, modifiers },
            Self::PointerMove { modifiers, .. } => Self::PointerMove { x, y, modifiers },
            Self::PointerUp { modifiers, .. } => Self::PointerUp { x, y, modifiers },
            Self::DoubleClick { modifiers, .. } => Self::DoubleClick { x, y, modifiers },
        }
    }

    pub fn position(&self) -> Point {
        match *self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::DoubleClick { x, y, .. } => Point::new(x, y),
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match *self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::DoubleClick { modifiers, .. } => modifiers,
        }
    }
}
