//! Input capability to intent mapping

use std::collections::HashMap;

/// A physical input the render/input layer can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputTag {
    /// Keyboard key, by the character it produces
    Key(char),
    /// Controller button index
    Button(u8),
}

/// What the player wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Left,
    Right,
    Up,
    Down,
    /// Counter-clockwise turn
    RotateLeft,
    /// Clockwise turn
    RotateRight,
    Fire,
    Shield,
    Restart,
}

/// Fixed bindings, resolved once when the map is built
#[derive(Debug, Clone, Default)]
pub struct InputMap {
    bindings: HashMap<InputTag, Intent>,
}

impl InputMap {
    pub fn new(bindings: impl IntoIterator<Item = (InputTag, Intent)>) -> Self {
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }

    /// a/d/w/s move, q/e turn, space fires, `.` shields, r restarts
    pub fn keyboard() -> Self {
        Self::new([
            (InputTag::Key('a'), Intent::Left),
            (InputTag::Key('d'), Intent::Right),
            (InputTag::Key('w'), Intent::Up),
            (InputTag::Key('s'), Intent::Down),
            (InputTag::Key('q'), Intent::RotateLeft),
            (InputTag::Key('e'), Intent::RotateRight),
            (InputTag::Key(' '), Intent::Fire),
            (InputTag::Key('.'), Intent::Shield),
            (InputTag::Key('r'), Intent::Restart),
        ])
    }

    /// D-pad on buttons 0-3, A (4) shields, B (5) fires, 6 restarts
    pub fn controller() -> Self {
        Self::new([
            (InputTag::Button(0), Intent::Left),
            (InputTag::Button(1), Intent::Right),
            (InputTag::Button(2), Intent::Up),
            (InputTag::Button(3), Intent::Down),
            (InputTag::Button(4), Intent::Shield),
            (InputTag::Button(5), Intent::Fire),
            (InputTag::Button(6), Intent::Restart),
        ])
    }

    /// Keyboard and controller bindings together
    pub fn standard() -> Self {
        let mut map = Self::keyboard();
        map.bindings.extend(Self::controller().bindings);
        map
    }

    pub fn resolve(&self, tag: InputTag) -> Option<Intent> {
        self.bindings.get(&tag).copied()
    }
}
