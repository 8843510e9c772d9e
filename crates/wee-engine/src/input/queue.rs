/// Keyboard events delivered by the host.
/// `code` is the layout-independent key identifier (e.g. `"ArrowLeft"`, `"KeyA"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key went down (auto-repeat events arrive as repeated `KeyDown`s).
    KeyDown { code: String },
    /// A key was released.
    KeyUp { code: String },
}

impl InputEvent {
    pub fn code(&self) -> &str {
        match self {
            InputEvent::KeyDown { code } | InputEvent::KeyUp { code } => code,
        }
    }
}

/// Key events waiting for the next tick.
///
/// Auto-repeat is folded away on push: a `KeyDown` is dropped when the
/// newest pending event for the same key is already a `KeyDown`, so a held
/// key costs one entry per tick no matter the repeat rate.
#[derive(Debug)]
pub struct InputQueue {
    pending: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(16),
        }
    }

    /// Returns false when the event was folded into an earlier one.
    pub fn push(&mut self, event: InputEvent) -> bool {
        if let InputEvent::KeyDown { code } = &event {
            let latest = self.pending.iter().rev().find(|e| e.code() == code);
            if matches!(latest, Some(InputEvent::KeyDown { .. })) {
                return false;
            }
        }
        self.pending.push(event);
        true
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Forget pending events, e.g. after focus loss.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
