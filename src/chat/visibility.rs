#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// Edge produced by a visibility request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened,
    Closed,
    /// Already in the requested state. Repeated opens land here, so the
    /// mark-read handshake runs once per real edge.
    Unchanged,
}

/// Two-state machine for the chat pane. The identity guard on opening is
/// applied by the session before [`VisibilityController::open`] is called.
#[derive(Debug, Default)]
pub struct VisibilityController {
    state: Visibility,
}

impl VisibilityController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == Visibility::Visible
    }

    pub fn open(&mut self) -> Transition {
        match self.state {
            Visibility::Visible => Transition::Unchanged,
            Visibility::Hidden => {
                self.state = Visibility::Visible;
                Transition::Opened
            }
        }
    }

    pub fn close(&mut self) -> Transition {
        match self.state {
            Visibility::Hidden => Transition::Unchanged,
            Visibility::Visible => {
                self.state = Visibility::Hidden;
                Transition::Closed
            }
        }
    }
}
