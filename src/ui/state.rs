use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use chrono::{DateTime, Local};
use support_chat::{ConnectionState, SessionUpdate, Visibility};

const ACTIVITY_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Connection,
    Messages,
    Pane,
    Notice,
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Local>,
    pub kind: ActivityKind,
    pub message: String,
}

/// Session updates in arrival order, shared with the session listener.
pub type ActivityLog = Rc<RefCell<VecDeque<ActivityEntry>>>;

pub struct AppState {
    pub user_id_input: String,
    pub token_input: String,
    pub input_text: String,
    pub activity: ActivityLog,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            user_id_input: String::new(),
            token_input: String::new(),
            input_text: String::new(),
            activity: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Listener to register with the session.
    pub fn recorder(&self) -> impl FnMut(&SessionUpdate) + 'static {
        let activity = Rc::clone(&self.activity);
        move |update| {
            let mut log = activity.borrow_mut();
            log.push_back(describe(update));
            while log.len() > ACTIVITY_LIMIT {
                log.pop_front();
            }
        }
    }
}

fn describe(update: &SessionUpdate) -> ActivityEntry {
    let (kind, message) = match update {
        SessionUpdate::Connection(state) => (
            ActivityKind::Connection,
            match state {
                ConnectionState::Disconnected => "Channel disconnected".to_string(),
                ConnectionState::Connecting => "Connecting to support".to_string(),
                ConnectionState::Connected => "Channel connected".to_string(),
            },
        ),
        SessionUpdate::Messages { total, unread } => (
            ActivityKind::Messages,
            format!("{total} message(s), {unread} unread"),
        ),
        SessionUpdate::Visibility(Visibility::Visible) => {
            (ActivityKind::Pane, "Chat pane opened".to_string())
        }
        SessionUpdate::Visibility(Visibility::Hidden) => {
            (ActivityKind::Pane, "Chat pane closed".to_string())
        }
        SessionUpdate::Notice(text) => (ActivityKind::Notice, text.clone()),
    };

    ActivityEntry {
        timestamp: Local::now(),
        kind,
        message,
    }
}
