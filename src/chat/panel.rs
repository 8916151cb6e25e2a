//! Panel visibility state for the chat surface
//!
//! Visibility is orthogonal to message and session state: a closed panel
//! may still hold an active session with history, and a reply that lands
//! while the panel is hidden is appended to the (now-invisible) log.
//! Transitions happen on explicit user toggles only; there are no network
//! or persistence side effects here.

use colored::Colorize;
use std::fmt;

/// Visibility state of the chat panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelVisibility {
    /// Panel hidden; incoming turns are stored but not shown
    #[default]
    Closed,
    /// Panel visible and interactive
    Open,
    /// Panel collapsed to an indicator; turns are stored but not shown
    Minimized,
}

impl fmt::Display for PanelVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::Minimized => write!(f, "MINIMIZED"),
        }
    }
}

impl PanelVisibility {
    /// Parse a visibility state from a string
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "closed" | "close" | "hidden" => Ok(Self::Closed),
            "open" | "show" => Ok(Self::Open),
            "minimized" | "min" => Ok(Self::Minimized),
            other => Err(format!("Unknown panel state: {}", other)),
        }
    }

    /// Colored tag suitable for terminal display
    pub fn colored_tag(&self) -> String {
        match self {
            Self::Closed => format!("[{}]", "CLOSED".red()),
            Self::Open => format!("[{}]", "OPEN".green()),
            Self::Minimized => format!("[{}]", "MINIMIZED".yellow()),
        }
    }
}

/// Open/closed/minimized controller for the chat surface
#[derive(Debug, Clone, Default)]
pub struct PanelController {
    state: PanelVisibility,
}

impl PanelController {
    /// Create a controller in the given initial state
    pub fn new(state: PanelVisibility) -> Self {
        Self { state }
    }

    /// Current visibility state
    pub fn state(&self) -> PanelVisibility {
        self.state
    }

    /// Whether the panel is fully open
    pub fn is_open(&self) -> bool {
        self.state == PanelVisibility::Open
    }

    /// Open the panel
    pub fn open(&mut self) {
        self.state = PanelVisibility::Open;
    }

    /// Close the panel
    pub fn close(&mut self) {
        self.state = PanelVisibility::Closed;
    }

    /// Minimize the panel
    pub fn minimize(&mut self) {
        self.state = PanelVisibility::Minimized;
    }
}
