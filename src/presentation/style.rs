//! Line styles told apart by consecutive runs.

use std::fmt;

use plotly::common::DashType;
use serde::{Deserialize, Serialize};

/// Line styles, in the order they are handed out to consecutive runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dash,
    Dot,
    DashDot,
}

/// Every style, starting with the one a new figure begins with.
pub const LINE_STYLES: [LineStyle; 4] = [
    LineStyle::Solid,
    LineStyle::Dash,
    LineStyle::Dot,
    LineStyle::DashDot,
];

impl LineStyle {
    /// Short notation (`-`, `--`, `:`, `-.`).
    pub fn symbol(&self) -> &'static str {
        match self {
            LineStyle::Solid => "-",
            LineStyle::Dash => "--",
            LineStyle::Dot => ":",
            LineStyle::DashDot => "-.",
        }
    }

    /// The plotly dash type drawing this style.
    pub fn dash(&self) -> DashType {
        match self {
            LineStyle::Solid => DashType::Solid,
            LineStyle::Dash => DashType::Dash,
            LineStyle::Dot => DashType::Dot,
            LineStyle::DashDot => DashType::DashDot,
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Endless cycle over [`LINE_STYLES`].
#[derive(Debug, Clone, Default)]
pub struct StyleCycle {
    position: usize,
}

impl StyleCycle {
    /// Starts over at the solid style.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Hands out the next style, wrapping around after [`LineStyle::DashDot`].
    pub fn next_style(&mut self) -> LineStyle {
        let style = LINE_STYLES[self.position % LINE_STYLES.len()];
        self.position += 1;
        style
    }
}
