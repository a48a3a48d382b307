//! Centralized color scheme for consistent output formatting

use colored::{ColoredString, Colorize};

/// Structural element colors
pub struct StructureColors;

impl StructureColors {
    /// Variable names
    pub fn variable(text: &str) -> ColoredString {
        text.white().bold()
    }

    /// Entity or document handles (e.g., #12/Wall, 0x1000)
    pub fn entity(text: &str) -> ColoredString {
        text.cyan()
    }

    /// Count/statistics numbers
    pub fn count(text: &str) -> ColoredString {
        text.yellow().bold()
    }
}
