//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips the escape codes when stdout is
//! not a terminal or `NO_COLOR` is set.

use owo_colors::Style;
use std::fmt::Display;

/// Check mark used for completed items
pub const CHECK: &str = "✓";

/// Semantic styles for CLI output
pub trait Stylize: Display {
    /// Secondary information
    fn muted(&self) -> String {
        paint(self, Style::new().dimmed())
    }

    /// Names the user should notice (branches, remotes)
    fn emphasis(&self) -> String {
        paint(self, Style::new().bold())
    }

    /// Identifiers (commit ids, PR numbers)
    fn accent(&self) -> String {
        paint(self, Style::new().cyan())
    }

    /// Successful outcome
    fn success(&self) -> String {
        paint(self, Style::new().green())
    }

    /// Failure
    fn error(&self) -> String {
        paint(self, Style::new().red().bold())
    }
}

impl<T: Display + ?Sized> Stylize for T {}

fn paint<T: Display + ?Sized>(value: &T, style: Style) -> String {
    style.style(value).to_string()
}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Short form of a commit id
pub fn short_id(id: git2::Oid) -> String {
    let hex = id.to_string();
    hex[..hex.len().min(10)].to_string()
}
