//! Status lines printed by the procat commands.
//!
//! Coloring follows `colored`'s NO_COLOR / CLICOLOR handling; `--no-color`
//! turns it off globally before any of these run.

use colored::Colorize;

use crate::application::{Notification, NotificationLevel};

/// Fatal command error on stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Non-fatal problem on stderr, e.g. an empty listing
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Confirmed change
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Rejected change
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✗".red(), msg);
}

/// Labelled line, e.g. `Created: <name> (<id>)` or a config file source
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Field of a process, or the backend's reason under a failure
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Rendered tree and other data meant for stdout
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Toast raised by the tree after a reorder commit settles.
pub fn notification(n: &Notification) {
    match n.level {
        NotificationLevel::Success => success(&n.message),
        NotificationLevel::Error => {
            failure(&n.message);
            if let Some(detail_text) = &n.detail {
                detail(detail_text);
            }
        }
    }
}
