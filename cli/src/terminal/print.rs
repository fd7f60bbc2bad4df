use std::fmt::Display;

use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

pub const TOTAL_WIDTH: usize = 64;
pub const PRINT_TARGET: &str = "topomap::print";

/// Writes a line through the subscriber so it interleaves with the spinner.
pub fn print(msg: &str) {
    info!(target: "topomap::print", raw_msg = msg);
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = UnicodeWidthStr::width(formatted.as_str());

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    print(&format!("{}", line));
}

pub fn fat_separator() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).bright_black();
    print(&format!("{}", sep));
}

/// `key.....: value` with keys padded to `key_width`.
pub fn aligned_line<V: Display>(key: &str, value: V, key_width: usize) {
    let dots: String = ".".repeat((key_width + 1).saturating_sub(key.len()));
    print(&format!(
        "{} {}{}{} {}",
        ">".bright_black(),
        key.cyan(),
        dots.bright_black(),
        ":".bright_black(),
        value
    ));
}

pub fn tree_head(idx: usize, name: &str) {
    let idx_str: String = format!("[{}]", idx.to_string().yellow());
    print(&format!("{} {}", idx_str.bright_black(), name.cyan()));
}

pub fn as_tree_one_level(details: &[(String, String)]) {
    let width = details.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (i, (key, value)) in details.iter().enumerate() {
        let branch = if i + 1 == details.len() { " └─" } else { " ├─" };
        let dots = ".".repeat((width + 1).saturating_sub(key.len()));
        print(&format!(
            "{} {}{}{} {}",
            branch.bright_black(),
            key.cyan(),
            dots.bright_black(),
            ":".bright_black(),
            value
        ));
    }
}

pub fn no_results(msg: &str) {
    print(&format!("{}", msg.red().bold()));
}
