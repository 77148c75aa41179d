use colored::Colorize;
use std::fmt;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
        MessageKind::Success => text.bright_green().to_string(),
        MessageKind::Warning => format!("[!] {text}").bright_yellow().to_string(),
        MessageKind::Error => format!("[x] {text}").bright_red().to_string(),
        MessageKind::Info => text,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message);
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Left-aligned columns padded to the widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(headers.to_vec())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_align() {
        let table = render_table(
            &["Name", "Balance"],
            &[
                vec!["Bank".into(), "$10.00".into()],
                vec!["Credit card".into(), "-$5.00".into()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Name         Balance");
        assert_eq!(lines[1], "-----------  -------");
        assert_eq!(lines[3], "Credit card  -$5.00");
    }
}
