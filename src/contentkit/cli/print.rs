use colored::Colorize;
use contentkit::item::Item;
use contentkit::model::Fields;
use contentkit::validation::ValidationErrors;
use std::collections::BTreeMap;

const SUMMARY_WIDTH: usize = 60;

pub(super) fn print_success(message: &str) {
    println!("{}", message.green());
}

pub(super) fn print_item(item: &Item<'_>) {
    print_fields(item.id(), item.fields());
}

pub(super) fn print_fields(key: &str, fields: &Fields) {
    println!("{}", key.yellow().bold());
    if fields.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }
    for (name, value) in fields {
        println!("{}", format!("--- {} ---", name).cyan());
        println!("{}", value);
    }
}

pub(super) fn print_list(items: &BTreeMap<String, Item<'_>>) {
    if items.is_empty() {
        println!("No content items found.");
        return;
    }
    let width = items.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    for (key, item) in items {
        let summary = item
            .fields()
            .get("title")
            .or_else(|| item.fields().values().next())
            .map(|v| summarize(v))
            .unwrap_or_default();
        println!(
            "{}  {}",
            format!("{:<width$}", key, width = width).yellow(),
            summary.dimmed()
        );
    }
}

pub(super) fn print_validation_errors(key: &str, errors: &ValidationErrors) {
    eprintln!("{}", format!("{} was not saved:", key).red());
    for (_, messages) in errors.iter() {
        for message in messages {
            eprintln!("  {}", message.red());
        }
    }
}

fn summarize(value: &str) -> String {
    let line = value.lines().next().unwrap_or("").trim();
    if line.chars().count() <= SUMMARY_WIDTH {
        return line.to_string();
    }
    let cut: String = line.chars().take(SUMMARY_WIDTH - 1).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize() {
        assert_eq!(summarize("short\nsecond line"), "short");
        let long = "x".repeat(100);
        let out = summarize(&long);
        assert_eq!(out.chars().count(), SUMMARY_WIDTH);
        assert!(out.ends_with('…'));
    }
}
