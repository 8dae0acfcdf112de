/// Output formatting: terminal table and JSON.
use anyhow::Result;
use colored::Colorize;
use elorank_core::{ItemPayload, RankedItem};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Serialize)]
struct JsonRankedItem<'a> {
    rank: usize,
    name: &'a str,
    #[serde(skip_serializing_if = "no_metadata")]
    metadata: &'a BTreeMap<String, String>,
    rating: f64,
    comparisons: usize,
    last_difference: f64,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    items: Vec<JsonRankedItem<'a>>,
    total_comparisons: usize,
}

fn no_metadata(metadata: &&BTreeMap<String, String>) -> bool {
    metadata.is_empty()
}

/// Name plus metadata values, e.g. "Teardrop (Massive Attack, Mezzanine)".
pub fn display_name(payload: &ItemPayload) -> String {
    if payload.metadata.is_empty() {
        return payload.name.clone();
    }
    let details: Vec<&str> = payload.metadata.values().map(String::as_str).collect();
    format!("{} ({})", payload.name, details.join(", "))
}

fn format_difference(diff: f64) -> String {
    let text = format!("{:>+7.1}", diff);
    if diff > 0.0 {
        text.green().to_string()
    } else if diff < 0.0 {
        text.red().to_string()
    } else {
        text.dimmed().to_string()
    }
}

/// Render the standings as a terminal table.
pub fn format_table(items: &[RankedItem<ItemPayload>], total_comparisons: usize) -> String {
    let names: Vec<String> = items.iter().map(|item| display_name(&item.payload)).collect();
    let name_width = names.iter().map(|n| n.chars().count()).max().unwrap_or(4).max(4);

    let mut out = String::new();
    let _ = writeln!(out, " # | {:<name_width$} |  Rating | Comparisons | Last change", "Item");
    let _ = writeln!(out, "---|-{}-|---------|-------------|------------", "-".repeat(name_width));

    for (i, (item, name)) in items.iter().zip(names.iter()).enumerate() {
        let _ = writeln!(
            out,
            "{:>2} | {:<name_width$} | {:>7.1} | {:>11} | {}",
            i + 1,
            name,
            item.rating,
            item.round,
            format_difference(item.last_difference),
        );
    }

    let _ = write!(out, "\n{} items ranked after {} comparisons", items.len(), total_comparisons);
    out
}

pub fn print_table(items: &[RankedItem<ItemPayload>], total_comparisons: usize) {
    println!("{}", format_table(items, total_comparisons));
}

/// Render the standings as pretty JSON.
pub fn format_json(items: &[RankedItem<ItemPayload>], total_comparisons: usize) -> Result<String> {
    let items: Vec<JsonRankedItem> = items
        .iter()
        .enumerate()
        .map(|(i, item)| JsonRankedItem {
            rank: i + 1,
            name: &item.payload.name,
            metadata: &item.payload.metadata,
            rating: item.rating,
            comparisons: item.round,
            last_difference: item.last_difference,
        })
        .collect();

    Ok(serde_json::to_string_pretty(&JsonOutput { items, total_comparisons })?)
}

pub fn print_json(items: &[RankedItem<ItemPayload>], total_comparisons: usize) -> Result<()> {
    println!("{}", format_json(items, total_comparisons)?);
    Ok(())
}
