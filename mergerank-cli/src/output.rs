/// Output formatting: terminal table and JSON.
use mergerank_core::Item;
use serde::Serialize;

use crate::bail;

#[derive(Serialize)]
struct JsonRankedItem<'a> {
    rank: usize,
    id: i64,
    title: &'a str,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    items: Vec<JsonRankedItem<'a>>,
    total_comparisons: usize,
}

/// Print results as a formatted terminal table.
pub fn print_table(order: &[Item], total_comparisons: usize) {
    let title_width = order.iter()
        .map(|item| item.title.chars().count())
        .max()
        .unwrap_or(4)
        .max(4); // at least "Item"

    println!(" # | {:<title_width$} | Id", "Item");
    println!("---|-{}-|------", "-".repeat(title_width));

    for (i, item) in order.iter().enumerate() {
        println!("{:>2} | {:<title_width$} | {}", i + 1, item.title, item.id);
    }

    println!("\n{} items ranked ({} comparisons)", order.len(), total_comparisons);
}

fn to_json(order: &[Item], total_comparisons: usize) -> String {
    let items = order
        .iter()
        .enumerate()
        .map(|(i, item)| JsonRankedItem {
            rank: i + 1,
            id: item.id,
            title: &item.title,
            image_url: item.image_url.as_deref(),
        })
        .collect();

    let output = JsonOutput { items, total_comparisons };
    serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| bail(format!("Failed to encode results as JSON: {e}")))
}

/// Print results as JSON.
pub fn print_json(order: &[Item], total_comparisons: usize) {
    println!("{}", to_json(order, total_comparisons));
}
