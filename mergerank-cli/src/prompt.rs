/// Rendering of a pending comparison for the terminal.
use mergerank_core::{ComparisonRequest, Item, ProgressUpdate};

pub const HELP: &str = "Type 1 or 2 to pick, u to undo, x1/x2 to remove an item, q to stop.";

fn describe(item: &Item) -> String {
    match &item.image_url {
        Some(url) => format!("{} <{url}>", item.title),
        None => item.title.clone(),
    }
}

/// Build the question shown for one comparison.
pub fn build_prompt(request: &ComparisonRequest, progress: ProgressUpdate) -> String {
    format!(
        "\n[{:>3}% | {} answered] Which do you prefer?\n  \
         1) {}\n  \
         2) {}\n\
         > ",
        progress.percent_complete,
        progress.comparison_count,
        describe(&request.left),
        describe(&request.right),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_contains_all_parts() {
        let request = ComparisonRequest {
            left: Item::new(1, "Pizza"),
            right: Item::new(2, "Sushi").with_image("http://img/sushi.png"),
        };
        let prompt = build_prompt(&request, ProgressUpdate { comparison_count: 3, percent_complete: 42 });
        assert!(prompt.contains(" 42%"));
        assert!(prompt.contains("3 answered"));
        assert!(prompt.contains("1) Pizza\n"));
        assert!(prompt.contains("2) Sushi <http://img/sushi.png>"));
        assert!(prompt.ends_with("> "));
    }
}
