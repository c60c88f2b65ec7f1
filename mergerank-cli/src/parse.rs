/// Parsing of interactive answers typed at the comparison prompt.

/// Which of the two shown items an answer refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Pick(Side),
    Undo,
    Remove(Side),
    Quit,
}

fn parse_side(token: &str) -> Option<Side> {
    match token {
        "1" | "l" | "left" => Some(Side::Left),
        "2" | "r" | "right" => Some(Side::Right),
        _ => None,
    }
}

/// Parse one input line. `None` means the line was not understood.
///
/// Accepted: `1`/`2` (or `l`/`r`) to pick, `u` to undo, `x1`/`x 2`/`remove 1`
/// to drop an item from the ranking, `q` to stop.
pub fn parse_answer(line: &str) -> Option<Answer> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "u" | "undo" => return Some(Answer::Undo),
        "q" | "quit" | "exit" => return Some(Answer::Quit),
        _ => {}
    }

    if let Some(side) = parse_side(&line) {
        return Some(Answer::Pick(side));
    }

    let rest = line
        .strip_prefix("remove")
        .or_else(|| line.strip_prefix('x'))?;
    parse_side(rest.trim()).map(Answer::Remove)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks() {
        assert_eq!(parse_answer("1"), Some(Answer::Pick(Side::Left)));
        assert_eq!(parse_answer(" 2\n"), Some(Answer::Pick(Side::Right)));
        assert_eq!(parse_answer("L"), Some(Answer::Pick(Side::Left)));
        assert_eq!(parse_answer("right"), Some(Answer::Pick(Side::Right)));
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_answer("u"), Some(Answer::Undo));
        assert_eq!(parse_answer("Q"), Some(Answer::Quit));
        assert_eq!(parse_answer("x1"), Some(Answer::Remove(Side::Left)));
        assert_eq!(parse_answer("x 2"), Some(Answer::Remove(Side::Right)));
        assert_eq!(parse_answer("remove 1"), Some(Answer::Remove(Side::Left)));
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("3"), None);
        assert_eq!(parse_answer("x"), None);
        assert_eq!(parse_answer("x3"), None);
        assert_eq!(parse_answer("hello"), None);
    }
}
