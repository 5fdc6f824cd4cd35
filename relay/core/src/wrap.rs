//! Greedy word wrapping for display lines

/// Pack whitespace-separated words into lines of at most `max_line_length`
/// bytes
///
/// Words are joined by a single space and never split, so a word longer than
/// the limit gets a line of its own. Empty lines are never produced.
#[must_use]
pub fn split_response(response: &str, max_line_length: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in response.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_line_length {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
