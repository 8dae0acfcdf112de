/// Verdict extraction from LLM responses.
///
/// The model is asked to end with "Verdict:" followed by A or B. We look for
/// the marker first, then fall back to a bare "A:" / "B:" line near the end.

/// Which presented option the model picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    OptionA,
    OptionB,
}

fn letter_to_verdict(c: char) -> Option<Verdict> {
    match c.to_ascii_uppercase() {
        'A' => Some(Verdict::OptionA),
        'B' => Some(Verdict::OptionB),
        _ => None,
    }
}

/// Find the letter following the last "Verdict:" marker, on the same line
/// or the next non-empty one.
fn parse_verdict_marker(text: &str) -> Option<Verdict> {
    let lower = text.to_ascii_lowercase();
    let idx = lower.rfind("verdict")?;
    let after = &text[idx + "verdict".len()..];
    let after = after.trim_start_matches(|c: char| c == ':' || c == '*' || c.is_whitespace());

    let mut chars = after.chars();
    let first = chars.next()?;
    // A lone letter, not the start of a word ("both", "a tough call")
    let standalone = match chars.next() {
        None | Some(':') | Some('\n') | Some('\r') => true,
        Some(c) => first.is_ascii_uppercase() && !c.is_alphanumeric(),
    };
    if !standalone {
        return None;
    }
    letter_to_verdict(first)
}

/// Fallback: look for lines like "B: Option B wins" among the last few lines.
fn parse_verdict_from_text(text: &str) -> Option<Verdict> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(5);
    for line in lines[start..].iter().rev() {
        let chars: Vec<char> = line.trim().chars().take(2).collect();
        if chars.len() >= 2 && chars[1] == ':' {
            if let Some(verdict) = letter_to_verdict(chars[0]) {
                return Some(verdict);
            }
        }
    }
    None
}

/// Parse a comparison response. Returns None if no verdict can be found.
pub fn parse_verdict(text: &str) -> Option<Verdict> {
    parse_verdict_marker(text).or_else(|| parse_verdict_from_text(text))
}
