/// Normalizes extracted text: lines are trimmed, blank lines dropped, the
/// rest rejoined with single newlines, and runs of interior spaces
/// collapsed to one. Idempotent: cleaning already-clean text is a no-op.
pub fn clean_text(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut first_line = true;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !first_line {
            result.push('\n');
        }
        collapse_spaces(trimmed, &mut result);
        first_line = false;
    }

    result
}

fn collapse_spaces(line: &str, out: &mut String) {
    let mut prev_was_space = false;

    for ch in line.chars() {
        if ch == ' ' {
            if !prev_was_space {
                out.push(' ');
                prev_was_space = true;
            }
        } else {
            out.push(ch);
            prev_was_space = false;
        }
    }
}
