//! LaTeX math normalization for the first escape pass.
//!
//! Delimiters are stripped and block math is set apart by blank lines. Symbol conversion (`\alpha` → `α`) is
//! not performed; expressions pass through unchanged.

/// Normalizes one math expression captured with its delimiters (`\( .. \)` or `\[ .. \]`).
pub fn latex_to_unicode(expr: &str) -> String {
    let expr = expr.trim();
    let block = expr.starts_with("\\[");
    let stripped = expr
        .replace("\\[", "")
        .replace("\\]", "")
        .replace("\\(", "")
        .replace("\\)", "");
    if block {
        format!("\n\n{}\n\n", stripped.trim())
    } else {
        stripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_math_drops_delimiters() {
        assert_eq!(latex_to_unicode("\\(x + y\\)"), "x + y");
    }

    #[test]
    fn block_math_gets_blank_lines() {
        assert_eq!(latex_to_unicode("\n  \\[ E = mc^2 \\]\n"), "\n\nE = mc^2\n\n");
    }

    #[test]
    fn symbols_pass_through() {
        assert_eq!(latex_to_unicode("\\(\\alpha\\)"), "\\alpha");
    }
}
