//! Interactive confirmation.

use std::io::{self, BufRead, Write};

use crossterm::style::Stylize;

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> io::Result<bool> {
    // stdout is reserved for --json output
    eprint!("  {} {question} (y/N) ", "?".bold().cyan());
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}
