use tracing::debug;

const PARAGRAPH_DELIMITER: &str = "\n\n";

/// Splits the input on blank lines.
///
/// Every piece between two `"\n\n"` sequences is trimmed and
/// pieces that end up empty are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParagraphWindow;

impl ParagraphWindow {
    pub fn chunk<'a>(&self, input: &'a str) -> Vec<&'a str> {
        let chunks = input
            .split(PARAGRAPH_DELIMITER)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>();

        debug!("Chunked {} paragraphs", chunks.len());

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_window_works() {
        let chunks = ParagraphWindow.chunk("a\n\nb\n\n\nc");
        assert_eq!(vec!["a", "b", "c"], chunks);
    }

    #[test]
    fn paragraph_window_skips_blank_pieces() {
        let input = "\n\n  First paragraph,\nstill first.  \n\n \t \n\n\n\nSecond.\n\n";
        let chunks = ParagraphWindow.chunk(input);

        assert_eq!(vec!["First paragraph,\nstill first.", "Second."], chunks);
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }

    #[test]
    fn paragraph_window_single_paragraph() {
        let input = "Just one line.\nAnd another one.";
        assert_eq!(vec![input], ParagraphWindow.chunk(input));
    }

    #[test]
    fn paragraph_window_empty() {
        assert!(ParagraphWindow.chunk("").is_empty());
        assert!(ParagraphWindow.chunk("\n\n\n\n").is_empty());
    }
}
