//! Repairs for the OCR misreads that matter in numeric date contexts.

/// Letter `O` read where a zero was printed, lowercase `l` where a one was printed.
pub const DEFAULT_SUBSTITUTIONS: &[(char, char)] = &[('O', '0'), ('l', '1')];

/// Applies a fixed character substitution table and trims the result.
#[derive(Debug, Clone, Copy)]
pub struct TextCleaner {
    substitutions: &'static [(char, char)],
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSTITUTIONS)
    }
}

impl TextCleaner {
    pub fn new(substitutions: &'static [(char, char)]) -> Self {
        Self { substitutions }
    }

    pub fn substitutions(&self) -> &'static [(char, char)] {
        self.substitutions
    }

    /// Every character is looked up once, so the table order never matters as long as
    /// no replacement is itself a key.
    pub fn clean(&self, text: &str) -> String {
        let cleaned: String = text
            .chars()
            .map(|c| {
                self.substitutions
                    .iter()
                    .find(|(from, _)| *from == c)
                    .map_or(c, |(_, to)| *to)
            })
            .collect();
        let cleaned = cleaned.trim().to_string();
        tracing::debug!(text = %cleaned, "cleaned OCR text");
        cleaned
    }
}

/// Cleans `text` with [`DEFAULT_SUBSTITUTIONS`].
pub fn clean(text: &str) -> String {
    TextCleaner::default().clean(text)
}
