use regex::Regex;

// Apostrophe glyphs found in the lexicons, all folded onto the ASCII one
pub const DEFAULT_APOSTROPHE_PATTERN: &str = "[’`]";
pub const DEFAULT_APOSTROPHE_REPLACEMENT: &str = "'";
pub const DEFAULT_FORBIDDEN_SYMBOLS: &str = "!\"#$%&()*+,/:;<=>?@[\\]^_{|}~.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    LeadingPunctuation,
    ForbiddenCharacter,
    SelfMapping,
}

#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    pattern: Regex,
    replacement: String,
}

impl SubstitutionRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Turns a raw `(word, lemma)` pair into the normalized form the association
/// graph stores, or says why the pair has to be dropped.
#[derive(Debug, Clone)]
pub struct PairNormalizer {
    substitutions: Vec<SubstitutionRule>,
    forbidden_symbols: Vec<char>,
}

impl Default for PairNormalizer {
    fn default() -> Self {
        let apostrophes =
            SubstitutionRule::new(DEFAULT_APOSTROPHE_PATTERN, DEFAULT_APOSTROPHE_REPLACEMENT)
                .expect("default apostrophe pattern is a valid regex");
        Self::new(vec![apostrophes], DEFAULT_FORBIDDEN_SYMBOLS)
    }
}

impl PairNormalizer {
    pub fn new(substitutions: Vec<SubstitutionRule>, forbidden_symbols: &str) -> Self {
        Self {
            substitutions,
            forbidden_symbols: forbidden_symbols.chars().collect(),
        }
    }

    pub fn clean_field(&self, field: &str) -> String {
        let mut cleaned = field.trim().to_lowercase();
        for rule in &self.substitutions {
            cleaned = rule.apply(&cleaned);
        }
        cleaned
    }

    pub fn check_field(&self, field: &str) -> Result<(), Rejection> {
        let Some(first) = field.chars().next() else {
            return Err(Rejection::Empty);
        };
        if first.is_ascii_punctuation() {
            return Err(Rejection::LeadingPunctuation);
        }
        if field
            .chars()
            .any(|c| c.is_ascii_digit() || self.forbidden_symbols.contains(&c))
        {
            return Err(Rejection::ForbiddenCharacter);
        }
        Ok(())
    }

    pub fn normalize(&self, word: &str, lemma: &str) -> Result<(String, String), Rejection> {
        let word = self.clean_field(word);
        let lemma = self.clean_field(lemma);
        self.check_field(&word)?;
        self.check_field(&lemma)?;
        if word == lemma {
            return Err(Rejection::SelfMapping);
        }
        Ok((word, lemma))
    }
}
