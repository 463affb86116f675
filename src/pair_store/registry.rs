use rustc_hash::FxHashMap;

use crate::pair_store::sources::RawPair;

pub type PairSupplier = Box<dyn Fn() -> Vec<RawPair>>;

pub struct LanguageRegistry {
    suppliers: FxHashMap<String, PairSupplier>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("fr", Box::new(french_seed_pairs));
        registry
    }
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            suppliers: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, language: &str, supplier: PairSupplier) {
        self.suppliers.insert(language.to_string(), supplier);
    }

    pub fn supplier(&self, language: &str) -> Option<&PairSupplier> {
        self.suppliers.get(language)
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.suppliers.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }
}

fn french_seed_pairs() -> Vec<RawPair> {
    [
        ("baux", "bail"),
        ("étaient", "être"),
        ("brillante", "brillant"),
        ("brillantes", "brillant"),
        ("contente", "content"),
        ("aimante", "aimer"),
        ("chienne", "chien"),
        ("chiennes", "chien"),
        ("sorcière", "sorcier"),
        ("faille", "falloir"),
    ]
    .into_iter()
    .map(|(text, lemma)| (text.to_string(), lemma.to_string()))
    .collect()
}
