//! Keyword category classifier shared by the receipt, chat and query paths.
//!
//! One ordered table of (category, keywords). The first category with any
//! keyword appearing as a substring of the lower-cased text wins, so
//! declaration order is the tie-break.

use crate::expense::Category;

/// Anything that can put free text into a category
pub trait Classify {
    fn classify(&self, text: &str) -> Category;
}

/// Ordered keyword table, checked top to bottom.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &[
            "eat", "ate", "lunch", "dinner", "breakfast", "snack", "burger", "biryani", "pizza",
            "kfc", "mcdonald", "coffee", "restaurant", "meal", "chai", "tea",
        ],
    ),
    (
        Category::Transport,
        &[
            "uber", "careem", "taxi", "bus", "train", "fuel", "petrol", "diesel", "ride", "cab",
            "fare",
        ],
    ),
    (
        Category::Bills,
        &["bill", "electricity", "gas", "water", "internet", "wifi", "phone", "rent"],
    ),
    (
        Category::Shopping,
        &[
            "grocery", "groceries", "clothes", "shirt", "shoes", "mall", "amazon", "daraz",
            "market", "shopping",
        ],
    ),
    (Category::Entertainment, &["movie", "netflix", "cinema"]),
];

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(Category, Vec<String>)>,
    default: Category,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::from_table(CATEGORY_KEYWORDS, Category::Other)
    }
}

impl KeywordClassifier {
    /// Build from an ordered table. Keywords are lower-cased once here.
    pub fn from_table(table: &[(Category, &[&str])], default: Category) -> Self {
        let rules = table
            .iter()
            .map(|(cat, kws)| (*cat, kws.iter().map(|k| k.to_lowercase()).collect()))
            .collect();
        Self { rules, default }
    }

    /// Same table, different fallback (the receipt path falls back to Shopping)
    pub fn with_default(mut self, default: Category) -> Self {
        self.default = default;
        self
    }

    /// First matching category, or `None` when no keyword hits.
    pub fn find(&self, text: &str) -> Option<Category> {
        let t = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, kws)| kws.iter().any(|k| t.contains(k.as_str())))
            .map(|(cat, _)| *cat)
    }
}

impl Classify for KeywordClassifier {
    fn classify(&self, text: &str) -> Category {
        self.find(text).unwrap_or(self.default)
    }
}
