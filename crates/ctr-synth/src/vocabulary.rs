//! Built-in search-term vocabularies.

const ECOMMERCE: &[&str] = &[
    // electronics
    "wireless earbuds",
    "laptop",
    "smartphone",
    "smart watch",
    "tablet",
    // clothing
    "running shoes",
    "winter jacket",
    "yoga pants",
    "dress",
    "jeans",
    // home and kitchen
    "coffee maker",
    "air fryer",
    "bedding set",
    "throw pillows",
    "curtains",
    // beauty
    "face moisturizer",
    "shampoo",
    "makeup palette",
    "perfume",
    "skincare set",
    // sports and outdoors
    "yoga mat",
    "dumbbells",
    "camping tent",
    "hiking boots",
    "water bottle",
];

const SITE_SEARCH: &[&str] = &[
    "pricing",
    "login",
    "contact",
    "support",
    "shipping",
    "returns",
    "order status",
    "gift cards",
    "store locator",
    "careers",
];

/// Which term list the generator draws `search_term` from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Vocabulary {
    /// 25 product queries across five departments.
    #[default]
    Ecommerce,
    /// Generic navigation queries typed into a site search box.
    SiteSearch,
}

impl Vocabulary {
    /// The terms, each drawn with equal probability.
    #[must_use]
    pub fn terms(self) -> &'static [&'static str] {
        match self {
            Vocabulary::Ecommerce => ECOMMERCE,
            Vocabulary::SiteSearch => SITE_SEARCH,
        }
    }

    /// Return `true` if `term` belongs to this vocabulary.
    #[must_use]
    pub fn contains(self, term: &str) -> bool {
        self.terms().contains(&term)
    }
}
