//! Watchlist input type.
//!
//! The watchlist is owned by an external configuration collaborator; the
//! engine only ever reads it. Symbols are normalized (trimmed, uppercased)
//! and de-duplicated with first occurrence winning, so batch order is
//! stable and predictable.

/// Ordered set of unique, normalized symbols.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    /// Build a watchlist from raw symbol strings. Empty entries are
    /// dropped; duplicates keep their first position.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for raw in symbols {
            let symbol = raw.as_ref().trim().to_uppercase();
            if symbol.is_empty() || normalized.contains(&symbol) {
                continue;
            }
            normalized.push(symbol);
        }
        Self {
            symbols: normalized,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<'a> IntoIterator for &'a Watchlist {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_and_deduplicates() {
        let watchlist = Watchlist::new(["aapl", " MSFT ", "AAPL", "", "msft"]);
        assert_eq!(watchlist.symbols(), &["AAPL", "MSFT"]);
    }

    #[test]
    fn test_preserves_first_occurrence_order() {
        let watchlist = Watchlist::new(["TSLA", "NVDA", "tsla", "AMD"]);
        assert_eq!(watchlist.symbols(), &["TSLA", "NVDA", "AMD"]);
    }

    #[test]
    fn test_empty_input_is_empty() {
        let watchlist = Watchlist::new(Vec::<String>::new());
        assert!(watchlist.is_empty());
        assert_eq!(watchlist.len(), 0);
    }
}
