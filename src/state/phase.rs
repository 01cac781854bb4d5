/// Crawl loop phase definitions
///
/// This module defines every phase the crawl loop can be in and which
/// transitions between them are legal.
use std::fmt;

/// Represents the current phase of the crawl loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Fetching a search results page
    FetchingSearchPage,

    /// Pulling product links out of a fetched search page
    ExtractingLinks,

    /// Fetching a product page
    FetchingProduct,

    /// Pulling a record out of a fetched product page
    ExtractingProduct,

    /// Filtering the record and handing it to the sink
    Emitting,

    /// Looking up the link to the next search page
    FetchingNextPage,

    /// The run is over
    Terminal,
}

impl CrawlPhase {
    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// Returns true if a transition from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (self, next) {
            (Terminal, _) => false,
            (_, Terminal) => true,
            (FetchingSearchPage, ExtractingLinks) => true,
            (ExtractingLinks, FetchingProduct | FetchingNextPage) => true,
            (FetchingProduct, ExtractingProduct | FetchingProduct | FetchingNextPage) => true,
            (ExtractingProduct, Emitting | FetchingProduct | FetchingNextPage) => true,
            (Emitting, FetchingProduct | FetchingNextPage) => true,
            (FetchingNextPage, FetchingSearchPage) => true,
            _ => false,
        }
    }

    /// Short lowercase label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::FetchingSearchPage => "fetching_search_page",
            Self::ExtractingLinks => "extracting_links",
            Self::FetchingProduct => "fetching_product",
            Self::ExtractingProduct => "extracting_product",
            Self::Emitting => "emitting",
            Self::FetchingNextPage => "fetching_next_page",
            Self::Terminal => "terminal",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_is_final() {
        assert!(CrawlPhase::Terminal.is_terminal());
        assert!(!CrawlPhase::Terminal.can_transition_to(CrawlPhase::FetchingSearchPage));
        assert!(!CrawlPhase::FetchingProduct.is_terminal());
    }

    #[test]
    fn test_every_phase_may_terminate() {
        for phase in [
            CrawlPhase::FetchingSearchPage,
            CrawlPhase::ExtractingLinks,
            CrawlPhase::FetchingProduct,
            CrawlPhase::ExtractingProduct,
            CrawlPhase::Emitting,
            CrawlPhase::FetchingNextPage,
        ] {
            assert!(phase.can_transition_to(CrawlPhase::Terminal), "{}", phase);
        }
    }

    #[test]
    fn test_main_cycle_transitions() {
        use CrawlPhase::*;

        let cycle = [
            FetchingSearchPage,
            ExtractingLinks,
            FetchingProduct,
            ExtractingProduct,
            Emitting,
            FetchingNextPage,
            FetchingSearchPage,
        ];
        for pair in cycle.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_illegal_transitions() {
        use CrawlPhase::*;

        assert!(!FetchingSearchPage.can_transition_to(FetchingProduct));
        assert!(!ExtractingLinks.can_transition_to(Emitting));
        assert!(!FetchingNextPage.can_transition_to(FetchingProduct));
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(CrawlPhase::FetchingSearchPage.to_string(), "fetching_search_page");
        assert_eq!(CrawlPhase::Terminal.to_string(), "terminal");
    }
}
