//! Side-by-side comparison of two query results.

use serde::{Deserialize, Serialize};

use crate::types::requests::Provider;
use crate::types::responses::QueryResult;

/// Derived summary of two results for the same query.
///
/// Deltas are signed and always `first - second`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comparison {
    pub query: String,
    pub first: Provider,
    pub second: Provider,

    /// Provider that answered strictly faster; `None` on ties or when either
    /// call did not complete.
    pub faster: Option<Provider>,

    pub first_elapsed_seconds: f64,
    pub second_elapsed_seconds: f64,
    pub elapsed_delta_seconds: f64,

    pub first_citations: usize,
    pub second_citations: usize,
    pub citation_delta: i64,

    pub first_answer_length: usize,
    pub second_answer_length: usize,
    pub answer_length_delta: i64,
}

/// Builds [`Comparison`]s.
pub struct Comparator;

impl Comparator {
    /// Compares two results.
    pub fn compare(first: &QueryResult, second: &QueryResult) -> Comparison {
        if first.query != second.query {
            tracing::debug!("Comparing results for different queries");
        }

        let first_citations = first.citations.len();
        let second_citations = second.citations.len();
        let first_answer_length = first.answer_length();
        let second_answer_length = second.answer_length();

        Comparison {
            query: first.query.clone(),
            first: first.provider,
            second: second.provider,
            faster: Self::faster(first, second),
            first_elapsed_seconds: first.elapsed_seconds,
            second_elapsed_seconds: second.elapsed_seconds,
            elapsed_delta_seconds: first.elapsed_seconds - second.elapsed_seconds,
            first_citations,
            second_citations,
            citation_delta: first_citations as i64 - second_citations as i64,
            first_answer_length,
            second_answer_length,
            answer_length_delta: first_answer_length as i64 - second_answer_length as i64,
        }
    }

    /// Picks the provider with the lower elapsed time among completed calls.
    pub fn faster(first: &QueryResult, second: &QueryResult) -> Option<Provider> {
        let completed = |r: &QueryResult| r.error.is_none() && r.elapsed_seconds > 0.0;
        if !completed(first) || !completed(second) {
            return None;
        }

        if first.elapsed_seconds < second.elapsed_seconds {
            Some(first.provider)
        } else if second.elapsed_seconds < first.elapsed_seconds {
            Some(second.provider)
        } else {
            None
        }
    }
}

impl Comparison {
    /// Renders the comparison as a plain-text block.
    pub fn render(&self) -> String {
        let first = self.first.display_name();
        let second = self.second.display_name();

        let mut out = String::new();
        out.push_str(&format!("Query: {}\n", self.query));
        out.push_str(&format!("{} response time: {:.2}s\n", first, self.first_elapsed_seconds));
        out.push_str(&format!("{} response time: {:.2}s\n", second, self.second_elapsed_seconds));
        match self.faster {
            Some(provider) => out.push_str(&format!("Faster: {}\n", provider.display_name())),
            None => out.push_str("Faster: n/a\n"),
        }
        out.push('\n');
        out.push_str(&format!("{} sources: {}\n", first, self.first_citations));
        out.push_str(&format!("{} sources: {}\n", second, self.second_citations));
        out.push_str(&format!("Source delta: {:+}\n", self.citation_delta));
        out.push('\n');
        out.push_str(&format!("{} answer length: {} chars\n", first, self.first_answer_length));
        out.push_str(&format!("{} answer length: {} chars\n", second, self.second_answer_length));
        out.push_str(&format!("Length delta: {:+}\n", self.answer_length_delta));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::responses::Citation;

    fn result(provider: Provider, answer: &str, elapsed: f64, citations: usize) -> QueryResult {
        QueryResult::answered(provider, "q", provider.default_model(), answer, elapsed).with_citations(
            (0..citations)
                .map(|i| Citation::new(format!("s{i}"), format!("https://s{i}.example")))
                .collect(),
        )
    }

    #[test]
    fn test_lower_elapsed_is_faster() {
        let gemini = result(Provider::Gemini, "short", 1.5, 3);
        let perplexity = result(Provider::Perplexity, "a longer answer", 2.5, 5);

        let comparison = Comparator::compare(&gemini, &perplexity);

        assert_eq!(comparison.faster, Some(Provider::Gemini));
        assert_eq!(comparison.citation_delta, -2);
        assert_eq!(comparison.answer_length_delta, -10);
        assert!((comparison.elapsed_delta_seconds + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_has_no_winner() {
        let a = result(Provider::Gemini, "x", 1.0, 0);
        let b = result(Provider::Perplexity, "x", 1.0, 0);

        assert_eq!(Comparator::faster(&a, &b), None);
    }

    #[test]
    fn test_failed_call_is_never_faster() {
        let failed = QueryResult::failure(Provider::Gemini, "q", "m", "timeout");
        let ok = result(Provider::Perplexity, "answer", 3.0, 1);

        let comparison = Comparator::compare(&failed, &ok);

        assert_eq!(comparison.faster, None);
        assert_eq!(comparison.citation_delta, -1);
        assert_eq!(comparison.answer_length_delta, -6);
    }

    #[test]
    fn test_render_mentions_both_providers() {
        let comparison = Comparator::compare(
            &result(Provider::Gemini, "a", 0.5, 1),
            &result(Provider::Perplexity, "bb", 0.75, 0),
        );

        let text = comparison.render();

        assert!(text.contains("Gemini response time: 0.50s"));
        assert!(text.contains("Perplexity sources: 0"));
        assert!(text.contains("Faster: Gemini"));
        assert!(text.contains("Source delta: +1"));
    }
}
