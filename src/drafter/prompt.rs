//! Prompt construction for reply drafting

use crate::store::{Review, is_missing_text};

use super::client::ChatMessage;

/// Fixed system instruction: tone, language matching, length matching
pub const SYSTEM_PROMPT: &str = "You are a business owner responding to customer google my business reviews in a helpful and professional tone. Respond in the same language as the review. Responses should be varied but be similar length to previous responses.";

/// Stand-in for reviews that carry a rating but no text
pub const REVIEW_PLACEHOLDER: &str = "Thank you for your business.";

/// Returned when every completion attempt failed
pub const FALLBACK_RESPONSE: &str = "Response unavailable at this time.";

/// Author used when the export has no name
pub const DEFAULT_AUTHOR: &str = "Anonymous";

const EXAMPLES_HEADER: &str = "Here are some previous examples of how you have responded:\n\n";

/// Truncate to `max_chars` characters and substitute the placeholder for empty text
pub fn prepare_review_text(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();
    if is_missing_text(&truncated) {
        REVIEW_PLACEHOLDER.chars().take(max_chars).collect()
    } else {
        truncated
    }
}

pub fn author_or_default(author: &str) -> &str {
    if is_missing_text(author) {
        DEFAULT_AUTHOR
    } else {
        author
    }
}

/// User message: optional examples block, then the review to answer
pub fn build_user_message(author: &str, review_text: &str, examples: &str) -> String {
    format!(
        "{examples}\n\nNow respond to a review from '{}' who said:\n\n\"{review_text}\"",
        author_or_default(author)
    )
}

pub fn build_messages(author: &str, review_text: &str, examples: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_user_message(author, review_text, examples)),
    ]
}

/// Style examples from reviews that already have an owner answer
///
/// Each pair is `Review: {text}\nAnswer: {answer}`; pairs are separated by a
/// blank line. `max_examples` keeps the last N pairs in table order.
pub fn build_examples(reviews: &[Review], max_examples: Option<usize>) -> String {
    let pairs: Vec<String> = reviews
        .iter()
        .filter_map(|review| {
            let answer = review.owner_answer.as_deref()?;
            if is_missing_text(&review.text) || is_missing_text(answer) {
                return None;
            }
            Some(format!("Review: {}\nAnswer: {}", review.text, answer))
        })
        .collect();

    if pairs.is_empty() {
        return String::new();
    }

    let skip = max_examples.map_or(0, |max| pairs.len().saturating_sub(max));
    format!("{EXAMPLES_HEADER}{}", pairs[skip..].join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn review(author: &str, text: &str, answer: Option<&str>) -> Review {
        Review {
            author: author.to_string(),
            text: text.to_string(),
            rating: Some(5.0),
            timestamp_raw: String::new(),
            timestamp: None,
            review_link: None,
            reviews_link: None,
            owner_answer: answer.map(str::to_string),
        }
    }

    #[test]
    fn empty_and_nan_text_get_placeholder() {
        for raw in ["", "   ", "nan", "NaN"] {
            assert_eq!(prepare_review_text(raw, 700), REVIEW_PLACEHOLDER);
        }
    }

    #[test]
    fn text_never_exceeds_truncation_length() {
        let inputs = [
            "a".repeat(5_000),
            "é".repeat(701),
            "short".to_string(),
            "日本語のレビュー".repeat(200),
        ];
        for input in &inputs {
            for limit in [1, 10, 700] {
                assert!(prepare_review_text(input, limit).chars().count() <= limit);
            }
        }
        assert_eq!(prepare_review_text(&"é".repeat(701), 700), "é".repeat(700));
    }

    #[test]
    fn user_message_quotes_author_and_text() {
        let msg = build_user_message("Ana", "Great coffee", "");
        assert_eq!(
            msg,
            "\n\nNow respond to a review from 'Ana' who said:\n\n\"Great coffee\""
        );
        assert!(build_user_message("  ", "x", "").contains("'Anonymous'"));
    }

    #[test]
    fn messages_carry_fixed_system_role() {
        let messages = build_messages("Ana", "Great", "");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn only_answered_review_becomes_an_example() {
        let reviews = vec![
            review("A", "Lovely place", None),
            review("B", "Slow service", None),
            review("C", "Best tacos in town", Some("Thanks, C! See you soon.")),
            review("D", "nan", None),
        ];

        let examples = build_examples(&reviews, None);
        assert_eq!(
            examples,
            "Here are some previous examples of how you have responded:\n\n\
             Review: Best tacos in town\nAnswer: Thanks, C! See you soon."
        );
        assert_eq!(examples.matches("Review: ").count(), 1);
    }

    #[test]
    fn no_answered_reviews_means_no_examples() {
        let reviews = vec![review("A", "ok", None), review("B", "", Some("Thanks"))];
        assert_eq!(build_examples(&reviews, None), "");
    }

    #[test]
    fn example_cap_keeps_latest_pairs() {
        let reviews = vec![
            review("A", "one", Some("r1")),
            review("B", "two", Some("r2")),
            review("C", "three", Some("r3")),
        ];
        let examples = build_examples(&reviews, Some(2));
        assert!(!examples.contains("Review: one"));
        assert!(examples.contains("Review: two\nAnswer: r2\n\nReview: three\nAnswer: r3"));
    }
}
