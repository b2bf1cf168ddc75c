//! Picking the target review among the blocks rendered on the page

use chrono::{DateTime, Duration, Utc};

use super::AutomationError;

/// One review block as scraped from the page
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewCandidate {
    /// Text of the author anchor
    pub author: String,
    /// Full visible text of the block
    pub text: String,
    /// Relative date shown on the block, if one was found
    pub date_label: Option<String>,
}

/// What is known about the review being answered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewTarget<'a> {
    pub author: &'a str,
    pub snippet: Option<&'a str>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Collapse runs of whitespace and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Index of the block to reply to
///
/// Authors must match exactly after trimming. Every block by the author must
/// then contain the snippet and show a date compatible with `posted_at`;
/// date labels that cannot be read are not held against a block. Exactly one
/// survivor is required.
pub fn select_review(
    candidates: &[ReviewCandidate],
    target: &ReviewTarget<'_>,
    now: DateTime<Utc>,
) -> Result<usize, AutomationError> {
    let author = target.author.trim();
    let snippet = target
        .snippet
        .map(normalize_whitespace)
        .filter(|s| !s.is_empty());

    let by_author: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.author.trim() == author)
        .map(|(i, _)| i)
        .collect();
    if by_author.is_empty() {
        return Err(AutomationError::ReviewNotFound {
            author: author.to_string(),
        });
    }

    let survivors: Vec<usize> = by_author
        .iter()
        .copied()
        .filter(|&i| {
            let candidate = &candidates[i];
            let text_ok = snippet
                .as_deref()
                .is_none_or(|s| normalize_whitespace(&candidate.text).contains(s));
            let date_ok = match (target.posted_at, candidate.date_label.as_deref()) {
                (Some(posted_at), Some(label)) => date_label_matches(label, posted_at, now),
                _ => true,
            };
            text_ok && date_ok
        })
        .collect();

    match survivors.as_slice() {
        [one] => Ok(*one),
        [] => Err(AutomationError::NoMatchingReview {
            author: author.to_string(),
            count: by_author.len(),
        }),
        many => Err(AutomationError::AmbiguousAuthor {
            author: author.to_string(),
            count: many.len(),
        }),
    }
}

/// First characters of the review body, enough to tell reviews apart
pub fn snippet_of(text: &str, max_chars: usize) -> Option<String> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return None;
    }
    Some(normalized.chars().take(max_chars).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgeUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl AgeUnit {
    fn from_word(word: &str) -> Option<Self> {
        let unit = match word {
            w if w.starts_with("minut") => Self::Minute,
            w if w.starts_with("hora") || w.starts_with("hour") => Self::Hour,
            w if w.starts_with("día") || w.starts_with("dia") || w.starts_with("day") => Self::Day,
            w if w.starts_with("semana") || w.starts_with("week") => Self::Week,
            w if w.starts_with("mes") || w.starts_with("month") => Self::Month,
            w if w.starts_with("año") || w.starts_with("ano") || w.starts_with("year") => {
                Self::Year
            }
            _ => return None,
        };
        Some(unit)
    }

    fn days(self) -> i64 {
        match self {
            Self::Minute | Self::Hour => 0,
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }
}

fn count_word(word: &str) -> Option<i64> {
    match word {
        "un" | "una" | "a" | "an" | "one" => Some(1),
        w => w.parse().ok(),
    }
}

/// Parse labels like "hace 3 semanas", "Editado hace un mes" or "2 weeks ago"
fn parse_relative_age(label: &str) -> Option<(i64, AgeUnit)> {
    let lower = label.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    words.iter().enumerate().skip(1).find_map(|(i, word)| {
        let unit = AgeUnit::from_word(word)?;
        let count = count_word(words[i - 1])?;
        Some((count, unit))
    })
}

/// Whether a relative date label is compatible with a review's UTC timestamp.
///
/// The platform rounds ages, so "N units ago" accepts anything within one
/// unit either side. Unreadable labels match.
pub fn date_label_matches(label: &str, posted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let Some((count, unit)) = parse_relative_age(label) else {
        return true;
    };
    let age = now - posted_at;
    let (low, high) = match unit.days() {
        0 => (Duration::zero(), Duration::days(2)),
        days => (
            Duration::days((count - 1).max(0) * days),
            Duration::days((count + 1) * days),
        ),
    };
    age >= low - Duration::days(1) && age <= high + Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn candidate(author: &str, text: &str) -> ReviewCandidate {
        ReviewCandidate {
            author: author.to_string(),
            text: text.to_string(),
            date_label: None,
        }
    }

    fn dated(author: &str, label: &str) -> ReviewCandidate {
        ReviewCandidate {
            date_label: Some(label.to_string()),
            ..candidate(author, &format!("{author}\n5 stars\n{label}"))
        }
    }

    fn target<'a>(author: &'a str, snippet: Option<&'a str>) -> ReviewTarget<'a> {
        ReviewTarget {
            author,
            snippet,
            posted_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn unknown_author_is_not_found() {
        let candidates = vec![candidate("Ana", "Great")];
        assert!(matches!(
            select_review(&candidates, &target("Luis", None), now()),
            Err(AutomationError::ReviewNotFound { author }) if author == "Luis"
        ));
    }

    #[test]
    fn single_author_match_is_used_without_disambiguators() {
        let candidates = vec![candidate("Ana", "Great"), candidate(" Luis ", "Slow service")];
        assert_eq!(select_review(&candidates, &target("Luis", None), now()).unwrap(), 1);
        assert_eq!(
            select_review(&candidates, &target("Luis", Some("Slow")), now()).unwrap(),
            1
        );
    }

    #[test]
    fn single_author_match_without_the_snippet_is_rejected() {
        let candidates = vec![candidate("Ana", "Great"), candidate("Maria", "Too noisy at night")];
        assert!(matches!(
            select_review(
                &candidates,
                &target("Maria", Some("Lovely staff, will return")),
                now()
            ),
            Err(AutomationError::NoMatchingReview { count: 1, .. })
        ));
    }

    #[test]
    fn duplicate_authors_without_snippet_are_ambiguous() {
        let candidates = vec![
            candidate("Maria", "Lovely staff"),
            candidate("Maria", "Too noisy"),
        ];
        assert!(matches!(
            select_review(&candidates, &target("Maria", None), now()),
            Err(AutomationError::AmbiguousAuthor { count: 2, .. })
        ));
    }

    #[test]
    fn unique_snippet_resolves_duplicates() {
        let candidates = vec![
            candidate("Maria", "Maria\n5 stars\nLovely   staff,\nwill return"),
            candidate("Maria", "Maria\n2 stars\nToo noisy at night"),
        ];
        assert_eq!(
            select_review(&candidates, &target("Maria", Some("too noisy at")), now())
                .map_err(|e| e.to_string()),
            Err("2 review(s) by 'Maria' on the page, none matching the review text or date"
                .to_string())
        );
        assert_eq!(
            select_review(&candidates, &target("Maria", Some("Too noisy at")), now()).unwrap(),
            1
        );
        assert_eq!(
            select_review(&candidates, &target("Maria", Some("Lovely staff, will")), now())
                .unwrap(),
            0
        );
    }

    #[test]
    fn snippet_matching_both_is_still_ambiguous() {
        let candidates = vec![candidate("Maria", "Great food"), candidate("Maria", "Great view")];
        assert!(matches!(
            select_review(&candidates, &target("Maria", Some("Great")), now()),
            Err(AutomationError::AmbiguousAuthor { count: 2, .. })
        ));
    }

    #[test]
    fn date_resolves_rating_only_duplicates() {
        let candidates = vec![dated("Luis", "hace 2 días"), dated("Luis", "hace 5 meses")];
        let mut luis = target("Luis", None);

        luis.posted_at = Some(now() - Duration::days(150));
        assert_eq!(select_review(&candidates, &luis, now()).unwrap(), 1);

        luis.posted_at = Some(now() - Duration::hours(50));
        assert_eq!(select_review(&candidates, &luis, now()).unwrap(), 0);

        luis.posted_at = Some(now() - Duration::days(800));
        assert!(matches!(
            select_review(&candidates, &luis, now()),
            Err(AutomationError::NoMatchingReview { count: 2, .. })
        ));
    }

    #[test]
    fn date_rejects_a_lone_block_from_another_time() {
        let candidates = vec![dated("Luis", "a week ago")];
        let luis = ReviewTarget {
            posted_at: Some(now() - Duration::days(400)),
            ..target("Luis", None)
        };
        assert!(matches!(
            select_review(&candidates, &luis, now()),
            Err(AutomationError::NoMatchingReview { .. })
        ));
    }

    #[test]
    fn relative_labels_are_parsed_in_spanish_and_english() {
        assert_eq!(parse_relative_age("hace un mes"), Some((1, AgeUnit::Month)));
        assert_eq!(parse_relative_age("Editado hace 3 semanas"), Some((3, AgeUnit::Week)));
        assert_eq!(parse_relative_age("hace una hora"), Some((1, AgeUnit::Hour)));
        assert_eq!(parse_relative_age("hace 2 años"), Some((2, AgeUnit::Year)));
        assert_eq!(parse_relative_age("a year ago"), Some((1, AgeUnit::Year)));
        assert_eq!(parse_relative_age("10 days ago"), Some((10, AgeUnit::Day)));
        assert_eq!(parse_relative_age("Nuevo"), None);
        assert!(date_label_matches("Nuevo", now() - Duration::days(900), now()));
    }

    #[test]
    fn snippet_is_normalised_and_capped() {
        assert_eq!(snippet_of("  Nice \n\n place  ", 100).as_deref(), Some("Nice place"));
        assert_eq!(snippet_of("abcdef", 3).as_deref(), Some("abc"));
        assert_eq!(snippet_of("   ", 10), None);
    }
}
