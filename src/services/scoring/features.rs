//! Feature scorers.
//!
//! Each scorer is a pure function of the user's answers and one film, bounded to
//! its own range. Missing data never penalizes a film: it yields a neutral value.

use crate::models::{Film, Genre, GenrePreferences, LanguageBucket, PeriodBucket};

use super::normalize::clamp;

/// Genre score for a category the user did not rate
pub const NEUTRAL_GENRE: f64 = 0.55;
/// Period score without a preference or a known year
pub const NEUTRAL_PERIOD: f64 = 0.60;
/// Language score without a preference or a known language
pub const NEUTRAL_LANGUAGE: f64 = 0.60;
/// Weight of each of the director and actor match fractions
pub const PEOPLE_TERM_WEIGHT: f64 = 0.20;
/// Soft ceiling on the people bonus; the two terms can add up to 0.40
pub const PEOPLE_BONUS_CAP: f64 = 0.35;

/// Rescales the user's 1-5 rating of the film's genre to [0, 1]
pub fn genre_score(category: Option<Genre>, preferences: &GenrePreferences) -> f64 {
    if preferences.is_empty() {
        return NEUTRAL_GENRE;
    }

    match category.and_then(|genre| preferences.get(genre)) {
        Some(rating) => clamp((f64::from(rating) - 1.0) / 4.0, 0.0, 1.0),
        None => NEUTRAL_GENRE,
    }
}

/// 1.0 when the film's year falls in the selected period, 0.0 otherwise.
///
/// 2010 belongs to both "2000-2010" and "2010+".
pub fn period_score(period: PeriodBucket, year: Option<i32>) -> f64 {
    let Some(year) = year else {
        return NEUTRAL_PERIOD;
    };

    let matched = match period {
        PeriodBucket::NoPreference => return NEUTRAL_PERIOD,
        PeriodBucket::Classics => year < 1980,
        PeriodBucket::EightiesNineties => (1980..=1999).contains(&year),
        PeriodBucket::TwoThousands => (2000..=2010).contains(&year),
        PeriodBucket::Recent => year >= 2010,
    };

    if matched {
        1.0
    } else {
        0.0
    }
}

/// Words identifying a language inside a free-text language tag
struct Synonyms {
    /// Language codes, matched at the start of a token ("en", "eng", "en-US")
    codes: &'static [&'static str],
    /// Names matched anywhere in the tag
    names: &'static [&'static str],
}

const ENGLISH: Synonyms = Synonyms {
    codes: &["en"],
    names: &["anglais", "english"],
};

const FRENCH: Synonyms = Synonyms {
    codes: &["fr"],
    names: &["français", "french"],
};

const JAPANESE: Synonyms = Synonyms {
    codes: &["ja", "jp"],
    names: &["japonais", "japanese"],
};

impl Synonyms {
    fn matches(&self, tag: &str) -> bool {
        // "french" contains "en" but does not start with it
        tag.split(|c: char| !c.is_alphanumeric())
            .any(|token| self.codes.iter().any(|code| token.starts_with(*code)))
            || self.names.iter().any(|name| tag.contains(name))
    }
}

/// 1.0 when the film's language tag matches the selected bucket, 0.0 otherwise.
///
/// "Autres" matches any tag that is none of English, French or Japanese.
pub fn language_score(language: LanguageBucket, film_language: Option<&str>) -> f64 {
    let Some(tag) = film_language.map(clean_text).filter(|t| !t.is_empty()) else {
        return NEUTRAL_LANGUAGE;
    };

    let matched = match language {
        LanguageBucket::NoPreference => return NEUTRAL_LANGUAGE,
        LanguageBucket::English => ENGLISH.matches(&tag),
        LanguageBucket::French => FRENCH.matches(&tag),
        LanguageBucket::Japanese => JAPANESE.matches(&tag),
        LanguageBucket::Other => [ENGLISH, FRENCH, JAPANESE]
            .iter()
            .all(|synonyms| !synonyms.matches(&tag)),
    };

    if matched {
        1.0
    } else {
        0.0
    }
}

/// Bonus for directors and actors the user named that appear in the film's text.
///
/// Each comma-separated list contributes the fraction of its names found,
/// times 0.20. The sum is capped at 0.35.
pub fn people_bonus(directors_csv: &str, actors_csv: &str, film: &Film) -> f64 {
    let haystack = clean_text(
        &[
            film.title.as_str(),
            film.description.as_str(),
            film.keywords.as_str(),
            film.director.as_deref().unwrap_or_default(),
            film.cast.as_deref().unwrap_or_default(),
        ]
        .join(" "),
    );

    let bonus: f64 = [directors_csv, actors_csv]
        .into_iter()
        .filter_map(|csv| match_fraction(&haystack, &parse_names(csv)))
        .map(|fraction| fraction * PEOPLE_TERM_WEIGHT)
        .sum();

    clamp(bonus, 0.0, PEOPLE_BONUS_CAP)
}

/// Lowercases and collapses whitespace
fn clean_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Distinct, cleaned, non-empty names of a comma-separated list, in input order
fn parse_names(csv: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in csv.split(',').map(clean_text).filter(|n| !n.is_empty()) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Share of `names` contained in `haystack`; `None` when there are no names
fn match_fraction(haystack: &str, names: &[String]) -> Option<f64> {
    if names.is_empty() {
        return None;
    }
    let found = names
        .iter()
        .filter(|name| haystack.contains(name.as_str()))
        .count();
    Some(found as f64 / names.len() as f64)
}
