//! Genre vocabulary canonicalization.
//!
//! Watch-history genres arrive as free text mixing Indonesian and English
//! terms in any case and order ("Horor, komedi, Action"). Canonicalization
//! maps each token through a fixed bilingual vocabulary, title-cases
//! anything the vocabulary does not know, and renders the deduplicated,
//! sorted result as a single ", "-joined string.
//!
//! # Example
//!
//! ```
//! use lifelens::models::canonicalize_genres;
//!
//! assert_eq!(canonicalize_genres(Some("Horor, komedi, Action")), "Action, Comedy, Horror");
//! assert_eq!(canonicalize_genres(None), "Unknown");
//! ```

use std::collections::BTreeSet;

/// Genre label used when a record carries no genre at all.
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Separator used to render a canonical genre list.
pub const GENRE_SEPARATOR: &str = ", ";

/// Look up a lowercased token in the bilingual vocabulary.
pub fn vocabulary_lookup(token: &str) -> Option<&'static str> {
    let canonical = match token {
        "komedi" | "comedy" => "Comedy",
        "horor" | "horror" => "Horror",
        "aksi" | "action" => "Action",
        "romantis" | "romance" => "Romance",
        "fiksi ilmiah" | "sci-fi" | "science fiction" => "Sci-Fi",
        "animasi" | "animation" => "Animation",
        "drama" => "Drama",
        "petualangan" | "adventure" => "Adventure",
        "thriller" => "Thriller",
        "misteri" | "mystery" => "Mystery",
        "fantasi" | "fantasy" => "Fantasy",
        "dokumenter" | "documentary" => "Documentary",
        "keluarga" | "family" => "Family",
        "musik" | "music" => "Music",
        "perang" | "war" => "War",
        "sejarah" | "history" => "History",
        "western" => "Western",
        "kejahatan" | "crime" => "Crime",
        "film noir" => "Film Noir",
        "olahraga" | "sport" => "Sport",
        "biografi" | "biography" => "Biography",
        "musikal" | "musical" => "Musical",
        "thriller psikologis" | "psychological thriller" => "Psychological Thriller",
        "superhero" => "Superhero",
        _ => return None,
    };
    Some(canonical)
}

/// Canonicalize a single trimmed, lowercased token.
fn canonical_token(token: &str) -> String {
    match vocabulary_lookup(token) {
        Some(canonical) => canonical.to_string(),
        None => title_case(token),
    }
}

/// Canonicalize a raw genre string.
///
/// Null, empty and separator-only input map to `"Unknown"`. The output does
/// not depend on token order and canonicalizing it again returns it unchanged.
pub fn canonicalize_genres(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return UNKNOWN_GENRE.to_string(),
    };

    let genres: BTreeSet<String> = raw
        .split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .map(|part| canonical_token(&part))
        .collect();

    if genres.is_empty() {
        return UNKNOWN_GENRE.to_string();
    }

    genres.into_iter().collect::<Vec<_>>().join(GENRE_SEPARATOR)
}

/// Title-case a string: uppercase every letter that follows a non-letter,
/// lowercase every other letter.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(c);
            prev_is_alpha = false;
        }
    }
    out
}
