//! SQL scalar functions registered on every connection.
//!
//! `similarity(a, b)` follows pg_trgm semantics: both strings are lowercased and
//! split into alphanumeric words, each word is padded with two leading blanks and
//! one trailing blank, and the score is the Jaccard index of the two trigram sets.

use std::collections::HashSet;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Register all custom functions on `conn`.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "similarity",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let a: Option<String> = ctx.get(0)?;
            let b: Option<String> = ctx.get(1)?;
            Ok(match (a, b) {
                (Some(a), Some(b)) => trigram_similarity(&a, &b),
                _ => 0.0,
            })
        },
    )
}

/// Trigram similarity in `[0.0, 1.0]`. Returns 0.0 when either side has no words.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let mut set = HashSet::new();
    let lower = text.to_lowercase();

    for word in lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_words_score_one() {
        assert_eq!(trigram_similarity("alquiler", "alquiler"), 1.0);
        assert_eq!(trigram_similarity("Alquiler", "ALQUILER"), 1.0);
    }

    #[test]
    fn unrelated_words_score_zero() {
        assert_eq!(trigram_similarity("juicio", "pago"), 0.0);
    }

    #[test]
    fn extra_lemmas_dilute_the_score() {
        // 9 shared trigrams out of 15 distinct ones
        let score = trigram_similarity("alquiler renta", "alquiler");
        assert!((score - 0.6).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(trigram_similarity("", "pago"), 0.0);
        assert_eq!(trigram_similarity("  ,; ", "pago"), 0.0);
    }

    #[test]
    fn function_is_callable_from_sql() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        let score: f64 = conn
            .query_row("SELECT similarity('deuda', 'deuda')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(score, 1.0);

        let null_score: f64 = conn
            .query_row("SELECT similarity(NULL, 'deuda')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(null_score, 0.0);
    }
}
