//! Readability formulas.
//!
//! Syllables are estimated from vowel groups, so scores track the usual
//! dictionary-based tools closely on ordinary English prose but not exactly.

use thiserror::Error;

use super::features::{split_sentences, words};

#[derive(Debug, Error, PartialEq)]
pub enum ReadabilityError {
    #[error("text contains no words")]
    NoWords,
    #[error("text contains no sentences")]
    NoSentences,
    #[error("readability score is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, PartialEq)]
struct TextStats {
    words: f64,
    sentences: f64,
    syllables: f64,
    polysyllables: f64,
    letters: f64,
    characters: f64,
    linsear_points: f64,
}

impl TextStats {
    fn collect(text: &str) -> Result<Self, ReadabilityError> {
        let sentences = split_sentences(text).len();
        let mut word_count = 0usize;
        let mut syllables = 0usize;
        let mut polysyllables = 0usize;
        let mut letters = 0usize;
        let mut characters = 0usize;
        let mut linsear_points = 0usize;

        for word in words(text) {
            let word_syllables = count_syllables(word);
            word_count += 1;
            syllables += word_syllables;
            if word_syllables >= 3 {
                polysyllables += 1;
            }
            letters += word.chars().filter(|c| c.is_alphabetic()).count();
            characters += word.chars().filter(|c| c.is_alphanumeric()).count();
            if word_count <= 100 {
                linsear_points += if word_syllables >= 3 { 3 } else { 1 };
            }
        }

        if word_count == 0 {
            return Err(ReadabilityError::NoWords);
        }
        if sentences == 0 {
            return Err(ReadabilityError::NoSentences);
        }

        Ok(Self {
            words: word_count as f64,
            sentences: sentences as f64,
            syllables: syllables as f64,
            polysyllables: polysyllables as f64,
            letters: letters as f64,
            characters: characters as f64,
            linsear_points: linsear_points as f64,
        })
    }

    fn words_per_sentence(&self) -> f64 {
        self.words / self.sentences
    }

    fn syllables_per_word(&self) -> f64 {
        self.syllables / self.words
    }

    fn flesch_reading_ease(&self) -> f64 {
        206.835 - 1.015 * self.words_per_sentence() - 84.6 * self.syllables_per_word()
    }

    fn flesch_kincaid_grade(&self) -> f64 {
        0.39 * self.words_per_sentence() + 11.8 * self.syllables_per_word() - 15.59
    }

    fn smog_index(&self) -> f64 {
        if self.sentences < 3.0 {
            return 0.0;
        }
        1.043 * (self.polysyllables * (30.0 / self.sentences)).sqrt() + 3.1291
    }

    fn coleman_liau_index(&self) -> f64 {
        let letters_per_100 = self.letters / self.words * 100.0;
        let sentences_per_100 = self.sentences / self.words * 100.0;
        0.0588 * letters_per_100 - 0.296 * sentences_per_100 - 15.8
    }

    fn automated_readability_index(&self) -> f64 {
        4.71 * (self.characters / self.words) + 0.5 * self.words_per_sentence() - 21.43
    }

    fn linsear_write(&self) -> f64 {
        let raw = self.linsear_points / self.sentences;
        if raw > 20.0 {
            raw / 2.0
        } else {
            raw / 2.0 - 1.0
        }
    }

    fn gunning_fog(&self) -> f64 {
        0.4 * (self.words_per_sentence() + 100.0 * self.polysyllables / self.words)
    }
}

/// Flesch reading ease, rounded to two decimals.
pub fn flesch_reading_ease(text: &str) -> Result<f64, ReadabilityError> {
    let stats = TextStats::collect(text)?;
    finite(round2(stats.flesch_reading_ease()))
}

/// Consensus grade level across several formulas, e.g. `"8th and 9th grade"`.
///
/// Dale-Chall is not part of the vote: it needs the Dale-Chall familiar-word
/// list, which this crate does not ship.
pub fn text_standard(text: &str) -> Result<String, ReadabilityError> {
    let stats = TextStats::collect(text)?;
    let mut grades: Vec<i64> = Vec::new();

    let mut push_range = |score: f64| -> Result<(), ReadabilityError> {
        let score = finite(score)?;
        grades.push(round_half_away(score));
        grades.push(score.ceil() as i64);
        Ok(())
    };

    push_range(stats.flesch_kincaid_grade())?;
    let ease_grades = flesch_band_grades(finite(stats.flesch_reading_ease())?);
    push_range(stats.smog_index())?;
    push_range(stats.coleman_liau_index())?;
    push_range(stats.automated_readability_index())?;
    push_range(stats.linsear_write())?;
    push_range(stats.gunning_fog())?;

    grades.splice(2..2, ease_grades);
    let consensus = most_common(&grades).ok_or(ReadabilityError::NoWords)?;
    let lower = consensus - 1;
    let upper = consensus;
    Ok(format!(
        "{}{} and {}{} grade",
        lower,
        grade_suffix(lower),
        upper,
        grade_suffix(upper)
    ))
}

fn flesch_band_grades(score: f64) -> Vec<i64> {
    match score {
        s if (90.0..100.0).contains(&s) => vec![5],
        s if (80.0..90.0).contains(&s) => vec![6],
        s if (70.0..80.0).contains(&s) => vec![7],
        s if (60.0..70.0).contains(&s) => vec![8, 9],
        s if (50.0..60.0).contains(&s) => vec![10],
        s if (40.0..50.0).contains(&s) => vec![11],
        s if (30.0..40.0).contains(&s) => vec![12],
        _ => vec![13],
    }
}

/// Most frequent value; ties go to the value seen first.
fn most_common(values: &[i64]) -> Option<i64> {
    let mut counts: Vec<(i64, usize)> = Vec::new();
    for &value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    let mut best: Option<(i64, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

fn grade_suffix(grade: i64) -> &'static str {
    if grade.div_euclid(10).rem_euclid(10) == 1 {
        return "th";
    }
    match grade.rem_euclid(10) {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Vowel-group syllable estimate; every word counts at least one.
pub fn count_syllables(word: &str) -> usize {
    let lower: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(|c| c.to_lowercase())
        .collect();
    if lower.is_empty() {
        return 1;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0usize;
    let mut previous_vowel = false;
    for &ch in &lower {
        let vowel = is_vowel(ch);
        if vowel && !previous_vowel {
            groups += 1;
        }
        previous_vowel = vowel;
    }

    let len = lower.len();
    let silent_e = len > 2
        && lower[len - 1] == 'e'
        && lower[len - 2] != 'l'
        && !is_vowel(lower[len - 2]);
    if silent_e && groups > 1 {
        groups -= 1;
    }

    groups.max(1)
}

fn finite(value: f64) -> Result<f64, ReadabilityError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ReadabilityError::NotFinite)
    }
}

/// Halves round away from zero, so 2.5 is grade 3 and -2.5 is grade -3.
fn round_half_away(value: f64) -> i64 {
    value.round() as i64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
