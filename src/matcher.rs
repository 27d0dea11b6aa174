//! Transcript to command matching
//!
//! Exact matches on the normalized trigger phrase are always tried first.
//! Containment matching (the command name appears as whole words inside the
//! transcript) is an opt-in fallback; among containment candidates the
//! longest phrase wins so a short phrase cannot pre-empt a more specific one.
//! Remaining ties go to type precedence, then catalog order.

use std::cmp::Reverse;

use crate::catalog::{normalize, Catalog, Command};
use crate::state::ModeState;

/// Upper bound on a spoken repeat count
pub const MAX_REPEAT: u32 = 50;

/// A matched command and whatever followed its phrase in the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'c> {
    pub command: &'c Command,
    /// Words after the matched phrase; empty for exact matches
    pub remainder: String,
}

impl Match<'_> {
    /// Repeat count spoken after the phrase, e.g. "down three"
    pub fn repeat_count(&self) -> Option<u32> {
        parse_count(&self.remainder)
    }
}

/// Finds the best enabled command for a transcript
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    containment: bool,
}

impl Matcher {
    pub fn new(containment: bool) -> Self {
        Self { containment }
    }

    /// Match against the commands the mode state enables
    pub fn find<'c>(
        &self,
        transcript: &str,
        catalog: &'c Catalog,
        mode: &ModeState,
    ) -> Option<Match<'c>> {
        let transcript = catalog.apply_replacements(&normalize(transcript));
        self.match_enabled(&transcript, catalog.enabled(mode))
    }

    /// Match against an explicit enabled set
    pub fn match_enabled<'c, I>(&self, transcript: &str, enabled: I) -> Option<Match<'c>>
    where
        I: IntoIterator<Item = &'c Command>,
    {
        let transcript = normalize(transcript);
        if transcript.is_empty() {
            return None;
        }
        let enabled: Vec<&Command> = enabled.into_iter().collect();

        let exact = enabled
            .iter()
            .copied()
            .filter(|c| c.name == transcript)
            .min_by_key(|c| (c.command_type.precedence(), c.order));
        if let Some(command) = exact {
            return Some(Match {
                command,
                remainder: String::new(),
            });
        }

        if !self.containment {
            return None;
        }

        let words: Vec<&str> = transcript.split(' ').collect();
        enabled
            .iter()
            .copied()
            .filter_map(|c| find_phrase(&words, c).map(|end| (c, end)))
            .min_by_key(|(c, _)| {
                (
                    Reverse(c.word_count()),
                    Reverse(c.name.len()),
                    c.command_type.precedence(),
                    c.order,
                )
            })
            .map(|(command, end)| Match {
                command,
                remainder: words[end..].join(" "),
            })
    }
}

/// Index just past the first whole-word occurrence of the command name
fn find_phrase(words: &[&str], command: &Command) -> Option<usize> {
    let phrase: Vec<&str> = command.name.split(' ').collect();
    if phrase.len() > words.len() {
        return None;
    }
    words
        .windows(phrase.len())
        .position(|window| window == phrase.as_slice())
        .map(|start| start + phrase.len())
}

/// Parse a spoken count such as "3", "three" or "twenty"
pub fn parse_count(text: &str) -> Option<u32> {
    let word = text.split_whitespace().next()?;
    let n = match word.parse::<u32>() {
        Ok(n) => n,
        Err(_) => number_word(word)?,
    };
    (1..=MAX_REPEAT).contains(&n).then_some(n)
}

fn number_word(word: &str) -> Option<u32> {
    let n = match word {
        "one" | "once" => 1,
        "two" | "twice" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "fifteen" => 15,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        _ => return None,
    };
    Some(n)
}
