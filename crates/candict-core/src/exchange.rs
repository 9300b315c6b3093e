//! Line-oriented exchange files.
//!
//! Word lines: `code word1 word2 ...`, a literal space inside a word written
//! as `\ `. A word token may carry an explicit frequency as `word:42`.
//! Count lines: `code count1 count2 ...`. Lines starting with `#` and blank
//! lines are ignored.

use std::io::{self, BufRead};

use crate::item::{Entry, Triple};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeWord {
    pub word: String,
    pub frequency: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeLine {
    pub code: String,
    pub words: Vec<ExchangeWord>,
}

fn is_skipped(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// Split on whitespace, honouring `\ ` as a literal space.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&' ') {
            current.push(' ');
            chars.next();
        } else if ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn split_frequency(token: String) -> ExchangeWord {
    if let Some((word, freq)) = token.rsplit_once(':') {
        if !word.is_empty() && !freq.is_empty() && freq.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(frequency) = freq.parse() {
                return ExchangeWord {
                    word: word.to_string(),
                    frequency: Some(frequency),
                };
            }
        }
    }
    ExchangeWord {
        word: token,
        frequency: None,
    }
}

/// Parse a word line. Returns `None` for comments, blank lines and lines
/// without any word.
pub fn parse_line(line: &str) -> Option<ExchangeLine> {
    let line = line.trim();
    if is_skipped(line) {
        return None;
    }
    let mut tokens = tokenize(line).into_iter();
    let code = tokens.next()?;
    let words: Vec<ExchangeWord> = tokens
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .map(split_frequency)
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(ExchangeLine { code, words })
}

/// Parse a count line. Returns `None` for comments, lines without counts
/// and lines with a non-numeric count.
pub fn parse_counts_line(line: &str) -> Option<(String, Vec<u64>)> {
    let line = line.trim();
    if is_skipped(line) {
        return None;
    }
    let mut fields = line.split_whitespace();
    let code = fields.next()?;
    let counts = fields
        .map(|f| f.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if counts.is_empty() {
        return None;
    }
    Some((code.to_string(), counts))
}

pub fn escape_word(word: &str) -> String {
    word.replace(' ', "\\ ")
}

/// `code word1 word2 ...`
pub fn format_words_line(entry: &Entry) -> String {
    let mut line = entry.code.clone();
    for word in &entry.words {
        line.push(' ');
        line.push_str(&escape_word(word));
    }
    line
}

/// `code count1 count2 ...` up to the last positive count; `None` when all
/// counts are zero.
pub fn format_counts_line(entry: &Entry) -> Option<String> {
    let n = entry.significant_counts();
    if n == 0 {
        return None;
    }
    let mut line = entry.code.clone();
    for count in &entry.counts[..n] {
        line.push(' ');
        line.push_str(&count.to_string());
    }
    Some(line)
}

/// Read word lines as triples. Without an explicit `:frequency`, a line of
/// n words ranks them n, n-1, ..., 1.
pub fn read_triples(reader: impl BufRead) -> io::Result<Vec<Triple>> {
    let mut triples = Vec::new();
    for line in reader.lines() {
        let Some(parsed) = parse_line(&line?) else {
            continue;
        };
        let n = parsed.words.len() as u64;
        for (idx, w) in parsed.words.into_iter().enumerate() {
            let frequency = w.frequency.unwrap_or(n - idx as u64);
            triples.push(Triple::new(parsed.code.clone(), w.word, frequency));
        }
    }
    Ok(triples)
}
