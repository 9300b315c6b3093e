//! One dictionary entry and its compact single-token encoding.
//!
//! Token layout (codec version 2):
//!
//! ```text
//! code#word1,word2,...#count1,count2,...
//! ```
//!
//! The counts segment stops at the last positive count and is omitted
//! entirely when every count is zero. Inside a word, `%`, `#` and `,` are
//! written as `%25`, `%23` and `%2C`; the escape introducer is itself
//! escaped, so every word survives a round trip unchanged.

#[cfg(test)]
mod tests;

/// Bumped whenever the separator or escape table changes.
pub const CODEC_VERSION: u8 = 2;

pub const SEP_MAIN: char = '#';
pub const SEP_SUB: char = ',';
const ESCAPE: char = '%';

/// (raw char, escaped form). Decoding accepts exactly these forms.
const ESCAPE_TABLE: [(char, &str); 3] = [('%', "%25"), ('#', "%23"), (',', "%2C")];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("malformed token {token:?}: {reason}")]
    MalformedToken { token: String, reason: &'static str },
}

fn malformed(token: &str, reason: &'static str) -> CodecError {
    CodecError::MalformedToken {
        token: token.to_string(),
        reason,
    }
}

/// Candidate words for one code, most preferred first.
///
/// `words` and `counts` are parallel: `counts[i]` is the usage weight of
/// `words[i]`. A word appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub code: String,
    pub words: Vec<String>,
    pub counts: Vec<u64>,
}

impl Entry {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            words: Vec::new(),
            counts: Vec::new(),
        }
    }

    pub fn single(code: impl Into<String>, word: impl Into<String>, count: u64) -> Self {
        Self {
            code: code.into(),
            words: vec![word.into()],
            counts: vec![count],
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn position(&self, word: &str) -> Option<usize> {
        self.words.iter().position(|w| w == word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.position(word).is_some()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn push(&mut self, word: impl Into<String>, count: u64) {
        self.words.push(word.into());
        self.counts.push(count);
    }

    /// Remove the word at `index` together with its count.
    pub fn remove_at(&mut self, index: usize) -> (String, u64) {
        (self.words.remove(index), self.counts.remove(index))
    }

    /// Iterate `(word, count)` pairs in rank order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.words
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    /// Number of counts up to and including the last positive one.
    pub fn significant_counts(&self) -> usize {
        self.counts
            .iter()
            .rposition(|&c| c > 0)
            .map_or(0, |i| i + 1)
    }
}

/// One `(code, word, frequency)` row, the unit exchanged with the store
/// and with line-oriented files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub code: String,
    pub word: String,
    pub frequency: u64,
}

impl Triple {
    pub fn new(code: impl Into<String>, word: impl Into<String>, frequency: u64) -> Self {
        Self {
            code: code.into(),
            word: word.into(),
            frequency,
        }
    }
}

fn escape_into(out: &mut String, word: &str) {
    for ch in word.chars() {
        match ESCAPE_TABLE.iter().find(|(raw, _)| *raw == ch) {
            Some((_, escaped)) => out.push_str(escaped),
            None => out.push(ch),
        }
    }
}

fn unescape(word: &str, token: &str) -> Result<String, CodecError> {
    if !word.contains(ESCAPE) {
        return Ok(word.to_string());
    }
    let mut out = String::with_capacity(word.len());
    let mut rest = word;
    while let Some(pos) = rest.find(ESCAPE) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let (raw, escaped) = ESCAPE_TABLE
            .iter()
            .find(|(_, escaped)| tail.starts_with(escaped))
            .ok_or_else(|| malformed(token, "unknown escape sequence"))?;
        out.push(*raw);
        rest = &tail[escaped.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Encode an entry into its single-token form.
pub fn encode(entry: &Entry) -> String {
    let mut out = String::with_capacity(entry.code.len() + entry.words.len() * 8);
    out.push_str(&entry.code);
    out.push(SEP_MAIN);
    for (i, word) in entry.words.iter().enumerate() {
        if i != 0 {
            out.push(SEP_SUB);
        }
        escape_into(&mut out, word);
    }
    for (i, count) in entry.counts[..entry.significant_counts()].iter().enumerate() {
        out.push(if i == 0 { SEP_MAIN } else { SEP_SUB });
        out.push_str(&count.to_string());
    }
    out
}

/// Decode a token produced by [`encode`].
///
/// Missing trailing counts decode as zero. The word segment always holds at
/// least one word, so `a#` is the entry with the single word `""`; an entry
/// without words is never stored and has no token of its own.
pub fn decode(token: &str) -> Result<Entry, CodecError> {
    let mut segments = token.split(SEP_MAIN);
    let code = segments.next().unwrap_or_default();
    if code.is_empty() {
        return Err(malformed(token, "empty code segment"));
    }
    let word_segment = segments
        .next()
        .ok_or_else(|| malformed(token, "missing word segment"))?;
    let count_segment = segments.next();
    if segments.next().is_some() {
        return Err(malformed(token, "too many segments"));
    }

    let words = word_segment
        .split(SEP_SUB)
        .map(|w| unescape(w, token))
        .collect::<Result<Vec<_>, _>>()?;

    let mut counts = match count_segment {
        Some(seg) => seg
            .split(SEP_SUB)
            .map(|c| c.parse::<u64>().map_err(|_| malformed(token, "invalid count")))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    if counts.len() > words.len() {
        return Err(malformed(token, "more counts than words"));
    }
    counts.resize(words.len(), 0);

    Ok(Entry {
        code: code.to_string(),
        words,
        counts,
    })
}
