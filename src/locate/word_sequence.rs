use crate::util::floor_char_boundary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordToken {
    pub text: String,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub window_words: usize,
    pub overlap_words: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_words: 2000,
            overlap_words: 50,
        }
    }
}

impl WindowConfig {
    // Token spans `[start, end)` covering `total` tokens. The overlap is
    // widened to `sequence_len - 1` so no run of that length straddles two
    // windows without being fully inside one of them.
    fn spans(self, total: usize, sequence_len: usize) -> Vec<(usize, usize)> {
        let window = self.window_words.max(sequence_len).max(1);
        let overlap = self
            .overlap_words
            .max(sequence_len.saturating_sub(1))
            .min(window - 1);
        let step = window - overlap;

        let mut spans = Vec::new();
        let mut start = 0_usize;
        loop {
            let end = (start + window).min(total);
            spans.push((start, end));
            if end == total {
                break;
            }
            start += step;
        }
        spans
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyHit {
    pub token_index: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    tokens: Vec<WordToken>,
}

impl WordIndex {
    pub fn build(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn offset_of(&self, token_index: usize) -> Option<usize> {
        self.tokens.get(token_index).map(|token| token.offset)
    }

    pub fn find_exact(&self, sequence: &[String], windows: WindowConfig) -> Option<usize> {
        let n = sequence.len();
        if n == 0 || n > self.tokens.len() {
            return None;
        }

        let mut next_unchecked = 0_usize;
        for (start, end) in windows.spans(self.tokens.len(), n) {
            if end - start < n {
                continue;
            }
            for position in start.max(next_unchecked)..=end - n {
                if self.matches_at(position, sequence) == n {
                    return Some(position);
                }
            }
            next_unchecked = end - n + 1;
        }

        None
    }

    pub fn find_fuzzy(
        &self,
        sequence: &[String],
        windows: WindowConfig,
        threshold: f64,
    ) -> Option<FuzzyHit> {
        let n = sequence.len();
        if n == 0 || n > self.tokens.len() {
            return None;
        }

        let mut best: Option<(usize, usize)> = None;
        let mut next_unchecked = 0_usize;
        for (start, end) in windows.spans(self.tokens.len(), n) {
            if end - start < n {
                continue;
            }
            for position in start.max(next_unchecked)..=end - n {
                let matched = self.matches_at(position, sequence);
                let ratio = matched as f64 / n as f64;
                if ratio < threshold {
                    continue;
                }
                if best.is_none_or(|(_, best_matched)| matched > best_matched) {
                    best = Some((position, matched));
                }
            }
            next_unchecked = end - n + 1;
        }

        best.map(|(token_index, matched)| FuzzyHit {
            token_index,
            ratio: matched as f64 / n as f64,
        })
    }

    fn matches_at(&self, position: usize, sequence: &[String]) -> usize {
        self.tokens[position..position + sequence.len()]
            .iter()
            .zip(sequence)
            .filter(|(token, word)| token.text == **word)
            .count()
    }
}

pub fn normalize_words(text: &str) -> Vec<String> {
    tokenize(text).into_iter().map(|token| token.text).collect()
}

fn tokenize(text: &str) -> Vec<WordToken> {
    let mut tokens = Vec::<WordToken>::new();
    let mut current: Option<WordToken> = None;

    for (offset, ch) in text.char_indices() {
        if ch.is_alphanumeric() || ch == '_' {
            let token = current.get_or_insert_with(|| WordToken {
                text: String::new(),
                offset,
            });
            token.text.extend(ch.to_lowercase());
        } else if let Some(token) = current.take() {
            tokens.push(token);
        }
    }

    if let Some(token) = current {
        tokens.push(token);
    }

    tokens
}

// Rightmost occurrence of `title` (as-is, upper, lower or title case) that
// starts within `lookback` bytes before `hit`, or at `hit` itself.
pub fn recover_heading_offset(
    raw_text: &str,
    title: &str,
    hit: usize,
    lookback: usize,
) -> Option<usize> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }

    let region_start = floor_char_boundary(raw_text, hit.saturating_sub(lookback));
    let mut variants = vec![
        title.to_string(),
        title.to_uppercase(),
        title.to_lowercase(),
        title_case(title),
    ];
    variants.dedup();

    variants
        .iter()
        .filter_map(|variant| {
            let region_end = floor_char_boundary(raw_text, hit.saturating_add(variant.len()));
            if region_end <= region_start {
                return None;
            }
            raw_text[region_start..region_end]
                .rfind(variant.as_str())
                .map(|index| region_start + index)
        })
        .max()
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
