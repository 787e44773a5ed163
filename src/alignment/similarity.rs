use std::collections::{HashMap, HashSet};

// @module: Text similarity for anchor matching

/// Normalize text before comparison: lowercase, strip punctuation and
/// markup remnants, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                out.push(lower);
            }
            last_was_space = false;
        } else if c.is_whitespace() || c.is_ascii_punctuation() || is_cjk_punctuation(c) {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        }
        // Everything else (control remnants, symbols) is dropped.
    }
    out.trim_end().to_string()
}

fn is_cjk_punctuation(c: char) -> bool {
    matches!(c as u32, 0x3000..=0x303F | 0xFF00..=0xFF0F | 0xFF1A..=0xFF20 | 0xFE30..=0xFE4F)
        || matches!(c, '…' | '—' | '“' | '”' | '‘' | '’' | '《' | '》')
}

/// Similarity of two texts in [0, 1]: the maximum of character
/// trigram Jaccard, normalized Levenshtein, and token-frequency cosine.
/// Taking the maximum keeps the measure usable across scripts; the
/// token metrics collapse on unsegmented Chinese, where trigrams work.
pub fn similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    if na == nb {
        return 1.0;
    }

    let jaccard = trigram_jaccard(&na, &nb);
    let edit = levenshtein_similarity(&na, &nb);
    let cosine = token_cosine(&na, &nb);
    jaccard.max(edit).max(cosine)
}

/// Jaccard index over character 3-grams.
fn trigram_jaccard(a: &str, b: &str) -> f64 {
    let grams_a = char_ngrams(a, 3);
    let grams_b = char_ngrams(b, 3);
    if grams_a.is_empty() || grams_b.is_empty() {
        return 0.0;
    }
    let intersection = grams_a.intersection(&grams_b).count();
    let union = grams_a.union(&grams_b).count();
    intersection as f64 / union as f64
}

fn char_ngrams(text: &str, n: usize) -> HashSet<Vec<char>> {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.len() < n {
        let mut single = HashSet::new();
        if !chars.is_empty() {
            single.insert(chars);
        }
        return single;
    }
    chars.windows(n).map(|w| w.to_vec()).collect()
}

/// 1 − edit_distance / max_len.
fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let ca: Vec<char> = a.chars().collect();
    let cb: Vec<char> = b.chars().collect();
    let max_len = ca.len().max(cb.len());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(&ca, &cb);
    1.0 - distance as f64 / max_len as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Cosine similarity over token-frequency vectors. Tokens are
/// whitespace-delimited for segmented scripts and single CJK
/// characters otherwise.
fn token_cosine(a: &str, b: &str) -> f64 {
    let freq_a = token_frequencies(a);
    let freq_b = token_frequencies(b);
    if freq_a.is_empty() || freq_b.is_empty() {
        return 0.0;
    }

    let dot: f64 = freq_a
        .iter()
        .filter_map(|(token, count)| freq_b.get(token).map(|other| (*count * *other) as f64))
        .sum();
    let norm_a: f64 = freq_a.values().map(|c| (*c * *c) as f64).sum::<f64>().sqrt();
    let norm_b: f64 = freq_b.values().map(|c| (*c * *c) as f64).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn token_frequencies(text: &str) -> HashMap<String, u32> {
    let mut freq = HashMap::new();
    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        let has_cjk = chars.iter().any(|c| matches!(*c as u32, 0x3400..=0x9FFF));
        if has_cjk {
            for c in chars {
                *freq.entry(c.to_string()).or_insert(0) += 1;
            }
        } else {
            *freq.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    freq
}
