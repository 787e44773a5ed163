use std::fmt;

use anyhow::{anyhow, Result};
use isolang::Language;
use log::debug;

// @module: Language classification from text samples and filenames

/// Characters used in simplified Chinese where traditional text uses a
/// different form. Hits here vote for zh-Hans.
const SIMPLIFIED_ONLY: &str = "爱边变标别宾仓产长车称达带单当党东动断对队发风冈广归国过华画欢会几机际继价间见将节进经举开来乐离历丽两辽龙楼陆虑论马买卖门们难鸟宁农齐气钱亲区热认软伤时书术树双说岁孙条万为伟问无线现乡写兴学压亚严业叶医艺亿阴应优邮语园远运这证钟众转庄准资总";

/// Traditional-form counterparts of the set above. Hits vote for zh-Hant.
const TRADITIONAL_ONLY: &str = "愛邊變標別賓倉產長車稱達帶單當黨東動斷對隊發風岡廣歸國過華畫歡會幾機際繼價間見將節進經舉開來樂離歷麗兩遼龍樓陸慮論馬買賣門們麵難鳥寧農齊氣錢親區熱認軟傷時書術樹雙說歲孫條萬為偉問無線現鄉寫興學壓亞嚴業葉醫藝億陰應優郵語園遠運這證鐘眾轉莊準資總";

/// Languages the classifier can distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    /// Simplified Chinese
    ZhHans,
    /// Traditional Chinese
    ZhHant,
    /// English
    En,
    /// Japanese
    Ja,
    /// Korean
    Ko,
}

impl Lang {
    /// The BCP-47-like tag for this language.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ZhHans => "zh-Hans",
            Self::ZhHant => "zh-Hant",
            Self::En => "en",
            Self::Ja => "ja",
            Self::Ko => "ko",
        }
    }

    /// True when a caller-supplied target tag refers to this language.
    /// `zh` matches both Chinese variants; `zh-Hans`/`chs` only one.
    pub fn matches_tag(&self, tag: &str) -> bool {
        let lower = tag.to_lowercase();
        match self {
            Self::ZhHans => {
                matches!(lower.as_str(), "zh-hans" | "chs" | "sc" | "zh-cn")
                    || is_chinese_tag(&lower)
            }
            Self::ZhHant => {
                matches!(lower.as_str(), "zh-hant" | "cht" | "tc" | "zh-tw" | "zh-hk")
                    || is_chinese_tag(&lower)
            }
            Self::En => matches!(lower.as_str(), "en" | "eng" | "english"),
            Self::Ja => matches!(lower.as_str(), "ja" | "jpn" | "japanese"),
            Self::Ko => matches!(lower.as_str(), "ko" | "kor" | "korean"),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

fn is_chinese_tag(lower: &str) -> bool {
    matches!(
        lower,
        "zh" | "chi" | "zho" | "chinese" | "cn" | "cmn" | "yue"
    )
}

/// A ranked classification result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanguageScore {
    pub lang: Lang,
    /// Score in [0, 1]; advisory, not a probability
    pub score: f64,
}

/// Counts of code points by Unicode block.
#[derive(Debug, Default, Clone, Copy)]
struct BlockCounts {
    cjk: usize,
    hiragana: usize,
    katakana: usize,
    hangul: usize,
    latin: usize,
    total: usize,
}

fn count_blocks(text: &str) -> BlockCounts {
    let mut counts = BlockCounts::default();
    for c in text.chars() {
        let code = c as u32;
        let bucket = match code {
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => &mut counts.cjk,
            0x3040..=0x309F => &mut counts.hiragana,
            0x30A0..=0x30FF => &mut counts.katakana,
            0xAC00..=0xD7AF => &mut counts.hangul,
            _ if c.is_ascii_alphabetic() => &mut counts.latin,
            0x00C0..=0x024F if c.is_alphabetic() => &mut counts.latin,
            _ => continue,
        };
        *bucket += 1;
        counts.total += 1;
    }
    counts
}

/// Score a text sample (and optional filename) for language membership.
///
/// Returns the matching languages ranked by score, best first. The
/// result is advisory; downstream consumers must stay robust when the
/// classification is wrong.
pub fn classify(sample: &str, filename: Option<&str>) -> Vec<LanguageScore> {
    let counts = count_blocks(sample);
    let mut scores: Vec<LanguageScore> = Vec::new();

    if counts.total > 0 {
        let total = counts.total as f64;
        let cjk = counts.cjk as f64 / total;
        let kana = (counts.hiragana + counts.katakana) as f64 / total;
        let hangul = counts.hangul as f64 / total;
        let latin = counts.latin as f64 / total;

        if kana > 0.02 {
            scores.push(LanguageScore {
                lang: Lang::Ja,
                score: (kana + cjk).min(1.0),
            });
        }
        if hangul > 0.05 {
            scores.push(LanguageScore {
                lang: Lang::Ko,
                score: hangul.min(1.0),
            });
        }
        if cjk > 0.15 && kana + hangul < 0.02 {
            let (winner, loser) = split_chinese_variant(sample);
            scores.push(LanguageScore {
                lang: winner,
                score: cjk.min(1.0),
            });
            scores.push(LanguageScore {
                lang: loser,
                score: (cjk * 0.3).min(1.0),
            });
        }
        if latin > 0.80 && cjk < 0.02 {
            scores.push(LanguageScore {
                lang: Lang::En,
                score: latin.min(1.0),
            });
        }
    }

    if let Some(name) = filename {
        apply_filename_boost(&mut scores, name);
    }

    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    debug!("Language classification: {:?}", scores);
    scores
}

/// Decide between simplified and traditional by counting hits in the
/// curated exclusive sets. Higher hit count wins; tie goes to simplified.
fn split_chinese_variant(sample: &str) -> (Lang, Lang) {
    let mut simplified = 0usize;
    let mut traditional = 0usize;
    for c in sample.chars() {
        if SIMPLIFIED_ONLY.contains(c) {
            simplified += 1;
        }
        if TRADITIONAL_ONLY.contains(c) {
            traditional += 1;
        }
    }
    if traditional > simplified {
        (Lang::ZhHant, Lang::ZhHans)
    } else {
        (Lang::ZhHans, Lang::ZhHant)
    }
}

/// Filename tokens like `.chs` or `_eng` boost the matching language by
/// +0.2, capped at 1.0. A token for an unseen language adds it outright.
fn apply_filename_boost(scores: &mut Vec<LanguageScore>, filename: &str) {
    let lower = filename.to_lowercase();
    let token_langs: [(&[&str], Lang); 5] = [
        (&[".chs", "_chs", ".zh-hans", ".sc"], Lang::ZhHans),
        (&[".cht", "_cht", ".zh-hant", ".tc"], Lang::ZhHant),
        (&[".en", "_en", ".eng", "_eng"], Lang::En),
        (&[".ja", "_ja", ".jpn", "_jpn"], Lang::Ja),
        (&[".ko", "_ko", ".kor", "_kor"], Lang::Ko),
    ];

    let mut boosted: Vec<Lang> = Vec::new();
    for (tokens, lang) in token_langs {
        if tokens.iter().any(|t| lower.contains(t)) {
            boosted.push(lang);
        }
    }
    // Generic Chinese tokens boost whichever variant is already ahead,
    // defaulting to simplified.
    if [".zh", "_zh", ".chi", "_chi", ".cn", "_cn"]
        .iter()
        .any(|t| lower.contains(t))
        && !boosted.contains(&Lang::ZhHans)
        && !boosted.contains(&Lang::ZhHant)
    {
        let variant = scores
            .iter()
            .find(|s| matches!(s.lang, Lang::ZhHans | Lang::ZhHant))
            .map(|s| s.lang)
            .unwrap_or(Lang::ZhHans);
        boosted.push(variant);
    }

    for lang in boosted {
        match scores.iter_mut().find(|s| s.lang == lang) {
            Some(entry) => entry.score = (entry.score + 0.2).min(1.0),
            None => scores.push(LanguageScore { lang, score: 0.2 }),
        }
    }
}

/// Normalize a language code to ISO 639-1 where one exists, keeping
/// Chinese script subtags intact.
pub fn normalize_tag(code: &str) -> Result<String> {
    let trimmed = code.trim();
    let lower = trimmed.to_lowercase();
    match lower.as_str() {
        "zh-hans" | "chs" | "zh-cn" | "sc" => return Ok("zh-Hans".to_string()),
        "zh-hant" | "cht" | "zh-tw" | "zh-hk" | "tc" => return Ok("zh-Hant".to_string()),
        _ if is_chinese_tag(&lower) => return Ok("zh".to_string()),
        _ => {}
    }

    if lower.len() == 2 {
        if Language::from_639_1(&lower).is_some() {
            return Ok(lower);
        }
    } else if lower.len() == 3 {
        // Accept both 639-2/T and the handful of bibliographic variants
        // that show up in container metadata.
        let part2t = match lower.as_str() {
            "fre" => "fra",
            "ger" => "deu",
            "dut" => "nld",
            "gre" => "ell",
            "cze" => "ces",
            "ice" => "isl",
            "per" => "fas",
            "rum" => "ron",
            "slo" => "slk",
            other => other,
        };
        if let Some(lang) = Language::from_639_3(part2t) {
            if let Some(short) = lang.to_639_1() {
                return Ok(short.to_string());
            }
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize language code: {}", code))
}

/// Whether two codes refer to the same language, ignoring the Chinese
/// script subtag (`zh-Hans` matches `zh`).
pub fn tags_match(a: &str, b: &str) -> bool {
    let na = match normalize_tag(a) {
        Ok(n) => n,
        Err(_) => return false,
    };
    let nb = match normalize_tag(b) {
        Ok(n) => n,
        Err(_) => return false,
    };
    base_tag(&na) == base_tag(&nb)
}

fn base_tag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}
