//! 卦的相容性评分
//!
//! 对目录中的每一卦按加权规则累加分数，并稳定排序。

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::hexagram::Hexagram;

pub const BASE_SCORE: f64 = 0.1;
pub const KEYWORD_WEIGHT: f64 = 0.3;
pub const EMOTION_WEIGHT: f64 = 0.4;
pub const EMOTION_BONUS: f64 = 0.3;
pub const SITUATION_BONUS: f64 = 0.25;

/// 报告中保留的最高分条数
pub const TOP_SCORES: usize = 10;

const PASSION_EMOTIONS: &[&str] = &["열정", "passion"];
const PASSION_KEYWORDS: &[&str] = &["창조", "리더십", "열정", "creation", "leadership", "passion"];

const ANXIETY_EMOTIONS: &[&str] = &["불안", "anxiety"];
const ANXIETY_KEYWORDS: &[&str] = &["안정", "인내", "진정", "stability", "patience", "calm"];

const WORK_MARKERS: &[&str] = &["직장", "업무", "workplace", "business"];
const WORK_KEYWORDS: &[&str] = &[
    "리더십", "질서", "경영", "성과", "leadership", "order", "management", "results",
];

const LOVE_MARKERS: &[&str] = &["사랑", "인간관계", "love", "relationship"];
const LOVE_KEYWORDS: &[&str] = &[
    "조화", "사랑", "소통", "관계", "harmony", "love", "communication", "relationship",
];

/// 单卦得分
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibilityScore {
    pub number: u8,
    pub name: String,
    pub score: f64,
    pub reason: String,
    pub keywords: Vec<String>,
    pub summary: String,
}

/// 评分报告
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibilityReport {
    pub total_hexagrams: usize,
    pub analyzed_keywords: Vec<String>,
    pub analyzed_emotions: Vec<String>,
    pub analyzed_situation: String,
    pub top_scores: Vec<CompatibilityScore>,
    pub all_scores: Vec<CompatibilityScore>,
}

fn has_any(keywords: &[String], candidates: &[&str]) -> bool {
    keywords
        .iter()
        .any(|k| candidates.iter().any(|c| k.eq_ignore_ascii_case(c)))
}

fn non_blank(items: &[String]) -> impl Iterator<Item = &str> {
    items.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn is_one_of(value: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| value.eq_ignore_ascii_case(c))
}

fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

fn summary_of(hexagram: &Hexagram) -> String {
    if !hexagram.summary.trim().is_empty() {
        hexagram.summary.clone()
    } else if !hexagram.core_viewpoint.trim().is_empty() {
        hexagram.core_viewpoint.chars().take(50).collect()
    } else {
        "설명 없음".to_string()
    }
}

/// 计算单卦得分
pub fn score_hexagram(
    hexagram: &Hexagram,
    emotions: &[String],
    situation: &str,
    keywords: &[String],
) -> CompatibilityScore {
    let hex_keywords = &hexagram.keywords;
    let hex_lower: Vec<String> = non_blank(hex_keywords).map(str::to_lowercase).collect();
    let mut score = BASE_SCORE;
    let mut reasons: Vec<String> = Vec::new();

    // 空白关键词会作为子串匹配任何卦，先剔除
    let matching: Vec<&str> = non_blank(keywords)
        .filter(|k| {
            let k = k.to_lowercase();
            hex_lower.iter().any(|hk| hk.contains(&k) || k.contains(hk))
        })
        .collect();
    if !matching.is_empty() {
        let keyword_score = matching.len() as f64 * KEYWORD_WEIGHT;
        score += keyword_score;
        reasons.push(format!(
            "키워드 매칭({:.1}): {}",
            keyword_score,
            matching.join(", ")
        ));
    }

    for emotion in non_blank(emotions) {
        if hex_keywords.iter().any(|k| k.eq_ignore_ascii_case(emotion)) {
            score += EMOTION_WEIGHT;
            reasons.push(format!("감정 매칭({:.1}): {}", EMOTION_WEIGHT, emotion));
        }
        if is_one_of(emotion, PASSION_EMOTIONS) && has_any(hex_keywords, PASSION_KEYWORDS) {
            score += EMOTION_BONUS;
            reasons.push("열정 성향 가점".to_string());
        }
        if is_one_of(emotion, ANXIETY_EMOTIONS) && has_any(hex_keywords, ANXIETY_KEYWORDS) {
            score += EMOTION_BONUS;
            reasons.push("불안 완화 가점".to_string());
        }
    }

    // 处境加分最多计一次
    let situation_lower = situation.to_lowercase();
    let mut situation_bonus = 0.0;
    if WORK_MARKERS.iter().any(|m| situation_lower.contains(m))
        && has_any(hex_keywords, WORK_KEYWORDS)
    {
        situation_bonus = SITUATION_BONUS;
        reasons.push("직장/업무 상황 매칭".to_string());
    }
    if LOVE_MARKERS.iter().any(|m| situation_lower.contains(m))
        && has_any(hex_keywords, LOVE_KEYWORDS)
    {
        situation_bonus = SITUATION_BONUS;
        reasons.push("인간관계 상황 매칭".to_string());
    }
    score += situation_bonus;

    CompatibilityScore {
        number: hexagram.number,
        name: hexagram.name.clone(),
        score: round2(score),
        reason: if reasons.is_empty() {
            "기본 점수".to_string()
        } else {
            reasons.join(" + ")
        },
        keywords: hex_keywords.clone(),
        summary: summary_of(hexagram),
    }
}

/// 为目录中的每一卦评分，按分数降序，同分保持目录顺序
pub fn calculate_compatibility(
    catalog: &[Hexagram],
    emotions: &[String],
    situation: &str,
    keywords: &[String],
) -> Vec<CompatibilityScore> {
    let mut scores: Vec<CompatibilityScore> = catalog
        .iter()
        .map(|h| score_hexagram(h, emotions, situation, keywords))
        .collect();
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scores
}

/// 评分并生成报告
pub fn compatibility_report(
    catalog: &[Hexagram],
    emotions: &[String],
    situation: &str,
    keywords: &[String],
) -> CompatibilityReport {
    let all_scores = calculate_compatibility(catalog, emotions, situation, keywords);
    CompatibilityReport {
        total_hexagrams: catalog.len(),
        analyzed_keywords: keywords.to_vec(),
        analyzed_emotions: emotions.to_vec(),
        analyzed_situation: situation.to_string(),
        top_scores: all_scores.iter().take(TOP_SCORES).cloned().collect(),
        all_scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::seed_catalog;

    fn hexagram(number: u8, keywords: &[&str]) -> Hexagram {
        Hexagram::new(number, "☰/☰", format!("괘{number}"), "관점", "요약")
            .with_keywords(keywords.iter().copied())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_waiting_hexagram_outranks_unrelated_one() {
        let catalog = vec![
            hexagram(1, &["thunder", "shock"]),
            hexagram(5, &["strategy", "waiting", "patience"]),
        ];
        let scores = calculate_compatibility(
            &catalog,
            &strings(&["anxiety"]),
            "I need to wait patiently at work",
            &[],
        );

        assert_eq!(scores[0].number, 5);
        assert!(scores[0].score > scores[1].score);
        assert_eq!(scores[1].score, BASE_SCORE);
    }

    #[test]
    fn test_keyword_matching_is_bidirectional_substring() {
        let h = hexagram(1, &["리더십", "Creation"]);
        let score = score_hexagram(&h, &[], "", &strings(&["리더", "creations"]));
        assert_eq!(score.score, 0.7);
        assert!(score.reason.starts_with("키워드 매칭(0.6)"));
    }

    #[test]
    fn test_emotion_literal_match_and_bonus() {
        let h = hexagram(1, &["창조", "리더십", "열정"]);
        let score = score_hexagram(&h, &strings(&["열정"]), "", &[]);
        // 0.1 + 0.4 + 0.3
        assert_eq!(score.score, 0.8);
        assert_eq!(score.reason, "감정 매칭(0.4): 열정 + 열정 성향 가점");
    }

    #[test]
    fn test_blank_keywords_do_not_match() {
        let h = hexagram(1, &["order", " "]);
        let score = score_hexagram(&h, &strings(&[""]), "", &strings(&["", "   "]));
        assert_eq!(score.score, BASE_SCORE);
        assert_eq!(score.reason, "기본 점수");
    }

    #[test]
    fn test_user_keywords_are_trimmed() {
        let h = hexagram(1, &["Patience"]);
        let score = score_hexagram(&h, &[], "", &strings(&["  patience "]));
        assert_eq!(score.score, 0.4);
        assert!(score.reason.contains("patience"));
    }

    #[test]
    fn test_plain_work_word_is_not_a_workplace_marker() {
        let h = hexagram(1, &["leadership"]);
        let score = score_hexagram(&h, &[], "my homework and network", &[]);
        assert_eq!(score.score, BASE_SCORE);

        let score = score_hexagram(&h, &[], "trouble at my workplace", &[]);
        assert_eq!(score.score, 0.35);
    }

    #[test]
    fn test_situation_bonus_applies_once() {
        let h = hexagram(7, &["리더십", "조화"]);
        let score = score_hexagram(&h, &[], "직장 내 인간관계", &[]);
        assert_eq!(score.score, 0.35);
        assert!(score.reason.contains("직장/업무 상황 매칭"));
        assert!(score.reason.contains("인간관계 상황 매칭"));
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = vec![hexagram(3, &[]), hexagram(1, &[]), hexagram(2, &[])];
        let scores = calculate_compatibility(&catalog, &[], "", &[]);
        assert_eq!(
            scores.iter().map(|s| s.number).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
        assert!(scores.iter().all(|s| s.reason == "기본 점수"));
    }

    #[test]
    fn test_full_catalog_report() {
        let catalog = seed_catalog().unwrap();
        let report = compatibility_report(
            &catalog,
            &strings(&["불안"]),
            "직장 및 업무 관련",
            &strings(&["인내"]),
        );

        assert_eq!(report.total_hexagrams, 64);
        assert_eq!(report.all_scores.len(), 64);
        assert_eq!(report.top_scores.len(), TOP_SCORES);
        assert!(report.all_scores.iter().all(|s| s.score >= BASE_SCORE));
        assert!(
            report
                .all_scores
                .windows(2)
                .all(|w| w[0].score >= w[1].score)
        );
        // 수천수(5)는 인내 키워드와 불안 완화 가점을 모두 받는다
        let waiting = report.all_scores.iter().find(|s| s.number == 5).unwrap();
        assert!(waiting.score >= 0.7);
    }
}
