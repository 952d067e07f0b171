//! 用户处境分析
//!
//! 基于标记词的启发式分析：从自由文本中提取情绪、处境类别与关键词。

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// 未识别到情绪时的标签
pub const NEUTRAL_EMOTION: &str = "중립";
/// 未识别到类别时的处境
pub const GENERAL_SITUATION: &str = "일반적 상황";
/// 未识别到关键词时的默认关键词
pub const DEFAULT_KEYWORD: &str = "개인적 성장";

/// 保留的原文长度（字符）
const ORIGINAL_TEXT_CHARS: usize = 200;

/// (情绪标签, 标记词)
const EMOTION_MARKERS: &[(&str, &[&str])] = &[
    ("불안", &["걱정", "불안", "두려", "anxious", "anxiety", "worried", "afraid"]),
    ("기쁨", &["기쁘", "행복", "좋아", "happy", "glad", "joy"]),
    ("분노", &["화나", "짜증", "억울", "angry", "annoyed", "furious"]),
    ("슬픔", &["슬프", "우울", "시련", "sad", "depressed", "grief"]),
    ("어려움", &["어려운", "어렵", "힘든", "곤란", "difficult", "struggle", "hard time"]),
    ("열정", &["열정", "흥미", "목표", "passion", "excited", "eager"]),
];

/// (处境类别, 标记词)，按顺序取第一个命中的类别
const SITUATION_MARKERS: &[(&str, &[&str])] = &[
    ("직장 및 업무 관련", &["직장", "업무", "회사", "work", "job", "office", "business", "career"]),
    ("인간관계 및 사랑", &["사랑", "연인", "결혼", "love", "relationship", "partner", "marriage"]),
    ("가족 문제", &["가족", "부모", "자녀", "family", "parent", "child"]),
    ("재정 및 경제 문제", &["돈", "재정", "투자", "money", "finance", "invest"]),
    ("건강 문제", &["건강", "병", "아프", "health", "sick", "illness"]),
    ("인생 방향 및 목표", &["진로", "꿈", "목표", "future", "dream", "purpose"]),
];

/// 关键词词表
const KEYWORD_VOCABULARY: &[&str] = &[
    "창조", "변화", "리더십", "성장", "축적", "인내", "열정", "노력", "지혜", "결단", "협력",
    "소통", "균형", "안정", "진전", "대담", "세심", "정확", "독립", "평화", "치유", "신뢰", "예지",
];

/// 处境分析结果
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SituationAnalysis {
    pub emotions: Vec<String>,
    pub situation: String,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub original_text: String,
}

/// 分析用户处境
pub fn analyze_situation(input: &str) -> Result<SituationAnalysis> {
    if input.trim().is_empty() {
        return Err(AppError::Validation("분석할 텍스트를 입력해주세요.".to_string()));
    }

    let text = input.to_lowercase();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| text.contains(m));

    let mut emotions: Vec<String> = EMOTION_MARKERS
        .iter()
        .filter(|(_, markers)| contains_any(markers))
        .map(|(label, _)| label.to_string())
        .collect();
    if emotions.is_empty() {
        emotions.push(NEUTRAL_EMOTION.to_string());
    }

    let situation = SITUATION_MARKERS
        .iter()
        .find(|(_, markers)| contains_any(markers))
        .map(|(label, _)| *label)
        .unwrap_or(GENERAL_SITUATION)
        .to_string();

    let mut keywords: Vec<String> = KEYWORD_VOCABULARY
        .iter()
        .filter(|word| text.contains(*word))
        .map(|word| word.to_string())
        .collect();
    if keywords.is_empty() {
        keywords.push(DEFAULT_KEYWORD.to_string());
    }

    Ok(SituationAnalysis {
        emotions,
        situation,
        keywords,
        original_text: input.chars().take(ORIGINAL_TEXT_CHARS).collect(),
    })
}
