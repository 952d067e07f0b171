//! 视角响应解析
//!
//! 生成服务的回答是半结构化的 Markdown：一个加粗标题、若干正文、
//! `**핵심 메시지**:` 一行以及 `**전략적 질문**:` 之后的编号问题。
//! 这里按行扫描并维护当前所在段落，任何输入都会得到一条完整记录。

use crate::models::perspective::{Perspective, PerspectiveKind};

/// 未提取到问题时的默认问题
pub const FALLBACK_QUESTIONS: [&str; 3] = [
    "이 관점에서 가장 중요한 고려사항은 무엇인가요?",
    "다음 단계로 어떤 행동을 취하는 것이 좋을까요?",
    "이 상황에서 주의해야 할 위험 요소는 무엇인가요?",
];

/// 正文与核心信息都缺失时的默认核心信息
pub const FALLBACK_KEY_MESSAGE: &str = "분석 결과를 확인해주세요.";

const KEY_MESSAGE_LABEL: &str = "핵심 메시지";
const QUESTIONS_LABEL: &str = "전략적 질문";

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub perspective: Perspective,
    /// 未归入任何段落的文本（标题之前、核心信息与问题之间）
    pub unparsed: Option<String>,
    /// 是否使用了任一默认值
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Body,
    KeyMessage,
    Questions,
}

/// 行内 `**label**` 之后的值（去掉冒号与空白）
fn labeled_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let marker = format!("**{}**", label);
    let start = line.find(&marker)?;
    let rest = line[start + marker.len()..].trim_start();
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('：'))
        .unwrap_or(rest);
    Some(rest.trim())
}

/// 行内第一个非空且不是段落标记的加粗片段，返回 (标题, 片段之后的文本)
fn title_span(line: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    while let Some(open) = line[offset..].find("**") {
        let inner_start = offset + open + 2;
        let close = line[inner_start..].find("**")?;
        let inner = line[inner_start..inner_start + close].trim();
        let after = inner_start + close + 2;
        if !inner.is_empty() && inner != KEY_MESSAGE_LABEL && inner != QUESTIONS_LABEL {
            return Some((inner, &line[after..]));
        }
        offset = after;
    }
    None
}

/// 去掉正文开头残留的 `**label**:` 片段
fn strip_label_remnant(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("**") else {
        return content;
    };
    let first_line = rest.lines().next().unwrap_or_default();
    let Some(close) = first_line.find("**") else {
        return content;
    };
    let after = rest[close + 2..].trim_start_matches([' ', '\t']);
    match after.strip_prefix(':').or_else(|| after.strip_prefix('：')) {
        Some(remaining) => remaining.trim_start(),
        None => content,
    }
}

/// 去掉行首的 `<n>.` 编号
fn strip_numbering(line: &str) -> &str {
    let trimmed = line.trim();
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix('.') {
            return rest.trim();
        }
    }
    trimmed
}

fn join_trimmed(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

/// 解析生成服务的回答
pub fn parse_response(raw: &str, kind: PerspectiveKind) -> ParsedResponse {
    let mut section = Section::Preamble;
    let mut title: Option<String> = None;
    let mut key_message: Option<String> = None;
    let mut saw_marker = false;
    let mut preamble: Vec<&str> = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    let mut trailing: Vec<&str> = Vec::new();
    let mut questions: Vec<String> = Vec::new();

    for line in raw.lines() {
        if section == Section::Questions {
            let question = strip_numbering(line);
            if !question.is_empty() {
                questions.push(question.to_string());
            }
            continue;
        }

        if let Some(value) = labeled_value(line, KEY_MESSAGE_LABEL) {
            if key_message.is_none() {
                key_message = Some(value.to_string());
            }
            saw_marker = true;
            section = Section::KeyMessage;
            continue;
        }

        if let Some(value) = labeled_value(line, QUESTIONS_LABEL) {
            saw_marker = true;
            section = Section::Questions;
            let question = strip_numbering(value);
            if !question.is_empty() {
                questions.push(question.to_string());
            }
            continue;
        }

        match section {
            Section::Preamble => match title_span(line) {
                Some((found, rest)) => {
                    title = Some(found.to_string());
                    saw_marker = true;
                    section = Section::Body;
                    let rest = rest.trim_start().trim_start_matches([':', '：']);
                    if !rest.trim().is_empty() {
                        body.push(rest);
                    }
                }
                None => preamble.push(line),
            },
            Section::Body => body.push(line),
            Section::KeyMessage => trailing.push(line),
            Section::Questions => {}
        }
    }

    // 没有标题时，标题之前的文本就是正文
    let content = if title.is_some() {
        join_trimmed(&body)
    } else if saw_marker {
        join_trimmed(&preamble)
    } else {
        String::new()
    };
    let content = strip_label_remnant(&content).trim().to_string();

    let mut unparsed_parts: Vec<&str> = Vec::new();
    if title.is_some() {
        unparsed_parts.extend(&preamble);
    }
    unparsed_parts.extend(&trailing);
    let unparsed = Some(join_trimmed(&unparsed_parts)).filter(|s| !s.is_empty());

    let mut used_fallback = false;
    let title = title.unwrap_or_else(|| {
        used_fallback = true;
        kind.default_title().to_string()
    });

    if questions.is_empty() {
        used_fallback = true;
        questions = FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect();
    }

    let mut key_message = key_message.unwrap_or_default();
    let mut content = content;
    if content.is_empty() && key_message.is_empty() {
        used_fallback = true;
        content = raw.to_string();
        key_message = FALLBACK_KEY_MESSAGE.to_string();
    }

    ParsedResponse {
        perspective: Perspective {
            title,
            content,
            key_message,
            questions,
        },
        unparsed,
        used_fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WELL_FORMED: &str = "**물리학 관점**

시스템은 평형을 향해 움직입니다.
에너지를 아껴 두십시오.

**핵심 메시지**: 기다림은 위치 에너지를 쌓는 시간이다

**전략적 질문**:
1. 지금 낭비되는 에너지는 어디에 있나요?
2. 시스템의 균형점은 어디인가요?
3. 언제 힘을 써야 할까요?";

    #[test]
    fn test_parse_well_formed_response() {
        let parsed = parse_response(WELL_FORMED, PerspectiveKind::Physics);
        let p = &parsed.perspective;
        assert_eq!(p.title, "물리학 관점");
        assert_eq!(
            p.content,
            "시스템은 평형을 향해 움직입니다.\n에너지를 아껴 두십시오."
        );
        assert_eq!(p.key_message, "기다림은 위치 에너지를 쌓는 시간이다");
        assert_eq!(
            p.questions,
            vec![
                "지금 낭비되는 에너지는 어디에 있나요?",
                "시스템의 균형점은 어디인가요?",
                "언제 힘을 써야 할까요?",
            ]
        );
        assert!(!parsed.used_fallback);
        assert!(parsed.unparsed.is_none());
    }

    #[test]
    fn test_round_trip_of_documented_format() {
        let text = format!(
            "**{}**\n\n**핵심 메시지**: {}\n\n**전략적 질문**:\n1. {}\n2. {}\n3. {}",
            "Title", "Key", "Q1", "Q2", "Q3"
        );
        let parsed = parse_response(&text, PerspectiveKind::Ancient);
        assert_eq!(parsed.perspective.title, "Title");
        assert_eq!(parsed.perspective.key_message, "Key");
        assert_eq!(parsed.perspective.questions, vec!["Q1", "Q2", "Q3"]);
    }

    #[test]
    fn test_unstructured_text_uses_fallbacks() {
        let parsed = parse_response("no markers at all", PerspectiveKind::Physics);
        let p = &parsed.perspective;
        assert_eq!(p.title, "⚙️ 물리학 관점");
        assert_eq!(p.content, "no markers at all");
        assert_eq!(p.key_message, FALLBACK_KEY_MESSAGE);
        assert_eq!(p.questions, FALLBACK_QUESTIONS.to_vec());
        assert!(parsed.used_fallback);
    }

    #[rstest]
    #[case("")]
    #[case("   \n\n")]
    #[case("**")]
    #[case("****")]
    #[case("**전략적 질문**:")]
    #[case("**핵심 메시지**:")]
    #[case("1. 2. 3.")]
    fn test_any_input_yields_complete_record(#[case] raw: &str) {
        for kind in PerspectiveKind::ALL {
            let p = parse_response(raw, kind).perspective;
            assert!(!p.title.is_empty());
            assert!(!p.questions.is_empty());
            assert!(!p.key_message.is_empty() || !p.content.is_empty());
        }
    }

    #[test]
    fn test_missing_title_keeps_text_before_key_message() {
        let raw = "시작이 어렵습니다.\n**핵심 메시지**: 작게 시작하라";
        let p = parse_response(raw, PerspectiveKind::Business).perspective;
        assert_eq!(p.title, "💼 경영학 관점");
        assert_eq!(p.content, "시작이 어렵습니다.");
        assert_eq!(p.key_message, "작게 시작하라");
        assert_eq!(p.questions.len(), 3);
    }

    #[test]
    fn test_leading_label_remnant_is_stripped() {
        let raw = "**군사학 관점**\n**분석**: 지형을 먼저 살피십시오.\n**핵심 메시지**: 정보가 먼저다";
        let p = parse_response(raw, PerspectiveKind::Military).perspective;
        assert_eq!(p.content, "지형을 먼저 살피십시오.");
    }

    #[test]
    fn test_text_outside_sections_is_reported() {
        let raw = "물론입니다!\n**심리학 관점**\n본문\n**핵심 메시지**: 요약\n추가 설명\n**전략적 질문**:\n1. 질문";
        let parsed = parse_response(raw, PerspectiveKind::Psychology);
        assert_eq!(parsed.perspective.title, "심리학 관점");
        assert_eq!(parsed.perspective.content, "본문");
        assert_eq!(parsed.unparsed.as_deref(), Some("물론입니다!\n추가 설명"));
        assert_eq!(parsed.perspective.questions, vec!["질문"]);
    }

    #[test]
    fn test_crlf_and_fullwidth_colon() {
        let raw = "**생물학 관점**\r\n적응하라\r\n**핵심 메시지**： 변화에 맞춰라\r\n**전략적 질문**:\r\n1. 무엇에 적응해야 하나요?\r\n";
        let p = parse_response(raw, PerspectiveKind::Biology).perspective;
        assert_eq!(p.content, "적응하라");
        assert_eq!(p.key_message, "변화에 맞춰라");
        assert_eq!(p.questions, vec!["무엇에 적응해야 하나요?"]);
    }

    #[test]
    fn test_large_response_is_still_parsed() {
        let line = "에너지를 아껴 두십시오.";
        let body = vec![line; 10_000].join("\n");
        let raw = format!(
            "**물리학 관점**\n{}\n**핵심 메시지**: 때를 기다려라\n**전략적 질문**:\n1. A\n2. B\n3. C",
            body
        );
        assert!(raw.len() > 200 * 1024);

        let parsed = parse_response(&raw, PerspectiveKind::Physics);
        assert_eq!(parsed.perspective.title, "물리학 관점");
        assert_eq!(parsed.perspective.content, body);
        assert_eq!(parsed.perspective.key_message, "때를 기다려라");
        assert_eq!(parsed.perspective.questions, vec!["A", "B", "C"]);
        assert!(!parsed.used_fallback);
    }
}
