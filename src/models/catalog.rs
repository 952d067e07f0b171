//! 内置六十四卦目录
//!
//! 随二进制一起发布的种子数据，用于初始化与兜底评分；
//! 以及从 Markdown 表格导入目录条目。
//!
//! 表格列顺序：`| 번호 | 기호 | 이름（한자）| 핵심 관점 | 멘탈 모델 | 요약 |`

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::hexagram::{Hexagram, MAX_HEXAGRAM_NUMBER};

static SEED_JSON: &str = include_str!("../../data/hexagrams.json");

#[derive(Debug, Deserialize)]
struct SeedEntry {
    number: u8,
    symbol: String,
    name: String,
    #[serde(default)]
    korean_name: Option<String>,
    core_viewpoint: String,
    summary: String,
    #[serde(default)]
    mental_models: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

impl From<SeedEntry> for Hexagram {
    fn from(entry: SeedEntry) -> Self {
        let mut hexagram = Hexagram::new(
            entry.number,
            entry.symbol,
            entry.name,
            entry.core_viewpoint,
            entry.summary,
        )
        .with_keywords(entry.keywords);
        hexagram.korean_name = entry.korean_name;
        hexagram.mental_models = entry.mental_models;
        hexagram.ensure_keywords();
        hexagram
    }
}

/// 加载内置目录，按序号升序
pub fn seed_catalog() -> Result<Vec<Hexagram>> {
    let entries: Vec<SeedEntry> = serde_json::from_str(SEED_JSON)?;
    let mut hexagrams: Vec<Hexagram> = entries.into_iter().map(Hexagram::from).collect();
    hexagrams.sort_by_key(|h| h.number);

    if hexagrams.len() != MAX_HEXAGRAM_NUMBER as usize {
        return Err(AppError::Internal(format!(
            "内置卦目录条目数异常: {}",
            hexagrams.len()
        )));
    }
    for hexagram in &hexagrams {
        hexagram.validate()?;
    }
    Ok(hexagrams)
}

/// 表格至少需要的列数
const MARKDOWN_COLUMNS: usize = 6;

/// `이름（한자）` 形式的卦名，括号为全角
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^（]+)（([^）]+)）").expect("valid regex"));

/// Markdown 表格中的一行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRow {
    /// 未校验的序号
    pub number: i64,
    pub symbol: String,
    pub name: String,
    pub korean_name: Option<String>,
    pub core_viewpoint: String,
    /// `-` 视为空
    pub mental_models: Option<String>,
    pub summary: String,
}

impl CatalogRow {
    /// 用本行覆盖卦的目录字段，保留关键词与已保存的视角
    pub fn apply_to(&self, hexagram: &mut Hexagram) {
        hexagram.symbol = self.symbol.clone();
        hexagram.name = self.name.clone();
        hexagram.korean_name = self.korean_name.clone();
        hexagram.core_viewpoint = self.core_viewpoint.clone();
        hexagram.mental_models = self.mental_models.clone();
        hexagram.summary = self.summary.clone();
        hexagram.updated_at = chrono::Utc::now();
    }
}

/// 拆分 `이름（한자）`，去掉加粗标记
pub fn split_name(field: &str) -> (String, Option<String>) {
    let field = field.replace("**", "");
    match NAME_PATTERN.captures(field.trim()) {
        Some(caps) => (
            caps[1].trim().to_string(),
            Some(caps[2].trim().to_string()).filter(|s| !s.is_empty()),
        ),
        None => (field.trim().to_string(), None),
    }
}

/// 分隔行：只由 `|`、`-`、`:` 与空白组成，且至少含一个 `-`
fn is_separator(line: &str) -> bool {
    line.starts_with('|')
        && line.contains('-')
        && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// 单元格开头的整数，`**5**`、`5번` 都读作 5
fn leading_number(cell: &str) -> Option<i64> {
    let cell = cell.replace("**", "");
    let cell = cell.trim();
    let (sign, digits) = match cell.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, cell),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// 解析 Markdown 表格
///
/// 第一条分隔行之后的 `|` 行才算数据行；列数不足或序号不是数字的行会被跳过，
/// 序号范围与字段内容留给导入时逐行校验。
pub fn parse_markdown_catalog(markdown: &str) -> Vec<CatalogRow> {
    let mut rows = Vec::new();
    let mut in_table = false;

    for line in markdown.lines() {
        let line = line.trim();
        if is_separator(line) {
            in_table = true;
            continue;
        }
        if !in_table || !line.starts_with('|') {
            continue;
        }

        let cells: Vec<&str> = line.split('|').map(str::trim).collect();
        // 首尾的 `|` 会切出两个空单元格
        if cells.len() < MARKDOWN_COLUMNS + 2 {
            continue;
        }
        let cells = &cells[1..cells.len() - 1];
        let Some(number) = leading_number(cells[0]) else {
            continue;
        };

        let (name, korean_name) = split_name(cells[2]);
        rows.push(CatalogRow {
            number,
            symbol: cells[1].to_string(),
            name,
            korean_name,
            core_viewpoint: cells[3].to_string(),
            mental_models: Some(cells[4])
                .filter(|m| !m.is_empty() && *m != "-")
                .map(str::to_string),
            summary: cells[5].to_string(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "# 64괘 멘탈 모델

| **번호** | **기호** | **이름** | **핵심 관점** | **멘탈 모델** | **요약** |
|---|---|---|---|---|---|
| 1 | ☰/☰ | **중천건（重天乾）** | 창조적 에너지 | 제1원칙 사고 | 시작의 힘 |
| 2 | ☷/☷ | 중지곤 | 수용성 | - | 받아들임 |
| 삼 | ☵/☳ | 수뢰둔 | 어려움 | - | 숫자가 아님 |
| 4 | 짧은 행 |

본문 | 표 밖의 줄 | 1 | 2 | 3 | 4 | 5 |
";

    #[test]
    fn test_seed_catalog_is_complete() {
        let catalog = seed_catalog().unwrap();
        assert_eq!(catalog.len(), 64);
        for (index, hexagram) in catalog.iter().enumerate() {
            assert_eq!(hexagram.number as usize, index + 1);
            assert!(!hexagram.keywords.is_empty());
        }
    }

    #[test]
    fn test_parse_markdown_catalog() {
        let rows = parse_markdown_catalog(TABLE);
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.symbol, "☰/☰");
        assert_eq!(first.name, "중천건");
        assert_eq!(first.korean_name.as_deref(), Some("重天乾"));
        assert_eq!(first.mental_models.as_deref(), Some("제1원칙 사고"));
        assert_eq!(first.summary, "시작의 힘");

        let second = &rows[1];
        assert_eq!(second.name, "중지곤");
        assert!(second.korean_name.is_none());
        assert!(second.mental_models.is_none());
    }

    #[test]
    fn test_rows_before_separator_are_ignored() {
        let markdown = "| 1 | ☰ | 건 | 관점 | - | 요약 |\n|:--|:-:|---|---|---|--:|\n| 2 | ☷ | 곤 | 관점 | - | 요약 |";
        let rows = parse_markdown_catalog(markdown);
        assert_eq!(rows.iter().map(|r| r.number).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_out_of_range_numbers_are_kept_for_validation() {
        let markdown = "|---|\n| **65** | ☰ | 건 | 관점 | - | 요약 |\n| 0번 | ☰ | 건 | 관점 | - | 요약 |";
        let rows = parse_markdown_catalog(markdown);
        assert_eq!(rows.iter().map(|r| r.number).collect::<Vec<_>>(), vec![65, 0]);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("**수천수（水天需）**"),
            ("수천수".to_string(), Some("水天需".to_string()))
        );
        assert_eq!(split_name(" 산수몽 "), ("산수몽".to_string(), None));
    }

    #[test]
    fn test_seed_catalog_content() {
        let catalog = seed_catalog().unwrap();
        let waiting = &catalog[4];
        assert_eq!(waiting.name, "수천수");
        assert!(waiting.keywords.iter().any(|k| k == "인내"));
    }
}
