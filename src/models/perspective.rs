//! 视角（Perspective）模型
//!
//! 六种固定的分析视角，以及由生成结果解析出的视角记录。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// 视角类别（封闭枚举）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PerspectiveKind {
    /// 古代智慧（易经）
    Ancient,
    /// 物理学
    Physics,
    /// 生物学
    Biology,
    /// 经营学
    Business,
    /// 心理学
    Psychology,
    /// 军事学
    Military,
}

impl PerspectiveKind {
    /// 固定顺序的全部视角
    pub const ALL: [PerspectiveKind; 6] = [
        PerspectiveKind::Ancient,
        PerspectiveKind::Physics,
        PerspectiveKind::Biology,
        PerspectiveKind::Business,
        PerspectiveKind::Psychology,
        PerspectiveKind::Military,
    ];

    /// 线上标识
    pub fn as_str(&self) -> &'static str {
        match self {
            PerspectiveKind::Ancient => "ancient",
            PerspectiveKind::Physics => "physics",
            PerspectiveKind::Biology => "biology",
            PerspectiveKind::Business => "business",
            PerspectiveKind::Psychology => "psychology",
            PerspectiveKind::Military => "military",
        }
    }

    /// 视角名称（提示词中的标题行）
    pub fn label(&self) -> &'static str {
        match self {
            PerspectiveKind::Ancient => "고대의 지혜",
            PerspectiveKind::Physics => "물리학 관점",
            PerspectiveKind::Biology => "생물학 관점",
            PerspectiveKind::Business => "경영학 관점",
            PerspectiveKind::Psychology => "심리학 관점",
            PerspectiveKind::Military => "군사학 관점",
        }
    }

    /// 解析失败时使用的默认标题
    pub fn default_title(&self) -> &'static str {
        match self {
            PerspectiveKind::Ancient => "📜 고대의 지혜",
            PerspectiveKind::Physics => "⚙️ 물리학 관점",
            PerspectiveKind::Biology => "🌱 생물학 관점",
            PerspectiveKind::Business => "💼 경영학 관점",
            PerspectiveKind::Psychology => "🧠 심리학 관점",
            PerspectiveKind::Military => "⚔️ 군사학 관점",
        }
    }
}

impl fmt::Display for PerspectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerspectiveKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PerspectiveKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| AppError::UnknownPerspective(s.to_string()))
    }
}

/// 视角记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Perspective {
    /// 标题
    pub title: String,
    /// 正文分析
    pub content: String,
    /// 一句话核心信息
    pub key_message: String,
    /// 追问列表
    pub questions: Vec<String>,
}

impl Perspective {
    /// 某一视角生成失败时返回给用户的占位记录
    pub fn generation_failed(kind: PerspectiveKind) -> Self {
        Self {
            title: kind.default_title().to_string(),
            content: format!(
                "{} 관점 분석 중 오류가 발생했습니다. 다시 시도해주세요.",
                kind.as_str()
            ),
            key_message: "분석을 다시 요청해주세요.".to_string(),
            questions: vec!["이 관점에서 다시 분석을 요청하시겠습니까?".to_string()],
        }
    }
}

/// 卦上挂载的六个可选视角
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PerspectiveSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancient: Option<Perspective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physics: Option<Perspective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biology: Option<Perspective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<Perspective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psychology: Option<Perspective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub military: Option<Perspective>,
}

impl PerspectiveSet {
    pub fn get(&self, kind: PerspectiveKind) -> Option<&Perspective> {
        self.slot(kind).as_ref()
    }

    pub fn set(&mut self, kind: PerspectiveKind, perspective: Perspective) {
        *self.slot_mut(kind) = Some(perspective);
    }

    pub fn is_empty(&self) -> bool {
        PerspectiveKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }

    fn slot(&self, kind: PerspectiveKind) -> &Option<Perspective> {
        match kind {
            PerspectiveKind::Ancient => &self.ancient,
            PerspectiveKind::Physics => &self.physics,
            PerspectiveKind::Biology => &self.biology,
            PerspectiveKind::Business => &self.business,
            PerspectiveKind::Psychology => &self.psychology,
            PerspectiveKind::Military => &self.military,
        }
    }

    fn slot_mut(&mut self, kind: PerspectiveKind) -> &mut Option<Perspective> {
        match kind {
            PerspectiveKind::Ancient => &mut self.ancient,
            PerspectiveKind::Physics => &mut self.physics,
            PerspectiveKind::Biology => &mut self.biology,
            PerspectiveKind::Business => &mut self.business,
            PerspectiveKind::Psychology => &mut self.psychology,
            PerspectiveKind::Military => &mut self.military,
        }
    }
}
