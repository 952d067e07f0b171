//! 视角提示词模板
//!
//! 每个视角共享同一段卦信息与用户处境，再附上该领域的角色设定和固定的回答格式。

use crate::models::hexagram::Hexagram;
use crate::models::perspective::PerspectiveKind;

/// 单个视角的模板参数
struct Template {
    /// 角色与分析方向
    persona: &'static str,
    /// 正文段落的写作要求
    analysis_hint: &'static str,
    /// 核心信息的写作要求
    key_message_hint: &'static str,
    /// 三个追问的方向
    questions: [&'static str; 3],
}

const ANCIENT: Template = Template {
    persona: "당신은 동양 철학과 역경(易經)의 전문가입니다. 위 괘의 고대 지혜를 바탕으로 사용자의 상황을 분석해주세요.",
    analysis_hint: "역경의 고전적 해석과 음양오행 원리를 통한 3-4문장의 심층 분석",
    key_message_hint: "한 줄로 요약된 핵심 통찰",
    questions: [
        "사용자 상황과 관련된 구체적 질문",
        "내면 성찰을 돕는 질문",
        "실행 방향에 대한 질문",
    ],
};

const PHYSICS: Template = Template {
    persona: "당신은 물리학자입니다. 에너지, 시스템, 힘의 균형, 열역학 법칙 등을 이용해 사용자 상황을 분석해주세요.",
    analysis_hint: "에너지 보존 법칙, 엔트로피, 평형 상태, 시스템 역학 등 물리학적 원리로 3-4문장 분석",
    key_message_hint: "물리학적 원리로 요약된 핵심 통찰",
    questions: [
        "에너지 효율성과 관련된 질문",
        "시스템 안정성에 대한 질문",
        "힘의 균형과 최적화에 대한 질문",
    ],
};

const BIOLOGY: Template = Template {
    persona: "당신은 생물학자입니다. 진화, 적응, 생태계, 생존 전략, 자연 선택 등의 원리로 사용자 상황을 분석해주세요.",
    analysis_hint: "진화론, 생태학, 적응 전략, 생존 기제 등 생물학적 원리로 3-4문장 분석",
    key_message_hint: "생물학적 원리로 요약된 핵심 통찰",
    questions: [
        "적응과 진화에 대한 질문",
        "생태계 내 역할과 관련된 질문",
        "생존 전략과 지속가능성에 대한 질문",
    ],
};

const BUSINESS: Template = Template {
    persona: "당신은 경영 전략 컨설턴트입니다. 전략 기획, 리더십, 조직 관리, 리스크 관리, 성과 최적화 등의 경영학 원리로 사용자 상황을 분석해주세요.",
    analysis_hint: "전략 경영, 리더십 이론, 조직 행동론, 학습조직 등 경영학 이론으로 3-4문장 분석",
    key_message_hint: "경영학적 관점에서 요약된 핵심 통찰",
    questions: [
        "전략적 의사결정과 관련된 질문",
        "리더십과 조직 관리에 대한 질문",
        "성과 측정과 개선에 대한 질문",
    ],
};

const PSYCHOLOGY: Template = Template {
    persona: "당신은 심리학자입니다. 인지 심리학, 행동 심리학, 동기 이론, 감정 조절, 성격 심리학 등의 원리로 사용자 상황을 분석해주세요.",
    analysis_hint: "인지 편향, 동기 이론, 감정 조절, 학습 이론, 성격 이론 등 심리학 이론으로 3-4문장 분석",
    key_message_hint: "심리학적 관점에서 요약된 핵심 통찰",
    questions: [
        "내적 동기와 가치관에 대한 질문",
        "감정 관리와 인지 처리에 대한 질문",
        "행동 변화와 습관 형성에 대한 질문",
    ],
};

const MILITARY: Template = Template {
    persona: "당신은 군사 전략 전문가입니다. 손자병법, 클라우제비츠, 마키아벨리 전략, 현대 군사 전략 등을 바탕으로 사용자 상황을 분석해주세요.",
    analysis_hint: "전략과 전술, 리스크 관리, 정보 수집, 자원 배분, 승리 조건 등 군사학 원리로 3-4문장 분석",
    key_message_hint: "군사학적 관점에서 요약된 핵심 통찰",
    questions: [
        "전략적 위치와 우위 확보에 대한 질문",
        "리스크 평가와 대응 능력에 대한 질문",
        "승리 조건과 자원 활용에 대한 질문",
    ],
};

fn template(kind: PerspectiveKind) -> &'static Template {
    match kind {
        PerspectiveKind::Ancient => &ANCIENT,
        PerspectiveKind::Physics => &PHYSICS,
        PerspectiveKind::Biology => &BIOLOGY,
        PerspectiveKind::Business => &BUSINESS,
        PerspectiveKind::Psychology => &PSYCHOLOGY,
        PerspectiveKind::Military => &MILITARY,
    }
}

/// 为指定视角构造提示词
pub fn build_prompt(kind: PerspectiveKind, hexagram: &Hexagram, situation: &str) -> String {
    let template = template(kind);
    let [q1, q2, q3] = template.questions;

    format!(
        "괘 정보:
- 이름: {name} ({number}번)
- 상징: {symbol}
- 핵심 관점: {core_viewpoint}
- 요약: {summary}

사용자 상황: {situation}

{persona}

다음 형식으로 반드시 답변해주세요. 전략적 질문은 번호를 붙여 정확히 3개만 작성해주세요:

**{label}**

[{analysis_hint}]

**핵심 메시지**: [{key_message_hint}]

**전략적 질문**:
1. [{q1}]
2. [{q2}]
3. [{q3}]",
        name = hexagram.name,
        number = hexagram.number,
        symbol = hexagram.symbol,
        core_viewpoint = hexagram.core_viewpoint,
        summary = hexagram.summary,
        situation = situation.trim(),
        persona = template.persona,
        label = kind.label(),
        analysis_hint = template.analysis_hint,
        key_message_hint = template.key_message_hint,
    )
}
