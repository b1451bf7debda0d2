use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::catalog::join_labels;
use crate::models::RecommendationSet;
use crate::profile::Profile;

pub const NO_RECOMMENDATIONS_MARKER: &str = "아직 추천된 연수가 없습니다";
const UNSET: &str = "미입력";

/// Which prompt contract to speak to the model.
///
/// `Classic` asks for courses plus related areas and short chat answers.
/// `Revised` asks for per-course audience/format/duration/credit detail, requests
/// JSON mode, and allows structured, longer chat answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptVariant {
    #[default]
    Classic,
    Revised,
}

impl PromptVariant {
    pub const fn default_model(&self) -> &'static str {
        match self {
            PromptVariant::Classic => "gpt-4",
            PromptVariant::Revised => "gpt-4o",
        }
    }

    /// Whether to ask the service for a JSON-only response.
    pub const fn json_mode(&self) -> bool {
        matches!(self, PromptVariant::Revised)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" | "v1" => Some(PromptVariant::Classic),
            "revised" | "v2" => Some(PromptVariant::Revised),
            _ => None,
        }
    }
}

/// What the instruction should make the model do.
#[derive(Debug, Clone, Copy)]
pub enum PromptKind<'a> {
    Recommendation,
    Chat {
        question: &'a str,
        recommendations: &'a RecommendationSet,
    },
}

/// Maps a profile plus optional context to a single instruction string.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptTemplate {
    variant: PromptVariant,
}

impl PromptTemplate {
    pub fn new(variant: PromptVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> PromptVariant {
        self.variant
    }

    pub fn render(&self, profile: &Profile, kind: PromptKind<'_>, today: NaiveDate) -> String {
        match kind {
            PromptKind::Recommendation => self.recommendation(profile, today),
            PromptKind::Chat {
                question,
                recommendations,
            } => self.chat(profile, question, recommendations),
        }
    }

    fn recommendation(&self, profile: &Profile, today: NaiveDate) -> String {
        let mut out = String::from(
            "당신은 교사 맞춤형 연수 추천 전문가입니다. 다음 정보를 바탕으로 교사에게 필요한 연수를 추천해주세요:\n\n",
        );
        out.push_str(&profile_block(profile));
        let _ = writeln!(out, "현재 시점: {}", today.format("%Y년 %m월"));
        out.push('\n');

        match self.variant {
            PromptVariant::Classic => out.push_str(CLASSIC_RECOMMENDATION_SCHEMA),
            PromptVariant::Revised => out.push_str(REVISED_RECOMMENDATION_SCHEMA),
        }
        out.push_str(
            "\n실제 존재할 것 같은 현실적인 연수 과정을 추천해주세요. \
             연수 제목은 실제 교육청이나 연수원에서 제공할 법한 구체적인 이름으로 작성해주세요.\n\
             JSON 이외의 설명이나 문장은 절대 출력하지 마세요.",
        );
        out
    }

    fn chat(&self, profile: &Profile, question: &str, recommendations: &RecommendationSet) -> String {
        let mut out = String::from(
            "당신은 '연수 도우미'라는 이름의 교사 연수 전문가입니다. \
             다음 정보를 가진 교사에게 친절하고 전문적으로 답변해주세요:\n\n",
        );
        out.push_str(&profile_block(profile));
        out.push_str("\n현재 추천된 연수:\n");
        out.push_str(&summarize_recommendations(recommendations));
        out.push_str("\n\n답변 시 다음 사항을 지켜주세요:\n");
        out.push_str("1. 따뜻하고 친절한 어조로 답변하세요\n");
        out.push_str("2. 실용적이고 구체적인 조언을 제공하세요\n");
        out.push_str("3. 교사의 경력과 관심사에 맞는 맞춤형 정보를 제공하세요\n");
        out.push_str("4. 정확한 정보가 없다면 추측하지 말고 모른다고 솔직하게 말하세요\n");
        match self.variant {
            PromptVariant::Classic => {
                out.push_str("5. 간결하고 명확하게 답변하세요 (3-4문장 이내)\n");
            }
            PromptVariant::Revised => {
                out.push_str(
                    "5. 핵심 답변, 구체적인 실천 방법, 참고할 점 순서로 구조화하여 충분히 자세하게 답변하세요\n",
                );
            }
        }
        out.push_str("6. 필요하다면 실제 교육부나 교육청의 정책 방향성을 반영하세요\n");
        let _ = write!(out, "\n질문: {}", question.trim());
        out
    }
}

fn profile_block(profile: &Profile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "이름: {}", profile.name.as_deref().unwrap_or("선생님"));
    let _ = writeln!(out, "관심 분야: {}", join_labels(&profile.interests, "미선택"));
    let _ = writeln!(out, "교직 경력: {}년", profile.years_experience);
    let _ = writeln!(out, "학교급: {}", profile.school_level.label());
    let _ = writeln!(out, "담당 과목: {}", profile.subject.as_deref().unwrap_or(UNSET));
    let _ = writeln!(out, "선호하는 연수 형태: {}", profile.format_preference.label());
    let _ = writeln!(
        out,
        "선호하는 연수 시간대: {}",
        join_labels(&profile.time_preference, UNSET)
    );
    out
}

/// Flattens the current recommendations into one line per course.
pub fn summarize_recommendations(set: &RecommendationSet) -> String {
    if set.courses.is_empty() {
        return NO_RECOMMENDATIONS_MARKER.to_string();
    }
    set.courses
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {} ({}, {}, {}, {}): {}",
                i + 1,
                c.title,
                c.category,
                c.format,
                c.duration,
                c.credits,
                c.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const CLASSIC_RECOMMENDATION_SCHEMA: &str = r#"다음 형식의 JSON으로 답변해주세요:
{
    "recommended_courses": [
        {
            "title": "연수 제목",
            "category": "연수 카테고리",
            "format": "온라인/오프라인/혼합형",
            "duration": "연수 기간",
            "credits": "이수 학점",
            "description": "연수 간략 설명",
            "benefits": "기대효과",
            "recommendation_reason": "이 연수를 추천하는 이유"
        },
        ... (총 3개)
    ],
    "related_areas": [
        {
            "area": "관련 분야명",
            "relevance": "선택한 관심 분야와의 관련성",
            "benefits": "이 분야를 학습했을 때의 장점"
        },
        ... (총 2개)
    ]
}
"#;

const REVISED_RECOMMENDATION_SCHEMA: &str = r#"다음 형식의 JSON 객체로만 답변해주세요:
{
    "recommended_courses": [
        {
            "title": "연수 제목",
            "category": "연수 카테고리",
            "target_audience": "연수 대상 (학교급, 경력 등)",
            "format": "실시간 온라인/녹화 강의 온라인/오프라인/혼합형",
            "duration": "연수 기간 및 총 시간",
            "credits": "이수 학점",
            "description": "연수 간략 설명",
            "benefits": "기대효과",
            "recommendation_reason": "이 교사에게 이 연수를 추천하는 이유",
            "practical_application": "수업이나 학교 현장에서의 구체적인 적용 방안"
        },
        ... (정확히 3개)
    ]
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FormatPreference, Interest, SchoolLevel};
    use crate::models::RecommendationItem;
    use crate::profile::ProfileForm;

    fn sample_profile() -> Profile {
        ProfileForm {
            name: "김선생".to_string(),
            years_experience: 5,
            school_level: SchoolLevel::Elementary,
            interests: Interest::AiEducation | Interest::BlendedLearning,
            format_preference: FormatPreference::Online,
            ..Default::default()
        }
        .snapshot()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
    }

    #[test]
    fn test_recommendation_prompt_embeds_profile_and_month() {
        let prompt = PromptTemplate::default().render(&sample_profile(), PromptKind::Recommendation, date());
        assert!(prompt.contains("이름: 김선생"));
        assert!(prompt.contains("관심 분야: 블렌디드 러닝, AI 교육"));
        assert!(prompt.contains("교직 경력: 5년"));
        assert!(prompt.contains("학교급: 초등학교"));
        assert!(prompt.contains("담당 과목: 미입력"));
        assert!(prompt.contains("선호하는 연수 시간대: 미입력"));
        assert!(prompt.contains("현재 시점: 2025년 03월"));
        assert!(prompt.contains("related_areas"));
        assert!(!prompt.contains("practical_application"));
    }

    #[test]
    fn test_revised_prompt_requests_detail_fields() {
        let prompt = PromptTemplate::new(PromptVariant::Revised).render(
            &sample_profile(),
            PromptKind::Recommendation,
            date(),
        );
        assert!(prompt.contains("target_audience"));
        assert!(prompt.contains("practical_application"));
        assert!(!prompt.contains("related_areas"));
    }

    #[test]
    fn test_chat_prompt_marks_missing_recommendations() {
        let empty = RecommendationSet::default();
        let prompt = PromptTemplate::default().render(
            &sample_profile(),
            PromptKind::Chat {
                question: "이 연수는 무료인가요?",
                recommendations: &empty,
            },
            date(),
        );
        assert!(prompt.contains(NO_RECOMMENDATIONS_MARKER));
        assert!(prompt.contains("질문: 이 연수는 무료인가요?"));
        assert!(prompt.contains("3-4문장"));
    }

    #[test]
    fn test_chat_prompt_lists_current_courses() {
        let set = RecommendationSet {
            courses: vec![RecommendationItem {
                title: "AI 융합 수업 설계".to_string(),
                category: "디지털 역량".to_string(),
                target_audience: "-".to_string(),
                format: "온라인".to_string(),
                duration: "4주".to_string(),
                credits: "2학점".to_string(),
                description: "AI 도구 활용".to_string(),
                benefits: "정보 없음".to_string(),
                recommendation_reason: "정보 없음".to_string(),
                practical_application: "정보 없음".to_string(),
            }],
            related_areas: vec![],
        };
        let prompt = PromptTemplate::new(PromptVariant::Revised).render(
            &sample_profile(),
            PromptKind::Chat {
                question: "수강 신청은 어디서 하나요?",
                recommendations: &set,
            },
            date(),
        );
        assert!(prompt.contains("1. AI 융합 수업 설계 (디지털 역량, 온라인, 4주, 2학점): AI 도구 활용"));
        assert!(!prompt.contains(NO_RECOMMENDATIONS_MARKER));
        assert!(prompt.contains("구조화"));
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!(PromptVariant::parse("Revised"), Some(PromptVariant::Revised));
        assert_eq!(PromptVariant::parse("v1"), Some(PromptVariant::Classic));
        assert_eq!(PromptVariant::parse("v3"), None);
    }
}
