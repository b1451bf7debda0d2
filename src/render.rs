/// Card rendering for recommendation results and chat logs (markdown and terminal).
use colored::*;
use std::fmt::Write as _;

use crate::models::{ChatHistory, RecommendationSet, Role};

pub const ASSISTANT_NAME: &str = "연수 도우미";

/// Markdown report: one card per course, related areas, then the chat log.
pub fn markdown_report(set: &RecommendationSet, history: &ChatHistory) -> String {
    let mut out = String::from("# 맞춤형 연수 추천 결과\n\n");

    if set.courses.is_empty() {
        out.push_str("_아직 추천된 연수가 없습니다._\n");
    }
    for (i, c) in set.courses.iter().enumerate() {
        let _ = writeln!(out, "### {}. {}\n", i + 1, c.title);
        let _ = writeln!(
            out,
            "**카테고리:** {} | **형태:** {} | **이수학점:** {}\n",
            c.category, c.format, c.credits
        );
        let _ = writeln!(out, "**대상:** {}\n", c.target_audience);
        let _ = writeln!(out, "**기간:** {}\n", c.duration);
        let _ = writeln!(out, "**내용:** {}\n", c.description);
        let _ = writeln!(out, "> 기대효과: {}\n", c.benefits);
        let _ = writeln!(out, "**추천 이유:** {}\n", c.recommendation_reason);
        let _ = writeln!(out, "**현장 적용 방안:** {}\n", c.practical_application);
    }

    if !set.related_areas.is_empty() {
        out.push_str("## 추가 관심 분야 추천\n\n");
        for r in &set.related_areas {
            let _ = writeln!(out, "### {}\n", r.area);
            let _ = writeln!(out, "**선택한 분야와의 관련성:** {}\n", r.relevance);
            let _ = writeln!(out, "**학습 시 장점:** {}\n", r.benefits);
        }
    }

    if !history.is_empty() {
        out.push_str("## 연수 상담\n\n");
        for m in history.messages() {
            let speaker = match m.role {
                Role::User => "나",
                Role::Assistant => ASSISTANT_NAME,
            };
            let _ = writeln!(out, "**{speaker}:** {}\n", m.content);
        }
    }
    out
}

/// Coloured cards for a terminal.
pub fn terminal_cards(set: &RecommendationSet) -> String {
    let mut out = String::new();
    let rule = "─".repeat(60);

    for (i, c) in set.courses.iter().enumerate() {
        let _ = writeln!(out, "{}", rule.bright_black());
        let _ = writeln!(out, "{}", format!("{}. {}", i + 1, c.title).bold().bright_blue());
        let _ = writeln!(
            out,
            "{} {}  {} {}  {} {}",
            "카테고리:".bold(),
            c.category,
            "형태:".bold(),
            c.format,
            "이수학점:".bold(),
            c.credits
        );
        let _ = writeln!(out, "{} {}", "대상:".bold(), c.target_audience);
        let _ = writeln!(out, "{} {}", "기간:".bold(), c.duration);
        let _ = writeln!(out, "{} {}", "내용:".bold(), c.description);
        let _ = writeln!(out, "{}", format!("기대효과: {}", c.benefits).cyan());
        let _ = writeln!(out, "{} {}", "추천 이유:".bold(), c.recommendation_reason);
        let _ = writeln!(out, "{} {}", "현장 적용:".bold(), c.practical_application);
    }

    if !set.related_areas.is_empty() {
        let _ = writeln!(out, "{}", rule.bright_black());
        let _ = writeln!(out, "{}", "추가 관심 분야 추천".bold().green());
        for r in &set.related_areas {
            let _ = writeln!(out, "  {} {}", "•".green(), r.area.bold());
            let _ = writeln!(out, "    관련성: {}", r.relevance);
            let _ = writeln!(out, "    장점: {}", r.benefits);
        }
    }
    out
}

pub fn terminal_chat_line(role: Role, content: &str) -> String {
    match role {
        Role::User => format!("{} {}", "나:".bold().yellow(), content),
        Role::Assistant => format!("{} {}", format!("{ASSISTANT_NAME}:").bold().green(), content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, RecommendationItem, RelatedArea};

    fn sample() -> RecommendationSet {
        RecommendationSet {
            courses: vec![RecommendationItem {
                title: "AI 융합교육 기초".to_string(),
                category: "디지털 역량".to_string(),
                target_audience: "초등 교사".to_string(),
                format: "온라인".to_string(),
                duration: "4주".to_string(),
                credits: "2학점".to_string(),
                description: "생성형 AI 활용".to_string(),
                benefits: "수업 설계 역량".to_string(),
                recommendation_reason: "AI 교육 관심".to_string(),
                practical_application: "정보 없음".to_string(),
            }],
            related_areas: vec![RelatedArea {
                area: "에듀테크 활용".to_string(),
                relevance: "AI 도구".to_string(),
                benefits: "효율".to_string(),
            }],
        }
    }

    #[test]
    fn test_markdown_report_lists_cards_and_chat() {
        let mut history = ChatHistory::default();
        history.push(ChatMessage::user("무료인가요?"));
        history.push(ChatMessage::assistant("네."));

        let md = markdown_report(&sample(), &history);
        assert!(md.contains("### 1. AI 융합교육 기초"));
        assert!(md.contains("**이수학점:** 2학점"));
        assert!(md.contains("## 추가 관심 분야 추천"));
        assert!(md.contains("**나:** 무료인가요?"));
        assert!(md.contains("**연수 도우미:** 네."));
    }

    #[test]
    fn test_markdown_report_without_recommendations() {
        let md = markdown_report(&RecommendationSet::default(), &ChatHistory::default());
        assert!(md.contains("아직 추천된 연수가 없습니다"));
        assert!(!md.contains("연수 상담"));
    }

    #[test]
    fn test_terminal_cards_without_colour() {
        colored::control::set_override(false);
        let text = terminal_cards(&sample());
        assert!(text.contains("1. AI 융합교육 기초"));
        assert!(text.contains("기대효과: 수업 설계 역량"));
        assert!(text.contains("• 에듀테크 활용"));
        assert_eq!(terminal_chat_line(Role::User, "q"), "나: q");
    }
}
