/// Fixed option sets offered by the profile form: interests, schedules, school levels and formats.
use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::fmt;

// ───────────────────────────────────────────────────────────────────────────────
// Multi-select options
// ───────────────────────────────────────────────────────────────────────────────

/// An option that can be ticked in a multi-select group.
///
/// Keys are stable snake_case identifiers used on the wire; labels are what the
/// teacher sees and what goes into prompts.
pub trait CatalogOption: EnumSetType + fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn key(&self) -> &'static str;
    fn label(&self) -> &'static str;

    /// Accepts either the key (case/separator insensitive) or the exact label.
    fn lookup(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let norm = normalize(trimmed);
        Self::ALL
            .iter()
            .copied()
            .find(|o| normalize(o.key()) == norm || o.label() == trimmed)
    }
}

fn normalize(s: &str) -> String {
    s.to_ascii_lowercase().replace(['_', '-', ' '], "")
}

/// Iterates a set in catalog order rather than bit order.
pub fn ordered<T: CatalogOption>(set: &EnumSet<T>) -> impl Iterator<Item = T> + '_ {
    T::ALL.iter().copied().filter(move |o| set.contains(*o))
}

/// Joins the labels of a set, or returns `empty` when nothing is selected.
pub fn join_labels<T: CatalogOption>(set: &EnumSet<T>, empty: &str) -> String {
    if set.is_empty() {
        return empty.to_string();
    }
    ordered(set).map(|o| o.label()).collect::<Vec<_>>().join(", ")
}

/// Serde adapter: sets travel as ordered lists of keys.
pub mod option_set {
    use super::CatalogOption;
    use enumset::EnumSet;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(set: &EnumSet<T>, s: S) -> Result<S::Ok, S::Error>
    where
        T: CatalogOption,
        S: Serializer,
    {
        let keys: Vec<&'static str> = super::ordered(set).map(|o| o.key()).collect();
        keys.serialize(s)
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<EnumSet<T>, D::Error>
    where
        T: CatalogOption,
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(d)?;
        let mut out = EnumSet::empty();
        for s in raw {
            let option = T::lookup(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown option: {s}")))?;
            out.insert(option);
        }
        Ok(out)
    }
}

// ───────────────────────────────────────────────────────────────────────────────
// Interests
// ───────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestCategory {
    Instruction,
    DigitalLiteracy,
    StudentGuidance,
    InclusiveEducation,
    TeacherCapacity,
}

impl InterestCategory {
    pub const ALL: [InterestCategory; 5] = [
        InterestCategory::Instruction,
        InterestCategory::DigitalLiteracy,
        InterestCategory::StudentGuidance,
        InterestCategory::InclusiveEducation,
        InterestCategory::TeacherCapacity,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            InterestCategory::Instruction => "교수학습",
            InterestCategory::DigitalLiteracy => "디지털 역량",
            InterestCategory::StudentGuidance => "학생 지도",
            InterestCategory::InclusiveEducation => "포용교육",
            InterestCategory::TeacherCapacity => "교사 역량",
        }
    }

    pub fn interests(&self) -> impl Iterator<Item = Interest> + '_ {
        Interest::ALL.iter().copied().filter(move |i| i.category() == *self)
    }
}

#[derive(EnumSetType, Debug)]
pub enum Interest {
    // 교수학습
    TeachingInnovation,
    CurriculumRedesign,
    LearningAssessment,
    ClassroomManagement,
    BlendedLearning,
    // 디지털 역량
    DigitalLiteracy,
    AiEducation,
    MakerEducation,
    EdtechUse,
    OnlineLessonDesign,
    // 학생 지도
    StudentCounseling,
    ViolencePrevention,
    CareerGuidance,
    LifeGuidance,
    StudentAutonomy,
    // 포용교육
    SpecialEducation,
    MulticulturalEducation,
    EquityGap,
    InclusiveClassroom,
    UnderachieverSupport,
    // 교사 역량
    TeacherLeadership,
    ResearchDesign,
    LearningCommunity,
    TeacherWellbeing,
    TeacherRights,
}

impl Interest {
    pub const fn category(&self) -> InterestCategory {
        use Interest::*;
        match self {
            TeachingInnovation | CurriculumRedesign | LearningAssessment | ClassroomManagement
            | BlendedLearning => InterestCategory::Instruction,
            DigitalLiteracy | AiEducation | MakerEducation | EdtechUse | OnlineLessonDesign => {
                InterestCategory::DigitalLiteracy
            }
            StudentCounseling | ViolencePrevention | CareerGuidance | LifeGuidance
            | StudentAutonomy => InterestCategory::StudentGuidance,
            SpecialEducation | MulticulturalEducation | EquityGap | InclusiveClassroom
            | UnderachieverSupport => InterestCategory::InclusiveEducation,
            TeacherLeadership | ResearchDesign | LearningCommunity | TeacherWellbeing
            | TeacherRights => InterestCategory::TeacherCapacity,
        }
    }
}

impl CatalogOption for Interest {
    const ALL: &'static [Self] = &[
        Interest::TeachingInnovation,
        Interest::CurriculumRedesign,
        Interest::LearningAssessment,
        Interest::ClassroomManagement,
        Interest::BlendedLearning,
        Interest::DigitalLiteracy,
        Interest::AiEducation,
        Interest::MakerEducation,
        Interest::EdtechUse,
        Interest::OnlineLessonDesign,
        Interest::StudentCounseling,
        Interest::ViolencePrevention,
        Interest::CareerGuidance,
        Interest::LifeGuidance,
        Interest::StudentAutonomy,
        Interest::SpecialEducation,
        Interest::MulticulturalEducation,
        Interest::EquityGap,
        Interest::InclusiveClassroom,
        Interest::UnderachieverSupport,
        Interest::TeacherLeadership,
        Interest::ResearchDesign,
        Interest::LearningCommunity,
        Interest::TeacherWellbeing,
        Interest::TeacherRights,
    ];

    fn key(&self) -> &'static str {
        use Interest::*;
        match self {
            TeachingInnovation => "teaching_innovation",
            CurriculumRedesign => "curriculum_redesign",
            LearningAssessment => "learning_assessment",
            ClassroomManagement => "classroom_management",
            BlendedLearning => "blended_learning",
            DigitalLiteracy => "digital_literacy",
            AiEducation => "ai_education",
            MakerEducation => "maker_education",
            EdtechUse => "edtech_use",
            OnlineLessonDesign => "online_lesson_design",
            StudentCounseling => "student_counseling",
            ViolencePrevention => "violence_prevention",
            CareerGuidance => "career_guidance",
            LifeGuidance => "life_guidance",
            StudentAutonomy => "student_autonomy",
            SpecialEducation => "special_education",
            MulticulturalEducation => "multicultural_education",
            EquityGap => "equity_gap",
            InclusiveClassroom => "inclusive_classroom",
            UnderachieverSupport => "underachiever_support",
            TeacherLeadership => "teacher_leadership",
            ResearchDesign => "research_design",
            LearningCommunity => "learning_community",
            TeacherWellbeing => "teacher_wellbeing",
            TeacherRights => "teacher_rights",
        }
    }

    fn label(&self) -> &'static str {
        use Interest::*;
        match self {
            TeachingInnovation => "교수법 혁신",
            CurriculumRedesign => "교육과정 재구성",
            LearningAssessment => "학습 평가",
            ClassroomManagement => "교실 관리",
            BlendedLearning => "블렌디드 러닝",
            DigitalLiteracy => "디지털 리터러시",
            AiEducation => "AI 교육",
            MakerEducation => "메이커 교육",
            EdtechUse => "에듀테크 활용",
            OnlineLessonDesign => "온라인 수업 설계",
            StudentCounseling => "학생 상담",
            ViolencePrevention => "학교폭력 예방",
            CareerGuidance => "진로 지도",
            LifeGuidance => "생활지도",
            StudentAutonomy => "학생 자치",
            SpecialEducation => "특수교육",
            MulticulturalEducation => "다문화 교육",
            EquityGap => "교육격차 해소",
            InclusiveClassroom => "통합교육",
            UnderachieverSupport => "학습 부진아 지도",
            TeacherLeadership => "교사 리더십",
            ResearchDesign => "연구 설계",
            LearningCommunity => "전문적 학습공동체",
            TeacherWellbeing => "교사 복지",
            TeacherRights => "교권 보호",
        }
    }
}

// ───────────────────────────────────────────────────────────────────────────────
// Preferred time slots
// ───────────────────────────────────────────────────────────────────────────────

#[derive(EnumSetType, Debug)]
pub enum TimeSlot {
    WeekdayMorning,
    WeekdayAfternoon,
    WeekdayEvening,
    Weekend,
    IntensiveBreak,
}

impl CatalogOption for TimeSlot {
    const ALL: &'static [Self] = &[
        TimeSlot::WeekdayMorning,
        TimeSlot::WeekdayAfternoon,
        TimeSlot::WeekdayEvening,
        TimeSlot::Weekend,
        TimeSlot::IntensiveBreak,
    ];

    fn key(&self) -> &'static str {
        match self {
            TimeSlot::WeekdayMorning => "weekday-morning",
            TimeSlot::WeekdayAfternoon => "weekday-afternoon",
            TimeSlot::WeekdayEvening => "weekday-evening",
            TimeSlot::Weekend => "weekend",
            TimeSlot::IntensiveBreak => "intensive-break",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TimeSlot::WeekdayMorning => "평일 오전",
            TimeSlot::WeekdayAfternoon => "평일 오후",
            TimeSlot::WeekdayEvening => "평일 저녁",
            TimeSlot::Weekend => "주말",
            TimeSlot::IntensiveBreak => "방학 중 집중 연수",
        }
    }
}

// ───────────────────────────────────────────────────────────────────────────────
// Single-choice options
// ───────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchoolLevel {
    #[default]
    Elementary,
    Middle,
    High,
    Special,
    Other,
}

impl SchoolLevel {
    pub const ALL: [SchoolLevel; 5] = [
        SchoolLevel::Elementary,
        SchoolLevel::Middle,
        SchoolLevel::High,
        SchoolLevel::Special,
        SchoolLevel::Other,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            SchoolLevel::Elementary => "초등학교",
            SchoolLevel::Middle => "중학교",
            SchoolLevel::High => "고등학교",
            SchoolLevel::Special => "특수학교",
            SchoolLevel::Other => "기타",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatPreference {
    #[default]
    Online,
    Offline,
    Hybrid,
    LiveOnline,
    RecordedOnline,
}

impl FormatPreference {
    pub const ALL: [FormatPreference; 5] = [
        FormatPreference::Online,
        FormatPreference::Offline,
        FormatPreference::Hybrid,
        FormatPreference::LiveOnline,
        FormatPreference::RecordedOnline,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            FormatPreference::Online => "온라인",
            FormatPreference::Offline => "오프라인",
            FormatPreference::Hybrid => "혼합형",
            FormatPreference::LiveOnline => "실시간 온라인",
            FormatPreference::RecordedOnline => "녹화 강의 온라인",
        }
    }
}

// ───────────────────────────────────────────────────────────────────────────────
// Catalog listing for clients
// ───────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct OptionEntry {
    pub key: String,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CategoryEntry {
    pub key: InterestCategory,
    pub label: &'static str,
    pub interests: Vec<OptionEntry>,
}

#[derive(Debug, Serialize)]
pub struct CatalogListing {
    pub interest_categories: Vec<CategoryEntry>,
    pub time_slots: Vec<OptionEntry>,
    pub school_levels: Vec<OptionEntry>,
    pub formats: Vec<OptionEntry>,
}

fn entry<T: CatalogOption>(o: T) -> OptionEntry {
    OptionEntry {
        key: o.key().to_string(),
        label: o.label(),
    }
}

fn enum_key<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

impl CatalogListing {
    pub fn build() -> Self {
        Self {
            interest_categories: InterestCategory::ALL
                .iter()
                .map(|c| CategoryEntry {
                    key: *c,
                    label: c.label(),
                    interests: c.interests().map(entry).collect(),
                })
                .collect(),
            time_slots: TimeSlot::ALL.iter().copied().map(entry).collect(),
            school_levels: SchoolLevel::ALL
                .iter()
                .map(|l| OptionEntry {
                    key: enum_key(l),
                    label: l.label(),
                })
                .collect(),
            formats: FormatPreference::ALL
                .iter()
                .map(|f| OptionEntry {
                    key: enum_key(f),
                    label: f.label(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_five_interests() {
        for category in InterestCategory::ALL {
            assert_eq!(category.interests().count(), 5, "{:?}", category);
        }
        assert_eq!(Interest::ALL.len(), 25);
    }

    #[test]
    fn test_lookup_accepts_key_and_label() {
        assert_eq!(Interest::lookup("ai_education"), Some(Interest::AiEducation));
        assert_eq!(Interest::lookup("AI-Education"), Some(Interest::AiEducation));
        assert_eq!(Interest::lookup("AI 교육"), Some(Interest::AiEducation));
        assert_eq!(Interest::lookup("cooking"), None);
        assert_eq!(TimeSlot::lookup("weekend"), Some(TimeSlot::Weekend));
    }

    #[test]
    fn test_join_labels_follows_catalog_order() {
        let set = Interest::TeacherRights | Interest::TeachingInnovation;
        assert_eq!(join_labels(&set, "미선택"), "교수법 혁신, 교권 보호");
        assert_eq!(join_labels(&EnumSet::<Interest>::empty(), "미선택"), "미선택");
    }

    #[test]
    fn test_catalog_listing_uses_wire_keys() {
        let listing = CatalogListing::build();
        assert_eq!(listing.interest_categories.len(), 5);
        assert_eq!(listing.school_levels[0].key, "elementary");
        assert_eq!(listing.formats[3].key, "live-online");
        assert_eq!(listing.time_slots[4].key, "intensive-break");
    }
}
