use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::chat::ChatResponder;
use crate::error::{AdvisorError, Result};
use crate::models::{ChatHistory, ChatMessage, RecommendationSet};
use crate::profile::{Profile, ProfileForm};
use crate::recommend::Recommender;

pub const EMPTY_QUESTION_WARNING: &str = "질문을 입력해주세요.";

/// What happens to the stored recommendations when a new request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationFailurePolicy {
    /// Keep showing the last successful list.
    #[default]
    Preserve,
    /// Drop the list so nothing stale is shown.
    Clear,
}

impl RecommendationFailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve" | "keep" => Some(Self::Preserve),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }
}

/// Lifecycle of a single outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    AwaitingResponse,
    Succeeded,
    Failed,
}

/// Everything one teacher's interaction owns: form values, the current
/// recommendations and the chat log.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    form: ProfileForm,
    recommendations: RecommendationSet,
    chat_history: ChatHistory,
    recommendation_state: RequestState,
    chat_state: RequestState,
    failure_policy: RecommendationFailurePolicy,
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub form: ProfileForm,
    pub profile: Profile,
    pub recommendations: RecommendationSet,
    pub chat_history: ChatHistory,
    pub recommendation_state: RequestState,
    pub chat_state: RequestState,
}

impl Session {
    pub fn new(form: ProfileForm, failure_policy: RecommendationFailurePolicy) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            form,
            recommendations: RecommendationSet::default(),
            chat_history: ChatHistory::default(),
            recommendation_state: RequestState::Idle,
            chat_state: RequestState::Idle,
            failure_policy,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_form(&mut self, form: ProfileForm) {
        self.form = form;
    }

    /// Fresh profile snapshot from the current form values.
    pub fn profile(&self) -> Profile {
        self.form.snapshot()
    }

    pub fn recommendations(&self) -> &RecommendationSet {
        &self.recommendations
    }

    pub fn chat_history(&self) -> &ChatHistory {
        &self.chat_history
    }

    pub fn recommendation_state(&self) -> RequestState {
        self.recommendation_state
    }

    pub fn chat_state(&self) -> RequestState {
        self.chat_state
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            created_at: self.created_at,
            form: self.form.clone(),
            profile: self.profile(),
            recommendations: self.recommendations.clone(),
            chat_history: self.chat_history.clone(),
            recommendation_state: self.recommendation_state,
            chat_state: self.chat_state,
        }
    }

    /// Requests recommendations for the current profile and stores them on success.
    ///
    /// Validation failures leave the session untouched. Service and parse failures
    /// mark the request failed and apply the session's failure policy.
    pub async fn request_recommendations(
        &mut self,
        recommender: &dyn Recommender,
    ) -> Result<RecommendationSet> {
        let profile = self.profile();
        let previous_state = self.recommendation_state;
        let in_flight = InFlight::start(&mut self.recommendation_state, previous_state);

        match recommender.recommend(&profile).await {
            Ok(set) => {
                in_flight.finish(RequestState::Succeeded);
                self.recommendations = set;
                Ok(self.recommendations.clone())
            }
            Err(e) if e.is_request_failure() => {
                in_flight.finish(RequestState::Failed);
                if self.failure_policy == RecommendationFailurePolicy::Clear {
                    self.recommendations = RecommendationSet::default();
                }
                tracing::warn!(session = %self.id, policy = ?self.failure_policy, "Recommendation request failed: {e}");
                Err(e)
            }
            Err(e) => {
                in_flight.finish(previous_state);
                Err(e)
            }
        }
    }

    /// Asks one question. The user's message is logged before the call is made,
    /// the assistant's only when the call succeeds.
    pub async fn ask(
        &mut self,
        responder: &dyn ChatResponder,
        question: &str,
    ) -> Result<ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AdvisorError::validation("question", EMPTY_QUESTION_WARNING));
        }

        let profile = self.profile();
        self.chat_history.push(ChatMessage::user(question));
        let in_flight = InFlight::start(&mut self.chat_state, RequestState::Failed);

        match responder
            .reply(question, &profile, &self.recommendations)
            .await
        {
            Ok(answer) => {
                in_flight.finish(RequestState::Succeeded);
                let message = ChatMessage::assistant(answer);
                self.chat_history.push(message.clone());
                Ok(message)
            }
            Err(e) => {
                in_flight.finish(RequestState::Failed);
                tracing::warn!(session = %self.id, "Chat request failed: {e}");
                Err(e)
            }
        }
    }
}

/// Marks a request state as awaiting a response. If dropped before `finish`,
/// as when a client disconnects mid-request, the state falls back to `on_cancel`.
struct InFlight<'a> {
    state: &'a mut RequestState,
    on_cancel: RequestState,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a mut RequestState, on_cancel: RequestState) -> Self {
        *state = RequestState::AwaitingResponse;
        Self { state, on_cancel }
    }

    fn finish(self, outcome: RequestState) {
        *self.state = outcome;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if *self.state == RequestState::AwaitingResponse {
            tracing::warn!(fallback = ?self.on_cancel, "Request dropped before a response arrived");
            *self.state = self.on_cancel;
        }
    }
}

/// Registry of live sessions. Each session is behind its own lock, held for the
/// whole of any outbound request.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
    failure_policy: RecommendationFailurePolicy,
}

impl SessionStore {
    pub fn new(failure_policy: RecommendationFailurePolicy) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            failure_policy,
        }
    }

    pub async fn create(&self, form: ProfileForm) -> Uuid {
        let session = Session::new(form, self.failure_policy);
        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        tracing::info!(session = %id, "Session started");
        id
    }

    /// Locks a session for exclusive use, failing fast if a request is in flight.
    pub async fn acquire(&self, id: Uuid) -> Result<OwnedMutexGuard<Session>> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AdvisorError::SessionNotFound(id))?;
        session.try_lock_owned().map_err(|_| AdvisorError::SessionBusy)
    }

    /// Ends a session, discarding its history.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        if self.sessions.write().await.remove(&id).is_none() {
            return Err(AdvisorError::SessionNotFound(id));
        }
        tracing::info!(session = %id, "Session ended");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Interest;
    use crate::chat::MockChatResponder;
    use crate::models::{RecommendationItem, Role};
    use crate::recommend::MockRecommender;

    fn course(title: &str) -> RecommendationItem {
        RecommendationItem {
            title: title.to_string(),
            category: "디지털 역량".to_string(),
            target_audience: "-".to_string(),
            format: "온라인".to_string(),
            duration: "4주".to_string(),
            credits: "2학점".to_string(),
            description: "설명".to_string(),
            benefits: "기대효과".to_string(),
            recommendation_reason: "이유".to_string(),
            practical_application: "정보 없음".to_string(),
        }
    }

    fn set_of(titles: &[&str]) -> RecommendationSet {
        RecommendationSet {
            courses: titles.iter().map(|t| course(t)).collect(),
            related_areas: vec![],
        }
    }

    fn ai_form() -> ProfileForm {
        ProfileForm {
            interests: Interest::AiEducation.into(),
            ..Default::default()
        }
    }

    async fn seeded(policy: RecommendationFailurePolicy) -> Session {
        let mut session = Session::new(ai_form(), policy);
        let mut ok = MockRecommender::new();
        ok.expect_recommend()
            .returning(|_| Ok(set_of(&["A", "B", "C"])));
        session
            .request_recommendations(&ok)
            .await
            .expect("seed recommendations");
        session
    }

    #[tokio::test]
    async fn test_success_replaces_recommendations() {
        let session = seeded(RecommendationFailurePolicy::Preserve).await;
        assert_eq!(session.recommendations().courses.len(), 3);
        assert_eq!(session.recommendation_state(), RequestState::Succeeded);
    }

    #[tokio::test]
    async fn test_parse_failure_preserves_list_by_default() {
        let mut session = seeded(RecommendationFailurePolicy::Preserve).await;
        let mut bad = MockRecommender::new();
        bad.expect_recommend()
            .returning(|_| Err(AdvisorError::Parse("not json".to_string())));

        let err = session.request_recommendations(&bad).await.expect_err("parse");
        assert!(matches!(err, AdvisorError::Parse(_)));
        assert_eq!(session.recommendations().courses.len(), 3);
        assert_eq!(session.recommendation_state(), RequestState::Failed);
    }

    #[tokio::test]
    async fn test_parse_failure_clears_list_when_configured() {
        let mut session = seeded(RecommendationFailurePolicy::Clear).await;
        let mut bad = MockRecommender::new();
        bad.expect_recommend()
            .returning(|_| Err(AdvisorError::Parse("not json".to_string())));

        assert!(session.request_recommendations(&bad).await.is_err());
        assert!(session.recommendations().is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_state_and_chat_untouched() {
        let mut session = seeded(RecommendationFailurePolicy::Clear).await;
        session.set_form(ProfileForm::default());
        let mut rec = MockRecommender::new();
        rec.expect_recommend().returning(|profile| {
            assert!(profile.interests.is_empty());
            Err(AdvisorError::validation("interests", "empty"))
        });

        assert!(session.request_recommendations(&rec).await.is_err());
        assert_eq!(session.recommendations().courses.len(), 3);
        assert_eq!(session.recommendation_state(), RequestState::Succeeded);
        assert!(session.chat_history().is_empty());
    }

    #[tokio::test]
    async fn test_ask_appends_user_then_assistant() {
        let mut session = Session::new(ai_form(), RecommendationFailurePolicy::Preserve);
        let mut responder = MockChatResponder::new();
        responder
            .expect_reply()
            .withf(|q, profile, recs| {
                q == "이 연수는 무료인가요?"
                    && profile.interests.contains(Interest::AiEducation)
                    && recs.courses.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok("네, 무료입니다.".to_string()));

        let reply = session
            .ask(&responder, "  이 연수는 무료인가요? ")
            .await
            .expect("reply");
        assert_eq!(reply.role, Role::Assistant);

        let history = session.chat_history().messages();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "이 연수는 무료인가요?");
        assert_eq!(history[1].content, "네, 무료입니다.");
        assert_eq!(session.chat_state(), RequestState::Succeeded);
    }

    #[tokio::test]
    async fn test_failed_ask_keeps_unanswered_question() {
        let mut session = Session::new(ai_form(), RecommendationFailurePolicy::Preserve);
        let mut responder = MockChatResponder::new();
        responder
            .expect_reply()
            .returning(|_, _, _| Err(AdvisorError::Service("HTTP 500".to_string())));

        assert!(session.ask(&responder, "질문").await.is_err());
        let history = session.chat_history().messages();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(session.chat_state(), RequestState::Failed);
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected_without_call() {
        let mut session = Session::new(ai_form(), RecommendationFailurePolicy::Preserve);
        let mut responder = MockChatResponder::new();
        responder.expect_reply().times(0);

        let err = session.ask(&responder, "   ").await.expect_err("blank");
        assert!(matches!(err, AdvisorError::Validation { .. }));
        assert!(session.chat_history().is_empty());
        assert_eq!(session.chat_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn test_store_rejects_second_lock() {
        let store = SessionStore::new(RecommendationFailurePolicy::Preserve);
        let id = store.create(ai_form()).await;

        let guard = store.acquire(id).await.expect("first lock");
        assert!(matches!(store.acquire(id).await, Err(AdvisorError::SessionBusy)));
        drop(guard);
        assert!(store.acquire(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_sessions_are_isolated() {
        let store = SessionStore::new(RecommendationFailurePolicy::Preserve);
        let a = store.create(ai_form()).await;
        let b = store.create(ProfileForm::default()).await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);

        let mut responder = MockChatResponder::new();
        responder
            .expect_reply()
            .returning(|_, _, _| Ok("답변".to_string()));
        {
            let mut session = store.acquire(a).await.expect("lock a");
            session.ask(&responder, "질문").await.expect("ask");
        }
        assert_eq!(store.acquire(b).await.expect("lock b").chat_history().len(), 0);

        store.remove(a).await.expect("remove");
        assert!(matches!(
            store.acquire(a).await,
            Err(AdvisorError::SessionNotFound(_))
        ));
    }

    /// Never answers, standing in for a call whose client went away.
    struct Unanswered;

    #[async_trait::async_trait]
    impl Recommender for Unanswered {
        async fn recommend(&self, _profile: &Profile) -> Result<RecommendationSet> {
            std::future::pending().await
        }
    }

    #[async_trait::async_trait]
    impl ChatResponder for Unanswered {
        async fn reply(
            &self,
            _question: &str,
            _profile: &Profile,
            _recommendations: &RecommendationSet,
        ) -> Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropped_requests_do_not_stay_in_flight() {
        let store = SessionStore::new(RecommendationFailurePolicy::Preserve);
        let id = store.create(ai_form()).await;
        let wait = std::time::Duration::from_millis(20);

        {
            let mut session = store.acquire(id).await.expect("lock");
            let dropped =
                tokio::time::timeout(wait, session.request_recommendations(&Unanswered)).await;
            assert!(dropped.is_err());
            let dropped = tokio::time::timeout(wait, session.ask(&Unanswered, "연수비는?")).await;
            assert!(dropped.is_err());
        }

        let session = store.acquire(id).await.expect("lock released");
        let view = session.view();
        assert_eq!(view.recommendation_state, RequestState::Idle);
        assert_eq!(view.chat_state, RequestState::Failed);
        assert_eq!(view.chat_history.len(), 1);
        assert_eq!(view.chat_history.messages()[0].role, Role::User);
    }
}
