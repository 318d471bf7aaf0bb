use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::wire::{
    self, CompleteSessionBody, CompleteSessionResponse, CoursesResponse, LoginBody, LoginResponse,
    RegisterBody, RepetitionStatsResponse, ResetProgressBody, SentencesResponse, StartSessionBody,
    StartSessionResponse, StatusResponse, UnitsStatusResponse,
};
use crate::api::{
    AccountApi, BatchCompletion, CompleteBatchRequest, Course, LoginGrant, RegisterRequest,
    RepetitionStats, SentenceBatch, SentenceBatchRequest, StudyApi, UnitLock, UnitStatus,
    UnitsOverview, WordBatch, WordBatchRequest,
};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::model::{CourseId, UserId};
use crate::store::ClientStore;

/// Outbound gateway to the study backend.
///
/// Every request carries the bearer token from the client store when one is
/// present, and every failure comes back as an [`ApiError`].
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    store: ClientStore,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig, store: ClientStore) -> Self {
        Self::with_base_url(&config.api_url, config.request_timeout, store)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration, store: ClientStore) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.send(endpoint, self.client.request(Method::GET, url))
            .await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.send(endpoint, self.client.request(Method::POST, url).json(body))
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        let builder = match self.store.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await.map_err(|err| {
            let err = ApiError::from_transport(err);
            warn!(endpoint, error = %err, "API request failed");
            err
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &bytes);
            warn!(endpoint, status = status.as_u16(), error = %err, "API request rejected");
            return Err(err);
        }

        debug!(endpoint, status = status.as_u16(), bytes = bytes.len(), "API request ok");
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::decode(format!("unexpected response from {endpoint}: {err}")))
    }
}

impl StudyApi for HttpGateway {
    async fn start_word_batch(&self, request: &WordBatchRequest) -> ApiResult<WordBatch> {
        let body = StartSessionBody {
            user_id: request.user_id,
            course_id: request.course_id,
            unit_id: request.unit_id,
        };
        let response: StartSessionResponse = self.post("/session/start", &body).await?;

        Ok(WordBatch {
            cards: response
                .items
                .into_iter()
                .map(|item| wire::word_card(&self.base_url, item))
                .collect(),
            current_step: response.current_step,
            active_unit_id: response.active_unit_id,
            unit_progress: response.unit_progress.map(Into::into),
        })
    }

    async fn complete_word_batch(
        &self,
        request: &CompleteBatchRequest,
    ) -> ApiResult<BatchCompletion> {
        let body = CompleteSessionBody {
            user_id: request.user_id,
            course_id: request.course_id,
            completed_word_ids: &request.completed_word_ids,
        };
        let response: CompleteSessionResponse = self.post("/session/complete", &body).await?;

        // The backend reports a rolled-back transaction in a 200 body.
        if response.status.as_deref() == Some("error") {
            let message = response
                .error
                .unwrap_or_else(|| "batch could not be saved".to_string());
            return Err(ApiError::from_status(500, message));
        }

        Ok(BatchCompletion {
            unit_progress: response.unit_progress.map(Into::into),
            daily_new_count: response.daily_new_count,
        })
    }

    async fn start_sentence_batch(
        &self,
        request: &SentenceBatchRequest,
    ) -> ApiResult<SentenceBatch> {
        let endpoint = format!(
            "/practice/sentences?user_id={}&course_id={}&limit={}",
            request.user_id, request.course_id, request.limit
        );
        let response: SentencesResponse = self.get(&endpoint).await?;

        match response.status.as_deref() {
            Some(wire::INSUFFICIENT_VOCABULARY) => Ok(SentenceBatch::InsufficientVocabulary {
                message: response
                    .message
                    .unwrap_or_else(|| "not enough known words to build sentences".to_string()),
            }),
            Some("error") => Err(ApiError::from_status(
                500,
                response
                    .message
                    .unwrap_or_else(|| "sentence practice unavailable".to_string()),
            )),
            _ => Ok(SentenceBatch::Ready(
                response
                    .sentences
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| wire::sentence_card(&self.base_url, index, item))
                    .collect(),
            )),
        }
    }
}

impl AccountApi for HttpGateway {
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginGrant> {
        let response: LoginResponse = self
            .post("/auth/login", &LoginBody { username, password })
            .await?;

        if response.status.as_deref() != Some("success") {
            return Err(ApiError::validation(
                response.message.unwrap_or_else(|| "login failed".to_string()),
            ));
        }

        match (response.user_id, response.access_token) {
            (Some(user_id), Some(access_token)) => Ok(LoginGrant {
                user_id,
                username: response.username.unwrap_or_else(|| username.to_string()),
                account_type: response.account_type,
                access_token,
            }),
            _ => Err(ApiError::decode("login response is missing user id or token")),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<String> {
        let body = RegisterBody {
            username: &request.username,
            password: &request.password,
            account_type: request.account_type.as_str(),
            teacher_id: request.teacher_id.as_deref(),
        };
        let response: StatusResponse = self.post("/auth/register", &body).await?;

        if response.status.as_deref() == Some("success") {
            Ok(response
                .message
                .unwrap_or_else(|| "registration complete".to_string()))
        } else {
            Err(ApiError::validation(
                response
                    .detail
                    .or(response.message)
                    .unwrap_or_else(|| "registration failed".to_string()),
            ))
        }
    }

    async fn reset_progress(&self, course_id: CourseId, password: &str) -> ApiResult<()> {
        let response: StatusResponse = self
            .post("/user/reset-progress", &ResetProgressBody { course_id, password })
            .await?;

        if response.status.as_deref() == Some("success") {
            Ok(())
        } else {
            Err(ApiError::validation(
                response
                    .detail
                    .or(response.message)
                    .unwrap_or_else(|| "progress could not be reset".to_string()),
            ))
        }
    }

    async fn list_courses(&self) -> ApiResult<Vec<Course>> {
        let response: CoursesResponse = self.get("/courses").await?;
        Ok(response
            .courses
            .into_iter()
            .map(|course| Course {
                id: course.id,
                name: course.name,
            })
            .collect())
    }

    async fn units_status(&self, course_id: CourseId, user_id: UserId) -> ApiResult<UnitsOverview> {
        let endpoint = format!("/courses/{course_id}/units/status?user_id={user_id}");
        let response: UnitsStatusResponse = self.get(&endpoint).await?;

        Ok(UnitsOverview {
            units: response
                .units
                .into_iter()
                .map(|unit| {
                    let stats = unit.progress.unwrap_or(wire::WireUnitStats {
                        total: 0,
                        seen_percentage: 0.0,
                    });
                    UnitStatus {
                        unit_id: unit.unit_id,
                        name: unit.name,
                        lock: if unit.status.eq_ignore_ascii_case("LOCKED") {
                            UnitLock::Locked
                        } else {
                            UnitLock::Open
                        },
                        total_words: stats.total,
                        seen_percentage: stats.seen_percentage,
                    }
                })
                .collect(),
            daily_new_count: response.daily_new_count.unwrap_or(0),
        })
    }

    async fn repetition_stats(
        &self,
        course_id: CourseId,
        user_id: UserId,
    ) -> ApiResult<RepetitionStats> {
        let endpoint = format!("/courses/{course_id}/stats/repetition?user_id={user_id}");
        let response: RepetitionStatsResponse = self.get(&endpoint).await?;
        Ok(RepetitionStats {
            new_seen: response.new_seen,
            mid_level: response.mid_level,
            mastered: response.mastered,
        })
    }
}
