//! JSON-over-HTTP client for the collaborator services.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use survey_flow_types::{
    Answer, ProgressReport, ProgressService, QuestionId, RespondentIntake, RouteDecision,
    RoutingService, ServiceError, SubmissionId, SubmissionService,
};

const USER_AGENT: &str = concat!("survey-flow/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SubmissionCreated {
    submission_id: SubmissionId,
}

#[derive(Debug, Serialize)]
struct RouteRequest<'a> {
    question_id: &'a QuestionId,
}

/// Talks to the submission, routing and progress services under one base URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client. `timeout` bounds each request at the transport level;
    /// the controller applies its own limits on top.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(ServiceError::backend)?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let message = response.text().await.unwrap_or_default();
        tracing::debug!(%url, %status, %message, "service rejected request");
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(url));
        }
        Err(ServiceError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ServiceError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(ServiceError::backend)
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::backend(err)
    }
}

#[async_trait]
impl SubmissionService for HttpBackend {
    async fn start_submission(
        &self,
        survey_id: &str,
        intake: &RespondentIntake,
    ) -> Result<SubmissionId, ServiceError> {
        let request = self
            .client
            .post(self.url(&format!("surveys/{}/submissions", survey_id)))
            .json(intake);
        let created: SubmissionCreated = self.send_json(request).await?;
        Ok(created.submission_id)
    }

    async fn save_answer(
        &self,
        submission: &SubmissionId,
        answer: &Answer,
    ) -> Result<(), ServiceError> {
        let request = self
            .client
            .post(self.url(&format!("submissions/{}/answers", submission)))
            .json(answer);
        self.send(request).await?;
        Ok(())
    }

    async fn complete_submission(&self, submission: &SubmissionId) -> Result<(), ServiceError> {
        let request = self
            .client
            .post(self.url(&format!("submissions/{}/complete", submission)));
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl RoutingService for HttpBackend {
    async fn resolve_route(
        &self,
        submission: &SubmissionId,
        question: &QuestionId,
    ) -> Result<RouteDecision, ServiceError> {
        let request = self
            .client
            .post(self.url(&format!("submissions/{}/routing", submission)))
            .json(&RouteRequest {
                question_id: question,
            });
        self.send_json(request).await
    }
}

#[async_trait]
impl ProgressService for HttpBackend {
    async fn progress(&self, submission: &SubmissionId) -> Result<ProgressReport, ServiceError> {
        let request = self
            .client
            .get(self.url(&format!("submissions/{}/progress", submission)));
        self.send_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let backend = HttpBackend::with_client(reqwest::Client::new(), "http://localhost:8080/api/");
        assert_eq!(backend.base_url(), "http://localhost:8080/api");
        assert_eq!(
            backend.url("submissions/sub-1/progress"),
            "http://localhost:8080/api/submissions/sub-1/progress"
        );
    }

    #[test]
    fn route_request_body() {
        let question = QuestionId::new("q2");
        let body = serde_json::to_string(&RouteRequest {
            question_id: &question,
        })
        .unwrap();
        assert_eq!(body, r#"{"question_id":"q2"}"#);
    }
}
