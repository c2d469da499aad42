//! Shared, queued access to one session.

use std::sync::Arc;

use survey_flow_types::{Answer, AnswerValue, Answers, FlowBackend, Question, RespondentIntake};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::controller::{AnswerReceipt, FlowController, FlowState, Navigation};
use crate::progress::Progress;
use crate::FlowError;

/// Shareable handle to one session.
///
/// Operations queue on an async mutex in arrival order, so a navigation
/// request waits for the one in flight to settle. `abandon` does not wait: it
/// cancels any pending service call, whose result is then discarded.
pub struct SessionHandle<B: FlowBackend + ?Sized> {
    inner: Arc<Mutex<FlowController<B>>>,
    cancel: CancellationToken,
}

impl<B: FlowBackend + ?Sized> Clone for SessionHandle<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: self.cancel.clone(),
        }
    }
}

impl<B: FlowBackend + ?Sized> SessionHandle<B> {
    pub fn new(controller: FlowController<B>) -> Self {
        let cancel = controller.cancellation_token();
        Self {
            inner: Arc::new(Mutex::new(controller)),
            cancel,
        }
    }

    pub async fn is_abandoned(&self) -> bool {
        self.state().await == FlowState::Abandoned
    }

    /// Abandon the session without waiting for a pending call.
    ///
    /// Has no effect on a completed session.
    pub fn abandon(&self) {
        self.cancel.cancel();
    }

    pub async fn state(&self) -> FlowState {
        self.inner.lock().await.state()
    }

    pub async fn progress(&self) -> Progress {
        self.inner.lock().await.progress()
    }

    pub async fn current_question(&self) -> Option<Question> {
        self.inner.lock().await.current_question().cloned()
    }

    pub async fn current_answer(&self) -> Option<AnswerValue> {
        self.inner.lock().await.current_answer().cloned()
    }

    pub async fn answers(&self) -> Option<Answers> {
        self.inner.lock().await.answers().cloned()
    }

    pub async fn start_survey(&self, intake: RespondentIntake) -> Result<Progress, FlowError> {
        self.inner.lock().await.start_survey(intake).await
    }

    pub async fn submit_answer(&self, answer: Answer) -> Result<AnswerReceipt, FlowError> {
        self.inner.lock().await.submit_answer(answer).await
    }

    pub async fn advance(&self) -> Result<Navigation, FlowError> {
        self.inner.lock().await.advance().await
    }

    pub async fn retreat(&self) -> Result<Navigation, FlowError> {
        self.inner.lock().await.retreat()
    }

    pub async fn respond(&self, answer: Answer) -> Result<Navigation, FlowError> {
        self.inner.lock().await.respond(answer).await
    }
}
