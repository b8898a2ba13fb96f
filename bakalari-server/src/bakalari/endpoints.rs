//! Endpoint surface of the Bakaláři v3 API.
//!
//! Each method is a 1:1 mapping from a name to one HTTP request; nothing
//! here transforms or validates the payload beyond JSON decoding. Note
//! that the komens message *lists* are POST on the wire even though they
//! only read data (an upstream contract quirk, not ours to fix).

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use reqwest::Method;
use serde_json::Value;

use super::error::ApiError;
use super::session::Session;

/// Thin endpoint wrappers over an authenticated [`Session`].
#[derive(Clone)]
pub struct Client {
    session: Arc<Session>,
}

impl Client {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// The underlying session, for callers that need a custom request.
    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let response = self
            .session
            .authorized_call(Method::GET, path, &[], None)
            .await?;
        decode(response).await
    }

    async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let response = self
            .session
            .authorized_call(Method::POST, path, &[], body)
            .await?;
        decode(response).await
    }

    /// Permanent (week-cycle) timetable.
    pub async fn timetable_permanent(&self) -> Result<Value, ApiError> {
        self.get("timetable/permanent").await
    }

    /// Actual timetable for the week containing `date`.
    ///
    /// Defaults to the current local date when no date is given, matching
    /// what the mobile app sends.
    pub async fn timetable_actual(&self, date: Option<NaiveDate>) -> Result<Value, ApiError> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let query = [("date", date.format("%Y-%m-%d").to_string())];
        let response = self
            .session
            .authorized_call(Method::GET, "timetable/actual", &query, None)
            .await?;
        decode(response).await
    }

    /// Student absence overview.
    pub async fn absence_student(&self) -> Result<Value, ApiError> {
        self.get("absence/student").await
    }

    pub async fn classbook(&self) -> Result<Value, ApiError> {
        self.get("classbook").await
    }

    pub async fn classbook_lesson_tags(&self) -> Result<Value, ApiError> {
        self.get("classbook/lessonTags").await
    }

    pub async fn events(&self) -> Result<Value, ApiError> {
        self.get("events").await
    }

    pub async fn events_my(&self) -> Result<Value, ApiError> {
        self.get("events/my").await
    }

    pub async fn events_public(&self) -> Result<Value, ApiError> {
        self.get("events/public").await
    }

    pub async fn homeworks(&self) -> Result<Value, ApiError> {
        self.get("homeworks").await
    }

    pub async fn homeworks_count_actual(&self) -> Result<Value, ApiError> {
        self.get("homeworks/count-actual").await
    }

    /// Raw attachment bytes; the one endpoint whose body is not JSON.
    pub async fn komens_attachment(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .session
            .authorized_call(Method::GET, &format!("komens/attachment/{id}"), &[], None)
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn komens_message(&self, id: &str) -> Result<Value, ApiError> {
        self.get(&format!("komens/message/{id}")).await
    }

    pub async fn komens_message_types(&self) -> Result<Value, ApiError> {
        self.get("komens/message-types").await
    }

    pub async fn komens_noticeboard(&self) -> Result<Value, ApiError> {
        self.get("komens/messages/noticeboard").await
    }

    pub async fn komens_noticeboard_unread(&self) -> Result<Value, ApiError> {
        self.get("komens/messages/noticeboard/unread").await
    }

    pub async fn komens_rating(&self) -> Result<Value, ApiError> {
        self.get("komens/messages/rating").await
    }

    /// Received message list (POST on the wire).
    pub async fn komens_received(&self) -> Result<Value, ApiError> {
        self.post("komens/messages/received", None).await
    }

    pub async fn komens_received_by_id(&self, id: &str) -> Result<Value, ApiError> {
        self.get(&format!("komens/messages/received/{id}")).await
    }

    pub async fn komens_received_unread(&self) -> Result<Value, ApiError> {
        self.get("komens/messages/received/unread").await
    }

    /// Sent message list (POST on the wire).
    pub async fn komens_sent(&self) -> Result<Value, ApiError> {
        self.post("komens/messages/sent", None).await
    }

    pub async fn komens_sent_by_id(&self, id: &str) -> Result<Value, ApiError> {
        self.get(&format!("komens/messages/sent/{id}")).await
    }

    pub async fn send_komens_message(&self, data: &Value) -> Result<Value, ApiError> {
        self.post("komens/message", Some(data)).await
    }

    pub async fn komens_mark_as_read(&self, id: &str) -> Result<Value, ApiError> {
        self.post(&format!("komens/message/{id}/mark-as-read"), None)
            .await
    }

    pub async fn komens_message_types_edit(&self, data: &Value) -> Result<Value, ApiError> {
        self.post("komens/message-types/edit", Some(data)).await
    }

    pub async fn komens_message_types_reply(&self, data: &Value) -> Result<Value, ApiError> {
        self.post("komens/message-types/reply", Some(data)).await
    }

    pub async fn komens_apology(&self, data: &Value) -> Result<Value, ApiError> {
        self.post("komens/messages/apology", Some(data)).await
    }

    pub async fn marks(&self) -> Result<Value, ApiError> {
        self.get("marks").await
    }

    pub async fn marks_count_new(&self) -> Result<Value, ApiError> {
        self.get("marks/count-new").await
    }

    pub async fn marks_final(&self) -> Result<Value, ApiError> {
        self.get("marks/final").await
    }

    pub async fn marks_measures(&self) -> Result<Value, ApiError> {
        self.get("marks/measures").await
    }

    pub async fn marks_what_if(&self, data: &Value) -> Result<Value, ApiError> {
        self.post("marks/what-if", Some(data)).await
    }

    pub async fn payments_classfund(&self) -> Result<Value, ApiError> {
        self.get("payments/classfund").await
    }

    pub async fn payments_classfund_info(&self) -> Result<Value, ApiError> {
        self.get("payments/classfund/paymentsinfo").await
    }

    pub async fn payments_classfund_summary(&self) -> Result<Value, ApiError> {
        self.get("payments/classfund/summary").await
    }

    pub async fn register_notification(&self, data: &Value) -> Result<Value, ApiError> {
        self.post("register-notification", Some(data)).await
    }

    pub async fn subjects(&self) -> Result<Value, ApiError> {
        self.get("subjects").await
    }

    pub async fn subject_themes(&self, id: &str) -> Result<Value, ApiError> {
        self.get(&format!("subjects/themes/{id}")).await
    }

    pub async fn substitutions(&self) -> Result<Value, ApiError> {
        self.get("substitutions").await
    }

    pub async fn user(&self) -> Result<Value, ApiError> {
        self.get("user").await
    }
}

/// Decode a JSON response body, keeping a snippet for diagnostics.
async fn decode(response: reqwest::Response) -> Result<Value, ApiError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(500).collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bakalari::Credentials;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> Client {
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-1",
                "refresh_token": "ref-1",
            })))
            .mount(server)
            .await;

        let session = Session::open(Credentials::new("student", "hunter2", server.uri()))
            .await
            .unwrap();
        Client::new(Arc::new(session))
    }

    #[tokio::test]
    async fn received_message_list_is_posted() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/3/komens/messages/received"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Messages": []})))
            .expect(1)
            .mount(&server)
            .await;

        let body = client.komens_received().await.unwrap();
        assert_eq!(body, json!({"Messages": []}));
    }

    #[tokio::test]
    async fn actual_timetable_sends_explicit_date() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/3/timetable/actual"))
            .and(query_param("date", "2024-01-08"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Days": []})))
            .expect(1)
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        client.timetable_actual(Some(date)).await.unwrap();
    }

    #[tokio::test]
    async fn actual_timetable_defaults_to_today() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        Mock::given(method("GET"))
            .and(path("/api/3/timetable/actual"))
            .and(query_param("date", today.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Days": []})))
            .expect(1)
            .mount(&server)
            .await;

        client.timetable_actual(None).await.unwrap();
    }

    #[tokio::test]
    async fn path_parameters_are_interpolated() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/3/subjects/themes/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Themes": []})))
            .expect(1)
            .mount(&server)
            .await;

        client.subject_themes("42").await.unwrap();
    }

    #[tokio::test]
    async fn attachment_returns_raw_bytes() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/3/komens/attachment/7"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x50, 0x4b, 0x03]))
            .mount(&server)
            .await;

        let bytes = client.komens_attachment("7").await.unwrap();
        assert_eq!(bytes, vec![0x50, 0x4b, 0x03]);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_json_error() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/3/marks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client.marks().await.unwrap_err();
        match err {
            ApiError::Json { body, .. } => {
                assert!(body.unwrap().contains("maintenance"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
