//! Named tool dispatch over the Bakaláři client.
//!
//! The dispatch table is the surface an external agent sees: each tool is
//! a name, a one-line description, and a mechanical mapping to one client
//! call. Only `get_actual_timetable` does more than pass JSON through; it
//! pipes the payload through the timetable view and returns text.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::bakalari::{ApiError, Client, Timetable};
use crate::timetable::{self, FormatError};

/// One entry in the tool catalog.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// Loosely-typed tool arguments. Tools ignore fields they do not use.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ToolArgs {
    /// Resource id, for tools addressing a single record.
    pub id: Option<String>,

    /// Date in `YYYY-MM-DD` form, for the actual timetable.
    pub date: Option<String>,

    /// JSON body, for tools that post data.
    pub data: Option<Value>,
}

/// Tool invocation result: JSON passthrough or rendered text.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    Text(String),
}

/// Errors from tool dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool {tool} requires argument `{name}`")]
    MissingArgument {
        tool: &'static str,
        name: &'static str,
    },

    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("timetable render failed: {0}")]
    Render(#[from] FormatError),

    #[error("malformed timetable payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The tool catalog, in registration order.
pub const CATALOG: &[ToolSpec] = &[
    ToolSpec {
        name: "get_permanent_timetable",
        description: "Get permanent timetable from Bakalari.",
    },
    ToolSpec {
        name: "get_actual_timetable",
        description: "Get actual timetable from Bakalari.",
    },
    ToolSpec {
        name: "get_events",
        description: "Get events from Bakalari.",
    },
    ToolSpec {
        name: "get_events_my",
        description: "Get my events from Bakalari.",
    },
    ToolSpec {
        name: "get_events_public",
        description: "Get public events from Bakalari.",
    },
    ToolSpec {
        name: "get_homeworks",
        description: "Get homeworks from Bakalari.",
    },
    ToolSpec {
        name: "get_homeworks_count_actual",
        description: "Get count of actual homeworks from Bakalari.",
    },
    ToolSpec {
        name: "get_marks",
        description: "Get marks from Bakalari.",
    },
    ToolSpec {
        name: "get_marks_count_new",
        description: "Get count of new marks from Bakalari.",
    },
    ToolSpec {
        name: "get_marks_final",
        description: "Get final marks from Bakalari.",
    },
    ToolSpec {
        name: "get_marks_measures",
        description: "Get marks measures from Bakalari.",
    },
    ToolSpec {
        name: "post_marks_what_if",
        description: "Post marks what-if calculation to Bakalari.",
    },
    ToolSpec {
        name: "get_payments_classfund",
        description: "Get class fund payments from Bakalari.",
    },
    ToolSpec {
        name: "get_payments_classfund_paymentsinfo",
        description: "Get class fund payments info from Bakalari.",
    },
    ToolSpec {
        name: "get_payments_classfund_summary",
        description: "Get class fund summary from Bakalari.",
    },
    ToolSpec {
        name: "get_subjects",
        description: "Get subjects from Bakalari.",
    },
    ToolSpec {
        name: "get_subjects_themes_id",
        description: "Get subject themes by subject ID from Bakalari.",
    },
    ToolSpec {
        name: "get_substitutions",
        description: "Get substitutions from Bakalari.",
    },
    ToolSpec {
        name: "get_classbook",
        description: "Get class book entries from Bakalari.",
    },
    ToolSpec {
        name: "get_classbook_lesson_tags",
        description: "Get class book lesson tags from Bakalari.",
    },
    ToolSpec {
        name: "get_absence_student",
        description: "Get student absences from Bakalari.",
    },
    ToolSpec {
        name: "get_user",
        description: "Get user from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_attachment_by_id",
        description: "Get komens attachment by ID from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_message_by_id",
        description: "Get komens message by ID from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_message_types",
        description: "Get komens message types from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_messages_noticeboard",
        description: "Get komens noticeboard messages from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_messages_noticeboard_unread",
        description: "Get unread komens noticeboard messages from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_messages_rating",
        description: "Get komens messages rating from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_messages_received",
        description: "Get komens messages received from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_messages_received_id",
        description: "Get komens received message by ID from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_messages_received_unread",
        description: "Get unread komens messages received from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_messages_sent",
        description: "Get komens messages sent from Bakalari.",
    },
    ToolSpec {
        name: "get_komens_messages_sent_id",
        description: "Get komens sent message by ID from Bakalari.",
    },
    ToolSpec {
        name: "post_komens_message",
        description: "Post komens message to Bakalari.",
    },
    ToolSpec {
        name: "post_komens_message_mark_as_read",
        description: "Mark komens message as read in Bakalari.",
    },
    ToolSpec {
        name: "post_komens_message_types_edit",
        description: "Post komens message types edit to Bakalari.",
    },
    ToolSpec {
        name: "post_komens_message_types_reply",
        description: "Post komens message types reply to Bakalari.",
    },
    ToolSpec {
        name: "post_komens_messages_apology",
        description: "Post komens absence apology to Bakalari.",
    },
    ToolSpec {
        name: "post_register_notification",
        description: "Register a push notification channel with Bakalari.",
    },
];

/// Invoke a tool by name.
pub async fn dispatch(
    client: &Client,
    name: &str,
    args: &ToolArgs,
) -> Result<ToolOutput, ToolError> {
    tracing::debug!(tool = name, "dispatching tool call");

    let output = match name {
        "get_permanent_timetable" => ToolOutput::Json(client.timetable_permanent().await?),
        "get_actual_timetable" => ToolOutput::Text(actual_timetable_text(client, args).await?),
        "get_events" => ToolOutput::Json(client.events().await?),
        "get_events_my" => ToolOutput::Json(client.events_my().await?),
        "get_events_public" => ToolOutput::Json(client.events_public().await?),
        "get_homeworks" => ToolOutput::Json(client.homeworks().await?),
        "get_homeworks_count_actual" => ToolOutput::Json(client.homeworks_count_actual().await?),
        "get_marks" => ToolOutput::Json(client.marks().await?),
        "get_marks_count_new" => ToolOutput::Json(client.marks_count_new().await?),
        "get_marks_final" => ToolOutput::Json(client.marks_final().await?),
        "get_marks_measures" => ToolOutput::Json(client.marks_measures().await?),
        "post_marks_what_if" => {
            let data = require_data("post_marks_what_if", args)?;
            ToolOutput::Json(client.marks_what_if(data).await?)
        }
        "get_payments_classfund" => ToolOutput::Json(client.payments_classfund().await?),
        "get_payments_classfund_paymentsinfo" => {
            ToolOutput::Json(client.payments_classfund_info().await?)
        }
        "get_payments_classfund_summary" => {
            ToolOutput::Json(client.payments_classfund_summary().await?)
        }
        "get_subjects" => ToolOutput::Json(client.subjects().await?),
        "get_subjects_themes_id" => {
            let id = require_id("get_subjects_themes_id", args)?;
            ToolOutput::Json(client.subject_themes(id).await?)
        }
        "get_substitutions" => ToolOutput::Json(client.substitutions().await?),
        "get_classbook" => ToolOutput::Json(client.classbook().await?),
        "get_classbook_lesson_tags" => ToolOutput::Json(client.classbook_lesson_tags().await?),
        "get_absence_student" => ToolOutput::Json(client.absence_student().await?),
        "get_user" => ToolOutput::Json(client.user().await?),
        "get_komens_attachment_by_id" => {
            let id = require_id("get_komens_attachment_by_id", args)?;
            let bytes = client.komens_attachment(id).await?;
            ToolOutput::Json(json!({
                "id": id,
                "content_base64": BASE64.encode(&bytes),
            }))
        }
        "get_komens_message_by_id" => {
            let id = require_id("get_komens_message_by_id", args)?;
            ToolOutput::Json(client.komens_message(id).await?)
        }
        "get_komens_message_types" => ToolOutput::Json(client.komens_message_types().await?),
        "get_komens_messages_noticeboard" => ToolOutput::Json(client.komens_noticeboard().await?),
        "get_komens_messages_noticeboard_unread" => {
            ToolOutput::Json(client.komens_noticeboard_unread().await?)
        }
        "get_komens_messages_rating" => ToolOutput::Json(client.komens_rating().await?),
        "get_komens_messages_received" => ToolOutput::Json(client.komens_received().await?),
        "get_komens_messages_received_id" => {
            let id = require_id("get_komens_messages_received_id", args)?;
            ToolOutput::Json(client.komens_received_by_id(id).await?)
        }
        "get_komens_messages_received_unread" => {
            ToolOutput::Json(client.komens_received_unread().await?)
        }
        "get_komens_messages_sent" => ToolOutput::Json(client.komens_sent().await?),
        "get_komens_messages_sent_id" => {
            let id = require_id("get_komens_messages_sent_id", args)?;
            ToolOutput::Json(client.komens_sent_by_id(id).await?)
        }
        "post_komens_message" => {
            let data = require_data("post_komens_message", args)?;
            ToolOutput::Json(client.send_komens_message(data).await?)
        }
        "post_komens_message_mark_as_read" => {
            let id = require_id("post_komens_message_mark_as_read", args)?;
            ToolOutput::Json(client.komens_mark_as_read(id).await?)
        }
        "post_komens_message_types_edit" => {
            let data = require_data("post_komens_message_types_edit", args)?;
            ToolOutput::Json(client.komens_message_types_edit(data).await?)
        }
        "post_komens_message_types_reply" => {
            let data = require_data("post_komens_message_types_reply", args)?;
            ToolOutput::Json(client.komens_message_types_reply(data).await?)
        }
        "post_komens_messages_apology" => {
            let data = require_data("post_komens_messages_apology", args)?;
            ToolOutput::Json(client.komens_apology(data).await?)
        }
        "post_register_notification" => {
            let data = require_data("post_register_notification", args)?;
            ToolOutput::Json(client.register_notification(data).await?)
        }
        other => return Err(ToolError::UnknownTool(other.to_string())),
    };

    Ok(output)
}

/// Fetch, flatten and render the actual timetable, with the current-time
/// trailer the interface promises.
async fn actual_timetable_text(client: &Client, args: &ToolArgs) -> Result<String, ToolError> {
    let date = parse_date(args)?;
    let raw = client.timetable_actual(date).await?;
    let payload: Timetable = serde_json::from_value(raw)?;
    let rows = timetable::flatten(&payload)?;

    Ok(format!(
        "{}\n{}",
        timetable::render_table(&rows),
        timetable::current_time_line()
    ))
}

fn require_id<'a>(tool: &'static str, args: &'a ToolArgs) -> Result<&'a str, ToolError> {
    args.id
        .as_deref()
        .ok_or(ToolError::MissingArgument { tool, name: "id" })
}

fn require_data<'a>(tool: &'static str, args: &'a ToolArgs) -> Result<&'a Value, ToolError> {
    args.data
        .as_ref()
        .ok_or(ToolError::MissingArgument { tool, name: "data" })
}

fn parse_date(args: &ToolArgs) -> Result<Option<NaiveDate>, ToolError> {
    match args.date.as_deref() {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ToolError::InvalidDate(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bakalari::{Credentials, Session};
    use std::collections::HashSet;
    use std::sync::Arc;
    use wiremock::matchers::{any, method, path};
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

    #[test]
    fn catalog_names_are_unique() {
        let mut seen = HashSet::new();
        for spec in CATALOG {
            assert!(seen.insert(spec.name), "duplicate tool name: {}", spec.name);
            assert!(!spec.description.is_empty());
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        let err = dispatch(&client, "get_lunch_menu", &ToolArgs::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "get_lunch_menu"));
    }

    #[tokio::test]
    async fn missing_id_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        let err = dispatch(&client, "get_komens_message_by_id", &ToolArgs::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::MissingArgument { name: "id", .. }
        ));
    }

    #[tokio::test]
    async fn missing_data_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        let err = dispatch(&client, "post_marks_what_if", &ToolArgs::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::MissingArgument { name: "data", .. }
        ));
    }

    #[tokio::test]
    async fn malformed_date_is_rejected() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        let args = ToolArgs {
            date: Some("08/01/2024".to_string()),
            ..ToolArgs::default()
        };
        let err = dispatch(&client, "get_actual_timetable", &args)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidDate(_)));
    }

    #[tokio::test]
    async fn every_catalog_entry_dispatches() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        // Catch-all after the login mock: every resource call succeeds
        // with an empty object, which every tool can digest.
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let args = ToolArgs {
            id: Some("1".to_string()),
            date: Some("2024-01-08".to_string()),
            data: Some(json!({})),
        };

        for spec in CATALOG {
            let result = dispatch(&client, spec.name, &args).await;
            assert!(result.is_ok(), "tool {} failed: {:?}", spec.name, result);
        }
    }

    #[tokio::test]
    async fn actual_timetable_renders_text_with_trailer() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/3/timetable/actual"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Hours": [{"Id": 1, "Caption": "1", "BeginTime": "08:00", "EndTime": "08:45"}],
                "Days": [{
                    "Date": "2024-01-08T00:00:00+01:00",
                    "DayOfWeek": 1,
                    "Atoms": [{
                        "HourId": 1,
                        "GroupIds": ["G1"],
                        "SubjectId": "S1",
                        "TeacherId": "T1",
                        "RoomId": "R1",
                    }],
                }],
                "Groups": [{"Id": "G1", "Name": "1.A"}],
                "Subjects": [{"Id": "S1", "Name": "Math"}],
                "Teachers": [{"Id": "T1", "Name": "J. Novak"}],
                "Rooms": [{"Id": "R1", "Abbrev": "101"}],
            })))
            .mount(&server)
            .await;

        let args = ToolArgs {
            date: Some("2024-01-08".to_string()),
            ..ToolArgs::default()
        };
        let output = dispatch(&client, "get_actual_timetable", &args)
            .await
            .unwrap();

        let ToolOutput::Text(text) = output else {
            panic!("expected text output");
        };
        assert!(text.contains("Date"));
        assert!(text.contains("| 2024-01-08 | Monday |"));
        assert!(text.contains("J. Novak"));
        assert!(text.lines().last().unwrap().starts_with("Current time is "));
    }

    #[tokio::test]
    async fn attachment_bytes_are_base64_wrapped() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/3/komens/attachment/7"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03".to_vec()))
            .mount(&server)
            .await;

        let args = ToolArgs {
            id: Some("7".to_string()),
            ..ToolArgs::default()
        };
        let output = dispatch(&client, "get_komens_attachment_by_id", &args)
            .await
            .unwrap();

        assert_eq!(
            output,
            ToolOutput::Json(json!({
                "id": "7",
                "content_base64": BASE64.encode(b"PK\x03"),
            }))
        );
    }
}
