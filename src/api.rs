//! Access to the hosted backend.
//!
//! The backend exposes PostgREST-style tables (`tasks`, `lists`). Rows are
//! decoded into [`TaskRow`] / [`ListRow`] here and converted to entities
//! before leaving this module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GatewayError;
use crate::models::{
    ListColor, ListIcon, ListPatch, Priority, Status, Task, TaskList, TaskPatch,
};

/// Everything the application needs from the backend.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, GatewayError>;
    async fn fetch_lists(&self) -> Result<Vec<TaskList>, GatewayError>;

    async fn create_task(&self, patch: &TaskPatch) -> Result<(), GatewayError>;
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), GatewayError>;
    async fn set_task_status(&self, id: &str, status: Status) -> Result<(), GatewayError>;
    async fn delete_task(&self, id: &str) -> Result<(), GatewayError>;

    async fn create_list(&self, patch: &ListPatch) -> Result<(), GatewayError>;
    async fn update_list(&self, id: &str, patch: &ListPatch) -> Result<(), GatewayError>;
    /// Unassigns every task in the list, then deletes the list itself.
    async fn delete_list(&self, id: &str) -> Result<(), GatewayError>;
}

// Task row as stored by the backend
#[derive(Deserialize, Debug)]
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    // A null here must not sink the whole batch
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    status: Option<Status>,
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    list_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description.filter(|d| !d.is_empty()),
            priority: self.priority.unwrap_or(Priority::Other),
            status: self.status.unwrap_or(Status::Other),
            due_date: self.due_date,
            tags: self.tags.unwrap_or_default(),
            list_id: self.list_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Deserialize, Debug)]
struct ListRow {
    id: String,
    name: String,
    color: Option<String>,
    icon: Option<String>,
    created_at: DateTime<Utc>,
}

impl ListRow {
    fn into_list(self) -> TaskList {
        TaskList {
            id: self.id,
            name: self.name,
            color: ListColor::from_name(self.color.as_deref().unwrap_or_default()),
            icon: ListIcon::from_name(self.icon.as_deref().unwrap_or_default()),
            created_at: self.created_at,
        }
    }
}

/// Unrecognized priority or status values are left out so the stored value
/// survives an edit of the other fields.
fn task_body(patch: &TaskPatch) -> Value {
    let mut body = json!({
        "title": patch.title,
        "description": patch.description,
        "due_date": patch.due_date.map(|d| d.to_rfc3339()),
        "list_id": patch.list_id,
        "tags": patch.tags,
    });
    if patch.priority != Priority::Other {
        body["priority"] = json!(patch.priority);
    }
    if patch.status != Status::Other {
        body["status"] = json!(patch.status);
    }
    body
}

fn list_body(patch: &ListPatch) -> Value {
    json!({
        "name": patch.name,
        "color": patch.color,
        "icon": patch.icon,
    })
}

pub fn decode_tasks(body: &str) -> Result<Vec<Task>, GatewayError> {
    let rows: Vec<TaskRow> = serde_json::from_str(body)?;
    Ok(rows.into_iter().map(TaskRow::into_task).collect())
}

pub fn decode_lists(body: &str) -> Result<Vec<TaskList>, GatewayError> {
    let rows: Vec<ListRow> = serde_json::from_str(body)?;
    Ok(rows.into_iter().map(ListRow::into_list).collect())
}

/// PostgREST client scoped to one user.
pub struct RestGateway {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: String,
    user_id: String,
}

impl RestGateway {
    pub fn new(config: &Config) -> RestGateway {
        RestGateway {
            client: Client::new(),
            base_url: config.backend_url.clone(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            user_id: config.user_id.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.access_token))
    }

    async fn send(&self, what: &str, request: RequestBuilder) -> Result<Response, GatewayError> {
        debug!(operation = what, "backend request");
        let res = self.authorized(request).send().await?;

        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status().as_u16();
            let message = res.text().await?;
            warn!(operation = what, status, %message, "backend rejected request");
            Err(GatewayError::Status { status, message })
        }
    }
}

#[async_trait]
impl Gateway for RestGateway {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        let request = self.client.get(self.table_url("tasks")).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", self.user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        let body = self.send("fetch_tasks", request).await?.text().await?;
        decode_tasks(&body)
    }

    async fn fetch_lists(&self) -> Result<Vec<TaskList>, GatewayError> {
        let request = self.client.get(self.table_url("lists")).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", self.user_id)),
            ("order", "created_at.asc".to_string()),
        ]);
        let body = self.send("fetch_lists", request).await?.text().await?;
        decode_lists(&body)
    }

    async fn create_task(&self, patch: &TaskPatch) -> Result<(), GatewayError> {
        let mut body = task_body(patch);
        body["user_id"] = json!(self.user_id);
        let request = self.client.post(self.table_url("tasks")).json(&body);
        self.send("create_task", request).await?;
        Ok(())
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), GatewayError> {
        let request = self
            .client
            .patch(self.table_url("tasks"))
            .query(&[("id", format!("eq.{}", id))])
            .json(&task_body(patch));
        self.send("update_task", request).await?;
        Ok(())
    }

    async fn set_task_status(&self, id: &str, status: Status) -> Result<(), GatewayError> {
        let request = self
            .client
            .patch(self.table_url("tasks"))
            .query(&[("id", format!("eq.{}", id))])
            .json(&json!({
                "status": status,
                "completed": status == Status::Done,
            }));
        self.send("set_task_status", request).await?;
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<(), GatewayError> {
        let request = self
            .client
            .delete(self.table_url("tasks"))
            .query(&[("id", format!("eq.{}", id))]);
        self.send("delete_task", request).await?;
        Ok(())
    }

    async fn create_list(&self, patch: &ListPatch) -> Result<(), GatewayError> {
        let mut body = list_body(patch);
        body["user_id"] = json!(self.user_id);
        let request = self.client.post(self.table_url("lists")).json(&body);
        self.send("create_list", request).await?;
        Ok(())
    }

    async fn update_list(&self, id: &str, patch: &ListPatch) -> Result<(), GatewayError> {
        let request = self
            .client
            .patch(self.table_url("lists"))
            .query(&[("id", format!("eq.{}", id))])
            .json(&list_body(patch));
        self.send("update_list", request).await?;
        Ok(())
    }

    async fn delete_list(&self, id: &str) -> Result<(), GatewayError> {
        let unassign = self
            .client
            .patch(self.table_url("tasks"))
            .query(&[("list_id", format!("eq.{}", id))])
            .json(&json!({ "list_id": null }));
        self.send("unassign_list_tasks", unassign).await?;

        let request = self
            .client
            .delete(self.table_url("lists"))
            .query(&[("id", format!("eq.{}", id))]);
        self.send("delete_list", request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_task_rows() {
        let body = r#"[
            {
                "id": "7f1c",
                "user_id": "u-1",
                "title": "Report",
                "description": "",
                "priority": "high",
                "status": "in-progress",
                "completed": false,
                "due_date": "2024-05-14T03:00:00+00:00",
                "list_id": null,
                "created_at": "2024-05-01T10:00:00+00:00",
                "updated_at": "2024-05-02T10:00:00+00:00"
            },
            {
                "id": "8a2d",
                "title": "Odd",
                "description": "kept",
                "priority": "urgent",
                "status": "archived",
                "due_date": null,
                "tags": ["ops"],
                "list_id": "l-1",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z"
            }
        ]"#;
        let tasks = decode_tasks(body).unwrap();
        assert_eq!(tasks.len(), 2);

        assert_eq!(tasks[0].description, None);
        assert_eq!(tasks[0].status, Status::InProgress);
        assert_eq!(tasks[0].priority, Priority::High);
        assert!(tasks[0].tags.is_empty());
        assert_eq!(tasks[0].list_id, None);
        assert_eq!(
            tasks[0].due_date.unwrap().to_rfc3339(),
            "2024-05-14T03:00:00+00:00"
        );

        assert_eq!(tasks[1].priority, Priority::Other);
        assert_eq!(tasks[1].status, Status::Other);
        assert_eq!(tasks[1].tags, vec!["ops".to_string()]);
        assert_eq!(tasks[1].list_id.as_deref(), Some("l-1"));
        assert_eq!(tasks[1].description.as_deref(), Some("kept"));
    }

    #[test]
    fn test_decode_list_rows_with_unknown_display_tags() {
        let body = r#"[
            {"id": "l-1", "name": "Work", "color": "green", "icon": "briefcase", "created_at": "2024-05-01T10:00:00Z"},
            {"id": "l-2", "name": "Misc", "color": "teal", "icon": null, "created_at": "2024-05-02T10:00:00Z"}
        ]"#;
        let lists = decode_lists(body).unwrap();
        assert_eq!(lists[0].color, ListColor::Green);
        assert_eq!(lists[0].icon, ListIcon::Briefcase);
        assert_eq!(lists[1].color, ListColor::Blue);
        assert_eq!(lists[1].icon, ListIcon::Circle);
    }

    #[test]
    fn test_decode_rejects_non_array() {
        let err = decode_tasks(r#"{"message": "JWT expired"}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn test_task_body_uses_wire_names() {
        let patch = TaskPatch {
            id: None,
            title: "Email".to_string(),
            description: None,
            priority: Priority::Low,
            status: Status::InProgress,
            due_date: None,
            list_id: Some("l-1".to_string()),
            tags: vec!["home".to_string()],
        };
        let body = task_body(&patch);
        assert_eq!(body["priority"], "low");
        assert_eq!(body["status"], "in-progress");
        assert_eq!(body["due_date"], Value::Null);
        assert_eq!(body["list_id"], "l-1");
        assert_eq!(body["tags"], json!(["home"]));
    }

    #[test]
    fn test_null_enums_degrade_per_row() {
        let body = r#"[
            {"id": "1", "title": "Broken", "description": null, "priority": null, "status": null,
             "due_date": null, "list_id": null,
             "created_at": "2024-05-01T10:00:00Z", "updated_at": "2024-05-01T10:00:00Z"},
            {"id": "2", "title": "Fine", "description": null, "priority": "low", "status": "todo",
             "due_date": null, "list_id": null,
             "created_at": "2024-05-01T10:00:00Z", "updated_at": "2024-05-01T10:00:00Z"}
        ]"#;
        let tasks = decode_tasks(body).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].priority, Priority::Other);
        assert_eq!(tasks[0].status, Status::Other);
        assert_eq!(tasks[1].priority, Priority::Low);
        assert_eq!(tasks[1].status, Status::Todo);
    }

    #[test]
    fn test_editing_unknown_enums_leaves_them_untouched() {
        let body = r#"[{
            "id": "8a2d", "title": "Odd", "description": null,
            "priority": "urgent", "status": "archived",
            "due_date": null, "list_id": null,
            "created_at": "2024-05-01T10:00:00Z", "updated_at": "2024-05-01T10:00:00Z"
        }]"#;
        let tasks = decode_tasks(body).unwrap();
        let mut form = crate::forms::TaskForm::edit(&tasks[0], &[]);
        form.description = "new notes".to_string();
        let patch = form.submit().unwrap();

        let body = task_body(&patch);
        assert_eq!(body["description"], "new notes");
        assert!(body.get("priority").is_none());
        assert!(body.get("status").is_none());
    }

    #[test]
    fn test_list_body() {
        let patch = ListPatch {
            id: None,
            name: "Lab".to_string(),
            color: ListColor::Purple,
            icon: ListIcon::Flask,
        };
        assert_eq!(
            list_body(&patch),
            json!({"name": "Lab", "color": "purple", "icon": "flask"})
        );
    }
}
