//! Stdio host speaking length-prefixed JSON.
//!
//! Each frame is a 4-byte little-endian length followed by that many bytes
//! of UTF-8 JSON. Every request gets exactly one response; failures become
//! an `error` response and the loop keeps going.

use crate::constants::MAX_MESSAGE_SIZE;
use crate::error::AppError;
use crate::models::{Category, ReminderTime, Task, TaskGroup};
use crate::reminders::ReminderService;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    #[serde(rename = "list_categories")]
    ListCategories,
    #[serde(rename = "add_category")]
    AddCategory { name: String },
    #[serde(rename = "rename_category")]
    RenameCategory { id: i64, name: String },
    #[serde(rename = "delete_category")]
    DeleteCategory { id: i64 },
    #[serde(rename = "list_tasks")]
    ListTasks {
        #[serde(rename = "categoryId", default)]
        category_id: Option<i64>,
    },
    #[serde(rename = "list_groups")]
    ListGroups,
    #[serde(rename = "add_task")]
    AddTask {
        name: String,
        #[serde(rename = "categoryId")]
        category_id: i64,
    },
    #[serde(rename = "rename_task")]
    RenameTask { id: i64, name: String },
    #[serde(rename = "set_task_done")]
    SetTaskDone { id: i64, done: bool },
    #[serde(rename = "delete_task")]
    DeleteTask { id: i64 },
    #[serde(rename = "list_reminders")]
    ListReminders,
    #[serde(rename = "add_reminder")]
    AddReminder { hour: u8, minute: u8 },
    #[serde(rename = "toggle_reminder")]
    ToggleReminder { hour: u8, minute: u8, enabled: bool },
    #[serde(rename = "delete_reminder")]
    DeleteReminder { hour: u8, minute: u8 },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "categories")]
    Categories { categories: Vec<Category> },
    #[serde(rename = "category")]
    Category { category: Category },
    #[serde(rename = "tasks")]
    Tasks { tasks: Vec<Task> },
    #[serde(rename = "task")]
    Task { task: Task },
    #[serde(rename = "groups")]
    Groups { groups: Vec<TaskGroup> },
    #[serde(rename = "reminders")]
    Reminders { reminders: Vec<ReminderTime> },
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "error")]
    Error { message: String },
}

impl From<AppError> for OutgoingMessage {
    fn from(e: AppError) -> Self {
        OutgoingMessage::Error { message: e.into() }
    }
}

/// Read one frame. `Ok(None)` means the peer closed the stream between frames.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = usize::try_from(u32::from_le_bytes(len_bytes))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Message too large: {len} bytes (max: {MAX_MESSAGE_SIZE} bytes)"),
        ));
    }

    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(Some(buffer))
}

pub fn write_message<W: Write>(writer: &mut W, message: &OutgoingMessage) -> io::Result<()> {
    let json = serde_json::to_vec(message)?;
    let len = u32::try_from(json.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "response too large"))?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()
}

pub struct Host {
    store: Arc<Store>,
    reminders: Arc<ReminderService>,
}

impl Host {
    pub fn new(store: Arc<Store>, reminders: Arc<ReminderService>) -> Self {
        Self { store, reminders }
    }

    /// Serve requests until `reader` reaches end of stream.
    pub fn run<R: Read, W: Write>(&self, reader: &mut R, writer: &mut W) -> io::Result<()> {
        while let Some(frame) = read_frame(reader)? {
            let response = match serde_json::from_slice::<IncomingMessage>(&frame) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    log::warn!("Rejecting malformed request: {e}");
                    OutgoingMessage::Error { message: format!("malformed request: {e}") }
                }
            };
            write_message(writer, &response)?;
        }
        log::info!("Host input closed");
        Ok(())
    }

    pub fn handle_message(&self, message: IncomingMessage) -> OutgoingMessage {
        log::debug!("Handling {message:?}");
        self.dispatch(message).unwrap_or_else(|e| {
            log::debug!("Request failed: {e}");
            OutgoingMessage::from(e)
        })
    }

    fn dispatch(&self, message: IncomingMessage) -> Result<OutgoingMessage, AppError> {
        let store = &self.store;
        let response = match message {
            IncomingMessage::ListCategories => OutgoingMessage::Categories {
                categories: store.query_all_categories()?,
            },
            IncomingMessage::AddCategory { name } => OutgoingMessage::Category {
                category: store.insert_category(&name).wait()?,
            },
            IncomingMessage::RenameCategory { id, name } => {
                let category = self.category(id)?;
                require(store.rename_category(&category, &name).wait()?, "Category")?
            }
            IncomingMessage::DeleteCategory { id } => {
                let category = self.category(id)?;
                require(store.delete_category(&category).wait()?, "Category")?
            }
            IncomingMessage::ListTasks { category_id } => OutgoingMessage::Tasks {
                tasks: match category_id {
                    Some(id) => store.query_tasks_by_category(id)?,
                    None => store.query_all_tasks()?,
                },
            },
            IncomingMessage::ListGroups => OutgoingMessage::Groups {
                groups: store.query_task_groups()?,
            },
            IncomingMessage::AddTask { name, category_id } => OutgoingMessage::Task {
                task: store.create_task(&name, category_id).wait()?,
            },
            IncomingMessage::RenameTask { id, name } => {
                let task = self.task(id)?;
                require(store.rename_task(&task, &name).wait()?, "Task")?
            }
            IncomingMessage::SetTaskDone { id, done } => {
                let task = self.task(id)?;
                OutgoingMessage::Task { task: store.set_task_done(&task, done).wait()? }
            }
            IncomingMessage::DeleteTask { id } => {
                let task = self.task(id)?;
                require(store.delete_task(&task).wait()?, "Task")?
            }
            IncomingMessage::ListReminders => self.reminder_list(),
            IncomingMessage::AddReminder { hour, minute } => {
                self.reminders.add(hour, minute)?;
                self.reminder_list()
            }
            IncomingMessage::ToggleReminder { hour, minute, enabled } => {
                self.reminders.set_enabled(hour, minute, enabled)?;
                self.reminder_list()
            }
            IncomingMessage::DeleteReminder { hour, minute } => {
                require(self.reminders.remove(hour, minute)?, "Reminder")?;
                self.reminder_list()
            }
        };
        Ok(response)
    }

    fn category(&self, id: i64) -> Result<Category, AppError> {
        self.store
            .find_category(id)?
            .ok_or(AppError::NotFound { entity: "Category" })
    }

    fn task(&self, id: i64) -> Result<Task, AppError> {
        self.store
            .find_task(id)?
            .ok_or(AppError::NotFound { entity: "Task" })
    }

    fn reminder_list(&self) -> OutgoingMessage {
        OutgoingMessage::Reminders { reminders: self.reminders.list() }
    }
}

fn require(found: bool, entity: &'static str) -> Result<OutgoingMessage, AppError> {
    if found {
        Ok(OutgoingMessage::Ok)
    } else {
        Err(AppError::NotFound { entity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmScheduler;
    use crate::clock::Clock;
    use crate::config::NotificationConfig;
    use crate::platform::NotificationPlatform;
    use crate::prefs::ReminderLedger;
    use crate::test_utils::{setup_test_store, RecordingPlatform};
    use serde_json::{json, Value};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn setup() -> (Host, Arc<AlarmScheduler>, TempDir) {
        let (store, clock, dir) = setup_test_store();
        let ledger = Arc::new(ReminderLedger::open(&dir.path().join("prefs.json")));
        let scheduler = Arc::new(AlarmScheduler::new(
            Arc::new(RecordingPlatform::new()) as Arc<dyn NotificationPlatform>,
            clock as Arc<dyn Clock>,
            NotificationConfig::default(),
        ));
        let reminders = Arc::new(ReminderService::new(ledger, Arc::clone(&scheduler)));
        (Host::new(Arc::new(store), reminders), scheduler, dir)
    }

    fn frame(value: &Value) -> Vec<u8> {
        let json = serde_json::to_vec(value).unwrap();
        let mut out = (json.len() as u32).to_le_bytes().to_vec();
        out.extend(json);
        out
    }

    fn decode_all(bytes: &[u8]) -> Vec<Value> {
        let mut cursor = Cursor::new(bytes);
        let mut out = Vec::new();
        while let Some(frame) = read_frame(&mut cursor).unwrap() {
            out.push(serde_json::from_slice(&frame).unwrap());
        }
        out
    }

    /// Send `requests` through a full host session and return the responses.
    fn session(host: &Host, requests: &[Value]) -> Vec<Value> {
        let input: Vec<u8> = requests.iter().flat_map(frame).collect();
        let mut output = Vec::new();
        host.run(&mut Cursor::new(input), &mut output).unwrap();
        decode_all(&output)
    }

    fn call(host: &Host, request: Value) -> Value {
        session(host, &[request]).remove(0)
    }

    #[test]
    fn test_category_and_task_round_trip() {
        let (host, _scheduler, _dir) = setup();

        let created = call(&host, json!({"type": "add_category", "name": "Work"}));
        assert_eq!(created, json!({"type": "category", "category": {"id": 1, "name": "Work"}}));

        let task = call(&host, json!({"type": "add_task", "name": "Write report", "categoryId": 1}));
        assert_eq!(task["type"], "task");
        assert_eq!(task["task"]["isDone"], false);
        assert_eq!(task["task"]["timestampDone"], 0);
        let id = task["task"]["id"].clone();

        let done = call(&host, json!({"type": "set_task_done", "id": id, "done": true}));
        assert_eq!(done["task"]["isDone"], true);
        assert!(done["task"]["timestampDone"].as_i64().unwrap() > 0);

        let tasks = call(&host, json!({"type": "list_tasks", "categoryId": 1}));
        assert_eq!(tasks["tasks"].as_array().unwrap().len(), 1);

        assert_eq!(call(&host, json!({"type": "delete_category", "id": 1})), json!({"type": "ok"}));
        let tasks = call(&host, json!({"type": "list_tasks"}));
        assert_eq!(tasks, json!({"type": "tasks", "tasks": []}));
    }

    #[test]
    fn test_groups() {
        let (host, _scheduler, _dir) = setup();
        session(
            &host,
            &[
                json!({"type": "add_category", "name": "Work"}),
                json!({"type": "add_category", "name": "Home"}),
                json!({"type": "add_task", "name": "dishes", "categoryId": 2}),
            ],
        );

        let groups = call(&host, json!({"type": "list_groups"}));
        let groups = groups["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["category"]["name"], "Work");
        assert!(groups[0]["tasks"].as_array().unwrap().is_empty());
        assert_eq!(groups[1]["tasks"][0]["name"], "dishes");
    }

    #[test]
    fn test_errors_are_responses() {
        let (host, _scheduler, _dir) = setup();
        let responses = session(
            &host,
            &[
                json!({"type": "add_task", "name": "orphan", "categoryId": 42}),
                json!({"type": "rename_task", "id": 7, "name": "x"}),
                json!({"type": "add_category", "name": "  "}),
                json!({"type": "no_such_thing"}),
                json!({"type": "list_categories"}),
            ],
        );

        assert_eq!(responses.len(), 5);
        for response in &responses[..4] {
            assert_eq!(response["type"], "error", "{response}");
        }
        assert_eq!(responses[1]["message"], "Task not found");
        assert_eq!(responses[4], json!({"type": "categories", "categories": []}));
    }

    #[test]
    fn test_reminder_messages() {
        let (host, scheduler, _dir) = setup();

        let seeded = call(&host, json!({"type": "list_reminders"}));
        assert_eq!(seeded["reminders"].as_array().unwrap().len(), 3);

        let added = call(&host, json!({"type": "add_reminder", "hour": 7, "minute": 30}));
        assert_eq!(
            added["reminders"][0],
            json!({"hour": 7, "minute": 30, "isEnabled": true})
        );

        call(&host, json!({"type": "toggle_reminder", "hour": 9, "minute": 0, "enabled": true}));
        let codes: Vec<_> = scheduler.armed().iter().map(|a| a.request_code).collect();
        assert_eq!(codes, vec![450, 540]);

        let removed = call(&host, json!({"type": "delete_reminder", "hour": 7, "minute": 30}));
        assert_eq!(removed["reminders"].as_array().unwrap().len(), 3);
        assert_eq!(scheduler.armed().len(), 1);

        let missing = call(&host, json!({"type": "delete_reminder", "hour": 7, "minute": 30}));
        assert_eq!(missing["type"], "error");
    }

    #[test]
    fn test_oversized_frame_is_fatal() {
        let (host, _scheduler, _dir) = setup();
        let input = ((MAX_MESSAGE_SIZE + 1) as u32).to_le_bytes().to_vec();
        let result = host.run(&mut Cursor::new(input), &mut Vec::new());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_frame_is_error() {
        let mut input = 10u32.to_le_bytes().to_vec();
        input.extend_from_slice(b"{}");
        assert!(read_frame(&mut Cursor::new(input)).is_err());
    }

    #[test]
    fn test_empty_input_ends_cleanly() {
        let (host, _scheduler, _dir) = setup();
        let mut output = Vec::new();
        host.run(&mut Cursor::new(Vec::new()), &mut output).unwrap();
        assert!(output.is_empty());
    }
}
