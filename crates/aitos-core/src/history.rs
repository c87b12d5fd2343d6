//! Conversation history
//!
//! Two persisted logs share the same record type: the quick-access command
//! history shown in the history panel (50 entries) and the full conversation
//! log (100 entries). Both evict the oldest entry once full.

use crate::bounded::BoundedLog;
use crate::ids::next_id;
use crate::storage::{self, KeyValueStore, COMMAND_HISTORY_KEY, CONVERSATION_LOG_KEY};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;

pub const COMMAND_HISTORY_CAPACITY: usize = 50;
pub const CONVERSATION_LOG_CAPACITY: usize = 100;

/// One prompt/response exchange with the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub id: String,
    pub command: String,
    pub response: String,
    /// Written as epoch millis. Conversation entries from older writers
    /// carry an RFC 3339 `created_at` instead, which is read here too.
    #[serde(with = "flexible_timestamp", alias = "created_at")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Free-form context attached by other writers; kept as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl CommandResponse {
    pub fn new(command: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: next_id().to_string(),
            command: command.into(),
            response: response.into(),
            timestamp: Utc::now(),
            module_type: None,
            channel: None,
            user_id: None,
            context: None,
        }
    }

    pub fn with_module(mut self, module_type: impl Into<String>) -> Self {
        self.module_type = Some(module_type.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

mod flexible_timestamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Rfc3339(String),
    }

    pub fn serialize<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        chrono::serde::ts_milliseconds::serialize(timestamp, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}"))),
            Raw::Rfc3339(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(de::Error::custom),
        }
    }
}

/// A persisted, capacity-bounded log of command responses, newest first
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    log: BoundedLog<CommandResponse>,
}

impl HistoryLog {
    pub fn open(store: Arc<dyn KeyValueStore>, key: &'static str, capacity: usize) -> Self {
        let entries = storage::load_list(store.as_ref(), key);
        Self {
            store,
            key,
            log: BoundedLog::from_newest_first(entries, capacity),
        }
    }

    /// The quick-access history behind the history panel
    pub fn command_history(store: Arc<dyn KeyValueStore>) -> Self {
        Self::open(store, COMMAND_HISTORY_KEY, COMMAND_HISTORY_CAPACITY)
    }

    /// The longer conversation log
    pub fn conversation_log(store: Arc<dyn KeyValueStore>) -> Self {
        Self::open(store, CONVERSATION_LOG_KEY, CONVERSATION_LOG_CAPACITY)
    }

    /// Prepend an entry to whatever is currently persisted, then truncate and write back.
    ///
    /// The persisted list is re-read first, so entries written by another
    /// writer since this log was opened are kept (last write wins per key).
    pub fn record(&mut self, entry: CommandResponse) {
        let persisted = storage::load_list(self.store.as_ref(), self.key);
        let mut log = BoundedLog::from_newest_first(persisted, self.log.capacity());
        if let Some(evicted) = log.push(entry) {
            tracing::debug!(key = self.key, evicted = %evicted.id, "history full, evicted oldest entry");
        }

        if let Err(e) = storage::write_list(self.store.as_ref(), self.key, &log.to_vec()) {
            tracing::error!(key = self.key, error = %e, "failed to persist history");
        }
        self.log = log;
    }

    /// Reload from storage and return every entry, newest first
    pub fn load_all(&mut self) -> Vec<CommandResponse> {
        let entries = storage::load_list(self.store.as_ref(), self.key);
        self.log = BoundedLog::from_newest_first(entries, self.log.capacity());
        self.log.to_vec()
    }

    /// Delete the persisted key and forget everything in memory
    pub fn clear(&mut self) {
        if let Err(e) = self.store.remove(self.key) {
            tracing::error!(key = self.key, error = %e, "failed to clear history");
        }
        self.log.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommandResponse> {
        self.log.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CommandResponse> {
        self.log.get(index)
    }

    pub fn latest(&self) -> Option<&CommandResponse> {
        self.log.newest()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.log.capacity()
    }
}

/// Short timestamp for the history panel: time only within the last day,
/// otherwise month, day and time
pub fn format_timestamp<Tz>(timestamp: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = timestamp.with_timezone(tz);
    if now.signed_duration_since(timestamp) < chrono::Duration::hours(24) {
        local.format("%I:%M %p").to_string()
    } else {
        local.format("%b %-d, %I:%M %p").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn entry(n: usize) -> CommandResponse {
        CommandResponse::new(format!("command {n}"), format!("response {n}"))
    }

    #[test]
    fn test_record_prepends_and_persists() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut log = HistoryLog::command_history(store.clone());
        log.record(entry(1));
        log.record(entry(2));

        assert_eq!(log.latest().unwrap().command, "command 2");

        let reopened = HistoryLog::command_history(store);
        let commands: Vec<_> = reopened.entries().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, vec!["command 2", "command 1"]);
    }

    #[test]
    fn test_record_51_keeps_newest_50() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut log = HistoryLog::command_history(store.clone());
        for n in 1..=51 {
            log.record(entry(n));
        }

        let all = HistoryLog::command_history(store).load_all();
        assert_eq!(all.len(), 50);
        assert_eq!(all.first().unwrap().command, "command 51");
        assert_eq!(all.last().unwrap().command, "command 2");
        let expected: Vec<String> = (2..=51).rev().map(|n| format!("command {n}")).collect();
        let actual: Vec<String> = all.into_iter().map(|e| e.command).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_conversation_log_capacity_is_100() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut log = HistoryLog::conversation_log(store);
        for n in 0..130 {
            log.record(entry(n));
            assert!(log.len() <= CONVERSATION_LOG_CAPACITY);
        }
        assert_eq!(log.len(), 100);
    }

    #[test]
    fn test_record_keeps_entries_from_other_writers() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut first = HistoryLog::command_history(store.clone());
        let mut second = HistoryLog::command_history(store.clone());

        first.record(entry(1));
        second.record(entry(2));

        let all = HistoryLog::command_history(store).load_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].command, "command 2");
    }

    #[test]
    fn test_clear_then_load_all_is_empty() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut log = HistoryLog::command_history(store.clone());
        log.record(entry(1));
        log.clear();

        assert!(log.load_all().is_empty());
        assert!(store.get(COMMAND_HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_history_loads_empty() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(COMMAND_HISTORY_KEY, "[{\"id\": 3").unwrap();

        let mut log = HistoryLog::command_history(store);
        assert!(log.is_empty());
        log.record(entry(1));
        assert_eq!(log.load_all().len(), 1);
    }

    #[test]
    fn test_timestamp_serializes_as_millis() {
        let mut e = entry(1);
        e.timestamp = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        assert!(json.get("module_type").is_none());
    }

    #[test]
    fn test_conversation_entries_with_created_at_survive_record() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set(
                CONVERSATION_LOG_KEY,
                r#"[{
                    "id": "1710081900000",
                    "user_id": "user-7",
                    "command": "What tasks are blocked?",
                    "response": "Two tasks are blocked.",
                    "context": {},
                    "module_type": "dashboard",
                    "channel": "dashboard",
                    "created_at": "2024-03-10T14:45:00.000Z"
                }]"#,
            )
            .unwrap();

        let mut log = HistoryLog::conversation_log(store.clone());
        assert_eq!(log.len(), 1);
        let old = log.latest().unwrap();
        assert_eq!(old.timestamp, Utc.with_ymd_and_hms(2024, 3, 10, 14, 45, 0).unwrap());
        assert_eq!(old.user_id.as_deref(), Some("user-7"));

        log.record(entry(2).with_user("user-7"));

        let all = HistoryLog::conversation_log(store.clone()).load_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].command, "command 2");
        assert_eq!(all[1].command, "What tasks are blocked?");
        assert_eq!(all[1].context, Some(serde_json::json!({})));

        // Rewritten entries use the millisecond field
        let raw = store.get(CONVERSATION_LOG_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[1]["timestamp"], 1_710_081_900_000i64);
    }

    #[test]
    fn test_format_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2024, 3, 10, 9, 5, 0).unwrap();
        let older = Utc.with_ymd_and_hms(2024, 3, 7, 21, 30, 0).unwrap();

        assert_eq!(format_timestamp(recent, now, &Utc), "09:05 AM");
        assert_eq!(format_timestamp(older, now, &Utc), "Mar 7, 09:30 PM");
    }
}
