use aitos_core::ai::{GenerationRequest, TextGenerator};
use aitos_core::history::COMMAND_HISTORY_CAPACITY;
use aitos_core::{
    AiGateway, CurrentUser, HistoryLog, KeyValueStore, Priority, PromptContext, RosterStore,
    SqliteStore, TaskDraft, TaskStatus, TaskStore, FALLBACK_RESPONSE,
};
use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_store(dir: &TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(SqliteStore::open(&dir.path().join("dashboard.db")).unwrap())
}

struct Failing;

#[async_trait]
impl TextGenerator for Failing {
    async fn generate_text(&self, _request: &GenerationRequest) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

struct Echo;

#[async_trait]
impl TextGenerator for Echo {
    async fn generate_text(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        Ok(format!("{} tokens", request.max_tokens))
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn write_report_moves_to_blocked() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let mut board = TaskStore::load(store.clone(), false);

    let created = board
        .create_task("me", TaskDraft::new("Write report", Priority::Medium))
        .unwrap();

    let todo = board.list_by_status(TaskStatus::Todo);
    assert_eq!(todo.len(), 1);
    assert_eq!(todo[0].title, "Write report");
    assert_eq!(todo[0].priority, Priority::Medium);

    std::thread::sleep(std::time::Duration::from_millis(5));
    assert!(board.update_status(&created.id, TaskStatus::Blocked));

    assert!(board.list_by_status(TaskStatus::Todo).is_empty());
    let blocked = board.list_by_status(TaskStatus::Blocked);
    assert_eq!(blocked.len(), 1);
    assert!(blocked[0].updated_at > created.updated_at);
    assert_eq!(blocked[0].title, created.title);
    assert_eq!(blocked[0].priority, created.priority);
    assert_eq!(blocked[0].created_at, created.created_at);

    // Survives a restart
    drop(board);
    let reopened = TaskStore::load(open_store(&dir), false);
    assert_eq!(reopened.list_by_status(TaskStatus::Blocked)[0].id, created.id);
}

#[test]
fn board_rehydrates_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let mut board = TaskStore::load(open_store(&dir), false);
    for title in ["one", "two", "three"] {
        board.create_task("me", TaskDraft::new(title, Priority::Low));
    }

    let reopened = TaskStore::load(open_store(&dir), false);
    let titles: Vec<_> = reopened
        .list_by_status(TaskStatus::Todo)
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(titles, vec!["three", "two", "one"]);
}

#[test]
fn history_caps_at_fifty_on_disk() {
    let dir = TempDir::new().unwrap();
    let mut history = HistoryLog::command_history(open_store(&dir));
    for n in 1..=51 {
        history.record(aitos_core::CommandResponse::new(format!("#{n}"), "ok"));
    }

    let mut reopened = HistoryLog::command_history(open_store(&dir));
    let all = reopened.load_all();
    assert_eq!(all.len(), COMMAND_HISTORY_CAPACITY);
    assert_eq!(all[0].command, "#51");
    assert_eq!(all[49].command, "#2");

    reopened.clear();
    assert!(HistoryLog::command_history(open_store(&dir)).load_all().is_empty());
}

#[test]
fn roster_upsert_survives_restart() {
    let dir = TempDir::new().unwrap();
    let user = CurrentUser::new("user-7", Some("nitish.m@ait-os.com".to_string()));

    let mut roster = RosterStore::load(open_store(&dir));
    assert!(roster.ensure_current_user(&user));

    let mut roster = RosterStore::load(open_store(&dir));
    let before = roster.len();
    assert!(!roster.ensure_current_user(&user));
    assert_eq!(roster.len(), before);
    assert_eq!(roster.find_by_user_id("user-7").unwrap().display_name, "nitish.m");
}

#[tokio::test]
async fn failed_gateway_call_is_recorded_with_fallback() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let roster = RosterStore::load(store.clone());
    let mut history = HistoryLog::command_history(store.clone());
    let mut conversations = HistoryLog::conversation_log(store);

    let gateway = AiGateway::new(Arc::new(Failing), "gpt-4o-mini");
    let entry = gateway
        .run_command("What tasks are blocked?", &PromptContext::new(&roster))
        .await;
    history.record(entry.clone());
    conversations.record(entry.with_user("me"));

    assert_eq!(history.latest().unwrap().response, FALLBACK_RESPONSE);
    assert_eq!(conversations.latest().unwrap().user_id.as_deref(), Some("me"));
}

#[tokio::test]
async fn module_and_command_budgets_differ() {
    let roster = RosterStore::load(Arc::new(aitos_core::MemoryStore::new()));
    let gateway = AiGateway::new(Arc::new(Echo), "m");
    let ctx = PromptContext::new(&roster);

    let command = gateway.run_command("hi", &ctx).await;
    let module = gateway.run_module(aitos_core::Module::OkrTracker, &ctx).await;

    assert_eq!(command.response, "300 tokens");
    assert_eq!(module.response, "400 tokens");
}
