use aitos_core::{
    AiGateway, ClaudeClient, CommandResponse, Config, CurrentUser, HistoryLog, KeyValueStore,
    Module, OllamaClient, OpenAIClient, Priority, PromptContext, Provider, RosterStore, TaskDraft,
    TaskStatus, TaskStore,
};
use chrono::NaiveDate;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shown when the background task itself dies (as opposed to the model call failing)
pub const PROCESSING_ERROR: &str =
    "Sorry, I encountered an error processing your command. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Board,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    CommandBar,
    Modules,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Description,
    Priority,
    Assignee,
    DueDate,
    Hours,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Priority,
            FormField::Priority => FormField::Assignee,
            FormField::Assignee => FormField::DueDate,
            FormField::DueDate => FormField::Hours,
            FormField::Hours => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Hours,
            FormField::Description => FormField::Title,
            FormField::Priority => FormField::Description,
            FormField::Assignee => FormField::Priority,
            FormField::DueDate => FormField::Assignee,
            FormField::Hours => FormField::DueDate,
        }
    }

    pub fn is_text(&self) -> bool {
        !matches!(self, FormField::Priority | FormField::Assignee)
    }
}

/// New-task form state
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub field: FormField,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// Index into the roster; `None` means unassigned
    pub assignee: Option<usize>,
    /// `YYYY-MM-DD`
    pub due_date: String,
    pub estimated_hours: String,
}

impl TaskForm {
    pub fn active_text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::DueDate => Some(&mut self.due_date),
            FormField::Hours => Some(&mut self.estimated_hours),
            FormField::Priority | FormField::Assignee => None,
        }
    }

    /// Build a draft; unparseable dates and hours are left empty
    pub fn to_draft(&self, roster: &RosterStore) -> TaskDraft {
        let due_date = NaiveDate::parse_from_str(self.due_date.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        let estimated_hours = self
            .estimated_hours
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite() && *h >= 0.0);
        let assigned_to = self
            .assignee
            .and_then(|i| roster.members().get(i))
            .map(|m| m.user_id.clone())
            .unwrap_or_default();

        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            assigned_to,
            due_date,
            estimated_hours,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Command bar
    pub command_input: String,
    pub command_cursor: usize,
    /// The submitted command text alongside its running call
    pub command_task: Option<(String, JoinHandle<CommandResponse>)>,
    pub suggestion_count: usize,

    // Quick-access modules (each has its own in-flight slot)
    pub selected_module: usize,
    pub module_task: Option<(Module, JoinHandle<CommandResponse>)>,

    // Latest response panel
    pub latest_response: Option<CommandResponse>,
    pub response_scroll: u16,

    // Kanban board
    pub selected_column: usize,
    pub column_states: [ListState; 5],

    // New task form
    pub show_task_form: bool,
    pub task_form: TaskForm,

    // History modal
    pub show_history: bool,
    pub history_entries: Vec<CommandResponse>,
    pub history_state: ListState,

    // Transient footer message ("Copied", ...) and ticks left to show it
    pub status_message: Option<(String, u8)>,

    // Animation state
    pub animation_frame: u8,

    // Model picker state
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,

    // Provider state
    pub current_provider: Provider,
    pub selected_model: String,
    pub show_provider_picker: bool,
    pub provider_picker_state: ListState,

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,
    pub api_key_target_provider: Option<Provider>,

    // Panel areas for mouse hit-testing (updated during render)
    pub response_area: Option<Rect>,
    pub history_area: Option<Rect>,

    // Session data
    pub config: Config,
    pub user: CurrentUser,
    pub tasks: TaskStore,
    pub roster: RosterStore,
    pub history: HistoryLog,
    pub conversations: HistoryLog,
    pub gateway: AiGateway,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>, user: CurrentUser) -> Self {
        let current_provider = config
            .provider
            .as_deref()
            .and_then(Provider::parse)
            .unwrap_or(Provider::Ollama);
        let selected_model = config
            .default_model
            .clone()
            .unwrap_or_else(|| current_provider.default_model().to_string());
        let gateway = AiGateway::for_provider(current_provider, selected_model.clone(), &config);

        let mut roster = RosterStore::load(store.clone());
        roster.ensure_current_user(&user);
        let tasks = TaskStore::load(store.clone(), config.seed_demo_data);
        let history = HistoryLog::command_history(store.clone());
        let conversations = HistoryLog::conversation_log(store);

        tracing::info!(
            user = %user.id,
            provider = current_provider.as_str(),
            model = %selected_model,
            tasks = tasks.len(),
            history = history.len(),
            "dashboard session started"
        );

        let latest_response = history.latest().cloned();

        Self {
            should_quit: false,
            screen: Screen::Dashboard,
            input_mode: InputMode::Editing,
            focus: FocusPane::CommandBar,

            command_input: String::new(),
            command_cursor: 0,
            command_task: None,
            suggestion_count: 0,

            selected_module: 0,
            module_task: None,

            latest_response,
            response_scroll: 0,

            selected_column: 0,
            column_states: Default::default(),

            show_task_form: false,
            task_form: TaskForm::default(),

            show_history: false,
            history_entries: Vec::new(),
            history_state: ListState::default(),

            status_message: None,
            animation_frame: 0,

            show_model_picker: false,
            available_models: Vec::new(),
            model_picker_state: ListState::default(),

            current_provider,
            selected_model,
            show_provider_picker: false,
            provider_picker_state: ListState::default(),

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,
            api_key_target_provider: None,

            response_area: None,
            history_area: None,

            config,
            user,
            tasks,
            roster,
            history,
            conversations,
            gateway,
        }
    }

    // ------------------------------------------------------------------
    // Command bar and modules
    // ------------------------------------------------------------------

    pub fn command_in_flight(&self) -> bool {
        self.command_task.is_some()
    }

    pub fn module_in_flight(&self) -> Option<Module> {
        self.module_task.as_ref().map(|(module, _)| *module)
    }

    /// Send the command bar text to the assistant. Ignored while a previous
    /// submission is still running or the input is blank.
    pub fn submit_command(&mut self) -> bool {
        let command = self.command_input.trim().to_string();
        if command.is_empty() || self.command_in_flight() {
            return false;
        }

        let gateway = self.gateway.clone();
        let context = PromptContext::new(&self.roster);
        tracing::info!(%command, "submitting command");
        let submitted = command.clone();
        self.command_task = Some((
            submitted,
            tokio::spawn(async move { gateway.run_command(&command, &context).await }),
        ));

        self.command_input.clear();
        self.command_cursor = 0;
        true
    }

    /// Run a quick-access module. The task manager opens the board instead.
    pub fn activate_module(&mut self, module: Module) {
        if module.opens_board() {
            self.screen = Screen::Board;
            self.input_mode = InputMode::Normal;
            return;
        }
        if self.module_task.is_some() {
            return;
        }

        let gateway = self.gateway.clone();
        let context = PromptContext::for_module(&self.roster, module);
        tracing::info!(module = module.id(), "running module");
        self.module_task = Some((
            module,
            tokio::spawn(async move { gateway.run_module(module, &context).await }),
        ));
    }

    pub fn fill_suggestion(&mut self) {
        self.command_input = aitos_core::module::suggestion(self.suggestion_count).to_string();
        self.command_cursor = self.command_input.chars().count();
        self.suggestion_count += 1;
        self.focus = FocusPane::CommandBar;
        self.input_mode = InputMode::Editing;
    }

    /// Collect finished background calls and record their responses
    pub async fn poll_pending(&mut self) {
        if self.command_task.as_ref().is_some_and(|(_, t)| t.is_finished()) {
            if let Some((command, handle)) = self.command_task.take() {
                let entry = match handle.await {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::error!(%command, error = %e, "command task failed");
                        CommandResponse::new(command, PROCESSING_ERROR)
                            .with_module("command_bar")
                            .with_channel("dashboard")
                    }
                };
                self.record_response(entry);
            }
        }

        if self.module_task.as_ref().is_some_and(|(_, t)| t.is_finished()) {
            if let Some((module, handle)) = self.module_task.take() {
                let entry = match handle.await {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::error!(module = module.id(), error = %e, "module task failed");
                        CommandResponse::new(module.history_command(), aitos_core::gateway::module_fallback(module))
                            .with_module(module.module_type())
                    }
                };
                self.record_response(entry);
            }
        }
    }

    /// Store a response in both logs and show it
    pub fn record_response(&mut self, entry: CommandResponse) {
        self.history.record(entry.clone());
        self.conversations
            .record(entry.clone().with_user(self.user.id.clone()));
        if self.show_history {
            self.reload_history();
        }
        self.latest_response = Some(entry);
        self.response_scroll = 0;
    }

    pub fn selected_module(&self) -> Module {
        Module::from_index(self.selected_module).unwrap_or(Module::DailyOps)
    }

    pub fn module_next(&mut self) {
        self.selected_module = (self.selected_module + 1) % Module::ALL.len();
    }

    pub fn module_prev(&mut self) {
        self.selected_module = (self.selected_module + Module::ALL.len() - 1) % Module::ALL.len();
    }

    // ------------------------------------------------------------------
    // Board
    // ------------------------------------------------------------------

    pub fn selected_status(&self) -> TaskStatus {
        TaskStatus::from_index(self.selected_column).unwrap_or(TaskStatus::Todo)
    }

    pub fn column_next(&mut self) {
        self.selected_column = (self.selected_column + 1).min(TaskStatus::ALL.len() - 1);
        self.clamp_card_selection(self.selected_column);
    }

    pub fn column_prev(&mut self) {
        self.selected_column = self.selected_column.saturating_sub(1);
        self.clamp_card_selection(self.selected_column);
    }

    pub fn card_down(&mut self) {
        let len = self.tasks.list_by_status(self.selected_status()).len();
        if len > 0 {
            let state = &mut self.column_states[self.selected_column];
            let i = state.selected().unwrap_or(0);
            state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn card_up(&mut self) {
        let state = &mut self.column_states[self.selected_column];
        let i = state.selected().unwrap_or(0);
        state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_task_id(&self) -> Option<String> {
        let column = self.tasks.list_by_status(self.selected_status());
        let i = self.column_states[self.selected_column].selected().unwrap_or(0);
        column.get(i).map(|t| t.id.clone())
    }

    /// Move the selected card to `status`, keeping it selected in its new column
    pub fn move_selected_task(&mut self, status: TaskStatus) -> bool {
        let Some(id) = self.selected_task_id() else {
            return false;
        };
        if !self.tasks.update_status(&id, status) {
            return false;
        }

        let from = self.selected_column;
        self.clamp_card_selection(from);

        let to = status.index();
        if let Some(pos) = self.tasks.list_by_status(status).iter().position(|t| t.id == id) {
            self.column_states[to].select(Some(pos));
        }
        true
    }

    /// Move the selected card one column left (-1) or right (+1)
    pub fn shift_selected_task(&mut self, delta: isize) -> bool {
        let target = self.selected_column as isize + delta;
        match usize::try_from(target).ok().and_then(TaskStatus::from_index) {
            Some(status) => {
                let moved = self.move_selected_task(status);
                if moved {
                    self.selected_column = status.index();
                }
                moved
            }
            None => false,
        }
    }

    fn clamp_card_selection(&mut self, column: usize) {
        let Some(status) = TaskStatus::from_index(column) else {
            return;
        };
        let len = self.tasks.list_by_status(status).len();
        let state = &mut self.column_states[column];
        if len == 0 {
            state.select(None);
        } else {
            let i = state.selected().unwrap_or(0);
            state.select(Some(i.min(len - 1)));
        }
    }

    pub fn open_task_form(&mut self) {
        self.task_form = TaskForm::default();
        self.show_task_form = true;
        self.input_mode = InputMode::Editing;
    }

    pub fn close_task_form(&mut self) {
        self.show_task_form = false;
        self.input_mode = InputMode::Normal;
    }

    /// Create a task from the form. A blank title leaves the form open and the board untouched.
    pub fn submit_task_form(&mut self) -> bool {
        let draft = self.task_form.to_draft(&self.roster);
        match self.tasks.create_task(&self.user.id, draft) {
            Some(_) => {
                self.close_task_form();
                self.selected_column = TaskStatus::Todo.index();
                self.column_states[self.selected_column].select(Some(0));
                true
            }
            None => false,
        }
    }

    pub fn cycle_form_choice(&mut self, forward: bool) {
        match self.task_form.field {
            FormField::Priority => {
                self.task_form.priority = if forward {
                    self.task_form.priority.next()
                } else {
                    // three steps forward is one step back in a cycle of four
                    self.task_form.priority.next().next().next()
                };
            }
            FormField::Assignee => {
                let len = self.roster.len();
                self.task_form.assignee = match (self.task_form.assignee, forward) {
                    (None, true) if len > 0 => Some(0),
                    (None, false) if len > 0 => Some(len - 1),
                    (Some(i), true) if i + 1 < len => Some(i + 1),
                    (Some(i), false) if i > 0 => Some(i - 1),
                    _ => None,
                };
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // History modal
    // ------------------------------------------------------------------

    pub fn open_history(&mut self) {
        self.reload_history();
        self.show_history = true;
    }

    pub fn reload_history(&mut self) {
        self.history_entries = self.history.load_all();
        if self.history_entries.is_empty() {
            self.history_state.select(None);
        } else {
            let i = self.history_state.selected().unwrap_or(0);
            self.history_state
                .select(Some(i.min(self.history_entries.len() - 1)));
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.history_entries.clear();
        self.history_state.select(None);
        tracing::info!("command history cleared");
    }

    pub fn history_nav_down(&mut self) {
        let len = self.history_entries.len();
        if len > 0 {
            let i = self.history_state.selected().unwrap_or(0);
            self.history_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn history_nav_up(&mut self) {
        let i = self.history_state.selected().unwrap_or(0);
        self.history_state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_history_entry(&self) -> Option<&CommandResponse> {
        self.history_state
            .selected()
            .and_then(|i| self.history_entries.get(i))
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), 6));
    }

    pub fn tick_animation(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
        if let Some((_, ticks)) = &mut self.status_message {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.status_message = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Provider and model pickers
    // ------------------------------------------------------------------

    pub async fn load_models(&mut self) {
        self.available_models = match self.current_provider {
            Provider::Ollama => OllamaClient::new(self.config.ollama_url())
                .list_models()
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "could not list Ollama models");
                    Vec::new()
                }),
            Provider::Claude => ClaudeClient::list_models(),
            Provider::OpenAI => OpenAIClient::list_models(),
        };
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(model) = self
            .model_picker_state
            .selected()
            .and_then(|i| self.available_models.get(i))
            .cloned()
        {
            self.set_model(model);
            self.show_model_picker = false;
        }
    }

    fn set_model(&mut self, model: String) {
        self.selected_model = model.clone();
        self.rebuild_gateway();
        self.config.default_model = Some(model.clone());
        if let Err(e) = Config::update(|c| c.default_model = Some(model)) {
            tracing::warn!(error = %e, "could not save model choice");
        }
    }

    pub fn provider_picker_nav_down(&mut self) {
        let len = Provider::all().len();
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn provider_picker_nav_up(&mut self) {
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Returns the source of the API key for a provider: "local", "env", "config", or None
    pub fn get_key_source(&self, provider: Provider) -> Option<&'static str> {
        let (env_var, stored) = match provider {
            Provider::Ollama => return Some("local"),
            Provider::Claude => ("ANTHROPIC_API_KEY", &self.config.claude_api_key),
            Provider::OpenAI => ("OPENAI_API_KEY", &self.config.openai_api_key),
        };
        if std::env::var(env_var).is_ok() {
            Some("env")
        } else if stored.is_some() {
            Some("config")
        } else {
            None
        }
    }

    /// Switch provider, asking for an API key first when one is needed and missing
    pub fn choose_provider(&mut self, provider: Provider) {
        if self.get_key_source(provider).is_none() {
            self.api_key_target_provider = Some(provider);
            self.api_key_input.clear();
            self.api_key_input_cursor = 0;
            self.show_api_key_input = true;
        } else {
            self.switch_provider(provider);
        }
        self.show_provider_picker = false;
    }

    pub fn submit_api_key(&mut self) {
        let key = self.api_key_input.trim().to_string();
        if let (Some(provider), false) = (self.api_key_target_provider, key.is_empty()) {
            match provider {
                Provider::Claude => self.config.claude_api_key = Some(key.clone()),
                Provider::OpenAI => self.config.openai_api_key = Some(key.clone()),
                Provider::Ollama => {}
            }
            if let Err(e) = Config::update(|c| match provider {
                Provider::Claude => c.claude_api_key = Some(key),
                Provider::OpenAI => c.openai_api_key = Some(key),
                Provider::Ollama => {}
            }) {
                tracing::warn!(error = %e, "could not save API key");
            }
            self.switch_provider(provider);
        }
        self.cancel_api_key_input();
    }

    pub fn cancel_api_key_input(&mut self) {
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
        self.api_key_target_provider = None;
    }

    fn switch_provider(&mut self, provider: Provider) {
        self.current_provider = provider;
        self.selected_model = provider.default_model().to_string();
        self.rebuild_gateway();
        self.config.provider = Some(provider.as_str().to_string());
        self.config.default_model = Some(self.selected_model.clone());

        let model = self.selected_model.clone();
        if let Err(e) = Config::update(|c| {
            c.provider = Some(provider.as_str().to_string());
            c.default_model = Some(model);
        }) {
            tracing::warn!(error = %e, "could not save provider choice");
        }
        tracing::info!(provider = provider.as_str(), "switched provider");
    }

    fn rebuild_gateway(&mut self) {
        self.gateway = AiGateway::for_provider(
            self.current_provider,
            self.selected_model.clone(),
            &self.config,
        );
    }

    pub fn board_summary(&self) -> String {
        self.tasks.summary().to_string()
    }
}
