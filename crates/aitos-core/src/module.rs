//! Quick-access modules and command-bar suggestions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    DailyOps,
    OkrTracker,
    TeamPulse,
    KnowledgeHub,
    TechSync,
    TaskManager,
    GtmOps,
}

impl Module {
    pub const ALL: [Module; 7] = [
        Module::DailyOps,
        Module::OkrTracker,
        Module::TeamPulse,
        Module::KnowledgeHub,
        Module::TechSync,
        Module::TaskManager,
        Module::GtmOps,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Module::DailyOps => "daily-ops",
            Module::OkrTracker => "okr-tracker",
            Module::TeamPulse => "team-pulse",
            Module::KnowledgeHub => "knowledge-hub",
            Module::TechSync => "tech-sync",
            Module::TaskManager => "task-manager",
            Module::GtmOps => "gtm-ops",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Module::DailyOps => "Daily Ops",
            Module::OkrTracker => "OKR Tracker",
            Module::TeamPulse => "Team Pulse",
            Module::KnowledgeHub => "Knowledge Hub",
            Module::TechSync => "Tech Sync",
            Module::TaskManager => "Task Manager",
            Module::GtmOps => "GTM & Ops",
        }
    }

    /// Canned prompt sent when the module is selected
    pub fn prompt(&self) -> &'static str {
        match self {
            Module::DailyOps => "Show me today's team status, blockers, and daily operations overview",
            Module::OkrTracker => "Display current OKRs, progress tracking, and goal alignment for the team",
            Module::TeamPulse => "Analyze team sentiment, communication health, and engagement metrics",
            Module::KnowledgeHub => "Access our team knowledge base, documentation, and shared insights",
            Module::TechSync => "Show technical updates, development progress, and engineering status",
            Module::TaskManager => "Open task management system to create, assign, and track team tasks",
            Module::GtmOps => "Review go-to-market operations, business metrics, and operational insights",
        }
    }

    /// History tag, e.g. `daily_ops`
    pub fn module_type(&self) -> String {
        self.id().replace('-', "_")
    }

    /// The task manager opens the board rather than asking the assistant
    pub fn opens_board(&self) -> bool {
        matches!(self, Module::TaskManager)
    }

    /// The command text recorded in history for this module
    pub fn history_command(&self) -> String {
        format!("[{}] {}", self.id().to_uppercase(), self.prompt())
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

pub const COMMAND_SUGGESTIONS: [&str; 6] = [
    "What can you help me with today?",
    "Show me today's team status",
    "What tasks are blocked?",
    "How is our sprint progress?",
    "Check team OKRs",
    "Who needs help today?",
];

/// Suggestions rotate: the n-th request gets the n-th suggestion, wrapping around
pub fn suggestion(n: usize) -> &'static str {
    COMMAND_SUGGESTIONS[n % COMMAND_SUGGESTIONS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_command_format() {
        assert_eq!(
            Module::TechSync.history_command(),
            "[TECH-SYNC] Show technical updates, development progress, and engineering status"
        );
        assert_eq!(Module::GtmOps.module_type(), "gtm_ops");
    }

    #[test]
    fn test_only_task_manager_opens_board() {
        let board_modules: Vec<_> = Module::ALL.iter().filter(|m| m.opens_board()).collect();
        assert_eq!(board_modules, vec![&Module::TaskManager]);
    }

    #[test]
    fn test_suggestions_wrap() {
        assert_eq!(suggestion(0), COMMAND_SUGGESTIONS[0]);
        assert_eq!(suggestion(7), COMMAND_SUGGESTIONS[1]);
    }
}
