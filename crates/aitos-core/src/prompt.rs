//! Prompt composition for the assistant
//!
//! The assistant only ever sees one flat prompt. Team roster, local time and
//! the module in focus are injected ahead of the user's own words.

use crate::module::Module;
use crate::roster::RosterStore;
use chrono::{DateTime, Local};

/// Context injected ahead of every prompt
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// "- Name (Role)" lines
    pub team: String,
    pub now: DateTime<Local>,
    pub module: Option<Module>,
}

impl PromptContext {
    pub fn new(roster: &RosterStore) -> Self {
        Self {
            team: roster.team_context(),
            now: Local::now(),
            module: None,
        }
    }

    pub fn for_module(roster: &RosterStore, module: Module) -> Self {
        Self {
            module: Some(module),
            ..Self::new(roster)
        }
    }
}

fn push_header(prompt: &mut String, context: &PromptContext) {
    prompt.push_str("You are OSS BOT, the operational assistant for AIT-OS, a team operating system.\n\n");

    if !context.team.is_empty() {
        prompt.push_str("TEAM:\n");
        prompt.push_str(&context.team);
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!(
        "CURRENT TIME: {}\n\n",
        context.now.format("%A, %B %-d %Y, %H:%M")
    ));
}

/// Prompt for free text typed into the command bar
pub fn compose_command_prompt(command: &str, context: &PromptContext) -> String {
    let mut prompt = String::new();
    push_header(&mut prompt, context);

    prompt.push_str("You help with task assignment and tracking, team coordination, OKRs, ");
    prompt.push_str("daily check-ins, knowledge management and team pulse.\n");
    prompt.push_str("Be concise and actionable, use team member names when relevant, ");
    prompt.push_str("and give specific next steps.\n\n");

    prompt.push_str(&format!("Command: \"{}\"\n\n", command.trim()));

    prompt.push_str("If this is a greeting, introduce yourself and suggest a few commands. ");
    prompt.push_str("If it is about people, refer to the team above. ");
    prompt.push_str("If it is about tasks or progress, answer with concrete actions.");

    prompt
}

/// Prompt for a quick-access module button
pub fn compose_module_prompt(module: Module, request: &str, context: &PromptContext) -> String {
    let mut prompt = String::new();
    push_header(&mut prompt, context);

    prompt.push_str(&format!(
        "The user opened the \"{}\" module. {}\n\n",
        module.id(),
        request
    ));
    prompt.push_str("Give a response for this module with realistic team insights, ");
    prompt.push_str("actionable items and relevant data points. Be specific.");

    prompt
}
