use serde::Deserialize;

use super::events::OfferedAction;

/// User-facing reply texts and button labels
///
/// Templates may contain `{remaining}` or `{seconds}`. Every field can be
/// overridden from the `[replies]` config section for localisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Replies {
    /// Sent on Start and on the add-more prompt
    pub record_prompt: String,
    pub fragment_saved: String,
    pub budget_exceeded: String,
    pub no_result: String,
    pub result_caption: String,
    pub unreadable_audio: String,
    pub generic_failure: String,

    pub add_more_label: String,
    pub listen_label: String,
    pub start_over_label: String,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            record_prompt:
                "Record a voice message or send an audio file no longer than {remaining} seconds."
                    .to_string(),
            fragment_saved: "Audio fragment of {seconds} seconds saved.".to_string(),
            budget_exceeded:
                "The allowed length of {remaining} seconds was exceeded. Please try again."
                    .to_string(),
            no_result: "There is no result yet. Please add at least one fragment.".to_string(),
            result_caption: "Here is your combined recording.".to_string(),
            unreadable_audio:
                "That audio could not be read. Please send a voice message or a common audio file."
                    .to_string(),
            generic_failure: "Something went wrong while saving your audio. Please try again."
                .to_string(),
            add_more_label: "Add another fragment".to_string(),
            listen_label: "Listen to result".to_string(),
            start_over_label: "Start over".to_string(),
        }
    }
}

impl Replies {
    pub fn record_prompt(&self, remaining: u32) -> String {
        fill(&self.record_prompt, "remaining", remaining)
    }

    pub fn fragment_saved(&self, seconds: u32) -> String {
        fill(&self.fragment_saved, "seconds", seconds)
    }

    pub fn budget_exceeded(&self, remaining: u32) -> String {
        fill(&self.budget_exceeded, "remaining", remaining)
    }

    /// Button label the gateway renders for an offered action
    pub fn label(&self, action: OfferedAction) -> &str {
        match action {
            OfferedAction::AddMore => &self.add_more_label,
            OfferedAction::Listen => &self.listen_label,
            OfferedAction::StartOver => &self.start_over_label,
        }
    }
}

fn fill(template: &str, key: &str, value: u32) -> String {
    template.replace(&format!("{{{}}}", key), &value.to_string())
}
