//! Prompt construction for the generation path.

use crate::types::{Message, SpiralData};

const CLOSING_REQUEST: &str =
    "Provide an evidence-based reframe with citations to my documented records.";

/// Builds the system and user prompts sent to the generation service.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Create a prompt builder.
    pub fn new() -> Self {
        Self
    }

    /// Reframing instructions with the user's context embedded.
    pub fn build_system_prompt(&self, context: &str) -> String {
        format!(
            r#"You are Clarity, a cognitive reframing assistant.

YOUR ROLE:
- Analyze catastrophizing narratives using evidence from the user's documented records
- Provide counter-narratives grounded in documented facts
- Cite specific sources (file paths, dates, quotes)
- Distinguish between what's TRUE and what anxiety is amplifying

USER'S CONTEXT:
{context}

GUIDELINES:
1. Start with "**EVIDENCE AGAINST THIS NARRATIVE:**"
2. Cite specific sources with file paths
3. Distinguish patterns (parents' voice vs reality, hypervigilance vs truth)
4. End with "**WHAT'S ACTUALLY TRUE:**" summary
5. Suggest concrete next step if applicable
6. Use compassionate but direct tone
7. Keep response focused and actionable (under 500 words)

RESPONSE FORMAT:
Use markdown formatting for clarity. Include:
- Numbered evidence points with citations
- Pattern recognition (whose voice is this?)
- Clear distinction between fear and fact
- One actionable next step (if applicable)

AVOID:
- Generic platitudes ("everyone struggles sometimes")
- Dismissing the spiral ("you're overthinking")
- Suggesting "just don't worry about it"
- Therapeutic jargon without explanation"#
        )
    }

    /// The spiral itself, its certainty and any extra context.
    pub fn build_user_prompt(&self, spiral: &SpiralData) -> String {
        let mut prompt = format!(
            "SPIRAL: {}\n\nCERTAINTY: {}/10 (how true this feels right now)",
            spiral.narrative, spiral.certainty
        );

        if let Some(context) = spiral.context.as_deref().filter(|c| !c.is_empty()) {
            prompt.push_str("\n\nADDITIONAL CONTEXT: ");
            prompt.push_str(context);
        }

        prompt.push_str("\n\n");
        prompt.push_str(CLOSING_REQUEST);
        prompt
    }

    /// The `[system, user]` message pair for one generation call.
    pub fn build_messages(&self, context: &str, spiral: &SpiralData) -> Vec<Message> {
        vec![
            Message::system(self.build_system_prompt(context)),
            Message::user(self.build_user_prompt(spiral)),
        ]
    }
}
