//! Prompt construction for the general backends.

use serde::Serialize;

use solace_core::types::{HistoryEntry, SessionContext};

/// History turns sent to chat-completion backends.
pub const CHAT_HISTORY_TURNS: usize = 5;

/// History turns rendered into the single-text Gemini prompt.
pub const GEMINI_HISTORY_TURNS: usize = 3;

pub const CHAT_SYSTEM_PROMPT: &str = "\
You are an empathetic and knowledgeable CBT (Cognitive Behavioral Therapy) mental health chatbot. Your role is to:

1. Provide supportive, evidence-based responses using CBT principles
2. Help users identify and challenge negative thought patterns
3. Encourage behavioral activation and healthy coping strategies
4. Show empathy and validate emotions while guiding toward solutions
5. Ask clarifying questions to better understand the user's situation
6. Suggest practical CBT techniques when appropriate

Important guidelines:
- Always be supportive and non-judgmental
- Use CBT frameworks (identifying automatic thoughts, cognitive distortions, behavioral experiments)
- Encourage professional help for serious mental health concerns
- Maintain appropriate boundaries
- Focus on empowerment and skill-building

Remember: You are a supportive tool, not a replacement for professional therapy.";

pub const GEMINI_SYSTEM_CONTEXT: &str = "\
You are an empathetic and knowledgeable CBT (Cognitive Behavioral Therapy) mental health assistant. Your role is to:

1. Provide supportive, evidence-based responses using CBT principles
2. Help users identify and challenge negative thought patterns (cognitive distortions like catastrophizing, black-and-white thinking, etc.)
3. Encourage behavioral activation and healthy coping strategies
4. Show empathy and validate emotions while guiding toward solutions
5. Ask clarifying questions to better understand the user's situation
6. Suggest practical CBT techniques when appropriate (thought records, behavioral experiments, exposure therapy, etc.)

Important guidelines:
- Always be supportive, warm, and non-judgmental
- Use CBT frameworks actively (identify automatic thoughts, challenge distortions, reframe thinking)
- Provide specific actionable advice and coping strategies
- Encourage professional help for serious mental health concerns
- Maintain appropriate boundaries
- Focus on empowerment and skill-building
- Keep responses conversational and under 150 words

CBT Techniques to use:
- Cognitive restructuring (identify and challenge negative thoughts)
- Behavioral activation (encourage action to improve mood)
- Exposure therapy principles (gradual facing of fears)
- Mindfulness and grounding techniques
- Problem-solving strategies
- Relaxation and breathing exercises

Remember: You are a supportive CBT tool, not a replacement for professional therapy. Provide practical, actionable guidance.";

/// One chat-completion message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Render session context as a bullet list, sorted by key. `None` when empty.
pub fn render_context(context: &SessionContext) -> Option<String> {
    if context.is_empty() {
        return None;
    }

    let mut keys: Vec<&String> = context.keys().collect();
    keys.sort();

    let mut out = String::from("Session context:\n");
    for key in keys {
        let value = match &context[key] {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&format!("- {}: {}\n", key, value));
    }
    Some(out)
}

/// System prompt, then the last turns as user/assistant pairs, then the message.
pub fn chat_messages(
    message: &str,
    history: &[HistoryEntry],
    context: &SessionContext,
) -> Vec<ChatMessage> {
    let system = match render_context(context) {
        Some(rendered) => format!("{}\n\n{}", CHAT_SYSTEM_PROMPT, rendered.trim_end()),
        None => CHAT_SYSTEM_PROMPT.to_string(),
    };

    let start = history.len().saturating_sub(CHAT_HISTORY_TURNS);
    let mut messages = Vec::with_capacity(2 + 2 * (history.len() - start));
    messages.push(ChatMessage::new("system", system));
    for turn in &history[start..] {
        messages.push(ChatMessage::new("user", turn.user.as_str()));
        messages.push(ChatMessage::new("assistant", turn.assistant.as_str()));
    }
    messages.push(ChatMessage::new("user", message));
    messages
}

/// Single-text prompt for generateContent.
pub fn gemini_prompt(message: &str, history: &[HistoryEntry], context: &SessionContext) -> String {
    let mut prompt = format!("{}\n\n", GEMINI_SYSTEM_CONTEXT);

    if let Some(rendered) = render_context(context) {
        prompt.push_str(&rendered);
        prompt.push('\n');
    }

    if !history.is_empty() {
        prompt.push_str("Previous conversation:\n");
        let start = history.len().saturating_sub(GEMINI_HISTORY_TURNS);
        for turn in &history[start..] {
            if !turn.user.is_empty() {
                prompt.push_str(&format!("User: {}\n", turn.user));
            }
            if !turn.assistant.is_empty() {
                prompt.push_str(&format!("Assistant: {}\n", turn.assistant));
            }
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("User: {}\n\nAssistant:", message));
    prompt
}
