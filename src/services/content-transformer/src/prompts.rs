//! Prompt templates for every transformation mode
//!
//! All builders are pure string templating; identical inputs always produce
//! byte-identical prompts.

use mindloom_shared::{ChatMessage, TransformationType};

use crate::llm::GenerationSettings;

/// System role plus the templated user prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// Single text block sent to providers that take one prompt
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

pub fn build_prompt(transformation_type: TransformationType, content: &str) -> PromptPair {
    let (system, template) = match transformation_type {
        TransformationType::Summary => (
            "You are an expert content summarizer. Create clear, concise summaries that capture the essence of any content.",
            "Create a comprehensive summary of the following content. Structure your response with:

• **Key Points**: 3-5 main takeaways
• **Main Arguments**: Core thesis or arguments presented
• **Important Details**: Supporting facts, data, or examples
• **Conclusion**: Overall significance or implications

Content to summarize:
",
        ),
        TransformationType::Mindmap => (
            "You are an expert at creating visual mind maps. Transform content into hierarchical, easy-to-follow structures.",
            "Create a detailed mind map of the following content. Use this format:

🎯 **MAIN TOPIC**
├── 📚 **Major Theme 1**
│   ├── Subtopic A
│   │   ├── Detail 1
│   │   └── Detail 2
│   └── Subtopic B
├── 🔍 **Major Theme 2**
└── ⚙️ **Major Theme 3**

Use emojis and clear hierarchy. Make it visually engaging and easy to follow.

Content:
",
        ),
        TransformationType::Notes => (
            "You are an expert educator who creates comprehensive study materials and learning notes.",
            "Transform the following content into structured study notes. Include:

📝 **STUDY NOTES**

**🎯 Learning Objectives:**
- [Key learning goals]

**📚 Key Concepts:**
- [Important terms and definitions]

**🔍 Main Topics:**
- [Organized topic breakdown]

**❓ Study Questions:**
- [Questions to test understanding]

**💡 Key Takeaways:**
- [Essential points to remember]

**📚 Further Reading:**
- [Related topics or resources]

Content:
",
        ),
        TransformationType::Legal => (
            "You are a legal expert who explains complex legal documents in plain English for non-lawyers.",
            "Analyze this legal document and provide a comprehensive breakdown:

⚖️ **LEGAL DOCUMENT ANALYSIS**

**📝 Plain English Summary:**
[Explain what this document is about in simple terms]

**⚠️ Key Risks & Obligations:**
[List important risks, responsibilities, and obligations]

**📜 Important Terms & Definitions:**
[Define complex legal terms used in the document]

**🔴 Red Flags:**
[Highlight any concerning clauses or unusual terms]

**✅ Recommendations:**
[Suggest actions or considerations for the reader]

Document:
",
        ),
        TransformationType::Analysis => (
            "You are an expert analyst who provides deep insights and critical analysis of content.",
            "Provide a comprehensive analysis of the following content:

🔍 **CONTENT ANALYSIS**

**🎯 Purpose & Context:**
[What is the main purpose and context?]

**📊 Key Arguments:**
[Main arguments and supporting evidence]

**🔄 Strengths & Weaknesses:**
[Critical evaluation of the content]

**💡 Insights:**
[Deeper insights and implications]

**🔮 Conclusions:**
[Final thoughts and recommendations]

Content:
",
        ),
        TransformationType::Qa => (
            "You are an expert who creates comprehensive Q&A materials from any content.",
            "Create a comprehensive Q&A based on the following content:

❓ **QUESTIONS & ANSWERS**

**Basic Understanding:**
[5-7 fundamental questions about the content]

**Detailed Analysis:**
[3-5 deeper analytical questions]

**Application Questions:**
[2-3 questions about practical applications]

**Critical Thinking:**
[2-3 questions that require critical analysis]

Provide clear, comprehensive answers for each question.

Content:
",
        ),
    };

    PromptPair {
        system: system.to_string(),
        user: format!("{}{}", template, content),
    }
}

/// Template used when a caller sends a tag outside the known set
pub fn build_generic_prompt(content: &str) -> PromptPair {
    PromptPair {
        system: "You are a helpful AI assistant that processes and transforms content according to user needs."
            .to_string(),
        user: format!(
            "Process and transform the following content in a helpful and structured way:\n\n{}",
            content
        ),
    }
}

/// Prompt for a raw wire tag, falling back to the generic template
pub fn build_prompt_for_tag(tag: &str, content: &str) -> PromptPair {
    match tag.parse::<TransformationType>() {
        Ok(transformation_type) => build_prompt(transformation_type, content),
        Err(_) => build_generic_prompt(content),
    }
}

/// Legal runs cooler; mind maps get a larger output budget
pub fn generation_settings(tag: &str) -> GenerationSettings {
    let temperature = if tag == "legal" { 0.3 } else { 0.7 };
    let max_output_tokens = if tag == "mindmap" { 3000 } else { 2048 };

    GenerationSettings::default()
        .with_temperature(temperature)
        .with_max_output_tokens(max_output_tokens)
        .with_safety()
}

// ============================================================================
// File processor
// ============================================================================

const FILE_DEFAULT_INSTRUCTION: &str = "Analyze and transform the following content in a helpful way.";

/// Instruction for a stored file; unknown tags use the caller's custom
/// prompt when one is given
pub fn file_instruction(tag: &str, custom_prompt: Option<&str>) -> String {
    match tag {
        "summary" => "You are an expert at creating concise, accurate summaries. Analyze the content and provide a clear summary with key points.".to_string(),
        "mindmap" => "You are an expert at creating visual mind maps. Convert the content into a hierarchical mind map structure using emojis and indentation.".to_string(),
        "podcast" => "You are an expert podcast scriptwriter. Convert the content into an engaging podcast script with natural dialogue and storytelling.".to_string(),
        "notes" => "You are an expert at creating study materials. Convert the content into well-organized study notes with key concepts, definitions, and questions.".to_string(),
        _ => custom_prompt
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(FILE_DEFAULT_INSTRUCTION)
            .to_string(),
    }
}

pub fn build_file_prompt(tag: &str, custom_prompt: Option<&str>, content: &str) -> String {
    format!(
        "{}\n\nContent to transform:\n{}",
        file_instruction(tag, custom_prompt),
        content
    )
}

// ============================================================================
// Chat
// ============================================================================

const CHAT_FALLBACK_SUFFIX: &str = "Please provide a helpful and accurate answer to the user's question. If you don't know something, say so clearly.";

/// System message, then prior turns, then the new question
pub fn build_chat_messages(
    question: &str,
    context: Option<&str>,
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let guidance = match context.filter(|c| !c.is_empty()) {
        Some(context) => format!("Use this context to answer questions: {}", context),
        None => "Answer questions clearly and helpfully.".to_string(),
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(format!(
        "You are an AI assistant helping users understand content. {}",
        guidance
    )));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(question));
    messages
}

/// Flattens a conversation into one prompt for single-turn providers
pub fn flatten_conversation(messages: &[ChatMessage]) -> String {
    let conversation = messages
        .iter()
        .map(|msg| format!("{}: {}", msg.role, msg.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{}\n\n{}", conversation, CHAT_FALLBACK_SUFFIX)
}
