//! Prompt builder for batch title annotation.
//!
//! [`PromptBuilder`] renders one instruction string per batch.  The rendering
//! is deterministic: the same batch always produces the same prompt.  Two
//! things in the prompt carry the alignment contract the reconciler depends
//! on — the exact entry count, and the demand that the reply array keep the
//! input order.  Identifiers never appear in the prompt; they are re-attached
//! locally after the reply is parsed.

use crate::source::TitleRecord;

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

/// Fixed persona sent as the system message with every request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a highly skilled Tibetan language expert with deep knowledge of \
Tibetan grammar, orthography, and translation. You excel at detailed \
linguistic analysis and accurate translation.";

// ---------------------------------------------------------------------------
// Instruction template
// ---------------------------------------------------------------------------

/// Built-in instruction template.  `{count}` and `{titles}` are substituted
/// at build time; the braces in the schema block are literal.
const DEFAULT_TEMPLATE: &str = "\
For each of the following {count} Tibetan titles, provide:
1. Spelling correction of the Tibetan text if needed
2. Linguistic analysis including:
   - Syntactic structure (identify the main noun phrases, verb phrases, and their relationships)
   - Key lexical components (identify important terms and technical vocabulary)
   - Any grammatical particles and their function
3. English translation based on this analysis

Reply with a pure JSON array and nothing else — no prose, no code fences.
The array must contain exactly {count} objects, one per title, in the same
order as the input array below. Each object must have this structure:
{
    \"original\": \"original Tibetan text\",
    \"corrected\": \"corrected Tibetan text (if different from original)\",
    \"analysis\": {
        \"syntax\": \"syntactic analysis\",
        \"lexical\": \"lexical analysis\",
        \"particles\": \"particle analysis\"
    },
    \"translation\": \"English translation\"
}

Tibetan titles to analyze:
{titles}";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the per-batch instruction string.
///
/// # Example
/// ```rust
/// use tibetan_titles::llm::PromptBuilder;
/// use tibetan_titles::source::TitleRecord;
///
/// let batch = vec![TitleRecord {
///     book_id: "W100".into(),
///     title: "bod kyi lo rgyus".into(),
/// }];
/// let prompt = PromptBuilder::new().build(&batch);
/// assert!(prompt.contains("bod kyi lo rgyus"));
/// ```
pub struct PromptBuilder {
    template: String,
}

impl PromptBuilder {
    /// Create a builder using the built-in instruction template.
    pub fn new() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Create a builder with a custom template.
    ///
    /// The template must contain the `{count}` and `{titles}` placeholders;
    /// anything else is passed through verbatim.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render the instruction for `batch`.
    ///
    /// The titles are embedded as a JSON-encoded array in batch order, so the
    /// reply order is specified to equal the input order.
    pub fn build(&self, batch: &[TitleRecord]) -> String {
        let titles: Vec<&str> = batch.iter().map(|r| r.title.as_str()).collect();
        // Serialising a Vec<&str> cannot fail.
        let titles_json =
            serde_json::to_string_pretty(&titles).unwrap_or_else(|_| "[]".to_string());

        self.template
            .replace("{count}", &batch.len().to_string())
            .replace("{titles}", &titles_json)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
