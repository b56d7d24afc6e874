//! Prompt templates for detection, extraction, translation and summarization

/// Prompt builder for document processing
pub struct PromptBuilder;

impl PromptBuilder {
    /// Structured JSON extraction with full translation
    pub fn build_json_prompt(text: &str, target_language: &str) -> String {
        format!(
            r#"
Please analyze the following document text.

Instructions:
1. Detect the original language automatically.
2. Translate all text into {target_language}.
3. Provide the result in this exact JSON format (valid JSON, no extra text outside the JSON):

{{
  "doc_type": "auto-detected document type (e.g., invoice, contract, letter, etc.)",
  "metadata": {{
    "detected_language": "ISO language code (e.g., 'ja', 'zh', 'ko', 'en')",
    "confidence": float_between_0_and_1
  }},
  "entities": {{
    // Extract all identifiable information as key-value pairs
    // Use descriptive keys written in {target_language}
  }},
  "full_translated_text": "Full translation of the document in {target_language}"
}}

4. Preserve numbers, dates, and currency formats exactly as in the original.
5. If any content is unreadable, replace it with "[unreadable]".
6. Include all readable information from the document without summarizing or omitting.

Document text:
{text}
"#,
            target_language = target_language,
            text = text
        )
    }

    /// Plain translation, used per page for the translated PDF
    pub fn build_translate_prompt(text: &str, target_language: &str) -> String {
        format!(
            r#"
You are a professional document translator.

Instructions:
1. Detect the original language automatically.
2. Translate the entire document into {target_language}.
3. Maintain the original document's formatting as much as possible.
4. Only translate text; do not alter non-text elements.

Document text:
{text}
"#,
            target_language = target_language,
            text = text
        )
    }

    /// Detailed summary in the target language
    pub fn build_summary_prompt(text: &str, target_language: &str) -> String {
        format!(
            r#"
You are a professional summarizer.

Instructions:
1. Detect the document's original language automatically.
2. Generate a **detailed summary** in {target_language}.
3. Do not omit important details (names, dates, amounts).
4. Keep the summary concise but complete.

Document text:
{text}
"#,
            target_language = target_language,
            text = text
        )
    }

    /// Language detection answered as a small JSON object
    pub fn build_detect_language_prompt(text: &str) -> String {
        format!(
            r#"
Please analyze the following document text and detect its original language.

Instructions:
1. Identify the language of the text.
2. Provide the result in JSON format:
{{
    "detected_language": "A string containing the full name of the language followed by its ISO 639-1 code in parentheses (e.g., "Japanese (ja)", "Chinese (zh)", "Korean (ko)", "English (en)")",
    "confidence": float_between_0_and_1
}}

3. Only include the JSON object in your response.

Document text:
{text}
"#,
            text = text
        )
    }

    /// Fill `{text}` and `{target_language}` in a user-supplied template
    pub fn apply_custom_instructions(template: &str, text: &str, target_language: &str) -> String {
        template
            .replace("{text}", text)
            .replace("{target_language}", target_language)
    }

    /// Custom template when given, built-in prompt otherwise
    pub fn custom_or(
        custom: Option<&str>,
        text: &str,
        target_language: &str,
        builtin: fn(&str, &str) -> String,
    ) -> String {
        match custom {
            Some(template) => Self::apply_custom_instructions(template, text, target_language),
            None => builtin(text, target_language),
        }
    }
}
