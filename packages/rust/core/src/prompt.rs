//! Prompt assembly for listing extraction. Pure string building.

use std::fmt::Write as _;

use toolscout_shared::ControlledVocabulary;

/// Appended when page content is cut at the character limit.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Inputs for [`build_prompt`].
#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    /// URL as submitted.
    pub url: &'a str,
    /// Name guessed from the hostname, if any.
    pub tool_name: Option<&'a str>,
    /// Sanitized page content (HTML or Markdown). May be empty.
    pub content: &'a str,
    pub vocabulary: &'a ControlledVocabulary,
    /// Character limit for `content`.
    pub max_content_chars: usize,
}

/// Fixed role instruction sent as the system message.
pub fn system_prompt() -> &'static str {
    "You are an analyst for a curated directory of software tools. \
     You read a product website and describe the product accurately and neutrally \
     for people deciding whether to use it. Only state what the page supports; \
     leave a field empty rather than guessing. Respond with JSON only."
}

/// Cut `content` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was removed.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let mut truncated = String::with_capacity(byte_index + TRUNCATION_MARKER.len());
            truncated.push_str(&content[..byte_index]);
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => content.to_string(),
    }
}

/// Build the user prompt: field guidance, allowed labels, then page content.
pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let mut prompt = String::with_capacity(input.content.len().min(input.max_content_chars) + 4096);

    let _ = writeln!(prompt, "Describe the software tool at {}.", input.url);
    if let Some(name) = input.tool_name {
        let _ = writeln!(
            prompt,
            "Its name is probably \"{name}\" (from the hostname); use the name the page itself uses if it differs."
        );
    }

    prompt.push_str(FIELD_GUIDE);

    push_allowed(&mut prompt, "categories", &input.vocabulary.categories);
    push_allowed(&mut prompt, "tags", &input.vocabulary.tags);
    if !input.vocabulary.core_technologies.is_empty() {
        push_allowed(
            &mut prompt,
            "core technologies",
            &input.vocabulary.core_technologies,
        );
    }

    prompt.push_str("\nWEBSITE CONTENT:\n");
    if input.content.trim().is_empty() {
        prompt.push_str(
            "(The page could not be read. Base your answer on the URL and the tool name; \
             leave fields empty when unsure.)\n",
        );
    } else {
        prompt.push_str(&truncate_content(input.content, input.max_content_chars));
        prompt.push('\n');
    }

    prompt
}

fn push_allowed(prompt: &mut String, label: &str, values: &[String]) {
    let _ = writeln!(prompt, "\nALLOWED {}:", label.to_uppercase());
    if values.is_empty() {
        let _ = writeln!(prompt, "(none; leave {label} empty)");
        return;
    }
    for value in values {
        let _ = writeln!(prompt, "- {value}");
    }
}

const FIELD_GUIDE: &str = r#"
Return a JSON object with these fields:
- name: product name as the vendor writes it.
- oneLiner: tagline under 100 characters. Default "".
- whatItDoes: one paragraph on what the tool does and how. Default "".
- bestFor: 3-5 short phrases naming who benefits most. Default [].
- keyFeatures: 3-8 short phrases. Default [].
- pros: 2-5 strengths. Default [].
- cons: 2-5 weaknesses or limitations. Default [].
- useThisIf: situations where this tool is the right pick. Default [].
- skipThisIf: situations where something else fits better. Default [].
- pricingSnapshot: { hasFreeTier, hasPaidPlans, isOpenSource } each "yes", "no" or "unknown" (default "unknown"), and notes: one sentence on pricing (default "").
- setupTime: "minutes", "hours" or "days" until a first useful result. Default "minutes".
- learningCurve: "easy", "moderate" or "steep". Default "moderate".
- alternatives: up to 5 { name, reason } naming competing tools. Default [].
- faq: 3-5 { question, answer } a prospective user would ask. Default [].
- tags: chosen ONLY from the allowed tags below, spelled exactly as listed. Default [].
- category: exactly ONE value from the allowed categories below, spelled exactly as listed. Default "".
- description: two or three sentence summary. Default "".
- introduction: Markdown introduction split into short sections headed with ##. Default "".
- categories: allowed categories that apply, spelled exactly as listed. Default [].
- coreTechnologies: chosen ONLY from the allowed core technologies below. Default [].
- image: absolute URL of a screenshot or social preview image found on the page, or null.
- icon: absolute URL of the logo or favicon found on the page, or null.
Never invent tags, categories or core technologies that are not listed.
"#;
