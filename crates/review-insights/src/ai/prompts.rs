//! Prompt builders for each analysis request.
//!
//! Every prompt asks for plain text without markdown so that results can be
//! dropped straight into reports.

use crate::types::{SegmentSummary, Summary};

const NO_CONTEXT: &str = "No context provided.";

/// Number of review characters included when suggesting questions.
pub const QUESTION_SAMPLE_CHARS: usize = 2000;

/// True when the language setting asks the model to detect the language.
pub fn is_auto_detect(language: &str) -> bool {
    language.trim().eq_ignore_ascii_case("auto-detect")
}

/// "the same language as <fallback>" for auto-detect, else the language itself.
fn target_language(language: &str, fallback: &str) -> String {
    if is_auto_detect(language) {
        format!("the same language as {fallback}")
    } else {
        language.to_string()
    }
}

fn context_or_default(context: &str) -> &str {
    if context.trim().is_empty() {
        NO_CONTEXT
    } else {
        context
    }
}

fn pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// First `max_chars` characters of `text`, on a char boundary.
fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn summary_prompt(reviews: &str, language: &str, context: &str) -> String {
    let language_step = if is_auto_detect(language) {
        "First, automatically detect the predominant language of the customer reviews. \
         All subsequent analysis and the final summary must be in this detected language."
            .to_string()
    } else {
        format!(
            "First, identify the primary language of the reviews. If it is not {language}, \
             mentally translate them before analysis. The final summary must be written in {language}."
        )
    };

    format!(
        "You are a world-class expert in customer feedback analysis for a global company. \
You have been provided with some background context about the product or service being reviewed. \
Use this context to better understand the customer feedback.

--- CONTEXT ---
{context}
--- END CONTEXT ---

Analyze the customer reviews below and produce a clear, concise and insightful summary:
1. Language handling: {language_step}
2. Key points:
   - Pros: positive points, compliments and aspects customers liked.
   - Cons: negative points, complaints and areas for improvement.
   - Common themes: recurring topics, features or issues mentioned across multiple reviews.
3. Sentiment: count how many reviews are clearly positive, negative and neutral. \
A neutral review states facts or balances mild pros and cons.
4. Actionable insights: from the themes and cons, infer 1 to 3 root causes. \
For each, suggest a concrete step the company can take.
5. Top keywords: the 10-15 most frequently mentioned specific nouns or noun phrases \
(e.g. \"battery life\", \"customer service\"). Exclude generic words like \"product\", \"item\", \
\"review\" or \"thing\". Give each keyword's frequency, sorted from most to least frequent.

Customer review data:
---
{reviews}
---

Return the complete summary as a single JSON object. All string values must be plain text \
without markdown characters (*, **, _, #). Do not include any text outside the JSON object.",
        context = context_or_default(context),
    )
}

pub fn strategy_prompt(summary: &Summary, language: &str) -> String {
    format!(
        "You are a seasoned data analyst and business strategist. Using the customer feedback \
summary below, write a high-level strategic analysis for a customer service team.

---
{summary}
---

Write the analysis in {language}. Include:
1. Overview: the overall customer sentiment and key takeaways.
2. Key focus area: the single most critical theme or problem from the cons and themes \
that requires immediate attention.
3. Strategic steps: 2-3 high-level next steps for the customer team.
4. Rationale: for each step, why it matters and how it addresses the data.

Return a single JSON object. All string values must be plain text without markdown \
characters (*, **, _, #). Do not include any text outside the JSON object.",
        summary = pretty_json(summary),
        language = target_language(language, "the provided summary data"),
    )
}

pub fn trend_prompt(
    start: &Summary,
    end: &Summary,
    start_label: &str,
    end_label: &str,
    language: &str,
) -> String {
    format!(
        "You are an expert business analyst specializing in customer feedback trends. \
You have two summaries of customer feedback from two periods or sources.

The first summary, labeled \"{start_label}\":
--- START SUMMARY ---
{start}
--- END START SUMMARY ---

The second summary, labeled \"{end_label}\":
--- END SUMMARY ---
{end}
--- END END SUMMARY ---

Perform a comparative trend analysis in {language}:
1. Narrative summary: 2-3 sentences on the key changes between \"{start_label}\" and \
\"{end_label}\", including sentiment shifts and new or disappearing themes.
2. New issues: cons or negative themes present in \"{end_label}\" but NOT in \"{start_label}\".
3. Resolved issues: cons or negative themes from \"{start_label}\" that are NO LONGER \
present in \"{end_label}\".
4. Persistent themes: significant themes (positive or negative) present in BOTH summaries.

Return a single JSON object. All string values must be plain text without markdown characters.",
        start = pretty_json(start),
        end = pretty_json(end),
        language = target_language(language, "the provided summaries"),
    )
}

pub fn persona_prompt(summaries: &[SegmentSummary<'_>], language: &str) -> String {
    format!(
        "You are a market research analyst. Below are customer feedback summaries, one per \
customer segment (persona). Compare them to highlight what sets each segment apart.

--- DATA ---
{data}
--- END DATA ---

Write the analysis in {language} as a single JSON object:
1. Overview: 2-3 sentences on the most significant differences or similarities across segments.
2. Segment differentiators: for each segment, 2-3 feedback points that are unique to it or \
clearly more prominent than in the other segments.

Focus on contrast and uniqueness. Do not just list pros and cons; explain what makes each \
segment different from the others.",
        data = pretty_json(summaries),
        language = target_language(language, "the provided summaries"),
    )
}

pub fn deep_dive_prompt(reviews: &str, topic: &str, language: &str, context: &str) -> String {
    format!(
        "You are a data analysis AI. Perform a deep-dive analysis of one topic using only the \
customer reviews below.

--- PRODUCT CONTEXT ---
{context}
--- END CONTEXT ---

--- CUSTOMER REVIEWS ---
{reviews}
--- END REVIEWS ---

The topic to analyze is: \"{topic}\"

Return a single JSON object in {language}:
1. Snippets: every direct quote or sentence from the reviews that is clearly about \"{topic}\".
2. Summary: 1-2 sentences on what customers say about \"{topic}\", based only on the snippets.
3. Sentiment: how many snippets are positive, negative and neutral towards \"{topic}\".

All string values must be plain text without markdown characters.",
        context = context_or_default(context),
        language = target_language(language, "the reviews"),
    )
}

pub fn question_prompt(reviews: &str, question: &str, language: &str, context: &str) -> String {
    format!(
        "You are a data analyst assistant. Answer questions using only the customer reviews and \
the product context below. Do not use external knowledge. If the answer cannot be found, say so \
clearly. Answer in plain text without markdown formatting (no asterisks, underscores or bullet points).

--- CONTEXT ---
{context}
--- END CONTEXT ---

--- REVIEWS ---
{reviews}
--- END REVIEWS ---

Answer this question in {language}: \"{question}\"",
        context = context_or_default(context),
        language = target_language(language, "the question"),
    )
}

pub fn suggested_questions_prompt(reviews: &str, context: &str) -> String {
    format!(
        "You are a data analyst AI helping a user explore customer reviews. Based on the product \
context and review sample below, suggest 3 to 4 insightful questions the user could ask.

--- PRODUCT CONTEXT ---
{context}
--- END CONTEXT ---

--- CUSTOMER REVIEWS (sample) ---
{sample}...
--- END REVIEWS ---

The questions should be concise, go beyond simple keyword lookups (ask \"What are the biggest \
complaints about battery life?\" rather than \"What about the battery?\"), and be answerable \
from the review data.

Return a single JSON array of strings with no other text.",
        context = context_or_default(context),
        sample = char_prefix(reviews, QUESTION_SAMPLE_CHARS),
    )
}

pub fn draft_reply_prompt(complaint: &str, language: &str, context: &str) -> String {
    format!(
        "You are an empathetic, highly professional customer service agent.

--- CONTEXT ---
{context}
--- END CONTEXT ---

A customer left this complaint:
--- COMPLAINT ---
\"{complaint}\"
--- END COMPLAINT ---

Draft a concise, helpful, non-robotic reply in {language}, using the context to be specific \
where possible. The reply should:
1. Acknowledge the specific problem and validate the customer's frustration.
2. Apologize for the negative experience.
3. Suggest a next step toward resolution, referring to features or policies from the context \
when relevant.
4. Make no promises that cannot be kept.

Output only the reply as plain text, with no markdown formatting or bullet points.",
        context = context_or_default(context),
        language = target_language(language, "the complaint"),
    )
}

pub fn sample_reviews_prompt() -> String {
    "Generate a realistic sample dataset of 15 customer reviews for a fictional product called \
\"AcoustiMax Pro Headphones\". Use CSV with four columns: \"Reviewer Name\", \"Rating (1-5)\", \
\"Customer Type\" and \"Comment\". For \"Customer Type\" use values like \"New User\", \
\"Power User\", \"Commuter\" and \"Audiophile\". Mix positive, negative and neutral reviews, \
with comments detailed enough to analyze and reflecting each customer type's priorities. \
Output only the raw CSV data including the header row, with no introduction or explanation."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_detect_is_case_insensitive() {
        assert!(is_auto_detect("Auto-detect"));
        assert!(is_auto_detect("auto-detect"));
        assert!(is_auto_detect(" AUTO-DETECT "));
        assert!(!is_auto_detect("German"));
    }

    #[test]
    fn test_summary_prompt_language_handling() {
        let auto = summary_prompt("r1", "Auto-detect", "");
        assert!(auto.contains("automatically detect the predominant language"));
        assert!(auto.contains("No context provided."));

        let german = summary_prompt("r1", "German", "Headphones");
        assert!(german.contains("must be written in German"));
        assert!(german.contains("Headphones"));
        assert!(german.contains("r1"));
    }

    #[test]
    fn test_strategy_prompt_embeds_summary_json() {
        let summary = Summary {
            pros: vec!["Great bass".to_string()],
            ..Default::default()
        };
        let prompt = strategy_prompt(&summary, "Auto-detect");
        assert!(prompt.contains("\"Great bass\""));
        assert!(prompt.contains("the same language as the provided summary data"));
    }

    #[test]
    fn test_trend_prompt_uses_labels() {
        let s = Summary::default();
        let prompt = trend_prompt(&s, &s, "Q1", "Q2", "French");
        assert!(prompt.contains("labeled \"Q1\""));
        assert!(prompt.contains("NOT in \"Q1\""));
        assert!(prompt.contains("in French"));
    }

    #[test]
    fn test_persona_prompt_lists_segments() {
        let s = Summary::default();
        let data = [
            SegmentSummary { segment: "Commuter", summary: &s },
            SegmentSummary { segment: "Audiophile", summary: &s },
        ];
        let prompt = persona_prompt(&data, "Auto-detect");
        assert!(prompt.contains("\"segment\": \"Commuter\""));
        assert!(prompt.contains("\"segment\": \"Audiophile\""));
    }

    #[test]
    fn test_suggested_questions_prompt_truncates_reviews() {
        let reviews = "é".repeat(QUESTION_SAMPLE_CHARS + 500);
        let prompt = suggested_questions_prompt(&reviews, "");
        assert_eq!(prompt.matches('é').count(), QUESTION_SAMPLE_CHARS);
    }

    #[test]
    fn test_question_and_reply_language_fallbacks() {
        assert!(question_prompt("r", "q?", "Auto-detect", "").contains("the same language as the question"));
        assert!(draft_reply_prompt("bad", "Auto-detect", "").contains("the same language as the complaint"));
        assert!(deep_dive_prompt("r", "battery", "Spanish", "").contains("in Spanish"));
    }
}
