//! Response schemas sent with structured requests.
//!
//! Written in the OpenAPI subset understood by the `generateContent`
//! endpoint (`OBJECT`, `ARRAY`, `STRING`, `NUMBER`).

use serde_json::{Value, json};

fn sentiment_schema(description: &str, required: bool) -> Value {
    let mut schema = json!({
        "type": "OBJECT",
        "description": description,
        "properties": {
            "positive": { "type": "NUMBER" },
            "negative": { "type": "NUMBER" },
            "neutral": { "type": "NUMBER" }
        }
    });
    if required {
        schema["required"] = json!(["positive", "negative", "neutral"]);
    }
    schema
}

fn string_list(description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "description": description,
        "items": { "type": "STRING" }
    })
}

pub fn summary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "pros": string_list("A list of positive points and compliments from the reviews."),
            "cons": string_list("A list of negative points and complaints from the reviews."),
            "themes": string_list("A list of recurring topics or common themes mentioned in the reviews."),
            "sentiment": sentiment_schema("A breakdown of review sentiment counts.", false),
            "insights": {
                "type": "ARRAY",
                "description": "A list of actionable insights, including root causes and suggestions.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "cause": { "type": "STRING", "description": "The inferred root cause of an issue." },
                        "suggestion": { "type": "STRING", "description": "A suggested actionable step to address the cause." }
                    }
                }
            },
            "keywords": {
                "type": "ARRAY",
                "description": "A list of the top 10-15 most frequent keywords and their frequencies.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "keyword": { "type": "STRING", "description": "The extracted keyword." },
                        "frequency": { "type": "NUMBER", "description": "How many times the keyword appeared." }
                    },
                    "required": ["keyword", "frequency"]
                }
            }
        },
        "required": ["pros", "cons", "themes", "sentiment", "insights", "keywords"]
    })
}

pub fn strategy_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overview": { "type": "STRING", "description": "A brief, high-level summary of the customer feedback." },
            "keyFocusArea": { "type": "STRING", "description": "The single most critical issue or theme to focus on." },
            "steps": {
                "type": "ARRAY",
                "description": "A list of strategic next steps with their rationale.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "step": { "type": "STRING", "description": "A concrete strategic step for the team." },
                        "rationale": { "type": "STRING", "description": "Why this step is recommended, based on the data." }
                    },
                    "required": ["step", "rationale"]
                }
            }
        },
        "required": ["overview", "keyFocusArea", "steps"]
    })
}

pub fn trend_schema(start_label: &str, end_label: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "A brief narrative summary of the key trends and changes between the two reports."
            },
            "newIssues": string_list(&format!(
                "Negative themes or cons that appeared in the second report (\"{end_label}\") but not the first (\"{start_label}\")."
            )),
            "resolvedIssues": string_list(&format!(
                "Negative themes from the first report (\"{start_label}\") that are no longer present in the second (\"{end_label}\")."
            )),
            "persistentThemes": string_list("Common themes that are present in both reports.")
        },
        "required": ["summary", "newIssues", "resolvedIssues", "persistentThemes"]
    })
}

pub fn deep_dive_schema(topic: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": format!("A concise summary of customer feedback about the topic: {topic}.")
            },
            "snippets": string_list(&format!(
                "A list of direct quotes from reviews that mention the topic: {topic}."
            )),
            "sentiment": sentiment_schema(
                &format!("A sentiment breakdown for only the snippets related to the topic: {topic}."),
                true,
            )
        },
        "required": ["summary", "snippets", "sentiment"]
    })
}

pub fn persona_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overview": { "type": "STRING", "description": "A brief, high-level summary comparing all customer segments." },
            "segmentComparisons": {
                "type": "ARRAY",
                "description": "A list of analyses for each segment, highlighting their unique feedback.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "segment": { "type": "STRING", "description": "The name of the customer segment." },
                        "keyDifferentiators": string_list(
                            "2-3 key feedback points that are unique or most prominent for this segment compared to others."
                        )
                    },
                    "required": ["segment", "keyDifferentiators"]
                }
            }
        },
        "required": ["overview", "segmentComparisons"]
    })
}

pub fn questions_schema() -> Value {
    string_list("A list of 3-4 suggested questions to ask about the review data.")
}
