//! Prompt schemas for MOM extraction.
//!
//! The five sections of a Meeting Minutes document and their column sets are
//! declared once, in [`SECTIONS`]. Both prompt variants are rendered from these
//! constants, so the full-document and topics-only endpoints can never ask the
//! model for different field names.
//!
//! Unit tests import the rendered prompts directly, which makes prompt
//! regressions visible without calling a model.

use std::fmt::Write;

/// One table section of a MOM document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Top-level key in the JSON result.
    pub key: &'static str,
    /// Heading as printed in the document.
    pub heading: &'static str,
    /// Column names, in document order. Each becomes a row-object key.
    pub fields: &'static [&'static str],
}

pub const MEETING_MOM: Section = Section {
    key: "meeting_mom",
    heading: "MEETING MOM",
    fields: &[
        "Meeting Reference",
        "Purpose of the Meeting",
        "Location",
        "Meeting starting date",
        "Meeting end date",
        "No of Attendance",
        "Quorum",
        "Rapporteur",
        "Chairperson",
    ],
};

pub const ATTENDEES: Section = Section {
    key: "attendees",
    heading: "ATTENDEES",
    fields: &["Name", "Title", "Company / Organization"],
};

pub const APOLOGIZE_FOR_ATTENDANCE: Section = Section {
    key: "apologize_for_attendance",
    heading: "APOLOGIZE FOR ATTENDANCE",
    fields: &["Name", "Title", "Company / Organization", "Comment"],
};

/// The "In‐charge" column uses U+2010 HYPHEN, matching the source documents.
pub const TOPICS_COVERED: Section = Section {
    key: "topics_covered",
    heading: "TOPICS COVERED",
    fields: &[
        "Topic",
        "Discussion",
        "Recommendation",
        "In\u{2010}charge",
        "Start Date",
        "Voting result",
    ],
};

pub const REQUIRED_SIGNATURES: Section = Section {
    key: "required_signatures",
    heading: "REQUIRED SIGNATURES",
    fields: &["Rapporteur", "Chairperson"],
};

/// All sections in document order.
pub const SECTIONS: [Section; 5] = [
    MEETING_MOM,
    ATTENDEES,
    APOLOGIZE_FOR_ATTENDANCE,
    TOPICS_COVERED,
    REQUIRED_SIGNATURES,
];

pub const TEXT_START_MARKER: &str = "--- START OF TEXT ---";
pub const TEXT_END_MARKER: &str = "--- END OF TEXT ---";

/// Rules shared by both variants: completeness over brevity.
const EXTRACTION_RULES: &[&str] = &[
    "Only extract structured tabular data from the relevant sections.",
    "Do not stop until you have extracted **all available rows** from each section.",
    "Continue extracting until the end of the provided text.",
    "Do not summarize or omit any repeating rows.",
    "Extract and return **each topic or row individually**, even if they appear repetitive.",
    "If the number of rows is long, continue generating until all rows are processed.",
    "It is acceptable to return a long JSON. Do not summarize or truncate data.",
];

/// Rules only meaningful for the five-section mapping.
const FULL_DOCUMENT_RULES: &[&str] = &[
    "Maintain the section order and hierarchy as listed above.",
    "Each section should be a separate top-level key in the JSON.",
    "If a section is missing, include an empty array for that section.",
];

/// Rules only meaningful for the bare topics array.
const TOPICS_ONLY_RULES: &[&str] = &[
    "Do NOT summarize or merge rows. Extract every topic row separately.",
    "If a field is missing, return it as an empty string.",
    "Return valid JSON array with one object per topic.",
];

/// Which schema the model is asked to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// All five sections, returned as a keyed object.
    FullDocument,
    /// Only the TOPICS COVERED rows, returned as a bare array.
    TopicsOnly,
}

/// A system/user prompt pair ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt pair for `variant`, embedding `text` verbatim.
pub fn build_prompt(variant: PromptVariant, text: &str) -> Prompt {
    match variant {
        PromptVariant::FullDocument => Prompt {
            system: full_document_system_prompt(),
            user: full_document_user_prompt(text),
        },
        PromptVariant::TopicsOnly => Prompt {
            system: topics_only_system_prompt(),
            user: topics_only_user_prompt(text),
        },
    }
}

fn push_bullets(out: &mut String, indent: &str, items: &[&str]) {
    for item in items {
        let _ = writeln!(out, "{indent}- {item}");
    }
}

fn push_quoted_bullets(out: &mut String, indent: &str, items: &[&str]) {
    for item in items {
        let _ = writeln!(out, "{indent}- \"{item}\"");
    }
}

fn fenced_text(text: &str) -> String {
    format!("{TEXT_START_MARKER}\n{text}\n{TEXT_END_MARKER}\n")
}

/// System prompt enumerating all five sections and their keys.
pub fn full_document_system_prompt() -> String {
    let mut s = String::with_capacity(2048);
    s.push_str(
        "You are a structured data extraction assistant that analyzes Meeting Minutes (MOM) \
PDF documents containing consistently formatted tables and sections. Your task is to extract \
tabular content from the following predefined sections and return it in a clean, structured \
JSON format.\n\n",
    );

    s.push_str("The PDF document may contain the following sections:\n");
    for (i, section) in SECTIONS.iter().enumerate() {
        let _ = writeln!(s, "{}. {}", i + 1, section.heading);
    }

    s.push_str(
        "\nFor each section, map each table column accurately to its corresponding JSON key \
as described below:\n\n",
    );
    for section in SECTIONS.iter() {
        let _ = writeln!(s, "- {}", section.heading);
        s.push_str("JSON Keys:\n");
        push_quoted_bullets(&mut s, "    ", section.fields);
        s.push('\n');
    }

    s.push_str("Important Instructions:\n");
    push_bullets(&mut s, "", &EXTRACTION_RULES[..1]);
    push_bullets(&mut s, "", FULL_DOCUMENT_RULES);
    push_bullets(&mut s, "", &EXTRACTION_RULES[1..]);

    s.push_str("\nReturn your response in the following JSON structure:\n\n```json\n{\n");
    let keys: Vec<String> = SECTIONS
        .iter()
        .map(|section| format!("\"{}\": [...]", section.key))
        .collect();
    s.push_str(&keys.join(",\n"));
    s.push_str("\n}\n```\n");
    s
}

/// User prompt for the full-document variant.
pub fn full_document_user_prompt(text: &str) -> String {
    let mut s = String::with_capacity(text.len() + 1024);
    s.push_str(
        "Below is the full extracted text from a Meeting MOM PDF document. Based on the \
structure and section rules shared earlier, extract all available sections and convert them \
to structured JSON format.\n\n",
    );
    s.push_str("Make sure that:\n");
    push_bullets(
        &mut s,
        "",
        &[
            "Each section is represented by its own top-level key in the output.",
            "Each row from a table is converted to a dictionary using the predefined JSON keys.",
            "The output follows the exact JSON schema described in your system instructions.",
            "Omit any non-tabular free-text content unless it's part of a section's table row.",
        ],
    );
    s.push('\n');
    s.push_str(&fenced_text(text));
    s
}

/// System prompt covering only the TOPICS COVERED rows.
pub fn topics_only_system_prompt() -> String {
    let section = TOPICS_COVERED;
    let mut s = String::with_capacity(1536);
    s.push_str(
        "You are an intelligent assistant that extracts structured information from PDFs.\n",
    );
    let _ = writeln!(
        s,
        "Focus only on the '{}' section of a meeting minutes document.\n",
        section.heading
    );
    s.push_str(
        "Extract all topics listed under this section, and return each as a structured JSON \
object with the following keys:\n",
    );
    push_quoted_bullets(&mut s, "", section.fields);

    s.push_str("\nRules:\n");
    push_bullets(&mut s, "", TOPICS_ONLY_RULES);
    push_bullets(&mut s, "", EXTRACTION_RULES);

    s.push_str("\nExample Output:\n[\n    {\n");
    let example: Vec<String> = section
        .fields
        .iter()
        .map(|field| format!("        \"{field}\": \"...\""))
        .collect();
    s.push_str(&example.join(",\n"));
    s.push_str("\n    },\n    ...\n]\n");
    s
}

/// User prompt for the topics-only variant.
pub fn topics_only_user_prompt(text: &str) -> String {
    let mut s = String::with_capacity(text.len() + 512);
    s.push_str("Below is the extracted text from a PDF MOM document.\n\n");
    let _ = writeln!(
        s,
        "Your task is to extract the complete '{}' section, row by row, **starting at '{}' \
and ending just before '{}'**.\n",
        TOPICS_COVERED.heading, TOPICS_COVERED.heading, REQUIRED_SIGNATURES.heading
    );
    s.push_str(
        "Each row should be extracted and mapped to a JSON object with the specified fields.\n\n",
    );
    s.push_str("Return your result as a JSON array, with one object per topic.\n\n");
    s.push_str(&fenced_text(text));
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_keys_are_unique_and_ordered() {
        let keys: Vec<&str> = SECTIONS.iter().map(|s| s.key).collect();
        assert_eq!(
            keys,
            vec![
                "meeting_mom",
                "attendees",
                "apologize_for_attendance",
                "topics_covered",
                "required_signatures"
            ]
        );
    }

    #[test]
    fn full_system_prompt_lists_every_field() {
        let prompt = full_document_system_prompt();
        for section in SECTIONS.iter() {
            assert!(prompt.contains(section.heading), "missing {}", section.heading);
            assert!(prompt.contains(&format!("\"{}\": [...]", section.key)));
            for field in section.fields {
                assert!(prompt.contains(&format!("\"{field}\"")), "missing {field}");
            }
        }
        assert!(prompt.contains("include an empty array"));
    }

    #[test]
    fn topics_prompt_uses_same_fields_as_full_prompt() {
        let full = full_document_system_prompt();
        let topics = topics_only_system_prompt();
        for field in TOPICS_COVERED.fields {
            let quoted = format!("\"{field}\"");
            assert!(full.contains(&quoted));
            assert!(topics.contains(&quoted));
        }
        assert!(topics.contains("In\u{2010}charge"));
        assert!(!topics.contains("\"Quorum\""));
    }

    #[test]
    fn user_prompt_embeds_text_between_markers() {
        let text = "TOPICS COVERED\nBudget | Approved\nREQUIRED SIGNATURES";
        for variant in [PromptVariant::FullDocument, PromptVariant::TopicsOnly] {
            let prompt = build_prompt(variant, text);
            let start = prompt.user.find(TEXT_START_MARKER).unwrap();
            let end = prompt.user.find(TEXT_END_MARKER).unwrap();
            let inner = &prompt.user[start + TEXT_START_MARKER.len() + 1..end - 1];
            assert_eq!(inner, text);
        }
    }

    #[test]
    fn topics_user_prompt_names_boundaries() {
        let prompt = topics_only_user_prompt("");
        assert!(prompt.contains("starting at 'TOPICS COVERED'"));
        assert!(prompt.contains("just before 'REQUIRED SIGNATURES'"));
    }

    #[test]
    fn empty_text_still_has_markers() {
        let prompt = build_prompt(PromptVariant::FullDocument, "");
        assert!(prompt
            .user
            .contains(&format!("{TEXT_START_MARKER}\n\n{TEXT_END_MARKER}")));
    }
}
