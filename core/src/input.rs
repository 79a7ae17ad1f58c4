use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::model::task::TaskDraft;

/// Metadata keys understood by [`draft_from_args`]. Any unambiguous prefix
/// works, so `m:`, `mes:` and `message:` are the same key.
pub const DRAFT_KEYS: [&str; 3] = ["message", "at", "priority"];

const KEY_ALIASES: [(&str, &str); 2] = [("msg", "message"), ("time", "at")];

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub name: String,
    pub metadata: HashMap<String, String>,
}

/// Splits `word word key:value` tokens into a name and metadata.
///
/// Only alphabetic keys count as metadata, so `10:30` stays part of the name.
/// An underscore in a value stands for a space.
pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut name_parts = Vec::new();
    let mut metadata = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic()) {
                metadata.insert(key.to_lowercase(), value.replace('_', " "));
                continue;
            }
        }
        name_parts.push(arg.as_str());
    }

    ParsedInput {
        name: name_parts.join(" "),
        metadata,
    }
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(anyhow!("Unknown key: '{}'", key)),
        _ => Err(anyhow!("Ambiguous key: '{}' matches {:?}", key, matches)),
    }
}

/// Builds an add candidate from command-line style tokens, e.g.
/// `Pay rent msg:transfer_to_landlord at:+2h pri:h`.
///
/// Unknown or ambiguous keys are errors. Missing values are left empty so
/// that validation can report them.
pub fn draft_from_args(args: &[String]) -> Result<TaskDraft> {
    let parsed = parse_args(args);
    let mut draft = TaskDraft {
        title: parsed.name,
        ..TaskDraft::default()
    };

    for (key, value) in parsed.metadata {
        let key = KEY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map_or(key.as_str(), |(_, target)| target);
        match expand_key(key, &DRAFT_KEYS)?.as_str() {
            "message" => draft.message = value,
            "at" => draft.reminder_time = value,
            "priority" => draft.priority = value,
            _ => {}
        }
    }
    Ok(draft)
}
