use regex::Regex;

use crate::models::Priority;

#[derive(Debug, PartialEq)]
pub struct ParsedTask {
    pub title: String,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
}

fn priority_token(token: &str) -> Option<Priority> {
    match token.to_ascii_lowercase().as_str() {
        "low" | "1" => Some(Priority::Low),
        "medium" | "2" => Some(Priority::Medium),
        "high" | "3" => Some(Priority::High),
        _ => None,
    }
}

/// Pulls `!priority` and `#tag` tokens out of a quick-add title.
pub fn parse_task_input(input: &str) -> ParsedTask {
    let priority_re = Regex::new(r"!(\w+)\s*").expect("static regex");
    let tag_re = Regex::new(r"(?:^|\s)#([\w-]+)").expect("static regex");

    let mut priority = None;

    // Priority
    for caps in priority_re.captures_iter(input) {
        if let Some(token) = caps.get(1) {
            if priority.is_none() {
                priority = priority_token(token.as_str());
            }
        }
    }

    // Tags
    let mut tags: Vec<String> = Vec::new();
    for caps in tag_re.captures_iter(input) {
        if let Some(tag) = caps.get(1) {
            let tag = tag.as_str().to_string();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }

    let title = priority_re.replace_all(input, " ");
    let title = tag_re.replace_all(&title, " ");

    let title = Regex::new(r"\s+")
        .expect("static regex")
        .replace_all(&title, " ")
        .trim()
        .to_string();

    ParsedTask {
        title,
        priority,
        tags,
    }
}
