use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tera::{Context, Error as TeraError, Tera};

use crate::models::tool::Tool;

const SYSTEM_PROMPT: &str = include_str!("prompts/system.md");
const SYSTEM_PROMPT_CONCISE: &str = include_str!("prompts/system_concise.md");

/// Which system instruction the agent runs with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// Full product instructions, including the mandatory greeting
    #[default]
    Full,
    Concise,
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(PromptStyle::Full),
            "concise" => Ok(PromptStyle::Concise),
            other => Err(format!("unknown prompt style: {}", other)),
        }
    }
}

#[derive(Serialize)]
struct ToolInfo<'a> {
    name: &'a str,
    description: &'a str,
}

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

/// Render the system instruction for the given tools
pub fn render_system_prompt(style: PromptStyle, tools: &[Tool]) -> Result<String, TeraError> {
    let template = match style {
        PromptStyle::Full => SYSTEM_PROMPT,
        PromptStyle::Concise => SYSTEM_PROMPT_CONCISE,
    };
    let tools: Vec<ToolInfo> = tools
        .iter()
        .map(|tool| ToolInfo {
            name: &tool.name,
            description: &tool.description,
        })
        .collect();

    let mut context = std::collections::HashMap::new();
    context.insert("tools", tools);
    load_prompt(template, &context)
}
