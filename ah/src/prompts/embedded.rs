//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time. Each
//! agent has a `{agent}-system` and a `{agent}-user` template.

use tracing::debug;

pub const RESEARCH_SYSTEM: &str = include_str!("../../prompts/research-system.pmt");
pub const RESEARCH_USER: &str = include_str!("../../prompts/research-user.pmt");
pub const PLANNER_SYSTEM: &str = include_str!("../../prompts/planner-system.pmt");
pub const PLANNER_USER: &str = include_str!("../../prompts/planner-user.pmt");
pub const RESOURCE_SYSTEM: &str = include_str!("../../prompts/resource-system.pmt");
pub const RESOURCE_USER: &str = include_str!("../../prompts/resource-user.pmt");
pub const REVIEW_SYSTEM: &str = include_str!("../../prompts/review-system.pmt");
pub const REVIEW_USER: &str = include_str!("../../prompts/review-user.pmt");
pub const INTENT_SYSTEM: &str = include_str!("../../prompts/intent-system.pmt");
pub const INTENT_USER: &str = include_str!("../../prompts/intent-user.pmt");
pub const SMALL_TALK_SYSTEM: &str = include_str!("../../prompts/small-talk-system.pmt");
pub const SMALL_TALK_USER: &str = include_str!("../../prompts/small-talk-user.pmt");
pub const MODERATION_SYSTEM: &str = include_str!("../../prompts/moderation-system.pmt");
pub const MODERATION_USER: &str = include_str!("../../prompts/moderation-user.pmt");
pub const QA_SYSTEM: &str = include_str!("../../prompts/qa-system.pmt");
pub const QA_USER: &str = include_str!("../../prompts/qa-user.pmt");
pub const SPRINT_SYSTEM: &str = include_str!("../../prompts/sprint-system.pmt");
pub const SPRINT_USER: &str = include_str!("../../prompts/sprint-user.pmt");
pub const EFFICIENCY_SYSTEM: &str = include_str!("../../prompts/efficiency-system.pmt");
pub const EFFICIENCY_USER: &str = include_str!("../../prompts/efficiency-user.pmt");

/// Names of every embedded template
pub const TEMPLATE_NAMES: &[&str] = &[
    "research-system",
    "research-user",
    "planner-system",
    "planner-user",
    "resource-system",
    "resource-user",
    "review-system",
    "review-user",
    "intent-system",
    "intent-user",
    "small-talk-system",
    "small-talk-user",
    "moderation-system",
    "moderation-user",
    "qa-system",
    "qa-user",
    "sprint-system",
    "sprint-user",
    "efficiency-system",
    "efficiency-user",
];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let prompt = match name {
        "research-system" => RESEARCH_SYSTEM,
        "research-user" => RESEARCH_USER,
        "planner-system" => PLANNER_SYSTEM,
        "planner-user" => PLANNER_USER,
        "resource-system" => RESOURCE_SYSTEM,
        "resource-user" => RESOURCE_USER,
        "review-system" => REVIEW_SYSTEM,
        "review-user" => REVIEW_USER,
        "intent-system" => INTENT_SYSTEM,
        "intent-user" => INTENT_USER,
        "small-talk-system" => SMALL_TALK_SYSTEM,
        "small-talk-user" => SMALL_TALK_USER,
        "moderation-system" => MODERATION_SYSTEM,
        "moderation-user" => MODERATION_USER,
        "qa-system" => QA_SYSTEM,
        "qa-user" => QA_USER,
        "sprint-system" => SPRINT_SYSTEM,
        "sprint-user" => SPRINT_USER,
        "efficiency-system" => EFFICIENCY_SYSTEM,
        "efficiency-user" => EFFICIENCY_USER,
        _ => {
            debug!("get_embedded: no match found");
            return None;
        }
    };
    Some(prompt)
}
