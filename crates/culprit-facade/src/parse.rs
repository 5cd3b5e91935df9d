//! The free-text entry point: a fixed table of regular-expression
//! grammars, each building the same typed parameters the keyword entry
//! point takes. Matching is all-or-nothing; nothing executes on a miss.

use regex::{Captures, Regex};
use serde_json::{json, Value};

type ParamBuilder = fn(&Captures) -> Value;

struct Grammar {
    regex: Regex,
    tool: &'static str,
    usage: &'static str,
    build: ParamBuilder,
}

/// Immutable grammar table, constructed once and owned by the facade.
pub struct CommandParser {
    grammars: Vec<Grammar>,
}

impl CommandParser {
    pub fn standard() -> Self {
        let grammar = |pattern: &str, tool: &'static str, usage: &'static str, build: ParamBuilder| Grammar {
            // The table is fixed, so a bad pattern is a programming error
            // caught by the unit tests below.
            regex: Regex::new(pattern).expect("grammar regex"),
            tool,
            usage,
            build,
        };

        Self {
            grammars: vec![
                grammar(
                    r"^hunt_regression\s+(\d+)(?:\s+(.+))?$",
                    "hunt_regression",
                    "hunt_regression <days> [pattern]",
                    |caps| {
                        json!({
                            "days_ago": caps[1].parse::<u64>().unwrap_or(u64::MAX),
                            "pattern": caps.get(2).map(|m| m.as_str()),
                        })
                    },
                ),
                grammar(
                    r"^list_commits\s+(\d+)$",
                    "list_commits",
                    "list_commits <days>",
                    |caps| json!({ "days_ago": caps[1].parse::<u64>().unwrap_or(u64::MAX) }),
                ),
                grammar(
                    r"^check_commit\s+(\S+)\s+(.+)$",
                    "check_commit",
                    "check_commit <hash> <pattern>",
                    |caps| json!({ "hash": &caps[1], "pattern": &caps[2] }),
                ),
                grammar(
                    r"^branch_create(?:\s+(.+))?$",
                    "branch_create",
                    "branch_create [description]",
                    |caps| json!({ "description": caps.get(1).map_or("", |m| m.as_str()) }),
                ),
                grammar(
                    r"^branch_list$",
                    "branch_list",
                    "branch_list",
                    |_| json!({}),
                ),
                grammar(
                    r"^branch_cleanup(?:\s+(--force|force))?$",
                    "branch_cleanup",
                    "branch_cleanup [force]",
                    |caps| json!({ "force": caps.get(1).is_some() }),
                ),
                grammar(
                    r"^record_test\s+(\d+)\s+(pass|fail)(?:\s+(.+))?$",
                    "record_test",
                    "record_test <commits_ago> <pass|fail> [notes]",
                    |caps| {
                        json!({
                            "commits_ago": caps[1].parse::<u64>().unwrap_or(u64::MAX),
                            "passed": &caps[2] == "pass",
                            "notes": caps.get(3).map(|m| m.as_str()),
                        })
                    },
                ),
                grammar(
                    r"^mark_resolved(?:\s+(.+))?$",
                    "mark_resolved",
                    "mark_resolved [finding]",
                    |caps| json!({ "finding": caps.get(1).map(|m| m.as_str()) }),
                ),
            ],
        }
    }

    /// Match `input` against the grammar table. Returns the tool name and
    /// its JSON parameters without executing anything.
    pub fn match_input(&self, input: &str) -> Option<(&'static str, Value)> {
        let input = input.trim();
        self.grammars.iter().find_map(|g| {
            g.regex
                .captures(input)
                .map(|caps| (g.tool, (g.build)(&caps)))
        })
    }

    /// One usage line per supported grammar, for failure messages.
    pub fn usages(&self) -> Vec<&'static str> {
        self.grammars.iter().map(|g| g.usage).collect()
    }
}
