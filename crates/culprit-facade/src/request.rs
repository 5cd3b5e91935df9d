//! Typed request structs, one per operation. The keyword and free-text
//! entry points both funnel into these, so validation lives in exactly
//! one place.

use serde::Deserialize;

/// Largest sensible trailing window, in days.
const MAX_WINDOW_DAYS: u64 = 3650;

fn check_window(days_ago: u64) -> Result<(), String> {
    if days_ago > MAX_WINDOW_DAYS {
        return Err(format!(
            "days_ago {days_ago} exceeds the {MAX_WINDOW_DAYS}-day limit"
        ));
    }
    Ok(())
}

fn check_rev(rev: &str) -> Result<(), String> {
    // Resolution is git's job; reject only what could never name a commit.
    if rev.is_empty() || rev.chars().any(char::is_whitespace) {
        return Err(format!("\"{rev}\" is not a usable revision"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HuntRegressionRequest {
    pub days_ago: u64,
    /// Log pattern for the log-pattern oracle; when absent the HTTP
    /// health-check oracle from the config is used instead.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl HuntRegressionRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_window(self.days_ago)?;
        if let Some(p) = &self.pattern {
            if p.is_empty() {
                return Err(String::from("pattern must not be empty"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ListCommitsRequest {
    pub days_ago: u64,
}

impl ListCommitsRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_window(self.days_ago)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CheckCommitRequest {
    /// Any revision git can resolve: a hash or prefix, `HEAD~2`, a tag.
    pub hash: String,
    pub pattern: String,
}

impl CheckCommitRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_rev(&self.hash)?;
        if self.pattern.is_empty() {
            return Err(String::from("pattern must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct BranchCreateRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct BranchCleanupRequest {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecordTestRequest {
    pub commits_ago: u64,
    pub passed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MarkResolvedRequest {
    #[serde(default)]
    pub finding: Option<String>,
}
