//! Task categories and their prompt templates.

use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Category of work requested from Codex.
///
/// Each category selects a fixed prefix that is prepended to the caller's
/// prompt before it is handed to the CLI.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    /// General coding assistance, no prefix.
    #[default]
    General,
    /// Generate new code.
    CodeGeneration,
    /// Explain existing code.
    CodeExplanation,
    /// Find and fix bugs.
    Debugging,
    /// Improve code structure.
    Refactoring,
    /// Write or fix tests.
    Testing,
    /// Security analysis and fixes.
    Security,
    /// Generate or improve documentation.
    Documentation,
}

impl TaskType {
    pub const ALL: [TaskType; 8] = [
        TaskType::General,
        TaskType::CodeGeneration,
        TaskType::CodeExplanation,
        TaskType::Debugging,
        TaskType::Refactoring,
        TaskType::Testing,
        TaskType::Security,
        TaskType::Documentation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::General => "general",
            TaskType::CodeGeneration => "code-generation",
            TaskType::CodeExplanation => "code-explanation",
            TaskType::Debugging => "debugging",
            TaskType::Refactoring => "refactoring",
            TaskType::Testing => "testing",
            TaskType::Security => "security",
            TaskType::Documentation => "documentation",
        }
    }

    /// Prompt prefix for this category. Empty only for `General`.
    pub fn prefix(self) -> &'static str {
        match self {
            TaskType::General => "",
            TaskType::CodeGeneration => {
                "Generate clean, well-documented code for the following task:\n\n"
            }
            TaskType::CodeExplanation => {
                "Provide a detailed explanation of the following code, including what it does, how it works, and any notable patterns:\n\n"
            }
            TaskType::Debugging => {
                "Analyze the following code/issue for bugs, explain the problems found, and provide fixes:\n\n"
            }
            TaskType::Refactoring => {
                "Refactor the following code to improve readability, performance, and maintainability:\n\n"
            }
            TaskType::Testing => {
                "Write comprehensive tests for the following code or fix existing test issues:\n\n"
            }
            TaskType::Security => {
                "Perform a security analysis of the following code, identify vulnerabilities, and suggest fixes:\n\n"
            }
            TaskType::Documentation => "Generate or improve documentation for the following code:\n\n",
        }
    }

    pub fn apply(self, prompt: &str) -> String {
        format!("{}{}", self.prefix(), prompt)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = TaskType::ALL.iter().map(|t| t.as_str()).collect();
                format!(
                    "unknown task type '{}', expected one of: {}",
                    s,
                    allowed.join(", ")
                )
            })
    }
}
