use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Autonomy level granted to the Codex agent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalMode {
    /// Only suggests changes; every action needs approval.
    #[default]
    Suggest,
    /// Reads and writes files automatically, asks before shell commands.
    AutoEdit,
    /// Full autonomy inside the CLI's network-disabled sandbox.
    FullAuto,
}

impl ApprovalMode {
    pub const ALL: [ApprovalMode; 3] = [
        ApprovalMode::Suggest,
        ApprovalMode::AutoEdit,
        ApprovalMode::FullAuto,
    ];

    pub const FLAG: &'static str = "--approval-mode";

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalMode::Suggest => "suggest",
            ApprovalMode::AutoEdit => "auto-edit",
            ApprovalMode::FullAuto => "full-auto",
        }
    }

    /// The flag/value pair passed to the CLI.
    pub fn cli_args(self) -> [&'static str; 2] {
        [Self::FLAG, self.as_str()]
    }
}

impl fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApprovalMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown approval mode '{}', expected one of: suggest, auto-edit, full-auto",
                    s
                )
            })
    }
}
