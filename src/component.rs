use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Name given to a component saved from an empty prompt.
pub const UNTITLED_NAME: &str = "Untitled Component";

const NAME_MAX_CHARS: usize = 50;

/// A generated component kept in the user's workspace.
///
/// Field names match the persisted JSON layout exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedComponent {
    /// Creation time in milliseconds since the Unix epoch.
    pub id: i64,
    pub name: String,
    pub prompt: String,
    pub code: String,
    pub framework: String,
    /// Locale-formatted creation time, display only.
    pub timestamp: String,
}

impl SavedComponent {
    pub fn new(id: i64, prompt: &str, code: &str, framework: Framework, created: DateTime<Local>) -> Self {
        Self {
            id,
            name: display_name(prompt),
            prompt: prompt.to_string(),
            code: code.to_string(),
            framework: framework.id().to_string(),
            timestamp: created.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        }
    }

    /// Framework of this record, or the default when the stored id is unknown.
    pub fn framework(&self) -> Framework {
        self.framework.parse().unwrap_or_default()
    }
}

/// First 50 characters of the prompt, or the untitled fallback.
pub fn display_name(prompt: &str) -> String {
    if prompt.is_empty() {
        return UNTITLED_NAME.to_string();
    }
    prompt.chars().take(NAME_MAX_CHARS).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framework {
    #[default]
    HtmlCss,
    HtmlTailwind,
    HtmlBootstrap,
    HtmlCssJs,
    HtmlTailwindBootstrap,
}

impl Framework {
    pub const ALL: [Framework; 5] = [
        Framework::HtmlCss,
        Framework::HtmlTailwind,
        Framework::HtmlBootstrap,
        Framework::HtmlCssJs,
        Framework::HtmlTailwindBootstrap,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Framework::HtmlCss => "html-css",
            Framework::HtmlTailwind => "html-tailwind",
            Framework::HtmlBootstrap => "html-bootstrap",
            Framework::HtmlCssJs => "html-css-js",
            Framework::HtmlTailwindBootstrap => "html-tailwind-bootstrap",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Framework::HtmlCss => "HTML + CSS",
            Framework::HtmlTailwind => "HTML + Tailwind CSS",
            Framework::HtmlBootstrap => "HTML + Bootstrap",
            Framework::HtmlCssJs => "HTML + CSS + JS",
            Framework::HtmlTailwindBootstrap => "HTML + Tailwind + Bootstrap",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown framework '{0}' (expected one of: html-css, html-tailwind, html-bootstrap, html-css-js, html-tailwind-bootstrap)")]
pub struct UnknownFramework(pub String);

impl FromStr for Framework {
    type Err = UnknownFramework;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Framework::ALL
            .into_iter()
            .find(|fw| fw.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFramework(s.to_string()))
    }
}
