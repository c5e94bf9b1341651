// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filename templates
//!
//! A template is text with `{variable}` placeholders, e.g.
//! `{type}-{YYYY}-{MM}-{DD}_{HHmmss}`. It is compiled once into a list of
//! segments; rendering is a single pass over those segments, so substituted
//! values are never expanded again.

use chrono::NaiveDateTime;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::{MediadateError, Result};

/// Template used when none is configured
pub const DEFAULT_TEMPLATE: &str = "{type}-{YYYY}-{MM}-{DD}_{HHmmss}";

/// A known template variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    /// `Photo` or `Video`
    Type,
    /// Four-digit year
    Year,
    /// Two-digit year
    ShortYear,
    Month,
    Day,
    /// Hour, 24h clock
    Hour,
    /// Hour, 12h clock
    Hour12,
    Minute,
    Second,
    /// `HHmmss` run together
    Time,
}

impl Variable {
    pub const ALL: [Variable; 10] = [
        Variable::Type,
        Variable::Year,
        Variable::ShortYear,
        Variable::Month,
        Variable::Day,
        Variable::Hour,
        Variable::Hour12,
        Variable::Minute,
        Variable::Second,
        Variable::Time,
    ];

    /// Name as written between braces
    pub fn name(self) -> &'static str {
        match self {
            Variable::Type => "type",
            Variable::Year => "YYYY",
            Variable::ShortYear => "YY",
            Variable::Month => "MM",
            Variable::Day => "DD",
            Variable::Hour => "HH",
            Variable::Hour12 => "hh",
            Variable::Minute => "mm",
            Variable::Second => "ss",
            Variable::Time => "HHmmss",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.name()).collect()
    }

    /// Look up a variable by its exact (case-sensitive) name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            Variable::Type => "Photo or Video",
            Variable::Year => "Year (4 digits), e.g. 2024",
            Variable::ShortYear => "Year (2 digits), e.g. 24",
            Variable::Month => "Month (2 digits), e.g. 08",
            Variable::Day => "Day (2 digits), e.g. 15",
            Variable::Hour => "Hour, 24h clock, e.g. 14",
            Variable::Hour12 => "Hour, 12h clock, e.g. 02",
            Variable::Minute => "Minutes, e.g. 22",
            Variable::Second => "Seconds, e.g. 03",
            Variable::Time => "Time run together, e.g. 142203",
        }
    }

    /// Value of this variable for a date and type label
    pub fn value(self, date: &NaiveDateTime, type_label: &str) -> String {
        let pattern = match self {
            Variable::Type => return type_label.to_string(),
            Variable::Year => "%Y",
            Variable::ShortYear => "%y",
            Variable::Month => "%m",
            Variable::Day => "%d",
            Variable::Hour => "%H",
            Variable::Hour12 => "%I",
            Variable::Minute => "%M",
            Variable::Second => "%S",
            Variable::Time => "%H%M%S",
        };
        date.format(pattern).to_string()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(Variable),
}

/// A validated, immutable naming template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    source: String,
    segments: Vec<Segment>,
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

impl NamingTemplate {
    /// Compile template text, rejecting every unknown `{variable}`
    pub fn compile(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut unknown: Vec<String> = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            if whole.start() > last {
                segments.push(Segment::Literal(text[last..whole.start()].to_string()));
            }
            last = whole.end();

            match Variable::from_name(name.as_str()) {
                Some(var) => segments.push(Segment::Var(var)),
                None => {
                    if !unknown.iter().any(|u| u == name.as_str()) {
                        unknown.push(name.as_str().to_string());
                    }
                }
            }
        }

        if !unknown.is_empty() {
            return Err(MediadateError::InvalidTemplate { unknown });
        }

        if last < text.len() {
            segments.push(Segment::Literal(text[last..].to_string()));
        }

        Ok(Self {
            source: text.to_string(),
            segments,
        })
    }

    /// Render a name (without extension) for a date and type label
    pub fn render(&self, date: &NaiveDateTime, type_label: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(var) => out.push_str(&var.value(date, type_label)),
            }
        }
        out
    }

    /// Variables referenced by this template, in order of appearance
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var(v) => Some(*v),
            Segment::Literal(_) => None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for NamingTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: vec![
                Segment::Var(Variable::Type),
                Segment::Literal("-".to_string()),
                Segment::Var(Variable::Year),
                Segment::Literal("-".to_string()),
                Segment::Var(Variable::Month),
                Segment::Literal("-".to_string()),
                Segment::Var(Variable::Day),
                Segment::Literal("_".to_string()),
                Segment::Var(Variable::Time),
            ],
        }
    }
}

impl fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Help text listing every variable and a few sample templates
pub fn help_text() -> String {
    let sample = NaiveDateTime::parse_from_str("2023-08-15 14:22:03", "%Y-%m-%d %H:%M:%S")
        .unwrap_or_default();

    let mut lines = vec!["Template variables:".to_string(), String::new()];
    for var in Variable::ALL {
        lines.push(format!("  {:<10} - {}", var.to_string(), var.description()));
    }

    lines.push(String::new());
    lines.push("Example templates:".to_string());
    for example in [
        DEFAULT_TEMPLATE,
        "IMG_{YYYY}{MM}{DD}_{HHmmss}",
        "{type}_{DD}.{MM}.{YYYY}_{HH}-{mm}-{ss}",
        "{YYYY}/{MM}/{type}_{YYYY}{MM}{DD}",
    ] {
        lines.push(String::new());
        lines.push(format!("  {}", example));
        if let Ok(template) = NamingTemplate::compile(example) {
            lines.push(format!("    -> {}.jpg", template.render(&sample, "Photo")));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_date() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2023-08-15 14:22:03", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_default_template() {
        let template = NamingTemplate::compile(DEFAULT_TEMPLATE).unwrap();
        assert_eq!(template.render(&sample_date(), "Photo"), "Photo-2023-08-15_142203");
        assert_eq!(template, NamingTemplate::default());
    }

    #[test]
    fn test_custom_templates() {
        let date = sample_date();
        let cases = [
            ("IMG_{YYYY}{MM}{DD}_{HHmmss}", "IMG_20230815_142203"),
            ("{type}_{DD}.{MM}.{YYYY}_{HH}-{mm}-{ss}", "Video_15.08.2023_14-22-03"),
            ("{YY}{MM}{DD}-{hh}{mm}", "230815-0222"),
            ("{YYYY}/{MM}/{type}_{YYYY}{MM}{DD}", "2023/08/Video_20230815"),
            ("no placeholders", "no placeholders"),
        ];
        for (text, expected) in cases {
            let template = NamingTemplate::compile(text).unwrap();
            assert_eq!(template.render(&date, "Video"), expected, "template {}", text);
        }
    }

    #[test]
    fn test_unknown_variables_are_all_reported() {
        let err = NamingTemplate::compile("{type}-{INVALID}-{YYYY}-{nope}-{INVALID}").unwrap_err();
        match err {
            MediadateError::InvalidTemplate { unknown } => {
                assert_eq!(unknown, vec!["INVALID".to_string(), "nope".to_string()]);
            }
            other => panic!("Expected InvalidTemplate, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_names_are_case_sensitive() {
        assert!(NamingTemplate::compile("{yyyy}").is_err());
        assert!(NamingTemplate::compile("{Type}").is_err());
    }

    #[test]
    fn test_values_are_not_expanded_again() {
        let template = NamingTemplate::compile("{type}_{YYYY}").unwrap();
        assert_eq!(template.render(&sample_date(), "{YYYY}"), "{YYYY}_2023");
    }

    #[test]
    fn test_non_placeholder_braces_are_literal() {
        let template = NamingTemplate::compile("{a-b}_{}_{YYYY}{").unwrap();
        assert_eq!(template.render(&sample_date(), "Photo"), "{a-b}_{}_2023{");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = NamingTemplate::compile("{type}{HHmmss}{ss}").unwrap();
        let first = template.render(&sample_date(), "Photo");
        let second = template.render(&sample_date(), "Photo");
        assert_eq!(first, second);
        assert_eq!(
            template.variables().collect::<Vec<_>>(),
            vec![Variable::Type, Variable::Time, Variable::Second]
        );
    }

    #[test]
    fn test_help_text_lists_every_variable() {
        let help = help_text();
        for var in Variable::ALL {
            assert!(help.contains(&var.to_string()));
        }
        assert!(help.contains("Photo-2023-08-15_142203.jpg"));
    }
}
