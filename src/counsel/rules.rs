//! Formatting rules a reply has to satisfy before it is returned.

use std::fmt;

use anyhow::Result;

use super::persona::{Persona, SEPARATOR, label_of};
use crate::ai::prompt::{Prompt, render};

/// Checked in declaration order, each at most once per request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Reply must contain `" | "` between label and answer
    Separator,
    /// First turn of a conversation must open as `친근함`
    OpeningPersona,
    /// Reply must mention at least one known persona label
    KnownPersona,
}

impl Rule {
    pub const ALL: [Rule; 3] = [Rule::Separator, Rule::OpeningPersona, Rule::KnownPersona];

    /// Whether this rule is checked at all given the length of the
    /// transcript the caller sent.
    pub fn applies(&self, transcript_len: usize) -> bool {
        match self {
            Rule::OpeningPersona => transcript_len == 1,
            Rule::Separator | Rule::KnownPersona => true,
        }
    }

    pub fn is_satisfied_by(&self, reply: &str) -> bool {
        match self {
            Rule::Separator => reply.contains(SEPARATOR),
            Rule::OpeningPersona => label_of(reply) == Some(Persona::Friendly.label()),
            Rule::KnownPersona => Persona::find_in(reply).is_some(),
        }
    }

    fn prompt(&self) -> Prompt {
        match self {
            Rule::Separator => Prompt::SeparatorDirective,
            Rule::OpeningPersona => Prompt::OpeningDirective,
            Rule::KnownPersona => Prompt::PersonaDirective,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Rule::Separator => "separator",
            Rule::OpeningPersona => "opening-persona",
            Rule::KnownPersona => "known-persona",
        };
        f.write_str(name)
    }
}

/// Corrective directive text for each rule, rendered once.
#[derive(Clone, Debug)]
pub struct Directives {
    separator: String,
    opening: String,
    persona: String,
}

impl Directives {
    pub fn render() -> Result<Self> {
        Ok(Self {
            separator: render(Rule::Separator.prompt())?,
            opening: render(Rule::OpeningPersona.prompt())?,
            persona: render(Rule::KnownPersona.prompt())?,
        })
    }

    pub fn for_rule(&self, rule: Rule) -> &str {
        match rule {
            Rule::Separator => &self.separator,
            Rule::OpeningPersona => &self.opening,
            Rule::KnownPersona => &self.persona,
        }
    }
}
