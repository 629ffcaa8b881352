//! Persona labels the counselor prefixes each reply with.
//!
//! Labels are opaque text tokens. Nothing here tracks which stage a
//! conversation is in, that is left entirely to the model.

use std::fmt;

/// Separates the persona label from the answer, e.g. `친근함 | 안녕!`
pub const SEPARATOR: &str = " | ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Persona {
    Friendly,
    CoolButWarm,
    Cold,
    Angry,
    Furious,
}

impl Persona {
    /// Every stage from friendliest to angriest. Membership checks
    /// scan in this order.
    pub const ALL: [Persona; 5] = [
        Persona::Friendly,
        Persona::CoolButWarm,
        Persona::Cold,
        Persona::Angry,
        Persona::Furious,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Persona::Friendly => "친근함",
            Persona::CoolButWarm => "차가우면서 온화함",
            Persona::Cold => "차가움",
            Persona::Angry => "화남",
            Persona::Furious => "매우 화남",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Persona::Friendly => "부드럽고 다정하게 대화합니다.",
            Persona::CoolButWarm => "약간 엄격하지만 여전히 배려심 있는 태도를 유지합니다.",
            Persona::Cold => "감정적으로 거리를 두며 단호하게 말합니다.",
            Persona::Angry => "강한 어조로 경고하거나 지시합니다.",
            Persona::Furious => "질책하며 타협하지 않습니다.",
        }
    }

    /// First persona (in `ALL` order) whose label appears anywhere in
    /// `text`. This deliberately matches inside the answer too, not
    /// only in the label slot before the separator.
    pub fn find_in(text: &str) -> Option<Persona> {
        Persona::ALL
            .into_iter()
            .find(|persona| text.contains(persona.label()))
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The label slot of a reply: everything before the first separator,
/// trimmed. `None` when the reply has no separator at all.
pub fn label_of(reply: &str) -> Option<&str> {
    reply
        .split_once(SEPARATOR)
        .map(|(label, _answer)| label.trim())
}
