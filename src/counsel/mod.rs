//! Counseling turn logic: persona labels, reply validation and the
//! corrective retry loop around the completion call.

mod core;
mod persona;
mod rules;

pub use self::core::{CounselError, Counselor, ValidatedReply};
pub use persona::{Persona, SEPARATOR, label_of};
pub use rules::{Directives, Rule};
