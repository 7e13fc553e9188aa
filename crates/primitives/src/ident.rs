//! Identifier rules of the embedded script language.
//!
//! Parameter identifiers become global names in the generated script, so they
//! must lex as a Lua name and must not collide with a reserved word.

use std::sync::LazyLock;

use regex::Regex;

/// Reserved words of Lua 5.4.
pub const RESERVED_WORDS: [&str; 22] = [
	"and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in", "local", "nil", "not", "or", "repeat", "return", "then",
	"true", "until", "while",
];

static NAME: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

/// Why an identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
	#[error("identifier is empty")]
	Empty,
	#[error("'{0}' is not a valid script identifier")]
	Lexical(String),
	#[error("'{0}' is a reserved word of the script language")]
	Reserved(String),
}

/// Returns true if `id` is a legal, non-reserved identifier.
pub fn is_identifier(id: &str) -> bool {
	validate_identifier(id).is_ok()
}

pub fn validate_identifier(id: &str) -> Result<(), IdentifierError> {
	if id.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if !NAME.as_ref().is_some_and(|re| re.is_match(id)) {
		return Err(IdentifierError::Lexical(id.to_string()));
	}
	if RESERVED_WORDS.contains(&id) {
		return Err(IdentifierError::Reserved(id.to_string()));
	}
	Ok(())
}
