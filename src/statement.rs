//! Scene statements: `Subject Predicate Object` lines and entity names.
//!
//! An entity token such as `Bicycle1` carries its class in its non-digit
//! characters (`Bicycle`) and its instance tag in what remains after the class
//! prefix (`1`).

use std::collections::HashSet;

use crate::error::StatementError;

/// An entity token from a scene statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityName {
    token: String,
    class: String,
}

impl EntityName {
    /// Decompose a token into its class name and instance tag.
    ///
    /// Only ASCII digits are stripped. Other Unicode decimal digits (`٣`,
    /// `३`) stay in the class name, so `Car٣` is an instance of class `Car٣`.
    ///
    /// Fails if the token has no non-digit characters.
    pub fn parse(token: &str) -> Result<Self, StatementError> {
        let class: String = token.chars().filter(|c| !c.is_ascii_digit()).collect();
        if class.is_empty() {
            return Err(StatementError::InvalidTerm {
                term: token.to_string(),
                message: "entity name has no class part".into(),
            });
        }
        Ok(Self {
            token: token.to_string(),
            class,
        })
    }

    /// The full token, e.g. `Bicycle1`.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The token with every digit removed, e.g. `Bicycle`.
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// What remains of the token after the class prefix, e.g. `1`.
    ///
    /// Tokens whose digits sit inside the class name (`A1B`) have no class
    /// prefix; the whole token is then the tag.
    pub fn instance_tag(&self) -> &str {
        self.token
            .strip_prefix(self.class.as_str())
            .unwrap_or(&self.token)
    }
}

impl std::fmt::Display for EntityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)
    }
}

/// One parsed scene line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based line number in the original text.
    pub line_number: usize,
    pub subject: EntityName,
    pub predicate: String,
    pub object: EntityName,
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// Parse a scene description, one statement per non-blank line.
///
/// Stops at the first line that does not have exactly three tokens.
pub fn parse_scene(text: &str) -> Result<Vec<Statement>, StatementError> {
    if text.trim().is_empty() {
        return Err(StatementError::EmptyInput);
    }

    let mut statements = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [subject, predicate, object] = tokens.as_slice() else {
            return Err(StatementError::Malformed {
                line_number: idx + 1,
                line: line.to_string(),
                token_count: tokens.len(),
            });
        };
        statements.push(Statement {
            line_number: idx + 1,
            subject: EntityName::parse(subject)?,
            predicate: (*predicate).to_string(),
            object: EntityName::parse(object)?,
        });
    }
    Ok(statements)
}

/// Distinct subjects in first-appearance order.
pub fn distinct_subjects(statements: &[Statement]) -> Vec<&EntityName> {
    distinct(statements.iter().map(|s| &s.subject))
}

/// Distinct objects in first-appearance order.
pub fn distinct_objects(statements: &[Statement]) -> Vec<&EntityName> {
    distinct(statements.iter().map(|s| &s.object))
}

fn distinct<'a>(names: impl Iterator<Item = &'a EntityName>) -> Vec<&'a EntityName> {
    let mut seen = HashSet::new();
    names.filter(|n| seen.insert(n.as_str())).collect()
}
