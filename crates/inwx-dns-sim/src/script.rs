//! Per-name scripted answer sequences.

use std::collections::HashMap;

/// One scripted response: the TXT values returned for a single query.
pub type AnswerSet = Vec<String>;

/// Scripted answers keyed by normalized query name, each with its own cursor.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    scripts: HashMap<String, Script>,
}

#[derive(Debug, Clone, Default)]
struct Script {
    answers: Vec<AnswerSet>,
    cursor: usize,
}

impl ScriptedAnswers {
    /// Create an empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `name -> answer sets`
    pub fn from_map<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<AnswerSet>)>,
        S: AsRef<str>,
    {
        let mut answers = Self::new();
        for (name, sets) in entries {
            answers.script(name.as_ref(), sets);
        }
        answers
    }

    /// Replace the script for `name` and rewind its cursor.
    pub fn script(&mut self, name: &str, answers: Vec<AnswerSet>) {
        self.scripts.insert(
            normalize_name(name),
            Script {
                answers,
                cursor: 0,
            },
        );
    }

    /// Answer set for the next query on `name`, advancing its cursor.
    ///
    /// Unknown names and exhausted scripts yield an empty set.
    pub fn next_answer(&mut self, name: &str) -> AnswerSet {
        let Some(script) = self.scripts.get_mut(&normalize_name(name)) else {
            return AnswerSet::new();
        };
        let answer = script.answers.get(script.cursor).cloned().unwrap_or_default();
        script.cursor = script.cursor.saturating_add(1);
        answer
    }

    /// Number of queries served for `name` so far
    #[must_use]
    pub fn cursor(&self, name: &str) -> usize {
        self.scripts
            .get(&normalize_name(name))
            .map_or(0, |s| s.cursor)
    }

    /// Number of scripted names
    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Whether no names are scripted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Lowercase and make fully qualified.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = name.trim().to_ascii_lowercase();
    if !normalized.ends_with('.') {
        normalized.push('.');
    }
    normalized
}

/// Whether normalized `name` is `zone` or below it.
pub fn within_zone(name: &str, zone: &str) -> bool {
    zone == "." || name == zone || name.strip_suffix(zone).is_some_and(|rest| rest.ends_with('.'))
}
