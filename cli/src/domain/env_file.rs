//! The runtime's environment file: ordered `KEY=value` lines.
//!
//! Pure functions only. Comments and blank lines are carried through
//! untouched so operator edits survive an upsert.

use std::fmt;

/// Variables written when the environment file does not exist yet.
pub const DEFAULT_ENV: &[(&str, &str)] = &[
    ("AR_IO_WALLET", ""),
    ("OTHER_ENV_VARIABLE", "default_value"),
];

/// Variable set by `load-wallet-file`.
pub const OBSERVER_WALLET_KEY: &str = "OBSERVER_WALLET";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Var { key: String, value: String },
    Verbatim(String),
}

/// Ordered mapping of variable name to value.
///
/// Keys are unique after any [`EnvironmentConfig::upsert`]: an existing key is
/// updated in place, later duplicates of it are dropped, and new keys are
/// appended at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentConfig {
    lines: Vec<Line>,
}

impl EnvironmentConfig {
    /// Parse env-file text. Lines without `=` and `#` comments are kept verbatim.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|raw| {
                let trimmed = raw.trim_start();
                if trimmed.starts_with('#') {
                    return Line::Verbatim(raw.to_string());
                }
                match raw.split_once('=') {
                    Some((key, value)) if !key.trim().is_empty() => Line::Var {
                        key: key.trim().to_string(),
                        value: value.to_string(),
                    },
                    _ => Line::Verbatim(raw.to_string()),
                }
            })
            .collect();
        Self { lines }
    }

    /// The default file contents used on first run.
    #[must_use]
    pub fn defaults() -> Self {
        let mut env = Self::default();
        for (key, value) in DEFAULT_ENV {
            env.upsert(key, value);
        }
        env
    }

    /// Value of the first occurrence of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Var { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Keys in file order (duplicates included if the file had any).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Var { key, .. } => Some(key.as_str()),
            Line::Verbatim(_) => None,
        })
    }

    /// Set `key` to `value`, returning `true` when the rendered file changes.
    pub fn upsert(&mut self, key: &str, value: &str) -> bool {
        let before = self.lines.clone();
        let mut seen = false;
        self.lines.retain_mut(|line| match line {
            Line::Var { key: k, value: v } if k == key => {
                if seen {
                    return false;
                }
                seen = true;
                *v = value.to_string();
                true
            }
            _ => true,
        });
        if !seen {
            self.lines.push(Line::Var {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        self.lines != before
    }

    /// Apply several updates in order. Returns `true` if anything changed.
    pub fn upsert_all<'a>(&mut self, vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> bool {
        vars.into_iter()
            .fold(false, |changed, (k, v)| self.upsert(k, v) || changed)
    }

    /// Whether `key` is a legal variable name (`[A-Za-z_][A-Za-z0-9_]*`).
    #[must_use]
    pub fn is_valid_key(key: &str) -> bool {
        let mut chars = key.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Whether `value` fits on one `KEY=VALUE` line.
    #[must_use]
    pub fn is_valid_value(value: &str) -> bool {
        !value.contains(['\n', '\r'])
    }
}

impl fmt::Display for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                Line::Var { key, value } => writeln!(f, "{key}={value}")?,
                Line::Verbatim(raw) => writeln!(f, "{raw}")?,
            }
        }
        Ok(())
    }
}
