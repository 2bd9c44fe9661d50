//! CRUSH Location Formatting
//!
//! Normalizes a free-form placement string (e.g. `rack=r1,datacenter=d1`)
//! into the space separated `key=value` form passed to the OSD daemon.

use crate::error::{Error, Result};

/// CRUSH key that identifies the node
pub const HOST_KEY: &str = "host";

/// Normalized topology location for an OSD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrushLocation {
    tokens: Vec<String>,
}

impl CrushLocation {
    /// Format a raw placement string for a node.
    ///
    /// Tokens keep their order from `raw`; `host=<node_name>` is appended
    /// when no host token was given.
    pub fn format(raw: &str, node_name: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        let mut has_host = false;

        if !raw.trim().is_empty() {
            for field in raw.split(',') {
                let field = field.trim();
                let (key, value) = parse_field(field)?;
                if key == HOST_KEY {
                    has_host = true;
                }
                tokens.push(format!("{}={}", key, value));
            }
        }

        if !has_host {
            tokens.push(format!("{}={}", HOST_KEY, node_name));
        }

        Ok(Self { tokens })
    }

    /// Ordered `key=value` tokens
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Value of the first token with the given key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tokens.iter().find_map(|t| {
            let (k, v) = t.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

impl std::fmt::Display for CrushLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

fn parse_field(field: &str) -> Result<(&str, &str)> {
    let invalid = || Error::InvalidLocation {
        field: field.to_string(),
    };

    let (key, value) = field.split_once('=').ok_or_else(invalid)?;
    let (key, value) = (key.trim(), value.trim());

    if !is_valid_name(key) || !is_valid_name(value) {
        return Err(invalid());
    }

    Ok((key, value))
}

fn is_valid_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
