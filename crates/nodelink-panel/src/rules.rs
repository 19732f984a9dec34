//! Detection rules: local rule list loading and panel rule aggregation.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nodelink_core::defaults::LOCAL_RULE_ID;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::PanelError;
use crate::wire::PanelRuleSet;

/// Panel mode under which panel-supplied rules are enforced.
const REJECT_MODE: &str = "reject";

/// Panel rule types that carry a regular expression.
const REGEX_RULE_TYPES: &[&str] = &["regex", "reg"];

/// A compiled pattern that flags traffic as a policy violation.
#[derive(Debug, Clone)]
pub struct DetectionRule {
    /// `-1` for local rules, the panel's id otherwise.
    pub id: i64,
    pub pattern: Regex,
}

impl DetectionRule {
    pub fn new(id: i64, pattern: &str) -> Result<Self, PanelError> {
        let compiled = Regex::new(pattern).map_err(|source| PanelError::RuleCompile {
            id,
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            id,
            pattern: compiled,
        })
    }

    #[inline]
    pub fn is_match(&self, target: &str) -> bool {
        self.pattern.is_match(target)
    }
}

/// Id of the first rule matching `target`.
pub fn first_match(rules: &[DetectionRule], target: &str) -> Option<i64> {
    rules.iter().find(|r| r.is_match(target)).map(|r| r.id)
}

/// Load the local rule list: one pattern per non-empty line.
///
/// A missing or unreadable file yields an empty set (logged). A read error
/// partway through the file, or an invalid pattern, is returned.
pub fn load_local_rules(path: Option<&Path>) -> Result<Vec<DetectionRule>, PanelError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open local rule list, continuing without it");
            return Ok(Vec::new());
        }
    };

    let mut rules = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let pattern = line.trim_end_matches('\r');
        if pattern.trim().is_empty() {
            continue;
        }
        rules.push(DetectionRule::new(LOCAL_RULE_ID, pattern)?);
    }

    info!(path = %path.display(), count = rules.len(), "loaded local rule list");
    Ok(rules)
}

/// Merge the local rule set with the panel's rule descriptor.
///
/// Local rules always come first and are kept as-is. Panel rules are only
/// appended in `reject` mode, and only those of a regex type.
pub fn aggregate_rules(
    local: &[DetectionRule],
    panel: &PanelRuleSet,
) -> Result<Vec<DetectionRule>, PanelError> {
    let mut rules = local.to_vec();
    if panel.mode != REJECT_MODE {
        debug!(mode = %panel.mode, "panel rules not enforced in this mode");
        return Ok(rules);
    }

    for rule in &panel.rules {
        if !REGEX_RULE_TYPES.contains(&rule.kind.as_str()) {
            debug!(id = rule.id, kind = %rule.kind, "skipping unsupported panel rule type");
            continue;
        }
        rules.push(DetectionRule::new(rule.id, &rule.pattern)?);
    }
    Ok(rules)
}
