//! Operator command line: `enable <regex>` / `disable <regex>`.
//!
//! The pattern is searched (not anchored) in every behavior's qualified type
//! name, across all parts the host lists.

use regex::Regex;

use crate::error::{CommandError, CommandResult};
use crate::host::BehaviorControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Enable,
    Disable,
}

impl Verb {
    fn parse(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("enable") {
            Some(Verb::Enable)
        } else if word.eq_ignore_ascii_case("disable") {
            Some(Verb::Disable)
        } else {
            None
        }
    }

    pub fn enables(self) -> bool {
        self == Verb::Enable
    }
}

#[derive(Debug, Clone)]
pub struct OperatorCommand {
    pub verb: Verb,
    pub pattern: Regex,
}

impl OperatorCommand {
    pub fn parse(line: &str) -> CommandResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let verb = Verb::parse(word).ok_or_else(|| CommandError::UnknownVerb(word.to_owned()))?;
        if rest.is_empty() {
            return Err(CommandError::MissingPattern(word.to_owned()));
        }
        let pattern = Regex::new(rest).map_err(|source| CommandError::InvalidPattern {
            pattern: rest.to_owned(),
            source,
        })?;
        Ok(Self { verb, pattern })
    }

    /// Apply to every matching behavior. Returns how many changed state.
    pub fn apply<H: BehaviorControl + ?Sized>(&self, host: &mut H) -> usize {
        let enabled = self.verb.enables();
        let mut changed = 0;
        for part in host.parts() {
            for (index, name) in host.behavior_names(part).iter().enumerate() {
                if !self.pattern.is_match(name) {
                    continue;
                }
                if host.behavior_enabled(part, index) == Some(enabled) {
                    continue;
                }
                log::info!(
                    "{}: {} {}",
                    host.describe(part),
                    if enabled { "enabling" } else { "disabling" },
                    name
                );
                host.set_behavior_enabled(part, index, enabled);
                changed += 1;
            }
        }
        changed
    }
}

/// Parse and apply in one step.
pub fn run<H: BehaviorControl + ?Sized>(host: &mut H, line: &str) -> CommandResult<usize> {
    Ok(OperatorCommand::parse(line)?.apply(host))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockVessel;

    fn vessel() -> MockVessel {
        let mut vessel = MockVessel::new();
        let pod = vessel.add_root("pod");
        vessel.add_behavior(pod, "Stock.ModuleCommand");
        vessel.add_behavior(pod, "Stock.ModuleLight");
        let lamp = vessel.add_child("lamp", pod);
        vessel.add_behavior(lamp, "Vendor.ModuleLight");
        vessel
    }

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!(OperatorCommand::parse("ENABLE x").unwrap().verb, Verb::Enable);
        assert_eq!(OperatorCommand::parse("  Disable   x ").unwrap().verb, Verb::Disable);
    }

    #[test]
    fn malformed_lines_are_typed_errors() {
        assert!(matches!(OperatorCommand::parse("   "), Err(CommandError::Empty)));
        assert!(matches!(
            OperatorCommand::parse("toggle x"),
            Err(CommandError::UnknownVerb(v)) if v == "toggle"
        ));
        assert!(matches!(
            OperatorCommand::parse("enable"),
            Err(CommandError::MissingPattern(_))
        ));
        assert!(matches!(
            OperatorCommand::parse("enable Module(("),
            Err(CommandError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn pattern_is_searched_not_anchored() {
        let mut vessel = vessel();
        assert_eq!(run(&mut vessel, "disable Light").unwrap(), 2);
        assert!(vessel.part(0).behaviors[0].1);
        assert!(!vessel.part(0).behaviors[1].1);
        assert!(!vessel.part(1).behaviors[0].1);
    }

    #[test]
    fn only_state_changes_are_counted() {
        let mut vessel = vessel();
        assert_eq!(run(&mut vessel, "disable ^Vendor\\.").unwrap(), 1);
        assert_eq!(run(&mut vessel, "disable ^Vendor\\.").unwrap(), 0);
        assert_eq!(run(&mut vessel, "enable .").unwrap(), 1);
    }
}
