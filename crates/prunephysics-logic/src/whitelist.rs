//! Pattern whitelist for behavior and resource names.
//!
//! Operators ship plain-text rule files (see [`WHITELIST_EXTENSIONS`]). Each
//! non-empty, non-comment line is a regular expression that must match the
//! *short* name of a behavior or resource (the part after the last `.`).
//! Rules are anchored at both ends, so `Engine` never matches `MyEngine`.
//!
//! ```
//! use prunephysics_logic::whitelist::{Whitelist, WhitelistSource};
//!
//! let source = WhitelistSource::from_text("stock.ppwl", "ModuleLight # lamps\nModuleAnim.*");
//! let whitelist = Whitelist::compile(&[source]);
//! assert!(whitelist.is_allowed("Some.Namespace.ModuleLight"));
//! assert!(whitelist.is_allowed("ModuleAnimateGeneric"));
//! assert!(!whitelist.is_allowed("ModuleLightning"));
//! ```
//!
//! [`WHITELIST_EXTENSIONS`]: crate::constants::WHITELIST_EXTENSIONS

use std::cell::OnceCell;
use std::fmt;

use regex::Regex;

use crate::constants::{COMMENT_MARKERS, WHITELIST_EXTENSIONS};
use crate::error::RuleError;

/// Raw rule lines from one origin (usually one file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistSource {
    pub origin: String,
    pub lines: Vec<String>,
}

impl WhitelistSource {
    pub fn new(origin: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            origin: origin.into(),
            lines,
        }
    }

    /// Split a whole file body into lines.
    pub fn from_text(origin: impl Into<String>, text: &str) -> Self {
        Self::new(origin, text.lines().map(str::to_owned).collect())
    }
}

/// Supplies rule sources on demand. Called once per (re)build.
pub trait WhitelistProvider {
    fn sources(&self) -> Vec<WhitelistSource>;
}

/// In-memory provider, used by tests and by hosts that read files themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticSources(pub Vec<WhitelistSource>);

impl StaticSources {
    pub fn new(sources: Vec<WhitelistSource>) -> Self {
        Self(sources)
    }

    pub fn push(&mut self, source: WhitelistSource) {
        self.0.push(source);
    }
}

impl WhitelistProvider for StaticSources {
    fn sources(&self) -> Vec<WhitelistSource> {
        self.0.clone()
    }
}

/// Whether a file extension (without the dot) names a whitelist file.
pub fn is_whitelist_extension(extension: &str) -> bool {
    WHITELIST_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(extension))
}

/// Cut a raw line at the first comment marker and trim it.
///
/// Returns `None` for blank and comment-only lines.
pub fn rule_text(raw: &str) -> Option<&str> {
    let cut = COMMENT_MARKERS
        .iter()
        .filter_map(|marker| raw.find(marker))
        .min()
        .unwrap_or(raw.len());
    let text = raw[..cut].trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Add `^` / `$` when the rule does not already start / end with them.
pub fn anchor(rule: &str) -> String {
    let mut anchored = String::with_capacity(rule.len() + 2);
    if !rule.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(rule);
    if !rule.ends_with('$') {
        anchored.push('$');
    }
    anchored
}

/// Compile an anchored rule so that it must match the whole candidate.
///
/// The body is wrapped in a group, so alternations such as `^A|B$` still
/// cover the full name instead of only its head or tail.
fn compile_anchored(anchored: &str) -> Result<Regex, regex::Error> {
    let body = anchored.strip_prefix('^').unwrap_or(anchored);
    let body = if ends_with_unescaped_dollar(body) {
        &body[..body.len() - 1]
    } else {
        body
    };
    Regex::new(&format!("^(?:{body})$"))
}

fn ends_with_unescaped_dollar(text: &str) -> bool {
    let Some(head) = text.strip_suffix('$') else {
        return false;
    };
    let backslashes = head.bytes().rev().take_while(|&b| b == b'\\').count();
    backslashes % 2 == 0
}

/// Reduce `Some.Namespace.Name` to `Name`.
///
/// A leading dot is kept as part of the name, so `.Name` stays `.Name`.
pub fn short_name(qualified: &str) -> &str {
    match qualified.rfind('.') {
        Some(pos) if pos > 0 => &qualified[pos + 1..],
        _ => qualified,
    }
}

/// One compiled rule, remembering where it came from.
#[derive(Debug, Clone)]
pub struct WhitelistRule {
    pub origin: String,
    /// 1-based line number within `origin`.
    pub line: usize,
    /// Anchored rule text as written to the log.
    pub pattern: String,
    regex: Regex,
}

impl WhitelistRule {
    /// Parse one raw line. `Ok(None)` for blank/comment lines.
    pub fn parse(origin: &str, line: usize, raw: &str) -> Result<Option<Self>, RuleError> {
        let Some(text) = rule_text(raw) else {
            return Ok(None);
        };
        let pattern = anchor(text);
        match compile_anchored(&pattern) {
            Ok(regex) => Ok(Some(Self {
                origin: origin.to_owned(),
                line,
                pattern,
                regex,
            })),
            Err(source) => Err(RuleError {
                origin: origin.to_owned(),
                line,
                pattern,
                source,
            }),
        }
    }

    /// Match against an already shortened name.
    pub fn matches(&self, short: &str) -> bool {
        self.regex.is_match(short)
    }
}

impl fmt::Display for WhitelistRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.origin, self.line, self.pattern)
    }
}

/// Compiled rule set. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    rules: Vec<WhitelistRule>,
    rejected: Vec<RuleError>,
}

impl Whitelist {
    /// Compile every line of every source. Bad lines are logged and kept
    /// aside in [`Whitelist::rejected`]; they never abort the build.
    pub fn compile(sources: &[WhitelistSource]) -> Self {
        let mut whitelist = Whitelist::default();
        for source in sources {
            for (idx, raw) in source.lines.iter().enumerate() {
                match WhitelistRule::parse(&source.origin, idx + 1, raw) {
                    Ok(Some(rule)) => {
                        log::debug!("whitelist rule {}", rule);
                        whitelist.rules.push(rule);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        log::warn!("{}", err);
                        whitelist.rejected.push(err);
                    }
                }
            }
        }
        log::info!(
            "whitelist compiled: {} rules from {} sources, {} rejected",
            whitelist.rules.len(),
            sources.len(),
            whitelist.rejected.len()
        );
        whitelist
    }

    /// First rule matching the short form of `qualified`.
    pub fn matching_rule(&self, qualified: &str) -> Option<&WhitelistRule> {
        let short = short_name(qualified);
        self.rules.iter().find(|rule| rule.matches(short))
    }

    pub fn is_allowed(&self, qualified: &str) -> bool {
        self.matching_rule(qualified).is_some()
    }

    pub fn rules(&self) -> &[WhitelistRule] {
        &self.rules
    }

    /// Lines that failed to compile during the last build.
    pub fn rejected(&self) -> &[RuleError] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Lazily built whitelist with an explicit reset.
///
/// Owned by the [`PruneContext`](crate::context::PruneContext); the first
/// lookup pulls sources from the provider and compiles them.
pub struct WhitelistRegistry {
    provider: Box<dyn WhitelistProvider>,
    compiled: OnceCell<Whitelist>,
    revision: u64,
    log_misses: bool,
}

impl WhitelistRegistry {
    pub fn new(provider: impl WhitelistProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            compiled: OnceCell::new(),
            revision: 0,
            log_misses: true,
        }
    }

    /// Registry that allows nothing. Every part with at least one behavior
    /// or resource is then ineligible.
    pub fn empty() -> Self {
        Self::new(StaticSources::default())
    }

    pub fn with_miss_logging(mut self, enabled: bool) -> Self {
        self.log_misses = enabled;
        self
    }

    /// Build the rule set if it is not built yet. Idempotent.
    pub fn load(&self) -> &Whitelist {
        self.compiled
            .get_or_init(|| Whitelist::compile(&self.provider.sources()))
    }

    pub fn is_loaded(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Drop the compiled set; the next lookup rebuilds from the provider.
    pub fn reset(&mut self) {
        self.compiled = OnceCell::new();
        self.revision += 1;
        log::info!("whitelist reset (revision {})", self.revision);
    }

    /// Reset and rebuild immediately.
    pub fn rebuild(&mut self) -> &Whitelist {
        self.reset();
        self.load()
    }

    /// Replace the provider. Takes effect like a [`reset`](Self::reset).
    pub fn set_provider(&mut self, provider: impl WhitelistProvider + 'static) {
        self.provider = Box::new(provider);
        self.reset();
    }

    /// Bumped on every reset.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Lookup with miss logging.
    pub fn is_allowed(&self, qualified: &str) -> bool {
        let allowed = self.load().is_allowed(qualified);
        if !allowed && self.log_misses {
            log::debug!("name \"{}\" is not in whitelist", short_name(qualified));
        }
        allowed
    }

    /// Lookup without logging, for diagnostics listings.
    pub fn check_quiet(&self, qualified: &str) -> bool {
        self.load().is_allowed(qualified)
    }
}

impl fmt::Debug for WhitelistRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhitelistRegistry")
            .field("loaded", &self.is_loaded())
            .field("rules", &self.compiled.get().map(Whitelist::len))
            .field("revision", &self.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn whitelist(text: &str) -> Whitelist {
        Whitelist::compile(&[WhitelistSource::from_text("test.ppwl", text)])
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert_eq!(rule_text("   "), None);
        assert_eq!(rule_text("# only a comment"), None);
        assert_eq!(rule_text("// also a comment"), None);
        assert_eq!(rule_text("  ModuleLight  # trailing"), Some("ModuleLight"));
        assert_eq!(rule_text("ModuleLight// trailing"), Some("ModuleLight"));
    }

    #[test]
    fn earliest_comment_marker_wins() {
        assert_eq!(rule_text("A # b // c"), Some("A"));
        assert_eq!(rule_text("A // b # c"), Some("A"));
    }

    #[test]
    fn anchors_are_added_only_when_missing() {
        assert_eq!(anchor("Foo"), "^Foo$");
        assert_eq!(anchor("^Foo"), "^Foo$");
        assert_eq!(anchor("Foo$"), "^Foo$");
        assert_eq!(anchor("^Foo$"), "^Foo$");
    }

    #[test]
    fn exact_short_name_matches() {
        let wl = whitelist("MyBehavior");
        assert!(wl.is_allowed("MyBehavior"));
        assert!(wl.is_allowed("Some.Namespace.MyBehavior"));
    }

    #[test]
    fn prefix_and_suffix_are_rejected() {
        let wl = whitelist("MyBehavior");
        assert!(!wl.is_allowed("MyBehaviorX"));
        assert!(!wl.is_allowed("XMyBehavior"));
        assert!(!wl.is_allowed("Some.Namespace.MyBehaviorX"));
    }

    #[test]
    fn alternation_stays_fully_anchored() {
        let wl = whitelist("Alpha|Beta");
        assert!(wl.is_allowed("Alpha"));
        assert!(wl.is_allowed("Beta"));
        assert!(!wl.is_allowed("AlphaX"));
        assert!(!wl.is_allowed("XBeta"));
    }

    #[test]
    fn escaped_dollar_is_literal() {
        let wl = whitelist(r"Cost\$");
        assert!(wl.is_allowed("Cost$"));
        assert!(!wl.is_allowed("Cost"));
    }

    #[test]
    fn family_rule_matches_vendor_prefix() {
        let wl = whitelist("KAS.*");
        assert!(wl.is_allowed("Vendor.KASModuleStrut"));
        assert!(!wl.is_allowed("Vendor.ModuleKAS"));
    }

    #[test]
    fn invalid_rules_are_dropped_not_fatal() {
        let wl = whitelist("Good\n(unclosed\nAlsoGood");
        assert_eq!(wl.len(), 2);
        assert_eq!(wl.rejected().len(), 1);
        let err = &wl.rejected()[0];
        assert_eq!(err.line, 2);
        assert_eq!(err.origin, "test.ppwl");
        assert!(err.to_string().starts_with("test.ppwl[2]"));
        assert!(wl.is_allowed("AlsoGood"));
    }

    #[test]
    fn short_name_keeps_leading_dot_names() {
        assert_eq!(short_name("a.b.C"), "C");
        assert_eq!(short_name("C"), "C");
        assert_eq!(short_name(".C"), ".C");
        assert_eq!(short_name("a."), "");
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_whitelist_extension("ppwl"));
        assert!(is_whitelist_extension("PPWL"));
        assert!(is_whitelist_extension("PrunePhysicsWhiteList"));
        assert!(!is_whitelist_extension("cfg"));
    }

    #[test]
    fn matching_rule_reports_origin() {
        let wl = Whitelist::compile(&[
            WhitelistSource::from_text("a.ppwl", "Foo"),
            WhitelistSource::from_text("b.ppwl", "\n\nBar"),
        ]);
        let rule = wl.matching_rule("x.Bar").unwrap();
        assert_eq!(rule.origin, "b.ppwl");
        assert_eq!(rule.line, 3);
    }

    struct CountingProvider {
        calls: Rc<Cell<u32>>,
        text: &'static str,
    }

    impl WhitelistProvider for CountingProvider {
        fn sources(&self) -> Vec<WhitelistSource> {
            self.calls.set(self.calls.get() + 1);
            vec![WhitelistSource::from_text("counted", self.text)]
        }
    }

    #[test]
    fn registry_loads_lazily_once() {
        let calls = Rc::new(Cell::new(0));
        let registry = WhitelistRegistry::new(CountingProvider {
            calls: calls.clone(),
            text: "Foo",
        });
        assert!(!registry.is_loaded());
        assert_eq!(calls.get(), 0);

        assert!(registry.is_allowed("Foo"));
        assert!(!registry.is_allowed("Bar"));
        registry.load();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn registry_reset_forces_reload() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = WhitelistRegistry::new(CountingProvider {
            calls: calls.clone(),
            text: "Foo",
        });
        registry.load();
        let before = registry.revision();

        registry.reset();
        assert!(!registry.is_loaded());
        assert_eq!(registry.revision(), before + 1);

        assert!(registry.is_allowed("Foo"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn empty_registry_allows_nothing() {
        let registry = WhitelistRegistry::empty();
        assert!(!registry.is_allowed("Anything"));
        assert!(registry.load().is_empty());
    }
}
