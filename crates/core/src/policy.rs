//! Include/exclude decisions for `(module, symbol)` pairs.
//!
//! Patterns are `module[:symbol]` globs. A pattern without a symbol part
//! matches every symbol of the module. The module glob is tried against both
//! the full module name (`UIKit.UIView`) and its top-level part (`UIKit`).

use bridgemeta_common::ConfigError;
use globset::{GlobBuilder, GlobMatcher};

#[derive(Debug, Clone)]
struct SymbolPattern {
    source: String,
    module: GlobMatcher,
    symbol: GlobMatcher,
}

impl SymbolPattern {
    fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let (module, symbol) = pattern.split_once(':').unwrap_or((pattern, "*"));
        Ok(Self {
            source: pattern.to_string(),
            module: compile(pattern, module)?,
            symbol: compile(pattern, symbol)?,
        })
    }

    fn matches(&self, module: &str, symbol: &str) -> bool {
        let top = module.split('.').next().unwrap_or(module);
        (self.module.is_match(module) || self.module.is_match(top)) && self.symbol.is_match(symbol)
    }
}

fn compile(pattern: &str, part: &str) -> Result<GlobMatcher, ConfigError> {
    let part = if part.is_empty() { "*" } else { part };
    GlobBuilder::new(part)
        .literal_separator(false)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Outcome of a policy lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub included: bool,
    /// Pattern that produced the decision, if any.
    pub provenance: Option<String>,
}

/// Allow/deny pattern lists. Deny always wins; an empty allow list allows all.
#[derive(Debug, Clone, Default)]
pub struct InclusionPolicy {
    include: Vec<SymbolPattern>,
    exclude: Vec<SymbolPattern>,
}

impl InclusionPolicy {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: include
                .iter()
                .map(|p| SymbolPattern::parse(p))
                .collect::<Result<_, _>>()?,
            exclude: exclude
                .iter()
                .map(|p| SymbolPattern::parse(p))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn decide(&self, module: &str, symbol: &str) -> PolicyDecision {
        if let Some(deny) = self.exclude.iter().find(|p| p.matches(module, symbol)) {
            return PolicyDecision {
                included: false,
                provenance: Some(format!("excluded by '{}'", deny.source)),
            };
        }
        if self.include.is_empty() {
            return PolicyDecision {
                included: true,
                provenance: None,
            };
        }
        match self.include.iter().find(|p| p.matches(module, symbol)) {
            Some(allow) => PolicyDecision {
                included: true,
                provenance: Some(format!("included by '{}'", allow.source)),
            },
            None => PolicyDecision {
                included: false,
                provenance: Some("not matched by any include pattern".to_string()),
            },
        }
    }
}
