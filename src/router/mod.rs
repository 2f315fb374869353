//! Path rewriting for the development proxy.
//!
//! Client code issues every request under `/api`. The proxy forwards it to
//! the backend after rewriting the path with the first rule, in declared
//! order, whose prefix matches. The catch-all `/api` rule is last and
//! strips the root prefix only.

mod rules;

pub use rules::{Rewrite, RewriteRule};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Prefix every client-visible API path starts with.
pub const ROOT_PREFIX: &str = "/api";

/// Default rules as (prefix, replacement). `None` strips the prefix.
const STANDARD_RULES: &[(&str, Option<&str>)] = &[
    ("/api/vod_list", Some("/vod/vod_list")),
    ("/api/vod_detail", Some("/vod/vod_detail")),
    ("/api/auth", Some("/auth")),
    ("/api/show", Some("/show")),
    ("/api/collection", Some("/collection")),
    ("/api/publish", Some("/publish")),
    ("/api/reply", Some("/reply")),
    ("/api/delete", Some("/delete")),
    ("/api/imgs", Some("/vod/imgs")),
    ("/api/live", Some("/live")),
    ("/api/proxy/m3u8", Some("/vod/proxy/m3u8")),
    (ROOT_PREFIX, None),
];

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Rule table is empty")]
    Empty,

    #[error("Invalid prefix '{0}': must start with '/'")]
    InvalidPrefix(String),

    #[error("Invalid target '{target}' for prefix '{prefix}': {reason}")]
    InvalidTarget {
        prefix: String,
        target: String,
        reason: String,
    },

    #[error("Rule '{shadowed}' can never match: '{by}' is declared before it")]
    Shadowed { shadowed: String, by: String },

    #[error("Failed to read rule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse rule file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Where a request goes: backend origin plus rewritten path (query kept).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendPath {
    pub origin: String,
    pub path: String,
}

impl BackendPath {
    pub fn url(&self) -> String {
        format!("{}{}", self.origin, self.path)
    }
}

/// One entry of a YAML rule file.
///
/// ```yaml
/// - prefix: /api/vod_list
///   replace: /vod/vod_list
/// - prefix: /api
///   target: http://127.0.0.1:9000
/// ```
#[derive(Debug, Clone, Deserialize)]
struct RuleSpec {
    prefix: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    replace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PathRouter {
    rules: Vec<RewriteRule>,
}

impl PathRouter {
    /// Validate and wrap an ordered rule table.
    pub fn new(rules: Vec<RewriteRule>) -> Result<Self, RouterError> {
        if rules.is_empty() {
            return Err(RouterError::Empty);
        }

        let mut checked: Vec<RewriteRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            let rule = rule.validated()?;
            if let Some(earlier) = checked.iter().find(|r| rule.match_prefix.starts_with(&r.match_prefix)) {
                return Err(RouterError::Shadowed {
                    shadowed: rule.match_prefix.clone(),
                    by: earlier.match_prefix.clone(),
                });
            }
            checked.push(rule);
        }

        Ok(Self { rules: checked })
    }

    /// The platform's rule table, every rule targeting `origin`.
    pub fn standard(origin: &str) -> Result<Self, RouterError> {
        let rules = STANDARD_RULES
            .iter()
            .map(|(prefix, replace)| match replace {
                Some(segment) => RewriteRule::replace(*prefix, *segment, origin),
                None => RewriteRule::strip(*prefix, origin),
            })
            .collect();
        Self::new(rules)
    }

    /// Parse a YAML rule list. Rules without `target` use `default_origin`.
    pub fn from_yaml(content: &str, default_origin: &str) -> Result<Self, RouterError> {
        let specs: Vec<RuleSpec> = serde_yaml::from_str(content)?;
        let rules = specs
            .into_iter()
            .map(|spec| {
                let target = spec.target.unwrap_or_else(|| default_origin.to_string());
                match spec.replace {
                    Some(segment) => RewriteRule::replace(spec.prefix, segment, target),
                    None => RewriteRule::strip(spec.prefix, target),
                }
            })
            .collect();
        Self::new(rules)
    }

    /// Rule file from `VOD_PROXY_RULES` when set, else the standard table.
    pub fn from_config() -> Result<Self, RouterError> {
        let cfg = config::config();
        match &cfg.proxy.rules_file {
            Some(path) => {
                tracing::info!("Loading proxy rules from {}", path.display());
                let content = std::fs::read_to_string(path)?;
                Self::from_yaml(&content, &cfg.backend.origin)
            }
            None => Self::standard(&cfg.backend.origin),
        }
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// First matching rule wins. `None` when the path is outside every rule.
    pub fn resolve(&self, request_path: &str) -> Option<BackendPath> {
        let rule = self.rules.iter().find(|r| r.matches(request_path))?;
        let resolved = BackendPath {
            origin: rule.target_base.clone(),
            path: rule.rewrite_path(request_path),
        };
        tracing::debug!("{} -> {} (rule {})", request_path, resolved.url(), rule.match_prefix);
        Some(resolved)
    }
}
