use serde::Serialize;
use url::Url;

use super::RouterError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rewrite {
    /// Drop the matched prefix.
    Strip,
    /// Put this segment where the matched prefix was.
    Replace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteRule {
    pub match_prefix: String,
    pub target_base: String,
    pub rewrite: Rewrite,
}

impl RewriteRule {
    pub fn strip(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            match_prefix: prefix.into(),
            target_base: target.into(),
            rewrite: Rewrite::Strip,
        }
    }

    pub fn replace(prefix: impl Into<String>, segment: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            match_prefix: prefix.into(),
            target_base: target.into(),
            rewrite: Rewrite::Replace(segment.into()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.match_prefix)
    }

    /// Rewrite a path this rule matches. The result always starts with `/`.
    pub fn rewrite_path(&self, path: &str) -> String {
        let rest = path.strip_prefix(self.match_prefix.as_str()).unwrap_or(path);
        let rewritten = match &self.rewrite {
            Rewrite::Strip => rest.to_string(),
            Rewrite::Replace(segment) => format!("{}{}", segment, rest),
        };

        if rewritten.starts_with('/') {
            rewritten
        } else {
            format!("/{}", rewritten)
        }
    }

    pub(super) fn validated(mut self) -> Result<Self, RouterError> {
        if !self.match_prefix.starts_with('/') {
            return Err(RouterError::InvalidPrefix(self.match_prefix));
        }

        let invalid = |reason: &str| RouterError::InvalidTarget {
            prefix: self.match_prefix.clone(),
            target: self.target_base.clone(),
            reason: reason.to_string(),
        };

        let url = Url::parse(&self.target_base).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        if url.path() != "/" {
            return Err(invalid("target must be an origin without a path"));
        }

        self.target_base = self.target_base.trim_end_matches('/').to_string();
        Ok(self)
    }
}
