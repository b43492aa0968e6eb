//! Tracing context for one plugin construction.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::field::Empty;

/// What is known about a plugin construction so far.
#[derive(Debug, Clone, Serialize)]
pub struct LoadContext {
    /// Raw native handle of the instance being constructed.
    pub handle: i64,
    /// Plugin class identifier, once the descriptor has been read.
    pub plugin: Option<String>,
    /// Resource folder, once derived.
    pub path: Option<String>,
    /// When construction started.
    pub started_at: DateTime<Utc>,
}

impl LoadContext {
    /// Start a construction for a native handle.
    #[must_use]
    pub fn new(handle: i64) -> Self {
        Self {
            handle,
            plugin: None,
            path: None,
            started_at: Utc::now(),
        }
    }

    /// Milliseconds since construction started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// A `plugin_load` span. `plugin` and `path` are recorded when the
    /// descriptor is resolved.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        let span = tracing::info_span!(
            "plugin_load",
            handle = self.handle,
            plugin = Empty,
            path = Empty,
        );
        if let Some(plugin) = &self.plugin {
            span.record("plugin", plugin.as_str());
        }
        if let Some(path) = &self.path {
            span.record("path", path.as_str());
        }
        span
    }
}

/// Keeps the `plugin_load` span entered for the whole construction and logs
/// its outcome on drop.
#[must_use = "the span is exited when the guard is dropped"]
pub struct LoadGuard {
    context: LoadContext,
    succeeded: bool,
    span: tracing::span::EnteredSpan,
}

impl LoadGuard {
    /// Enter the span of `context`.
    pub fn new(context: LoadContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("Plugin load started");
        Self {
            context,
            succeeded: false,
            span,
        }
    }

    /// Record the resolved plugin class and resource folder.
    pub fn resolved(&mut self, plugin: &str, path: &Path) {
        let path = path.display().to_string();
        self.span.record("plugin", plugin);
        self.span.record("path", path.as_str());
        self.context.plugin = Some(plugin.to_owned());
        self.context.path = Some(path);
    }

    /// The construction context.
    #[must_use]
    pub fn context(&self) -> &LoadContext {
        &self.context
    }

    /// Mark the construction as successful.
    pub fn succeed(&mut self) {
        self.succeeded = true;
    }
}

impl std::fmt::Debug for LoadGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadGuard")
            .field("context", &self.context)
            .field("succeeded", &self.succeeded)
            .finish_non_exhaustive()
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.context.elapsed_ms();
        if self.succeeded {
            tracing::info!(elapsed_ms, "Plugin loaded");
        } else {
            tracing::warn!(elapsed_ms, "Plugin load failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_fills_the_context() {
        let mut guard = LoadGuard::new(LoadContext::new(7));
        assert_eq!(guard.context().handle, 7);
        assert!(guard.context().plugin.is_none());

        guard.resolved("EchoPlug", Path::new("/plugins/echo"));
        assert_eq!(guard.context().plugin.as_deref(), Some("EchoPlug"));
        assert_eq!(guard.context().path.as_deref(), Some("/plugins/echo"));
        assert!(guard.context().elapsed_ms() >= 0);
    }

    #[test]
    fn context_serializes_for_structured_logs() {
        let json = serde_json::to_value(LoadContext::new(16)).unwrap();
        assert_eq!(json["handle"], 16);
        assert!(json["plugin"].is_null());
        assert!(json["started_at"].is_string());
    }

    #[test]
    fn outcome_is_tracked() {
        let mut guard = LoadGuard::new(LoadContext::new(1));
        assert!(!guard.succeeded);
        guard.succeed();
        assert!(guard.succeeded);
    }
}
