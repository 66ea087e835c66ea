//! File watching for configuration hot-reload.
//!
//! This module provides the [`ConfigWatcher`] for monitoring configuration
//! files during development. When a watched file changes, the application
//! reloads its configuration and recompiles the route chain set, so edits
//! to stacks and route chains take effect without a restart.
//!
//! The watcher uses the `notify` crate for cross-platform file system
//! events, debounces rapid changes, and filters by file extension.
//!
//! # Example
//!
//! ```no_run
//! use daedalus_config::ConfigWatcher;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), daedalus_config::ConfigError> {
//! let mut watcher = ConfigWatcher::new()
//!     .with_debounce(Duration::from_millis(500))
//!     .watch_path("conf/")?
//!     .watch_extensions(&["toml", "json"])
//!     .on_change(|event| {
//!         println!("Configuration changed: {:?}", event.path);
//!         // Reload config and recompile the chain set
//!     })
//!     .build()?;
//!
//! watcher.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Change callbacks are invoked on the watcher's task, so they should be
//! fast and non-blocking. For heavy reload work, send a message to another
//! task.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::ConfigError;

/// A debounced configuration file change.
#[derive(Debug, Clone)]
pub struct ConfigChangeEvent {
    /// Path to the changed file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Timestamp when the change was detected.
    pub timestamp: Instant,
}

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File was created.
    Created,
    /// File was modified.
    Modified,
    /// File was deleted.
    Deleted,
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Deleted,
            _ => ChangeKind::Modified,
        }
    }
}

/// Options for the configuration watcher.
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    /// Paths to watch (files or directories).
    pub paths: Vec<PathBuf>,
    /// Debounce duration for rapid changes.
    pub debounce: Duration,
    /// Whether to watch directories recursively.
    pub recursive: bool,
    /// File extensions to watch (empty = all files).
    pub extensions: HashSet<String>,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            debounce: Duration::from_millis(500),
            recursive: true,
            extensions: HashSet::new(),
        }
    }
}

/// Builder for creating a [`ConfigWatcher`].
pub struct ConfigWatcherBuilder {
    options: WatcherOptions,
    callback: Option<Arc<dyn Fn(ConfigChangeEvent) + Send + Sync>>,
}

impl ConfigWatcherBuilder {
    /// Create a new watcher builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: WatcherOptions::default(),
            callback: None,
        }
    }

    /// Set the debounce duration.
    ///
    /// Multiple changes to the same file within this duration are coalesced
    /// into a single event. Default is 500ms.
    #[must_use]
    pub fn with_debounce(mut self, duration: Duration) -> Self {
        self.options.debounce = duration;
        self
    }

    /// Add a path to watch.
    ///
    /// Can be a file or directory. Directories are watched recursively by
    /// default.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist.
    pub fn watch_path<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Path does not exist: {}", path.display()),
            )));
        }
        self.options.paths.push(path.to_path_buf());
        Ok(self)
    }

    /// Add a path to watch, ignoring if it doesn't exist.
    ///
    /// This is useful for optional configuration files.
    #[must_use]
    pub fn watch_path_optional<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            self.options.paths.push(path.to_path_buf());
        }
        self
    }

    /// Set whether to watch directories recursively. Default is true.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.options.recursive = recursive;
        self
    }

    /// Set file extensions to watch.
    ///
    /// Only files with these extensions will trigger events.
    /// Pass an empty slice to watch all files.
    #[must_use]
    pub fn watch_extensions(mut self, extensions: &[&str]) -> Self {
        self.options.extensions = extensions.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Set the callback for change events.
    #[must_use]
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(ConfigChangeEvent) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Build the watcher.
    ///
    /// # Errors
    ///
    /// Returns an error if no paths are configured or if the underlying
    /// watcher cannot be created.
    pub fn build(self) -> Result<ConfigWatcher, ConfigError> {
        if self.options.paths.is_empty() {
            return Err(ConfigError::InvalidConfig {
                message: "No paths configured for configuration watcher".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Only send if channel is open
                let _ = tx.blocking_send(event);
            }
        })
        .map_err(|e| ConfigError::InvalidConfig {
            message: format!("Failed to create configuration watcher: {e}"),
        })?;

        let mode = if self.options.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        for path in &self.options.paths {
            watcher.watch(path, mode).map_err(|e| {
                ConfigError::Io(std::io::Error::other(format!(
                    "Failed to watch path {}: {e}",
                    path.display()
                )))
            })?;
        }

        Ok(ConfigWatcher {
            watcher,
            rx,
            options: self.options,
            callback: self.callback,
            last_event: None,
        })
    }
}

impl Default for ConfigWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Watches configuration files and reports debounced changes.
pub struct ConfigWatcher {
    #[allow(dead_code)]
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Event>,
    options: WatcherOptions,
    callback: Option<Arc<dyn Fn(ConfigChangeEvent) + Send + Sync>>,
    last_event: Option<(PathBuf, Instant)>,
}

impl ConfigWatcher {
    /// Create a new watcher builder.
    #[must_use]
    pub fn new() -> ConfigWatcherBuilder {
        ConfigWatcherBuilder::new()
    }

    /// Run the watcher, invoking the change callback for every event.
    ///
    /// This method blocks and processes file system events until the
    /// watcher is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher encounters a fatal error.
    pub async fn run(&mut self) -> Result<(), ConfigError> {
        while let Some(event) = self.rx.recv().await {
            self.handle_event(event);
        }
        Ok(())
    }

    /// Poll for a single change event.
    ///
    /// Returns immediately if no events are pending.
    pub async fn poll(&mut self) -> Option<ConfigChangeEvent> {
        match self.rx.try_recv() {
            Ok(event) => self.process_event(event),
            Err(_) => None,
        }
    }

    /// Wait for the next change event.
    ///
    /// Blocks until an event passes filtering and debouncing, or the
    /// watcher shuts down.
    pub async fn next(&mut self) -> Option<ConfigChangeEvent> {
        loop {
            match self.rx.recv().await {
                Some(event) => {
                    if let Some(change_event) = self.process_event(event) {
                        return Some(change_event);
                    }
                    // Event was filtered or debounced, continue waiting
                }
                None => return None,
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        if let Some(change_event) = self.process_event(event) {
            if let Some(callback) = &self.callback {
                callback(change_event);
            }
        }
    }

    fn process_event(&mut self, event: Event) -> Option<ConfigChangeEvent> {
        // Only creates, modifies, and deletes are interesting
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
            _ => return None,
        }

        let path = event.paths.first()?.clone();

        // Filter by extension if configured
        if !self.options.extensions.is_empty() {
            match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if self.options.extensions.contains(ext) => {}
                _ => return None,
            }
        }

        // Debounce: skip if the same path changed recently
        let now = Instant::now();
        if let Some((last_path, last_time)) = &self.last_event {
            if last_path == &path && now.duration_since(*last_time) < self.options.debounce {
                return None;
            }
        }

        self.last_event = Some((path.clone(), now));

        Some(ConfigChangeEvent {
            path,
            kind: ChangeKind::from(&event.kind),
            timestamp: now,
        })
    }
}
