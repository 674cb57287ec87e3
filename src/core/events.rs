// src/core/events.rs

use crate::core::error::BuildError;
use std::fmt;

/// `log` target under which project messages are mirrored.
pub const BUILD_LOG_TARGET: &str = "anvil::build";

/// Message priority. Lower is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Build-breaking problems.
    Error = 0,
    /// Suspicious but tolerated situations.
    Warn = 1,
    /// Normal progress output.
    Info = 2,
    /// Detail shown with `-v`.
    Verbose = 3,
    /// Internals shown with `-d`.
    Debug = 4,
}

impl LogLevel {
    /// Parses the names accepted by the `echo` task's `level` attribute.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "verbose" => Some(Self::Verbose),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }

    /// The `log` facade level used when mirroring a message.
    pub fn as_log_level(self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
            Self::Verbose => log::Level::Debug,
            Self::Debug => log::Level::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warning",
            Self::Info => "info",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// What an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject<'a> {
    /// The whole build of the named project.
    Build {
        /// Project name.
        project: &'a str,
    },
    /// A single target.
    Target {
        /// Target name.
        target: &'a str,
    },
    /// A task invocation inside a target.
    Task {
        /// Name the task was invoked by.
        task: &'a str,
        /// Owning target.
        target: &'a str,
    },
}

/// The single event shape every listener callback receives.
#[derive(Debug, Clone, Copy)]
pub struct BuildEvent<'a> {
    /// What the event is about.
    pub subject: EventSubject<'a>,
    /// Text of a logged message.
    pub message: Option<&'a str>,
    /// Priority of a logged message.
    pub priority: Option<LogLevel>,
    /// The failure that ended a build, target or task.
    pub error: Option<&'a BuildError>,
}

impl<'a> BuildEvent<'a> {
    /// An event without message or error.
    pub fn new(subject: EventSubject<'a>) -> Self {
        Self {
            subject,
            message: None,
            priority: None,
            error: None,
        }
    }

    /// Attaches a message at the given priority.
    pub fn with_message(mut self, message: &'a str, priority: LogLevel) -> Self {
        self.message = Some(message);
        self.priority = Some(priority);
        self
    }

    /// Attaches an error, if any.
    pub fn with_error(mut self, error: Option<&'a BuildError>) -> Self {
        self.error = error;
        self
    }
}

/// Observer of build lifecycle events. Every method defaults to a no-op.
pub trait BuildListener {
    /// Fired once before any target runs.
    fn build_started(&mut self, _event: &BuildEvent<'_>) {}
    /// Fired once after the last target, with the error if the build failed.
    fn build_finished(&mut self, _event: &BuildEvent<'_>) {}
    /// Fired before a target's guard is evaluated.
    fn target_started(&mut self, _event: &BuildEvent<'_>) {}
    /// Fired after a target ran, was skipped, or failed.
    fn target_finished(&mut self, _event: &BuildEvent<'_>) {}
    /// Fired before a task is created and invoked.
    fn task_started(&mut self, _event: &BuildEvent<'_>) {}
    /// Fired after a task returned, with the error if it failed.
    fn task_finished(&mut self, _event: &BuildEvent<'_>) {}
    /// Fired for every message logged through the project.
    fn message_logged(&mut self, _event: &BuildEvent<'_>) {}
}

/// Ordered fan-out of events to the registered listeners.
///
/// Dispatch is synchronous: each `fire_*` call returns only after every
/// listener, in registration order, has seen the event.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn BuildListener>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener.
    pub fn add_listener(&mut self, listener: Box<dyn BuildListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Takes every listener out of the bus, leaving it empty.
    pub fn take_listeners(&mut self) -> Vec<Box<dyn BuildListener>> {
        std::mem::take(&mut self.listeners)
    }

    /// Puts listeners back (e.g. after lending them to a sub-build).
    pub fn restore_listeners(&mut self, listeners: Vec<Box<dyn BuildListener>>) {
        self.listeners = listeners;
    }

    fn dispatch(&mut self, event: &BuildEvent<'_>, f: fn(&mut dyn BuildListener, &BuildEvent<'_>)) {
        for listener in &mut self.listeners {
            f(listener.as_mut(), event);
        }
    }

    /// Dispatches `build_started`.
    pub fn fire_build_started(&mut self, event: &BuildEvent<'_>) {
        self.dispatch(event, |l, e| l.build_started(e));
    }

    /// Dispatches `build_finished`.
    pub fn fire_build_finished(&mut self, event: &BuildEvent<'_>) {
        self.dispatch(event, |l, e| l.build_finished(e));
    }

    /// Dispatches `target_started`.
    pub fn fire_target_started(&mut self, event: &BuildEvent<'_>) {
        self.dispatch(event, |l, e| l.target_started(e));
    }

    /// Dispatches `target_finished`.
    pub fn fire_target_finished(&mut self, event: &BuildEvent<'_>) {
        self.dispatch(event, |l, e| l.target_finished(e));
    }

    /// Dispatches `task_started`.
    pub fn fire_task_started(&mut self, event: &BuildEvent<'_>) {
        self.dispatch(event, |l, e| l.task_started(e));
    }

    /// Dispatches `task_finished`.
    pub fn fire_task_finished(&mut self, event: &BuildEvent<'_>) {
        self.dispatch(event, |l, e| l.task_finished(e));
    }

    /// Dispatches `message_logged` and mirrors the message to the `log` facade.
    pub fn fire_message_logged(&mut self, event: &BuildEvent<'_>) {
        if let (Some(message), Some(priority)) = (event.message, event.priority) {
            log::log!(target: BUILD_LOG_TARGET, priority.as_log_level(), "{}", message);
        }
        self.dispatch(event, |l, e| l.message_logged(e));
    }
}
