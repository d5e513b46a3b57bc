//! Transient user notifications.
//!
//! Pages and actions push toasts; the host (CLI, tests) drains them after
//! each interaction. Only the most recent [`MAX_TOASTS`] are kept.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[cfg(test)]
#[path = "toast_test.rs"]
mod tests;

pub const MAX_TOASTS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Shared toast queue. Clones share the same queue.
#[derive(Clone, Debug, Default)]
pub struct Toasts {
    queue: Arc<Mutex<VecDeque<Toast>>>,
}

impl Toasts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, level: ToastLevel, message: impl Into<String>) {
        let mut queue = self.queue();
        if queue.len() == MAX_TOASTS {
            queue.pop_front();
        }
        queue.push_back(Toast { level, message: message.into() });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(ToastLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message);
    }

    /// Pending toasts, oldest first, without removing them.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Toast> {
        self.queue().iter().cloned().collect()
    }

    /// Remove and return every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.queue().drain(..).collect()
    }
}
