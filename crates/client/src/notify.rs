//! User-facing notifications and navigation hooks.
//!
//! The client never renders anything itself. Stores report what the user
//! should see through a [`Notifier`] and ask a [`Navigator`] to return to
//! the home screen when the session ends under them. Front ends plug in
//! their own implementations; the defaults log through `tracing`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use reqwest::StatusCode;
use tracing::{error, info, warn};

/// User-facing texts.
pub mod messages {
    pub const SESSION_EXPIRED: &str = "Сессия истекла. Войдите снова";
    pub const SERVER_UNREACHABLE: &str = "Сервер недоступен. Проверьте подключение";
    pub const PROFILE_UPDATED: &str = "Профиль обновлён";
    pub const USER_EXISTS: &str = "Пользователь уже существует";
    pub const REGISTRATION_FAILED: &str = "Ошибка регистрации";
}

/// Message shown for a failed response.
#[must_use]
pub fn status_message(status: StatusCode) -> String {
    let text = match status.as_u16() {
        400 => "Некорректный запрос",
        401 => "Необходима авторизация",
        403 => "Доступ запрещён",
        404 => "Ресурс не найден",
        422 => "Ошибка валидации данных",
        500 => "Внутренняя ошибка сервера",
        502 => "Сервер недоступен (Bad Gateway)",
        503 => "Сервис временно недоступен",
        504 => "Сервер не отвечает (Gateway Timeout)",
        code => return format!("Ошибка {code}"),
    };
    text.to_owned()
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// One user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Leaves the current screen for the home screen.
pub trait Navigator: Send + Sync {
    fn navigate_home(&self);
}

// =============================================================================
// Default implementations
// =============================================================================

/// Logs notices at a level matching their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success | NoticeLevel::Info => info!(message = %notice.message, "Notice"),
            NoticeLevel::Warning => warn!(message = %notice.message, "Notice"),
            NoticeLevel::Error => error!(message = %notice.message, "Notice"),
        }
    }
}

/// Logs navigation requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_home(&self) {
        info!("Navigating to home");
    }
}

// =============================================================================
// Recording implementations
// =============================================================================

/// Keeps every notice, for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of notices with exactly this message.
    #[must_use]
    pub fn count(&self, message: &str) -> usize {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|n| n.message == message)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

/// Counts navigation requests.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    home: AtomicUsize,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn home_count(&self) -> usize {
        self.home.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_home(&self) {
        self.home.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(status_message(StatusCode::NOT_FOUND), "Ресурс не найден");
        assert_eq!(
            status_message(StatusCode::UNPROCESSABLE_ENTITY),
            "Ошибка валидации данных"
        );
        assert_eq!(
            status_message(StatusCode::GATEWAY_TIMEOUT),
            "Сервер не отвечает (Gateway Timeout)"
        );
        assert_eq!(status_message(StatusCode::IM_A_TEAPOT), "Ошибка 418");
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notice::error(messages::SESSION_EXPIRED));
        notifier.notify(Notice::success(messages::PROFILE_UPDATED));

        assert_eq!(notifier.count(messages::SESSION_EXPIRED), 1);
        assert_eq!(notifier.notices()[1].level, NoticeLevel::Success);
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        navigator.navigate_home();
        assert_eq!(navigator.home_count(), 1);
    }
}
