//! Order status display and price visibility.
//!
//! Statuses come from two sources: the portal's own workflow
//! (`pending`, `in-progress`, ...) and the CRM pipeline (`C3:*` stages).

/// Display text for an order status. Unknown statuses are shown verbatim.
#[must_use]
pub fn status_text(status: &str) -> &str {
    match status {
        "pending" => "Ожидает оплаты",
        "processing" => "Обработка",
        "in-progress" => "В работе",
        "completed" | "C3:WIN" => "Завершен",
        "cancelled" | "C3:LOSE" => "Отменен",
        other => other,
    }
}

/// Accounts whose prices are withheld until the deal leaves early stages.
pub const HIDDEN_PRICE_USERNAMES: &[&str] = &["AODMZ", "KTSPECTR", "AOIKAR", "Kronshtadt"];

/// CRM stages during which prices stay hidden for those accounts.
pub const HIDDEN_PRICE_STATUSES: &[&str] = &["C3:NEW", "C3:PREPARATION"];

/// Whether an order's price must be hidden from this user.
///
/// True only for a hidden-price account AND a missing or early-stage status.
#[must_use]
pub fn hide_price(username: Option<&str>, status: Option<&str>) -> bool {
    let hidden_user = username.is_some_and(|u| HIDDEN_PRICE_USERNAMES.contains(&u));
    let hidden_status = status
        .filter(|s| !s.is_empty())
        .is_none_or(|s| HIDDEN_PRICE_STATUSES.contains(&s));

    hidden_user && hidden_status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_known() {
        assert_eq!(status_text("pending"), "Ожидает оплаты");
        assert_eq!(status_text("in-progress"), "В работе");
        assert_eq!(status_text("C3:WIN"), "Завершен");
        assert_eq!(status_text("completed"), "Завершен");
        assert_eq!(status_text("C3:LOSE"), "Отменен");
    }

    #[test]
    fn test_status_text_unknown_is_verbatim() {
        assert_eq!(status_text("C3:PREPARATION"), "C3:PREPARATION");
        assert_eq!(status_text(""), "");
    }

    #[test]
    fn test_hide_price_requires_both_conditions() {
        assert!(hide_price(Some("AODMZ"), Some("C3:NEW")));
        assert!(hide_price(Some("Kronshtadt"), None));
        assert!(hide_price(Some("AOIKAR"), Some("")));
        assert!(!hide_price(Some("AODMZ"), Some("C3:WIN")));
        assert!(!hide_price(Some("buyer"), Some("C3:NEW")));
        assert!(!hide_price(None, None));
    }
}
