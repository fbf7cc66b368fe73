//! Read-time presentation of notifications: category, icon color and a
//! relative timestamp. Nothing here is persisted.

use chrono::{DateTime, Utc};

use lostfound_types::api::NotificationView;
use lostfound_types::models::{Notification, NotificationKind};

const READ_COLOR: &str = "bg-gray-400";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Keyword classifier for notifications stored without a kind. First match
/// wins, in this order.
pub fn classify_message(message: &str) -> NotificationKind {
    let text = message.to_lowercase();
    let has = |needle: &str| text.contains(needle);

    if has("new post") {
        NotificationKind::NewPost
    } else if has("claim") || has("take") {
        NotificationKind::Claim
    } else if has("update") || has("status") {
        NotificationKind::Update
    } else {
        NotificationKind::Info
    }
}

pub fn icon_color(kind: NotificationKind, is_read: bool) -> &'static str {
    if is_read {
        return READ_COLOR;
    }
    match kind {
        NotificationKind::NewPost => "bg-green-500",
        NotificationKind::Claim => "bg-purple-500",
        NotificationKind::Update => "bg-orange-500",
        NotificationKind::Info => "bg-blue-500",
    }
}

/// Units are rounded to the nearest whole value and capped below the next
/// bucket, so 90 seconds is "2 minutes ago" and 59m50s stays in minutes.
pub fn format_time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - created_at).num_seconds();

    if elapsed < MINUTE {
        "just now".to_string()
    } else if elapsed < HOUR {
        plural(rounded(elapsed, MINUTE).min(59), "minute")
    } else if elapsed < DAY {
        plural(rounded(elapsed, HOUR).min(23), "hour")
    } else if elapsed < 30 * DAY {
        plural(rounded(elapsed, DAY).min(29), "day")
    } else {
        created_at.format("%d %b %Y").to_string()
    }
}

fn rounded(seconds: i64, unit: i64) -> i64 {
    (seconds + unit / 2) / unit
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

pub fn format_notification(
    notification: Notification,
    post_title: Option<String>,
    now: DateTime<Utc>,
) -> NotificationView {
    let kind = notification
        .kind
        .unwrap_or_else(|| classify_message(&notification.message));

    NotificationView {
        id: notification.id,
        post_id: notification.post_id,
        time: format_time_ago(notification.created_at, now),
        icon_color: icon_color(kind, notification.is_read),
        kind,
        message: notification.message,
        is_read: notification.is_read,
        created_at: notification.created_at,
        post_title: post_title.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn notification(message: &str, kind: Option<NotificationKind>, is_read: bool) -> Notification {
        Notification {
            id: 1,
            post_id: Some(7),
            kind,
            message: message.to_string(),
            is_read,
            created_at: now() - Duration::minutes(5),
        }
    }

    #[test]
    fn classifier_priority() {
        assert_eq!(
            classify_message("New post created by admin (ID: 1): Lost wallet"),
            NotificationKind::NewPost
        );
        assert_eq!(classify_message("Someone wants to CLAIM the umbrella"), NotificationKind::Claim);
        assert_eq!(classify_message("Please take your keys"), NotificationKind::Claim);
        assert_eq!(classify_message("Status changed"), NotificationKind::Update);
        assert_eq!(classify_message("Report 'Lost wallet' resolved by Admin"), NotificationKind::Info);
        // "new post" wins over "status"
        assert_eq!(classify_message("new post status"), NotificationKind::NewPost);
    }

    #[test]
    fn read_overrides_category_color() {
        assert_eq!(icon_color(NotificationKind::NewPost, false), "bg-green-500");
        assert_eq!(icon_color(NotificationKind::Claim, false), "bg-purple-500");
        assert_eq!(icon_color(NotificationKind::Update, false), "bg-orange-500");
        assert_eq!(icon_color(NotificationKind::Info, false), "bg-blue-500");
        for kind in [
            NotificationKind::NewPost,
            NotificationKind::Claim,
            NotificationKind::Update,
            NotificationKind::Info,
        ] {
            assert_eq!(icon_color(kind, true), "bg-gray-400");
        }
    }

    #[test]
    fn relative_time_buckets() {
        let now = now();
        assert_eq!(format_time_ago(now - Duration::seconds(20), now), "just now");
        assert_eq!(format_time_ago(now - Duration::seconds(90), now), "2 minutes ago");
        assert_eq!(format_time_ago(now - Duration::seconds(61), now), "1 minute ago");
        assert_eq!(format_time_ago(now - Duration::seconds(3590), now), "59 minutes ago");
        assert_eq!(format_time_ago(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(format_time_ago(now - Duration::days(1), now), "1 day ago");
        assert_eq!(format_time_ago(now - Duration::days(12), now), "12 days ago");
    }

    #[test]
    fn old_notifications_show_calendar_date() {
        let now = now();
        let ten_months_ago = Utc.with_ymd_and_hms(2024, 8, 3, 9, 30, 0).unwrap();
        assert_eq!(format_time_ago(ten_months_ago, now), "03 Aug 2024");
    }

    #[test]
    fn future_timestamps_are_just_now() {
        let now = now();
        assert_eq!(format_time_ago(now + Duration::minutes(3), now), "just now");
    }

    #[test]
    fn stored_kind_beats_keywords() {
        let view = format_notification(
            notification("Report 'Umbrella' resolved by Admin", Some(NotificationKind::Claim), false),
            Some("Umbrella".into()),
            now(),
        );
        assert_eq!(view.kind, NotificationKind::Claim);
        assert_eq!(view.icon_color, "bg-purple-500");
        assert_eq!(view.time, "5 minutes ago");
        assert_eq!(view.post_title, "Umbrella");
    }

    #[test]
    fn legacy_rows_are_classified_and_orphans_have_empty_title() {
        let view = format_notification(notification("status update", None, true), None, now());
        assert_eq!(view.kind, NotificationKind::Update);
        assert_eq!(view.icon_color, "bg-gray-400");
        assert_eq!(view.post_title, "");
    }
}
