//! ntfy request formatting: headers and mute action buttons.
//!
//! See https://docs.ntfy.sh/publish/ for the header semantics.

use dmon_models::{FeedbackNotification, FeedbackType, Notification, ObjectNotification};

use crate::config::{ImageAttachMethod, NotifierConfig, NtfyPriority};

/// Mute shortcuts offered on object notifications (and after unmuting).
pub const MUTE_PRESETS_S: [i64; 3] = [10 * 60, 60 * 60, 4 * 60 * 60];

/// Shortcuts offered after a short mute: unmute, or extend.
pub const MUTED_FOLLOWUP_PRESETS_S: [i64; 3] = [0, 4 * 60 * 60, 12 * 60 * 60];

/// Mutes longer than this only offer "Unmute".
const LONG_MUTE_S: i64 = 60 * 60;

const MUTED_PRIORITY: NtfyPriority = NtfyPriority::Min;
const UNMUTED_PRIORITY: NtfyPriority = NtfyPriority::Default;

/// Human label for a mute duration: "Unmute", "Mute 10m", "Mute 1h", "Mute 1h 30m".
pub fn mute_label(seconds: i64) -> String {
    if seconds == 0 {
        return "Unmute".to_string();
    }
    let duration = if seconds >= 3600 {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    } else {
        format!("{}m", seconds / 60)
    };
    format!("Mute {}", duration)
}

/// One ntfy `http` action that POSTs a mute command to the control server.
pub fn mute_action(base_url: &str, seconds: i64, key: &str) -> String {
    format!(
        "http, {}, {}/mute, body='{{\"s\": {}, \"key\": \"{}\"}}', headers.content-type=application/json, clear=true",
        mute_label(seconds),
        base_url,
        seconds,
        key
    )
}

fn mute_actions(base_url: &str, presets: &[i64], key: &str) -> String {
    presets
        .iter()
        .map(|s| mute_action(base_url, *s, key))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Public URL of a notification photo.
pub fn photo_url(base_url: &str, id: &str) -> String {
    format!("{}/photo/{}.jpg", base_url, id)
}

/// Build the ntfy headers for a notification.
pub fn headers(config: &NotifierConfig, notification: &Notification) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        ("Tags", notification.tags().to_string()),
        ("Title", notification.title()),
    ];

    match notification {
        Notification::Object(n) => object_headers(config, n, &mut headers),
        Notification::Feedback(n) => feedback_headers(config, n, &mut headers),
    }

    if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
        headers.push(("Authorization", format!("Bearer {}", token)));
    }
    headers
}

fn object_headers(
    config: &NotifierConfig,
    n: &ObjectNotification,
    headers: &mut Vec<(&'static str, String)>,
) {
    let base_url = config.base_url();
    if n.jpeg_image.is_some() {
        let url = photo_url(base_url, &n.id);
        if config.image_method != Some(ImageAttachMethod::Attach) {
            headers.push(("Click", url.clone()));
        }
        if config.image_method != Some(ImageAttachMethod::Click) {
            headers.push(("Attach", url));
        }
    }
    headers.push(("Actions", mute_actions(base_url, &MUTE_PRESETS_S, &n.id)));
    headers.push((
        "Priority",
        config.priority_for(&n.classification).as_str().to_string(),
    ));
}

fn feedback_headers(
    config: &NotifierConfig,
    n: &FeedbackNotification,
    headers: &mut Vec<(&'static str, String)>,
) {
    let base_url = config.base_url();
    match n.kind {
        FeedbackType::Muted => {
            headers.push(("Priority", MUTED_PRIORITY.as_str().to_string()));
            let actions = if n.mute_seconds.is_some_and(|s| s > LONG_MUTE_S) {
                mute_action(base_url, 0, &n.key)
            } else {
                mute_actions(base_url, &MUTED_FOLLOWUP_PRESETS_S, &n.key)
            };
            headers.push(("Actions", actions));
        }
        FeedbackType::Unmuted => {
            headers.push(("Priority", UNMUTED_PRIORITY.as_str().to_string()));
            headers.push(("Actions", mute_actions(base_url, &MUTE_PRESETS_S, &n.key)));
        }
    }
}
