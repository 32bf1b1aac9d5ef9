use chrono::{DateTime, Utc};

/// Fit a repository path into `max_width` characters, keeping the file name
/// and as much of the leading directory as fits.
pub(crate) fn shorten_path(path: &str, max_width: usize) -> String {
    if path.chars().count() <= max_width {
        return path.to_string();
    }

    if let Some((dir, name)) = path.rsplit_once('/') {
        let name_len = name.chars().count();
        if name_len <= max_width {
            let remaining = max_width.saturating_sub(name_len + 4);
            if remaining > 0 {
                let dir_part: String = dir.chars().take(remaining).collect();
                return format!("{}…/{}", dir_part, name);
            }
            return name.to_string();
        }
        return truncate(name, max_width);
    }

    truncate(path, max_width)
}

/// Cut to `max_width` characters, ending with an ellipsis when shortened
pub(crate) fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
}

/// "just now", "5m ago", "3h ago", "2d ago"; future times clamp to "just now"
pub(crate) fn format_relative_time(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - time).num_seconds().max(0);
    if secs < 60 {
        return "just now".to_string();
    }
    if secs < 3600 {
        return format!("{}m ago", secs / 60);
    }
    if secs < 86400 {
        return format!("{}h ago", secs / 3600);
    }
    if secs < 86400 * 30 {
        return format!("{}d ago", secs / 86400);
    }
    time.format("%Y-%m-%d").to_string()
}
