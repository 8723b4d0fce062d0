//! Meeting tab identification.

use url::Url;

pub type TabId = u32;

pub const MEETING_HOST: &str = "meet.google.com";

/// Tab update status that means the page finished loading.
pub const TAB_STATUS_COMPLETE: &str = "complete";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTab {
    pub tab_id: TabId,
    pub url: String,
    /// First path segment of the meeting URL, when there is one.
    pub meeting_code: Option<String>,
}

impl TrackedTab {
    pub fn new(tab_id: TabId, url: &str) -> Self {
        Self {
            tab_id,
            url: url.to_string(),
            meeting_code: meeting_code(url),
        }
    }
}

pub fn is_meeting_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host == MEETING_HOST))
        .unwrap_or(false)
}

pub fn meeting_code(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_meeting_host_only() {
        assert!(is_meeting_url("https://meet.google.com/abc-defg-hij"));
        assert!(is_meeting_url("https://meet.google.com/"));
        assert!(!is_meeting_url("https://calendar.google.com/meet.google.com"));
        assert!(!is_meeting_url("not a url"));
    }

    #[test]
    fn meeting_code_is_first_segment() {
        assert_eq!(
            meeting_code("https://meet.google.com/abc-defg-hij?authuser=0"),
            Some("abc-defg-hij".to_string())
        );
        assert_eq!(
            meeting_code("https://meet.google.com/lookup/team-sync"),
            Some("lookup".to_string())
        );
        assert_eq!(meeting_code("https://meet.google.com/"), None);
    }
}
