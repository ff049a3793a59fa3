//! Extended playlist (`#EXTM3U`) support
//!
//! Parses the de-facto IPTV playlist format into [`Channel`]s, renders
//! channels back to that format, and orders them by keyword priority.
//!
//! ```text
//! #EXTM3U
//! #EXTINF:-1 tvg-logo="http://logo" group-title="News",BBC One
//! http://example.com/bbc1.m3u8
//! ```

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::{normalize_key, renumber, AuthFields, Channel, DEFAULT_GROUP, DEFAULT_TITLE};

/// Header line of an extended playlist
pub const HEADER: &str = "#EXTM3U";

/// Prefix of a channel info line
pub const INFO_MARKER: &str = "#EXTINF:";

fn logo_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"tvg-logo="([^"]+)""#).expect("valid logo regex"))
}

fn group_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"group-title="([^"]+)""#).expect("valid group regex"))
}

/// Parse playlist text into channels
///
/// Every info line consumes exactly one following line as its stream URL. A
/// blank or `#`-prefixed line there produces no channel, and is not scanned
/// again even if it is itself an info line. A trailing info line with nothing
/// after it is dropped. Ids are dense over produced channels.
pub fn parse(content: &str) -> Vec<Channel> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let mut channels = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if !line.starts_with(INFO_MARKER) {
            continue;
        }

        let Some(&url) = lines.get(i) else {
            debug!("Dropping trailing info line without URL: {}", line);
            break;
        };

        i += 1;
        if url.is_empty() || url.starts_with('#') {
            debug!("No stream URL for info line: {}", line);
            continue;
        }

        let title = display_name(line);
        channels.push(Channel {
            id: channels.len(),
            key: normalize_key(&title),
            title,
            stream_urls: vec![url.to_string()],
            group: capture(group_regex(), line).unwrap_or_else(|| DEFAULT_GROUP.to_string()),
            logo_url: capture(logo_regex(), line).unwrap_or_default(),
            auth: AuthFields::default(),
        });
    }

    debug!("Playlist parsed: {} channels", channels.len());
    channels
}

/// Text after the last comma, or the placeholder title
fn display_name(info_line: &str) -> String {
    info_line
        .rsplit_once(',')
        .map(|(_, name)| name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string()
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Render channels as an extended playlist, one URL per channel
///
/// Channels without a URL are left out. Only the first URL is written.
pub fn render(channels: &[Channel]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for channel in channels {
        let Some(url) = channel.primary_url().filter(|u| !u.is_empty()) else {
            continue;
        };
        out.push_str("#EXTINF:-1");
        if !channel.logo_url.is_empty() {
            out.push_str(&format!(" tvg-logo=\"{}\"", channel.logo_url));
        }
        if !channel.group.is_empty() {
            out.push_str(&format!(" group-title=\"{}\"", channel.group));
        }
        out.push(',');
        out.push_str(&channel.title);
        out.push('\n');
        out.push_str(url);
        out.push('\n');
    }

    out
}

/// Stable-sort channels by the first keyword their title contains
///
/// Matching is case-insensitive. Channels matching no keyword keep their
/// relative order at the end. Ids are reassigned afterwards.
pub fn prioritize<S: AsRef<str>>(channels: &mut [Channel], keywords: &[S]) {
    let lowered: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().to_lowercase())
        .collect();

    channels.sort_by_cached_key(|channel| {
        let title = channel.title.to_lowercase();
        lowered
            .iter()
            .position(|k| title.contains(k.as_str()))
            .unwrap_or(lowered.len())
    });
    renumber(channels);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_takes_name_after_last_comma() {
        let content = "#EXTINF:-1 tvg-logo=\"L\" group-title=\"G\",Name A, Name B\nhttp://x/y\n";
        let channels = parse(content);
        assert_eq!(channels.len(), 1);
        let ch = &channels[0];
        assert_eq!(ch.title, "Name B");
        assert_eq!(ch.logo_url, "L");
        assert_eq!(ch.group, "G");
        assert_eq!(ch.stream_urls, vec!["http://x/y".to_string()]);
        assert_eq!(ch.id, 0);
    }

    #[test]
    fn test_parse_defaults() {
        let content = "#EXTM3U\n#EXTINF:-1\nhttp://a\n#EXTINF:-1 group-title=\"\",  \nhttp://b\n";
        let channels = parse(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].title, "Unknown");
        assert_eq!(channels[0].group, "Other");
        assert_eq!(channels[0].logo_url, "");
        assert_eq!(channels[1].title, "Unknown");
        assert_eq!(channels[1].group, "Other");
    }

    #[test]
    fn test_parse_attributes_independent() {
        let content = "#EXTINF:-1 tvg-logo=\"http://logo\",Logo Only\nhttp://a\n\
                       #EXTINF:-1 group-title=\"News\",Group Only\nhttp://b\n";
        let channels = parse(content);
        assert_eq!(channels[0].logo_url, "http://logo");
        assert_eq!(channels[0].group, "Other");
        assert_eq!(channels[1].logo_url, "");
        assert_eq!(channels[1].group, "News");
    }

    #[test]
    fn test_parse_info_followed_by_info_consumes_both() {
        let content = "#EXTM3U\n#EXTINF:-1,First\n#EXTINF:-1,Second\nhttp://second\n";
        assert!(parse(content).is_empty());

        let content = "#EXTINF:-1,First\n#EXTINF:-1,Second\nhttp://second\n#EXTINF:-1,Third\nhttp://third\n";
        let channels = parse(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "Third");
        assert_eq!(channels[0].id, 0);
    }

    #[test]
    fn test_parse_skips_blank_url_line() {
        let content = "#EXTINF:-1,Empty\n\n#EXTINF:-1,Good\nhttp://good\n";
        let channels = parse(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "Good");
        assert_eq!(channels[0].id, 0);
    }

    #[test]
    fn test_parse_drops_truncated_trailing_info() {
        let content = "#EXTINF:-1,One\nhttp://one\n#EXTINF:-1,Dangling";
        let channels = parse(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "One");
    }

    #[test]
    fn test_parse_trims_whitespace_and_crlf() {
        let content = "#EXTM3U\r\n  #EXTINF:-1 ,  CCTV 1 综合  \r\n  http://cctv1  \r\n";
        let channels = parse(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "CCTV 1 综合");
        assert_eq!(channels[0].key, "CCTV1综合");
        assert_eq!(channels[0].primary_url(), Some("http://cctv1"));
    }

    #[test]
    fn test_parse_keeps_duplicate_keys() {
        let content = "#EXTINF:-1,A B\nhttp://1\n#EXTINF:-1,AB\nhttp://2\n";
        let channels = parse(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].key, channels[1].key);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("#EXTM3U\n").is_empty());
    }

    #[test]
    fn test_render_then_parse() {
        let mut logo = Channel::new(0, "BBC One", "http://bbc", "News");
        logo.logo_url = "http://logo/bbc.png".to_string();
        let plain = Channel::new(1, "Cartoon", "http://toon", "Kids");

        let text = render(&[logo, plain]);
        assert!(text.starts_with("#EXTM3U\n"));
        assert!(text.contains(
            "#EXTINF:-1 tvg-logo=\"http://logo/bbc.png\" group-title=\"News\",BBC One\nhttp://bbc\n"
        ));

        let parsed = parse(&text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].logo_url, "http://logo/bbc.png");
        assert_eq!(parsed[1].title, "Cartoon");
        assert_eq!(parsed[1].group, "Kids");
    }

    #[test]
    fn test_render_skips_channels_without_url() {
        let mut ch = Channel::new(0, "Nothing", "", "Other");
        ch.stream_urls.clear();
        assert_eq!(render(&[ch]), "#EXTM3U\n");
    }

    #[test]
    fn test_prioritize_orders_by_keyword() {
        let mut channels = vec![
            Channel::new(0, "Random Channel", "u0", "g"),
            Channel::new(1, "bbc world", "u1", "g"),
            Channel::new(2, "CCTV-1", "u2", "g"),
            Channel::new(3, "Another", "u3", "g"),
            Channel::new(4, "BBC Two", "u4", "g"),
        ];
        prioritize(&mut channels, &["CCTV", "BBC"]);

        let titles: Vec<&str> = channels.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["CCTV-1", "bbc world", "BBC Two", "Random Channel", "Another"]
        );
        let ids: Vec<usize> = channels.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }
}
