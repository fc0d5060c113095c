use std::borrow::Cow;
use std::fmt::Write;
use shared::protocol::DEFAULT_GAME_PORT;
use shared::types::ServerRecord;

const ELLIPSIS: char = '\u{2026}';

/// Longest host shown in full in the address column
const ADDRESS_HOST_BUDGET: usize = 26;

/// Unit letter, seconds per unit, decimals shown
const DURATION_UNITS: [(char, f64, usize); 4] = [
    ('y', 31_536_000.0, 1),
    ('d', 86_400.0, 0),
    ('h', 3_600.0, 0),
    ('m', 60.0, 0),
];

pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Human readable duration: `45s`, `12m`, `3h`, `2d`, `1.5y`; `?` when unknown.
pub fn humanize(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite()) else {
        return "?".to_string();
    };

    for (code, unit, decimals) in DURATION_UNITS {
        if seconds >= unit {
            let value = seconds / unit;
            let scale = 10f64.powi(decimals as i32);
            let rounded = (value * scale).round() / scale;
            return format!("{:.*}{}", decimals, rounded, code);
        }
    }
    format!("{}s", seconds.trunc() as i64)
}

/// Seconds to whole milliseconds, rounded down.
pub fn millis(seconds: Option<f64>) -> String {
    match seconds.filter(|s| s.is_finite()) {
        Some(seconds) => format!("{}", (seconds * 1000.0).floor() as i64),
        None => "?".to_string(),
    }
}

/// Cut `text` to `budget` characters, spending the last one on an ellipsis.
pub fn truncate(text: &str, budget: usize) -> Cow<'_, str> {
    if budget == 0 || text.chars().count() <= budget {
        return Cow::Borrowed(text);
    }
    let mut out: String = text.chars().take(budget - 1).collect();
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

/// Truncated text with the full text in the hover title.
pub fn tooltip(text: &str, budget: usize) -> String {
    format!(
        r#"<span title="{}">{}</span>"#,
        escape_html(text),
        escape_html(&truncate(text, budget))
    )
}

/// `host[:port]`, bracketing IPv6 literals and hiding the default port.
pub fn address(record: &ServerRecord) -> String {
    let host = if record.address.contains(':') {
        format!("[{}]", record.address)
    } else {
        record.address.clone()
    };
    let full = format!("{}:{}", host, record.port);

    let mut out = String::from("<span");
    let mut short = host;
    if short.chars().count() > ADDRESS_HOST_BUDGET {
        short = short.chars().take(ADDRESS_HOST_BUDGET - 1).collect();
        short.push(ELLIPSIS);
        let _ = write!(out, r#" title="{}""#, escape_html(&full));
    }
    if record.port != DEFAULT_GAME_PORT {
        let _ = write!(short, ":{}", record.port);
    }
    let _ = write!(out, ">{}</span>", escape_html(&short));
    out
}

/// Fixed width cell segment, `width` in em.
pub fn constant_width(text: &str, width: f32) -> String {
    format!(
        r#"<span class="mts_cwidth" style="width:{}em;">{}</span>"#,
        width,
        escape_html(text)
    )
}

/// Hover block listing `items` under `name` with their count; empty for no items.
pub fn hover_list(name: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut out = format!(
        r#"<div class="mts_hover_list"><b>{}</b> ({})<br />"#,
        escape_html(name),
        items.len()
    );
    for item in items {
        let _ = write!(out, "{}<br />", escape_html(item));
    }
    out.push_str("</div>");
    out
}

/// Hover block with a single free text value; empty when there is none.
pub fn hover_string(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) if !value.is_empty() => format!(
            r#"<div class="mts_hover_list"><b>{}</b>:<br />{}<br /></div>"#,
            escape_html(name),
            escape_html(value)
        ),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(address: &str, port: u16) -> ServerRecord {
        ServerRecord {
            address: address.to_string(),
            port,
            ..Default::default()
        }
    }

    #[test]
    fn test_humanize_units() {
        assert_eq!(humanize(Some(45.0)), "45s");
        assert_eq!(humanize(Some(59.0)), "59s");
        assert_eq!(humanize(Some(60.0)), "1m");
        assert_eq!(humanize(Some(3600.0)), "1h");
        assert_eq!(humanize(Some(5400.0)), "2h");
        assert_eq!(humanize(Some(86400.0)), "1d");
        assert_eq!(humanize(Some(31_536_000.0)), "1.0y");
        assert_eq!(humanize(Some(47_304_000.0)), "1.5y");
    }

    #[test]
    fn test_humanize_unknown() {
        assert_eq!(humanize(None), "?");
        assert_eq!(humanize(Some(f64::NAN)), "?");
    }

    #[test]
    fn test_millis() {
        assert_eq!(millis(Some(0.0567)), "56");
        assert_eq!(millis(Some(0.0)), "0");
        assert_eq!(millis(None), "?");
    }

    #[test]
    fn test_truncate_to_budget() {
        let name = "A very long server name that keeps going";
        let cut = truncate(name, 25);

        assert_eq!(cut.chars().count(), 25);
        assert!(cut.ends_with(ELLIPSIS));
        assert_eq!(cut.chars().take(24).collect::<String>(), name.chars().take(24).collect::<String>());

        assert_eq!(truncate("short", 25), "short");
        assert_eq!(truncate("exactly five", 12), "exactly five");
    }

    #[test]
    fn test_tooltip_keeps_full_text() {
        let description = "x".repeat(60);
        let html = tooltip(&description, 50);

        assert!(html.contains(&format!(r#"title="{}""#, description)));
        assert!(html.contains(&format!(">{}{}</span>", "x".repeat(49), ELLIPSIS)));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_address_default_port_hidden() {
        assert_eq!(address(&record("example.org", 30000)), "<span>example.org</span>");
        assert_eq!(address(&record("example.org", 30001)), "<span>example.org:30001</span>");
    }

    #[test]
    fn test_address_brackets_ipv6() {
        assert_eq!(address(&record("2001:db8::1", 30000)), "<span>[2001:db8::1]</span>");
        assert_eq!(address(&record("2001:db8::1", 4000)), "<span>[2001:db8::1]:4000</span>");
    }

    #[test]
    fn test_address_long_host_truncated() {
        let host = "a-really-long-hostname.games.example.org";
        let html = address(&record(host, 30005));

        let short: String = host.chars().take(25).collect();
        assert_eq!(
            html,
            format!(r#"<span title="{}:30005">{}{}:30005</span>"#, host, short, ELLIPSIS)
        );
    }

    #[test]
    fn test_hover_list() {
        assert_eq!(hover_list("Mods", &[]), "");
        let html = hover_list("Clients", &["alice".to_string(), "<bob>".to_string()]);
        assert_eq!(
            html,
            r#"<div class="mts_hover_list"><b>Clients</b> (2)<br />alice<br />&lt;bob&gt;<br /></div>"#
        );
    }

    #[test]
    fn test_hover_string() {
        assert_eq!(hover_string("Privs", None), "");
        assert!(hover_string("Privs", Some("interact, shout")).contains("interact, shout"));
    }

    #[test]
    fn test_constant_width() {
        assert_eq!(
            constant_width("3/20", 3.4),
            r#"<span class="mts_cwidth" style="width:3.4em;">3/20</span>"#
        );
    }
}
