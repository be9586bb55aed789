/// Short single-line preview of post content for logs.
pub fn preview(raw: &str, max_chars: usize) -> String {
    let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() > max_chars {
        let mut truncated: String = line.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    } else {
        line
    }
}

/// Content as line-break-separated HTML, escaped.
pub fn rich_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' => {}
            '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo\nwörld", 7), "héllo w...");
        assert_eq!(preview("short", 10), "short");
    }

    #[test]
    fn rich_html_escapes_then_breaks_lines() {
        assert_eq!(rich_html("a < b\r\nc & d"), "a &lt; b<br>c &amp; d");
    }
}
