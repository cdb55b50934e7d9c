//! Markup rendering of a replica.
//!
//! Walks the content one char index at a time, emitting cursor markers,
//! property open/close tags and escaped characters. Tags never overlap in
//! the output: closing a tag that is not on top of the stack closes the
//! tags above it first and reopens them after.

use crate::text::editor::Replica;

/// An open tag on the render stack.
#[derive(Debug, Clone)]
struct OpenTag {
    name: String,
    flag: Option<String>,
    end: usize,
}

fn escape(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn open_tag(tag: &OpenTag, out: &mut String) {
    out.push('<');
    out.push_str(&tag.name);
    if let Some(flag) = &tag.flag {
        out.push(' ');
        out.push_str(flag);
    }
    out.push('>');
}

fn close_tag(tag: &OpenTag, out: &mut String) {
    out.push_str("</");
    out.push_str(&tag.name);
    out.push('>');
}

/// Render a replica's content, properties and cursors to a single string.
pub fn render_markup(replica: &Replica) -> String {
    let len = replica.content.len();
    let chars: Vec<char> = replica.content.chars().collect();
    let spans: Vec<_> = replica.properties.iter_spans().collect();

    let mut out = String::new();
    let mut stack: Vec<OpenTag> = Vec::new();

    for i in 0..=len {
        for (_, cursor) in replica.cursors.iter() {
            if cursor.position == i {
                out.push_str("<cursor colour=\"");
                out.push_str(&cursor.colour);
                out.push_str("\" user=\"");
                escape(&cursor.username, &mut out);
                out.push_str("\">");
            }
        }

        // Close every tag ending here, unwinding past still-open inner tags
        // and reopening them afterwards.
        if stack.iter().any(|t| t.end == i) {
            let mut reopen: Vec<OpenTag> = Vec::new();
            while stack.iter().any(|t| t.end == i) {
                let Some(top) = stack.pop() else { break };
                close_tag(&top, &mut out);
                if top.end != i {
                    reopen.push(top);
                }
            }
            for tag in reopen.into_iter().rev() {
                open_tag(&tag, &mut out);
                stack.push(tag);
            }
        }

        for &(name, flag, span) in &spans {
            if span.start == i {
                let tag = OpenTag {
                    name: name.to_string(),
                    flag: flag.map(str::to_string),
                    end: span.end,
                };
                open_tag(&tag, &mut out);
                stack.push(tag);
            }
        }

        if i < len {
            match chars[i] {
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                c => out.push(c),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::editor::Replica;
    use crate::text::Buffer;

    fn replica(content: &str) -> Replica {
        Replica {
            content: Buffer::from_str(content),
            ..Replica::default()
        }
    }

    #[test]
    fn test_plain_content_passes_through() {
        assert_eq!(render_markup(&replica("hello")), "hello");
    }

    #[test]
    fn test_angle_brackets_escaped() {
        assert_eq!(render_markup(&replica("a<b>c")), "a&lt;b&gt;c");
    }

    #[test]
    fn test_cursor_marker() {
        let mut rep = replica("ab");
        rep.cursors.set_local(0, 1);
        assert_eq!(
            render_markup(&rep),
            "a<cursor colour=\"black\" user=\"Me\">b"
        );
    }

    #[test]
    fn test_cursor_at_end_of_content() {
        let mut rep = replica("ab");
        rep.cursors.set_remote(1, 2, "ada");
        assert_eq!(
            render_markup(&rep),
            "ab<cursor colour=\"red\" user=\"ada\">"
        );
    }

    #[test]
    fn test_property_tags() {
        let mut rep = replica("abcd");
        rep.properties.add(1, 3, "bold", None);
        assert_eq!(render_markup(&rep), "a<bold>bc</bold>d");
    }

    #[test]
    fn test_flag_emitted_as_attribute() {
        let mut rep = replica("abcd");
        rep.properties.add(0, 4, "align", Some("left"));
        assert_eq!(render_markup(&rep), "<align left>abcd</align>");
    }

    #[test]
    fn test_overlapping_tags_close_and_reopen() {
        let mut rep = replica("abcdef");
        rep.properties.add(0, 4, "bold", None);
        rep.properties.add(2, 6, "italic", None);
        assert_eq!(
            render_markup(&rep),
            "<bold>ab<italic>cd</italic></bold><italic>ef</italic>"
        );
    }

    #[test]
    fn test_nested_tags_stay_nested() {
        let mut rep = replica("abcd");
        rep.properties.add(0, 4, "bold", None);
        rep.properties.add(1, 3, "italic", None);
        assert_eq!(
            render_markup(&rep),
            "<bold>a<italic>bc</italic>d</bold>"
        );
    }

    #[test]
    fn test_username_is_escaped() {
        let mut rep = replica("x");
        rep.cursors.set_remote(1, 0, "<ada>");
        assert_eq!(
            render_markup(&rep),
            "<cursor colour=\"red\" user=\"&lt;ada&gt;\">x"
        );
    }
}
