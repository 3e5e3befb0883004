//! HTML fragments for each panel of the wizard.
//!
//! User-entered text is always escaped. Backend fields documented as HTML (`analysis`,
//! string recommendations, summary sections) are inserted as they are.

pub mod history;
pub mod interview;
pub mod labels;
pub mod results;
pub mod symptoms;

/// Escape text for use in element content and quoted attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Upper-case the first letter of every word
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric() && c != '\'';
    }
    out
}

/// `snake_case` or `kebab-case` identifiers as words
pub fn humanize(identifier: &str) -> String {
    identifier.replace(['_', '-'], " ")
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Numbers as a person would write them: `101` rather than `101.0`
pub fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b onclick="x">'hi' & bye</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;&#39;hi&#39; &amp; bye&lt;/b&gt;"
        );
    }

    #[test]
    fn word_helpers() {
        assert_eq!(title_case("south asian"), "South Asian");
        assert_eq!(title_case(&humanize("chest_pain")), "Chest Pain");
        assert_eq!(humanize("middle-eastern"), "middle eastern");
        assert_eq!(capitalize("female"), "Female");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn numbers_drop_trailing_zero() {
        assert_eq!(number(101.0), "101");
        assert_eq!(number(38.5), "38.5");
    }
}
