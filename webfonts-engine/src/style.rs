//! Inline style declarations and font-family lists.
//!
//! Just enough CSS handling for `style="a: b; c: d"` attributes and
//! `font-family` values. Anything more elaborate belongs to the host.

/// Split `text` on `separator` where it appears outside quoted strings and
/// parentheses, so `url('data:a;b')` and `'A;B'` stay whole.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(open)) if c == open => quote = None,
            (_, Some(_)) => {}
            ('(', None) => depth += 1,
            (')', None) => depth = depth.saturating_sub(1),
            (c, None) if c == separator && depth == 0 => {
                pieces.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Iterate `(name, value)` pairs of an inline style, trimmed.
/// Entries without a `:` are skipped.
pub fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    split_top_level(style, ';')
        .into_iter()
        .filter_map(|entry| entry.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
}

/// Value of `name` in an inline style. The last declaration wins, as in CSS.
pub fn declaration<'a>(style: &'a str, name: &str) -> Option<&'a str> {
    declarations(style)
        .filter(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
        .last()
}

/// Rewrite an inline style with `name: value`, replacing any previous
/// declaration of the same property and keeping the others in order.
pub fn set_declaration(style: &str, name: &str, value: &str) -> String {
    let mut out: Vec<String> = declarations(style)
        .filter(|(n, _)| !n.eq_ignore_ascii_case(name))
        .map(|(n, v)| format!("{n}: {v}"))
        .collect();
    out.push(format!("{name}: {value}"));
    out.join("; ")
}

/// Rewrite an inline style without any declaration of `name`.
pub fn remove_declaration(style: &str, name: &str) -> String {
    declarations(style)
        .filter(|(n, _)| !n.eq_ignore_ascii_case(name))
        .map(|(n, v)| format!("{n}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// First family of a `font-family` value, with quotes and surrounding
/// whitespace removed. `None` when nothing is left.
pub fn primary_family(value: &str) -> Option<String> {
    let first = split_top_level(value, ',').into_iter().next()?;
    let family: String = first.chars().filter(|c| *c != '"' && *c != '\'').collect();
    let family = family.trim();
    if family.is_empty() {
        None
    } else {
        Some(family.to_string())
    }
}

/// Join families into a `font-family` value, quoting names that are not
/// plain identifiers (`"Custom Sans", Helvetica, sans-serif`).
pub fn family_list<S: AsRef<str>>(families: &[S]) -> String {
    families
        .iter()
        .map(|family| quote_family(family.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote_family(family: &str) -> String {
    let mut chars = family.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '-' || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        family.to_string()
    } else {
        format!("\"{}\"", family.replace('"', "\\\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_lookup() {
        let style = "color: red; font-family: \"Custom Sans\", sans-serif";
        assert_eq!(declaration(style, "font-family"), Some("\"Custom Sans\", sans-serif"));
        assert_eq!(declaration(style, "COLOR"), Some("red"));
        assert_eq!(declaration(style, "margin"), None);
    }

    #[test]
    fn test_declaration_last_wins() {
        assert_eq!(declaration("font-family: A; font-family: B", "font-family"), Some("B"));
    }

    #[test]
    fn test_declarations_skip_garbage() {
        let pairs: Vec<_> = declarations("; nonsense ; :x; a:b;").collect();
        assert_eq!(pairs, vec![("a", "b")]);
    }

    #[test]
    fn test_set_declaration_replaces() {
        let style = "color: red; font-family: A";
        assert_eq!(set_declaration(style, "font-family", "B"), "color: red; font-family: B");
        assert_eq!(set_declaration("", "font-family", "B"), "font-family: B");
    }

    #[test]
    fn test_remove_declaration() {
        assert_eq!(remove_declaration("color: red; font-family: A", "font-family"), "color: red");
        assert_eq!(remove_declaration("font-family: A", "font-family"), "");
    }

    #[test]
    fn test_primary_family_strips_quotes() {
        assert_eq!(primary_family("\"Custom Sans\", sans-serif").as_deref(), Some("Custom Sans"));
        assert_eq!(primary_family("  'Taamey' ").as_deref(), Some("Taamey"));
        assert_eq!(primary_family("Arial").as_deref(), Some("Arial"));
    }

    #[test]
    fn test_primary_family_empty() {
        assert_eq!(primary_family(""), None);
        assert_eq!(primary_family("  \"\" , serif"), None);
        assert_eq!(primary_family(", serif"), None);
    }

    #[test]
    fn test_family_list_quotes_when_needed() {
        let families = ["Custom Sans", "Helvetica", "sans-serif"];
        assert_eq!(family_list(&families), "\"Custom Sans\", Helvetica, sans-serif");
    }

    #[test]
    fn test_family_list_quotes_leading_digit() {
        assert_eq!(family_list(&["3Dumb", "_x", "-y"]), "\"3Dumb\", _x, -y");
    }

    #[test]
    fn test_data_url_survives_rewrite() {
        let style = "background: url('data:image/png;base64,AAAA'); color: red";
        assert_eq!(
            declaration(style, "background"),
            Some("url('data:image/png;base64,AAAA')")
        );

        let written = set_declaration(style, "font-family", "Taamey, serif");
        assert_eq!(
            written,
            "background: url('data:image/png;base64,AAAA'); color: red; font-family: Taamey, serif"
        );
        assert_eq!(remove_declaration(&written, "font-family"), style);
    }

    #[test]
    fn test_quoted_family_with_semicolon() {
        let style = "font-family: 'Taamey;Bold', serif; color: red";
        let value = declaration(style, "font-family").unwrap();
        assert_eq!(value, "'Taamey;Bold', serif");
        assert_eq!(primary_family(value).as_deref(), Some("Taamey;Bold"));
        assert_eq!(declaration(style, "color"), Some("red"));
    }

    #[test]
    fn test_quoted_family_with_comma() {
        assert_eq!(primary_family("\"Noto, Serif\", serif").as_deref(), Some("Noto, Serif"));
    }
}
