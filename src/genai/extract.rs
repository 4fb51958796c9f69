/// Returns the first balanced `{...}` block in `text`, or `None`.
///
/// The text service is not guaranteed to return pure JSON; answers commonly
/// arrive wrapped in prose or markdown fences. The scan tracks string
/// literals and escapes so braces inside strings do not unbalance the count.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object() {
        assert_eq!(extract_json_block(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn object_inside_markdown_fence() {
        let text = "Here you go:\n```json\n{\"isFood\": true, \"calories\": 250}\n```\nHope that helps!";
        assert_eq!(
            extract_json_block(text),
            Some(r#"{"isFood": true, "calories": 250}"#)
        );
    }

    #[test]
    fn nested_objects_stay_balanced() {
        let text = r#"answer: {"a": {"b": {"c": 1}}, "d": 2} trailing"#;
        assert_eq!(
            extract_json_block(text),
            Some(r#"{"a": {"b": {"c": 1}}, "d": 2}"#)
        );
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"{"msg": "look: } escaped \" brace {", "n": 1}"#;
        assert_eq!(extract_json_block(text), Some(text));
    }

    #[test]
    fn no_object_yields_none() {
        assert_eq!(extract_json_block("I could not analyze that image."), None);
        assert_eq!(extract_json_block(""), None);
    }

    #[test]
    fn unterminated_object_yields_none() {
        assert_eq!(extract_json_block(r#"{"a": {"b": 1}"#), None);
    }
}
