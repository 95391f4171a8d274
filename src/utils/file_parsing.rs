/// Splits a comma separated line, keeping commas inside single or double quotes.
pub fn split_csv_preserving_quotes(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => {
                quote = None;
                current.push(ch);
            }
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            None if ch == ',' => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            None => current.push(ch),
        }
    }
    tokens.push(current.trim().to_string());
    tokens
}

pub fn strip_surrounding_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_commas_stay_in_token() {
        let tokens = split_csv_preserving_quotes("a,'b,c', \"d\" ,e");
        assert_eq!(tokens, vec!["a", "'b,c'", "\"d\"", "e"]);
    }

    #[test]
    fn strips_matching_quotes_only() {
        assert_eq!(strip_surrounding_quotes("'x y'"), "x y");
        assert_eq!(strip_surrounding_quotes("\"x\""), "x");
        assert_eq!(strip_surrounding_quotes("'x\""), "'x\"");
        assert_eq!(strip_surrounding_quotes("x"), "x");
    }
}
