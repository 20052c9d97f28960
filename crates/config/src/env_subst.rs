/// Replace `${ENV_VAR}` and `${ENV_VAR:-fallback}` placeholders in raw config
/// text.
///
/// Unresolvable variables without a fallback are left as-is so the parser
/// reports them in context.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated: emit the remainder untouched.
            result.push_str(&rest[start..]);
            return result;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(val), _) => result.push_str(&val),
            (false, None, Some(fallback)) => result.push_str(fallback),
            _ => {
                result.push_str("${");
                result.push_str(body);
                result.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        (name == "GENOLINK_TEST_SECRET").then(|| "hunter2".to_string())
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_with("secret = \"${GENOLINK_TEST_SECRET}\"", env),
            "secret = \"hunter2\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_with("${GENOLINK_NONEXISTENT}", env),
            "${GENOLINK_NONEXISTENT}"
        );
    }

    #[test]
    fn fallback_used_only_when_unset() {
        assert_eq!(substitute_with("${GENOLINK_NOPE:-8}", env), "8");
        assert_eq!(substitute_with("${GENOLINK_TEST_SECRET:-x}", env), "hunter2");
        assert_eq!(substitute_with("${GENOLINK_NOPE:-}", env), "");
    }

    #[test]
    fn malformed_placeholders_are_literal() {
        assert_eq!(substitute_with("a ${ b", env), "a ${ b");
        assert_eq!(substitute_with("${}", env), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_with("plain $text", env), "plain $text");
    }
}
