/// Reads the admin token from an `Authorization` header value. Both the backend's
/// `Token <key>` scheme and `Bearer <key>` are accepted.
pub fn parse_admin_token(header: &str) -> Option<String> {
    let (scheme, token) = header.trim().split_once(char::is_whitespace)?;

    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }

    Some(token.to_string())
}
