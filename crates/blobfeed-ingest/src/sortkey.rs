//! Filename-derived sort keys
//!
//! log4net-style appenders name blobs after the timestamp of the first
//! entry they contain, e.g.
//! `logs/2017_11_01_19_41_34_4218211.91186457-….entry.log.xml`. Two pure
//! string transforms recover ordering information from such names; both
//! tolerate arbitrary names and never panic.

/// Canonical sortable token of a blob name: everything after the last
/// path separator and before the first `.`.
///
/// For `"logs/2017_11_01_19_41_34_4218211.abc.log.xml"` this returns
/// `"2017_11_01_19_41_34_4218211"`. Names without separators or dots are
/// returned unchanged.
pub fn sortable_token(name: &str) -> &str {
    let after_slash = match name.rfind('/') {
        Some(idx) => &name[idx + 1..],
        None => name,
    };
    match after_slash.find('.') {
        Some(idx) => &after_slash[..idx],
        None => after_slash,
    }
}

/// Timestamp literal derived from the blob name's sortable token.
///
/// Splits the token on `_` and maps the first seven components into
/// `YYYY-MM-DDThh:mm:ss.fffZ`. Tokens with fewer than seven components
/// yield `None` and the caller omits the field; components are not
/// checked for numeric-ness (names outside the appender convention keep
/// whatever the split produced).
pub fn timestamp_token(name: &str) -> Option<String> {
    let parts: Vec<&str> = sortable_token(name).split('_').collect();
    if parts.len() < 7 {
        return None;
    }

    Some(format!(
        "{}-{}-{}T{}:{}:{}.{}Z",
        parts[0], parts[1], parts[2], parts[3], parts[4], parts[5], parts[6]
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sortable_token_strips_folder_and_extensions() {
        assert_eq!(
            sortable_token("logs/2017_11_01_19_41_34_4218211.abc.log.xml"),
            "2017_11_01_19_41_34_4218211"
        );
    }

    #[test]
    fn test_sortable_token_uses_last_separator() {
        assert_eq!(
            sortable_token("a/b/c/2017_11_01_19_41_34_4218211.log"),
            "2017_11_01_19_41_34_4218211"
        );
    }

    #[test]
    fn test_sortable_token_without_folder() {
        assert_eq!(sortable_token("2017_11_01.log"), "2017_11_01");
    }

    #[test]
    fn test_sortable_token_without_dot() {
        assert_eq!(sortable_token("logs/plain"), "plain");
    }

    #[test]
    fn test_sortable_token_plain_name() {
        assert_eq!(sortable_token("plain"), "plain");
    }

    #[test]
    fn test_timestamp_from_appender_name() {
        assert_eq!(
            timestamp_token("logs/2017_11_01_19_41_34_4218211.abc.log.xml").unwrap(),
            "2017-11-01T19:41:34.4218211Z"
        );
    }

    #[test]
    fn test_timestamp_requires_seven_components() {
        assert!(timestamp_token("logs/2017_11_01.log").is_none());
        assert!(timestamp_token("plain").is_none());
        assert!(timestamp_token("").is_none());
    }

    #[test]
    fn test_timestamp_does_not_validate_numericness() {
        // Non-numeric components pass through; ordering metadata from
        // unconventional names is best-effort.
        assert_eq!(
            timestamp_token("y_m_d_h_min_s_frac.log").unwrap(),
            "y-m-dTh:min:s.fracZ"
        );
    }
}
