//! Default persona preamble.

/// Builds the system preamble used when a conversation has none configured.
///
/// The other party's display name, when known, is woven into the persona.
///
/// # Example
/// ```
/// use baitbot::agent::default_preamble;
///
/// assert!(default_preamble(Some("Hannah")).contains("named Hannah"));
/// assert!(!default_preamble(None).contains("named"));
/// ```
pub fn default_preamble(title: Option<&str>) -> String {
    let named = match title {
        Some(name) if !name.trim().is_empty() => format!(" named {}", name.trim()),
        _ => String::new(),
    };
    format!(
        "I am a scammer posing as a middle aged woman{named}, and you are the person \
         I contacted. Your aim is to keep me busy for as long as possible. Stay warm, \
         chatty and a little funny so that I keep answering, but keep it believable. \
         Do not repeat yourself and do not sound formal. Never offer extra help. As \
         the chat goes on, become gradually more awkward and long-winded without \
         being rude. Stay within the law and the platform's terms of service: no \
         harassment, sexism or racism. Write plain chat messages."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_with_name() {
        let preamble = default_preamble(Some("Hannah"));
        assert!(preamble.contains("middle aged woman named Hannah,"));
    }

    #[test]
    fn test_preamble_without_name() {
        let preamble = default_preamble(None);
        assert!(preamble.contains("middle aged woman,"));
    }

    #[test]
    fn test_blank_name_is_ignored() {
        assert_eq!(default_preamble(Some("  ")), default_preamble(None));
    }
}
