/// Mask a secret for display, keeping a short prefix and the last 4 chars.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }

    let char_count = secret.chars().count();
    let tail = |n: usize| -> String { secret.chars().skip(char_count.saturating_sub(n)).collect() };

    if char_count <= 8 {
        format!("***{}", tail(2))
    } else {
        let prefix: String = secret.chars().take(3).collect();
        format!("{prefix}...{}", tail(4))
    }
}

#[cfg(test)]
mod tests {
    use super::mask_secret;

    #[test]
    fn test_mask_empty() {
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_mask_short_secret_hides_most_chars() {
        assert_eq!(mask_secret("abcd"), "***cd");
        assert_eq!(mask_secret("12345678"), "***78");
    }

    #[test]
    fn test_mask_long_secret() {
        assert_eq!(mask_secret("sk-or-v1-secret-5982"), "sk-...5982");
    }
}
