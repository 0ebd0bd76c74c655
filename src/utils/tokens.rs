use rand::{distributions::Alphanumeric, Rng};

/// Longueur des tokens d'activation et de reset password
pub const TOKEN_LENGTH: usize = 48;

/// Chaîne aléatoire alphanumérique (tokens, salts)
pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn generate_token() -> String {
    random_string(TOKEN_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }
}
