use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;

use crate::utils::tokens;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "pbkdf2_sha256";
#[cfg(not(test))]
const ITERATIONS: u32 = 720_000;
// Les tests hashent beaucoup de mots de passe : itérations réduites
#[cfg(test)]
const ITERATIONS: u32 = 1_000;
const KEY_LENGTH: usize = 32;
const SALT_LENGTH: usize = 22;

/// Hash un mot de passe au format Django (compatible avec les comptes existants)
/// Format: pbkdf2_sha256$iterations$salt$hash (hash en base64 standard)
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = tokens::random_string(SALT_LENGTH);
    let key = derive(password, salt.as_bytes(), ITERATIONS, KEY_LENGTH)?;

    Ok(format!("{}${}${}${}", ALGORITHM, ITERATIONS, salt, STANDARD.encode(key)))
}

/// Vérifie un mot de passe contre un hash Django
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    let parts: Vec<&str> = stored_hash.split('$').collect();
    if parts.len() != 4 {
        return Err("Invalid hash format".to_string());
    }

    if parts[0] != ALGORITHM {
        return Err(format!("Unsupported algorithm: {}", parts[0]));
    }

    let iterations = parts[1]
        .parse::<u32>()
        .map_err(|_| "Invalid iterations".to_string())?;

    let expected = STANDARD
        .decode(parts[3])
        .map_err(|e| format!("Invalid hash encoding: {}", e))?;

    let computed = derive(password, parts[2].as_bytes(), iterations, expected.len())?;

    Ok(constant_time_eq(&computed, &expected))
}

fn derive(password: &str, salt: &[u8], iterations: u32, length: usize) -> Result<Vec<u8>, String> {
    let mut key = vec![0u8; length];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt, iterations, &mut key)
        .map_err(|e| format!("PBKDF2 failed: {}", e))?;
    Ok(key)
}

// Comparaison sans sortie anticipée (timing attacks)
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("pbkdf2_sha256$1000$"));
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salt_differs_between_hashes() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_respects_stored_iterations() {
        let key = derive("password", b"seasalt", 1, KEY_LENGTH).unwrap();
        let stored = format!("pbkdf2_sha256$1$seasalt${}", STANDARD.encode(key));
        assert!(verify_password("password", &stored).unwrap());
        assert!(!verify_password("Password", &stored).unwrap());

        // Même valeur que hashlib.pbkdf2_hmac("sha256", b"password", b"seasalt", 1)
        let from_python = "pbkdf2_sha256$1$seasalt$YQUqaoGGIdcjQtCPUVvu1oIcyb7WgPW9b7k/hvRudOk=";
        assert_eq!(stored, from_python);
    }

    #[test]
    fn test_invalid_format() {
        assert!(verify_password("x", "not-a-hash").is_err());
        assert!(verify_password("x", "md5$1$salt$abc").is_err());
    }
}
