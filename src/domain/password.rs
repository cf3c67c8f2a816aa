//! Argon2idによるパスワードハッシュ化

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::HashError;

/// ハッシュ化できるパスワードの最大バイト数
pub const MAX_PASSWORD_BYTES: usize = 1024;

/// パスワードハッシュ化のポリシー
///
/// ハッシュごとにランダムなソルトを生成する。コストは構成から与える。
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl PasswordHasher {
    /// コストを指定して作成する
    ///
    /// # エラー
    /// Argon2が受け付けないパラメータの場合は`HashError::Argon2`
    pub fn new(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, HashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| HashError::Argon2(e.to_string()))?;
        Ok(Self { params })
    }

    /// 平文をハッシュ化してPHC文字列を返す
    pub fn hash(&self, plain: &str) -> Result<String, HashError> {
        if plain.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::TooLong {
                max: MAX_PASSWORD_BYTES,
            });
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| HashError::Argon2(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// 平文がハッシュと一致するか
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// 値がArgon2のPHC文字列か
    pub fn is_hash(value: &str) -> bool {
        match PasswordHash::new(value) {
            Ok(parsed) => Algorithm::try_from(parsed.algorithm).is_ok() && parsed.hash.is_some(),
            Err(_) => false,
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(Params::MIN_M_COST, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret123").unwrap();

        assert_ne!(hash, "secret123");
        assert!(hasher.verify("secret123", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = fast_hasher();
        let first = hasher.hash("secret123").unwrap();
        let second = hasher.hash("secret123").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret123", &first));
        assert!(hasher.verify("secret123", &second));
    }

    #[test]
    fn test_hash_rejects_too_long_password() {
        let hasher = fast_hasher();
        let long = "a".repeat(MAX_PASSWORD_BYTES + 1);

        let result = hasher.hash(&long);
        assert!(matches!(
            result,
            Err(HashError::TooLong {
                max: MAX_PASSWORD_BYTES
            })
        ));
    }

    #[test]
    fn test_hash_accepts_max_length_password() {
        let hasher = fast_hasher();
        let max = "a".repeat(MAX_PASSWORD_BYTES);
        assert!(hasher.hash(&max).is_ok());
    }

    #[test]
    fn test_is_hash() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret123").unwrap();

        assert!(PasswordHasher::is_hash(&hash));
        assert!(!PasswordHasher::is_hash("secret123"));
        assert!(!PasswordHasher::is_hash("$not$a$hash"));
        assert!(!PasswordHasher::is_hash(""));
    }

    #[test]
    fn test_verify_with_malformed_hash_is_false() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("secret123", "secret123"));
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        assert!(PasswordHasher::new(0, 0, 0).is_err());
    }

    #[test]
    fn test_debug_shows_costs() {
        let debug = format!("{:?}", fast_hasher());
        assert!(debug.contains("m_cost"));
    }
}
