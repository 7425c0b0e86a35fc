use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Password verification failed")]
    Verify,
    #[error("Invalid hasher parameters: {0}")]
    InvalidParams(String),
}

/// Алгоритм хеширования для новых паролей.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Argon2id,
    Bcrypt,
}

/// Параметры хеширования паролей.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub algorithm: HashAlgorithm,
    /// Объём памяти Argon2 в КиБ.
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
    /// Стоимость bcrypt (4..=31).
    pub bcrypt_cost: u32,
    /// Сколько хеширований может выполняться одновременно.
    pub max_concurrent_hashes: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Argon2id,
            argon2_memory_kib: Params::DEFAULT_M_COST,
            argon2_iterations: Params::DEFAULT_T_COST,
            argon2_parallelism: Params::DEFAULT_P_COST,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_concurrent_hashes: num_cpus::get().max(1),
        }
    }
}

/// Хеширует пароли медленной солёной односторонней функцией и проверяет
/// их. Проверка определяет алгоритм по префиксу сохранённого хеша, поэтому
/// смена алгоритма в конфигурации не ломает старые записи.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    algorithm: HashAlgorithm,
    argon2_params: Params,
    bcrypt_cost: u32,
}

impl PasswordHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let argon2_params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(PasswordError::InvalidParams(format!(
                "bcrypt cost {} out of range 4..=31",
                config.bcrypt_cost
            )));
        }

        Ok(Self {
            algorithm: config.algorithm,
            argon2_params,
            bcrypt_cost: config.bcrypt_cost,
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Возвращает хеш в виде строки (PHC для Argon2, modular crypt для bcrypt).
    pub fn hash(
        &self,
        password: &str,
    ) -> Result<String, PasswordError> {
        match self.algorithm {
            HashAlgorithm::Argon2id => {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::new(Algorithm::Argon2id, Version::V0x13, self.argon2_params.clone())
                    .hash_password(password.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
                    .map_err(|e| PasswordError::Hash(e.to_string()))
            }
            HashAlgorithm::Bcrypt => bcrypt::hash(password, self.bcrypt_cost)
                .map_err(|e| PasswordError::Hash(e.to_string())),
        }
    }

    pub fn verify(
        &self,
        hash: &str,
        password: &str,
    ) -> Result<bool, PasswordError> {
        verify_password(hash, password)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Argon2id,
            argon2_params: Params::default(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Проверяет пароль по сохранённому хешу любого поддерживаемого алгоритма.
///
/// `Ok(false)`: пароль неверный. `Err`: хеш не распознан.
pub fn verify_password(
    hash: &str,
    password: &str,
) -> Result<bool, PasswordError> {
    if hash.starts_with("$argon2") {
        let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::Verify)?;
        return Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok());
    }

    if hash.starts_with("$2") {
        return bcrypt::verify(password, hash).map_err(|_| PasswordError::Verify);
    }

    Err(PasswordError::Verify)
}
