use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ftpgate_error::{AuthError, AuthResult, StoreError};
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, debug_span, info, warn};

use super::{
    entry::{entry_key, kind_prefix, read_entry, write_entry, Entry, Group, User},
    password::{PasswordConfig, PasswordHasher},
};
use crate::{
    logging::log_error,
    store::{CommitGate, ReadTxn, Store, UpdateTxn},
};

/// Таймаут операций со store по умолчанию.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Пароль, хеш которого проверяется, когда пользователя нет: время ответа
/// не должно выдавать, существует ли учётная запись.
const DUMMY_PASSWORD: &str = "ftpgate-dummy-password";

/// Постоянное хранилище учётных данных.
///
/// Все мутации атомарны относительно store; чтения видят согласованный
/// снимок. `check_password` никогда не возвращает ошибку: любой сбой
/// сворачивается в `false`.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Создаёт пользователя. `UserExists`, если имя занято.
    async fn add_user(
        &self,
        name: &str,
        pass: &str,
    ) -> AuthResult<User>;

    /// Создаёт группу. `GroupExists`, если имя занято.
    async fn add_group(
        &self,
        name: &str,
    ) -> AuthResult<Group>;

    async fn get_user(
        &self,
        name: &str,
    ) -> AuthResult<User>;

    async fn get_group(
        &self,
        name: &str,
    ) -> AuthResult<Group>;

    /// Перезаписывает существующего пользователя (не upsert).
    async fn save_user(
        &self,
        user: &User,
    ) -> AuthResult<()>;

    /// Перезаписывает существующую группу (не upsert).
    async fn save_group(
        &self,
        group: &Group,
    ) -> AuthResult<()>;

    async fn delete_user(
        &self,
        name: &str,
    ) -> AuthResult<()>;

    /// Удаляет группу и убирает её из членства всех пользователей.
    async fn delete_group(
        &self,
        name: &str,
    ) -> AuthResult<()>;

    async fn check_password(
        &self,
        name: &str,
        pass: &str,
    ) -> bool;

    async fn change_password(
        &self,
        name: &str,
        pass: &str,
    ) -> AuthResult<()>;
}

/// Параметры [`StoreAuthenticator`].
#[derive(Debug, Clone)]
pub struct AuthenticatorOptions {
    /// Предел на одну операцию со store.
    pub store_timeout: Duration,
    /// Сколько хеширований может идти одновременно.
    pub max_concurrent_hashes: usize,
}

impl Default for AuthenticatorOptions {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_concurrent_hashes: num_cpus::get().max(1),
        }
    }
}

impl AuthenticatorOptions {
    pub fn from_password_config(
        config: &PasswordConfig,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store_timeout,
            max_concurrent_hashes: config.max_concurrent_hashes.max(1),
        }
    }
}

/// [`Authenticator`] поверх транзакционного [`Store`].
///
/// Хеширование выполняется вне транзакций в пуле блокирующих потоков и
/// ограничено семафором. Каждая операция со store выполняется в
/// `spawn_blocking` под таймаутом.
#[derive(Debug, Clone)]
pub struct StoreAuthenticator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    store: Arc<Store>,
    hasher: PasswordHasher,
    hash_permits: Semaphore,
    store_timeout: Duration,
    dummy_hash: OnceCell<String>,
}

impl StoreAuthenticator {
    pub fn new(
        store: Arc<Store>,
        hasher: PasswordHasher,
        options: AuthenticatorOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                hasher,
                hash_permits: Semaphore::new(options.max_concurrent_hashes.max(1)),
                store_timeout: options.store_timeout,
                dummy_hash: OnceCell::new(),
            }),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.inner.store
    }

    /// Имена всех пользователей по возрастанию.
    pub async fn list_users(&self) -> AuthResult<Vec<String>> {
        self.list_names(User::KIND).await
    }

    /// Имена всех групп по возрастанию.
    pub async fn list_groups(&self) -> AuthResult<Vec<String>> {
        self.list_names(Group::KIND).await
    }

    async fn list_names(
        &self,
        kind: &'static str,
    ) -> AuthResult<Vec<String>> {
        self.with_store("list", move |store| {
            let prefix = kind_prefix(kind);
            store.view(|txn| {
                Ok(txn
                    .keys_with_prefix(&prefix)
                    .into_iter()
                    .map(|key| key[prefix.len()..].to_string())
                    .collect())
            })
        })
        .await
    }

    /// Выполняет чтение `f` над store в блокирующем потоке с таймаутом.
    async fn with_store<T, F>(
        &self,
        operation: &'static str,
        f: F,
    ) -> AuthResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> AuthResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.inner.store);
        let task = tokio::task::spawn_blocking(move || f(&store));

        match tokio::time::timeout(self.inner.store_timeout, task).await {
            Ok(joined) => flatten_join(joined),
            Err(_) => Err(self.timed_out(operation)),
        }
    }

    /// Выполняет транзакцию записи `f` с таймаутом.
    ///
    /// Таймаут, случившийся до начала транзакции, отменяет её: вызывающий
    /// получает `StoreError::Timeout`, и в store ничего не попадает. Если
    /// транзакция уже начата, дожидаемся её настоящего исхода, чтобы не
    /// сообщить об ошибке записи, которая на самом деле прошла. Брошенный
    /// future отменяет транзакцию так же.
    async fn update_store<T, F>(
        &self,
        operation: &'static str,
        f: F,
    ) -> AuthResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut UpdateTxn<'_>) -> AuthResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.inner.store);
        let gate = Arc::new(CommitGate::new(operation));
        let _abandon = AbandonOnDrop(Arc::clone(&gate));

        let task_gate = Arc::clone(&gate);
        let mut task = tokio::task::spawn_blocking(move || store.update_gated(&task_gate, f));

        let outcome = tokio::time::timeout(self.inner.store_timeout, &mut task).await;
        match outcome {
            Ok(joined) => flatten_join(joined),
            Err(_) if gate.abandon() => Err(self.timed_out(operation)),
            Err(_) => {
                debug!(operation, "Deadline passed mid-transaction, awaiting outcome");
                flatten_join(task.await)
            }
        }
    }

    fn timed_out(
        &self,
        operation: &'static str,
    ) -> AuthError {
        let err: AuthError = StoreError::Timeout {
            operation: operation.to_string(),
        }
        .into();
        log_error(&err, operation);
        err
    }

    async fn hash(
        &self,
        password: &str,
    ) -> AuthResult<String> {
        let _permit = self.inner.hash_permits.acquire().await.map_err(|_| {
            AuthError::PasswordHashFailed {
                reason: "hasher closed".into(),
            }
        })?;

        let hasher = self.inner.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::PasswordHashFailed {
                reason: e.to_string(),
            })?
            .map_err(|e| AuthError::PasswordHashFailed {
                reason: e.to_string(),
            })
    }

    async fn verify(
        &self,
        hash: String,
        password: &str,
    ) -> bool {
        let Ok(_permit) = self.inner.hash_permits.acquire().await else {
            return false;
        };

        let hasher = self.inner.hasher.clone();
        let password = password.to_string();
        match tokio::task::spawn_blocking(move || hasher.verify(&hash, &password)).await {
            Ok(Ok(ok)) => ok,
            Ok(Err(err)) => {
                warn!(error = %err, "Stored password hash is unreadable");
                false
            }
            Err(err) => {
                warn!(error = %err, "Password verification task failed");
                false
            }
        }
    }

    /// Проверка по фиктивному хешу, чтобы отказ для несуществующего
    /// пользователя занимал столько же времени, сколько неверный пароль.
    async fn burn_dummy_verify(
        &self,
        password: &str,
    ) {
        let dummy = self
            .inner
            .dummy_hash
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD))
            .await;
        if let Ok(dummy) = dummy {
            let _ = self.verify(dummy.clone(), password).await;
        }
    }

    async fn user_exists(
        &self,
        name: &str,
    ) -> AuthResult<bool> {
        let key = entry_key(User::KIND, name);
        self.with_store("user_exists", move |store| {
            store.view(|txn| Ok(txn.contains(&key)))
        })
        .await
    }
}

/// Бросает транзакцию, если future операции уничтожен до её начала.
struct AbandonOnDrop(Arc<CommitGate>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

fn flatten_join<T>(joined: Result<AuthResult<T>, tokio::task::JoinError>) -> AuthResult<T> {
    joined.unwrap_or_else(|join| {
        Err(StoreError::TaskFailed {
            reason: join.to_string(),
        }
        .into())
    })
}

#[async_trait]
impl Authenticator for StoreAuthenticator {
    async fn add_user(
        &self,
        name: &str,
        pass: &str,
    ) -> AuthResult<User> {
        // Быстрый отказ без дорогого хеширования. Окончательная проверка
        // делается ниже, в той же транзакции, что и вставка.
        if self.user_exists(name).await? {
            return Err(AuthError::UserExists {
                username: name.to_string(),
            });
        }

        let hash = self.hash(pass).await?;
        let user = User::new(name, hash);
        let record = user.clone();

        self.update_store("add_user", move |txn| {
            if txn.contains(&record.key()) {
                return Err(AuthError::UserExists {
                    username: record.name().to_string(),
                });
            }
            write_entry(txn, &record)?;
            Ok(())
        })
        .await?;

        info!(user = name, "User created");
        Ok(user)
    }

    async fn add_group(
        &self,
        name: &str,
    ) -> AuthResult<Group> {
        let group = Group::new(name);
        let record = group.clone();

        self.update_store("add_group", move |txn| {
            if txn.contains(&record.key()) {
                return Err(AuthError::GroupExists {
                    group: record.name().to_string(),
                });
            }
            write_entry(txn, &record)?;
            Ok(())
        })
        .await?;

        info!(group = name, "Group created");
        Ok(group)
    }

    async fn get_user(
        &self,
        name: &str,
    ) -> AuthResult<User> {
        let name = name.to_string();
        self.with_store("get_user", move |store| {
            store.view(|txn| {
                read_entry::<User>(txn, &name)?
                    .ok_or(AuthError::UserDoesntExist { username: name.clone() })
            })
        })
        .await
    }

    async fn get_group(
        &self,
        name: &str,
    ) -> AuthResult<Group> {
        let name = name.to_string();
        self.with_store("get_group", move |store| {
            store.view(|txn| {
                read_entry::<Group>(txn, &name)?
                    .ok_or(AuthError::GroupDoesntExist { group: name.clone() })
            })
        })
        .await
    }

    async fn save_user(
        &self,
        user: &User,
    ) -> AuthResult<()> {
        let record = user.clone();
        self.update_store("save_user", move |txn| {
            if !txn.contains(&record.key()) {
                return Err(AuthError::UserDoesntExist {
                    username: record.name().to_string(),
                });
            }
            if let Some(missing) = record
                .groups()
                .iter()
                .find(|g| !txn.contains(&entry_key(Group::KIND, g)))
            {
                return Err(AuthError::GroupDoesntExist {
                    group: missing.clone(),
                });
            }
            write_entry(txn, &record)?;
            Ok(())
        })
        .await?;

        debug!(user = user.name(), "User saved");
        Ok(())
    }

    async fn save_group(
        &self,
        group: &Group,
    ) -> AuthResult<()> {
        let record = group.clone();
        self.update_store("save_group", move |txn| {
            if !txn.contains(&record.key()) {
                return Err(AuthError::GroupDoesntExist {
                    group: record.name().to_string(),
                });
            }
            write_entry(txn, &record)?;
            Ok(())
        })
        .await?;

        debug!(group = group.name(), "Group saved");
        Ok(())
    }

    async fn delete_user(
        &self,
        name: &str,
    ) -> AuthResult<()> {
        let username = name.to_string();
        self.update_store("delete_user", move |txn| {
            if !txn.delete(&entry_key(User::KIND, &username)) {
                return Err(AuthError::UserDoesntExist { username });
            }
            Ok(())
        })
        .await?;

        info!(user = name, "User deleted");
        Ok(())
    }

    async fn delete_group(
        &self,
        name: &str,
    ) -> AuthResult<()> {
        let group = name.to_string();
        let detached = self
            .update_store("delete_group", move |txn| {
                if !txn.delete(&entry_key(Group::KIND, &group)) {
                    return Err(AuthError::GroupDoesntExist { group });
                }

                let prefix = kind_prefix(User::KIND);
                let mut detached = 0usize;
                for key in txn.keys_with_prefix(&prefix) {
                    let name = &key[prefix.len()..];
                    let Some(mut user) = read_entry::<User>(&*txn, name)? else {
                        continue;
                    };
                    if user.leave_group(&group) {
                        write_entry(txn, &user)?;
                        detached += 1;
                    }
                }
                Ok(detached)
            })
            .await?;

        info!(group = name, members = detached, "Group deleted");
        Ok(())
    }

    async fn check_password(
        &self,
        name: &str,
        pass: &str,
    ) -> bool {
        match self.get_user(name).await {
            Ok(user) => {
                let ok = self.verify(user.password_hash().to_string(), pass).await;
                if !ok {
                    debug!(user = name, "Password mismatch");
                }
                ok
            }
            Err(AuthError::UserDoesntExist { .. }) => {
                debug!(user = name, "Password check for unknown user");
                self.burn_dummy_verify(pass).await;
                false
            }
            Err(err) => {
                debug_span!("check_password", user = name)
                    .in_scope(|| log_error(&err, "check_password"));
                false
            }
        }
    }

    async fn change_password(
        &self,
        name: &str,
        pass: &str,
    ) -> AuthResult<()> {
        if !self.user_exists(name).await? {
            return Err(AuthError::UserDoesntExist {
                username: name.to_string(),
            });
        }

        let hash = self.hash(pass).await?;
        let username = name.to_string();
        self.update_store("change_password", move |txn| {
            let mut user = read_entry::<User>(&*txn, &username)?
                .ok_or_else(|| AuthError::UserDoesntExist {
                    username: username.clone(),
                })?;
            user.set_password_hash(hash);
            write_entry(txn, &user)?;
            Ok(())
        })
        .await?;

        info!(user = name, "Password changed");
        Ok(())
    }
}
