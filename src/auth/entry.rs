use std::fmt;

use ftpgate_error::StoreResult;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    acl::Identity,
    store::{decode, encode, ReadTxn, UpdateTxn},
};

/// Запись, хранимая в store под ключом `<KIND>:<name>`.
pub trait Entry: Serialize + DeserializeOwned + Send + 'static {
    const KIND: &'static str;

    fn name(&self) -> &str;

    fn key(&self) -> String {
        entry_key(Self::KIND, self.name())
    }
}

/// Ключ записи. Имя используется как есть, без нормализации регистра.
pub fn entry_key(
    kind: &str,
    name: &str,
) -> String {
    format!("{kind}:{name}")
}

/// Префикс всех ключей данного вида (для перебора).
pub fn kind_prefix(kind: &str) -> String {
    format!("{kind}:")
}

/// Учётная запись пользователя.
///
/// Пароль хранится только в виде хеша. Группы и флаги участвуют в
/// вычислении ACL через [`Identity`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    name: String,
    password_hash: String,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    flags: Vec<String>,
}

/// Группа пользователей. Членство хранится на стороне пользователя.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    name: String,
}

impl User {
    pub(crate) fn new(
        name: impl Into<String>,
        password_hash: String,
    ) -> Self {
        Self {
            name: name.into(),
            password_hash,
            groups: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub(crate) fn set_password_hash(
        &mut self,
        hash: String,
    ) {
        self.password_hash = hash;
    }

    pub fn in_group(
        &self,
        group: &str,
    ) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Добавляет группу. Возвращает `false`, если пользователь уже в ней.
    pub fn join_group(
        &mut self,
        group: impl Into<String>,
    ) -> bool {
        let group = group.into();
        if self.in_group(&group) {
            return false;
        }
        self.groups.push(group);
        true
    }

    /// Убирает группу. Возвращает `false`, если пользователь в ней не состоял.
    pub fn leave_group(
        &mut self,
        group: &str,
    ) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g != group);
        self.groups.len() != before
    }

    pub fn has_flag(
        &self,
        flag: &str,
    ) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn add_flag(
        &mut self,
        flag: impl Into<String>,
    ) -> bool {
        let flag = flag.into();
        if self.has_flag(&flag) {
            return false;
        }
        self.flags.push(flag);
        true
    }

    pub fn remove_flag(
        &mut self,
        flag: &str,
    ) -> bool {
        let before = self.flags.len();
        self.flags.retain(|f| f != flag);
        self.flags.len() != before
    }
}

impl fmt::Debug for User {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("groups", &self.groups)
            .field("flags", &self.flags)
            .finish()
    }
}

impl Identity for User {
    fn name(&self) -> &str {
        &self.name
    }

    fn groups(&self) -> &[String] {
        &self.groups
    }

    fn flags(&self) -> &[String] {
        &self.flags
    }
}

impl Entry for User {
    const KIND: &'static str = "user";

    fn name(&self) -> &str {
        &self.name
    }
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entry for Group {
    const KIND: &'static str = "group";

    fn name(&self) -> &str {
        &self.name
    }
}

pub(crate) fn read_entry<E: Entry>(
    txn: &impl ReadTxn,
    name: &str,
) -> StoreResult<Option<E>> {
    txn.get(&entry_key(E::KIND, name))
        .map(decode::<E>)
        .transpose()
}

pub(crate) fn write_entry<E: Entry>(
    txn: &mut UpdateTxn<'_>,
    entry: &E,
) -> StoreResult<()> {
    let bytes = encode(entry)?;
    txn.set(entry.key(), bytes);
    Ok(())
}
