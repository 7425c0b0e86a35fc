use std::collections::BTreeSet;

/// Одна сторона ACL (разрешённые или запрещённые): точные предикаты по
/// пользователям, группам и флагам плюс признак «все».
///
/// Все значения хранятся в нижнем регистре, проверки членства
/// регистронезависимы.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    all: bool,
    users: BTreeSet<String>,
    groups: BTreeSet<String>,
    flags: BTreeSet<String>,
}

impl Collection {
    /// Пустая коллекция, ничему не соответствует.
    pub fn new() -> Self {
        Self::default()
    }

    /// Установлен ли признак «все» (`*`).
    pub fn all(&self) -> bool {
        self.all
    }

    pub fn users(&self) -> &BTreeSet<String> {
        &self.users
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn flags(&self) -> &BTreeSet<String> {
        &self.flags
    }

    /// Нет ни одного предиката и не установлен признак «все».
    pub fn is_empty(&self) -> bool {
        !self.all && self.users.is_empty() && self.groups.is_empty() && self.flags.is_empty()
    }

    pub(crate) fn set_all(&mut self) {
        self.all = true;
    }

    pub(crate) fn insert_user(
        &mut self,
        user: &str,
    ) {
        self.users.insert(user.to_lowercase());
    }

    pub(crate) fn insert_group(
        &mut self,
        group: &str,
    ) {
        self.groups.insert(group.to_lowercase());
    }

    pub(crate) fn insert_flag(
        &mut self,
        flag: &str,
    ) {
        self.flags.insert(flag.to_lowercase());
    }

    pub fn has_user(
        &self,
        user: &str,
    ) -> bool {
        has(&self.users, user)
    }

    pub fn has_group(
        &self,
        group: &str,
    ) -> bool {
        has(&self.groups, group)
    }

    pub fn has_flag(
        &self,
        flag: &str,
    ) -> bool {
        has(&self.flags, flag)
    }

    /// Пересекается ли набор групп субъекта с группами коллекции.
    pub fn has_any_group(
        &self,
        groups: &[String],
    ) -> bool {
        groups.iter().any(|g| self.has_group(g))
    }

    /// Пересекается ли набор флагов субъекта с флагами коллекции.
    pub fn has_any_flag(
        &self,
        flags: &[String],
    ) -> bool {
        flags.iter().any(|f| self.has_flag(f))
    }
}

fn has(
    set: &BTreeSet<String>,
    value: &str,
) -> bool {
    if set.is_empty() {
        return false;
    }
    set.contains(&value.to_lowercase())
}
