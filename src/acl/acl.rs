use std::str::FromStr;

use ftpgate_error::AclError;

use super::{collection::Collection, identity::Identity};

/// Политика доступа для одной пары (scope, path): разрешённые и
/// запрещённые предикаты.
///
/// Синтаксис (glftpd), токены разделяются пробелами, регистр не важен:
/// - `-name`: пользователь;
/// - `=name`: группа;
/// - без префикса: группа (см. ниже);
/// - `*`: все;
/// - префикс `!` переносит токен в список запретов: `!-name`, `!=name`, `!*`.
///
/// Токены без префикса документировались как флаги, но правила в
/// эксплуатации опираются на то, что они попадают в группы. Флаги задаются
/// только через [`AclBuilder`].
///
/// Порядок проверки (первое совпадение выигрывает):
/// 1. запрещённый пользователь;
/// 2. запрещённая группа;
/// 3. запрещённый флаг;
/// 4. разрешённый пользователь;
/// 5. разрешённая группа;
/// 6. разрешённый флаг;
/// 7. `!*`;
/// 8. `*`;
/// 9. иначе отказ.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    allowed: Collection,
    blocked: Collection,
}

/// Пошаговое построение [`Acl`] из кода, без текстового разбора.
#[derive(Debug, Default)]
pub struct AclBuilder {
    acl: Acl,
}

impl Acl {
    /// Разбирает строку ACL. Эквивалентно `s.parse::<Acl>()`.
    pub fn parse(s: &str) -> Result<Self, AclError> {
        s.parse()
    }

    pub fn builder() -> AclBuilder {
        AclBuilder::default()
    }

    pub fn allowed_collection(&self) -> &Collection {
        &self.allowed
    }

    pub fn blocked_collection(&self) -> &Collection {
        &self.blocked
    }

    /// Проверяет, разрешено ли действие субъекту. По умолчанию отказ.
    pub fn allowed<I: Identity + ?Sized>(
        &self,
        identity: &I,
    ) -> bool {
        let name = identity.name();
        let groups = identity.groups();
        let flags = identity.flags();

        // Сначала конкретные запреты
        if self.blocked.has_user(name)
            || self.blocked.has_any_group(groups)
            || self.blocked.has_any_flag(flags)
        {
            return false;
        }

        // Потом конкретные разрешения
        if self.allowed.has_user(name)
            || self.allowed.has_any_group(groups)
            || self.allowed.has_any_flag(flags)
        {
            return true;
        }

        if self.blocked.all() {
            return false;
        }

        self.allowed.all()
    }

    /// Разбирает один токен и добавляет его в нужную коллекцию.
    fn push_token(
        &mut self,
        token: &str,
    ) -> Result<(), AclError> {
        let (collection, token) = match token.strip_prefix('!') {
            Some("") => return Err(AclError::ExpectedAfter { prefix: '!' }),
            Some(rest) => (&mut self.blocked, rest),
            None => (&mut self.allowed, token),
        };

        if let Some(user) = token.strip_prefix('-') {
            match user {
                "" => return Err(AclError::ExpectedAfter { prefix: '-' }),
                "*" => return Err(AclError::BadUser { name: user.into() }),
                _ => collection.insert_user(user),
            }
        } else if let Some(group) = token.strip_prefix('=') {
            match group {
                "" => return Err(AclError::ExpectedAfter { prefix: '=' }),
                "*" => return Err(AclError::BadGroup { name: group.into() }),
                _ => collection.insert_group(group),
            }
        } else if token == "*" {
            collection.set_all();
        } else {
            collection.insert_group(token);
        }

        Ok(())
    }
}

impl FromStr for Acl {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Только пустая строка является ошибкой; строка из одних пробелов
        // даёт пустой ACL, который никому ничего не разрешает.
        if s.is_empty() {
            return Err(AclError::EmptyInput);
        }

        let lowered = s.to_lowercase();
        let mut acl = Acl::default();
        for token in lowered.split_whitespace() {
            acl.push_token(token)?;
        }

        Ok(acl)
    }
}

impl AclBuilder {
    pub fn allow_all(mut self) -> Self {
        self.acl.allowed.set_all();
        self
    }

    pub fn block_all(mut self) -> Self {
        self.acl.blocked.set_all();
        self
    }

    pub fn allow_user(
        mut self,
        user: &str,
    ) -> Self {
        self.acl.allowed.insert_user(user);
        self
    }

    pub fn block_user(
        mut self,
        user: &str,
    ) -> Self {
        self.acl.blocked.insert_user(user);
        self
    }

    pub fn allow_group(
        mut self,
        group: &str,
    ) -> Self {
        self.acl.allowed.insert_group(group);
        self
    }

    pub fn block_group(
        mut self,
        group: &str,
    ) -> Self {
        self.acl.blocked.insert_group(group);
        self
    }

    pub fn allow_flag(
        mut self,
        flag: &str,
    ) -> Self {
        self.acl.allowed.insert_flag(flag);
        self
    }

    pub fn block_flag(
        mut self,
        flag: &str,
    ) -> Self {
        self.acl.blocked.insert_flag(flag);
        self
    }

    pub fn build(self) -> Acl {
        self.acl
    }
}
