/// Субъект, предъявляемый при проверке прав.
///
/// Реализуется объектом сессии или записью пользователя; ядро только
/// читает эти данные и никогда их не изменяет.
pub trait Identity {
    /// Имя пользователя.
    fn name(&self) -> &str;
    /// Группы, в которых состоит пользователь.
    fn groups(&self) -> &[String];
    /// Флаги пользователя.
    fn flags(&self) -> &[String];
}

impl<T: Identity + ?Sized> Identity for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn groups(&self) -> &[String] {
        (**self).groups()
    }

    fn flags(&self) -> &[String] {
        (**self).flags()
    }
}

/// Простая реализация [`Identity`] для случаев, когда сессия ещё не
/// привязана к записи пользователя (и для тестов).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub groups: Vec<String>,
    pub flags: Vec<String>,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_groups<I, S>(
        mut self,
        groups: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_flags<I, S>(
        mut self,
        flags: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }
}

impl Identity for Subject {
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
