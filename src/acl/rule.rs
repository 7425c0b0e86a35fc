use std::str::FromStr;

use ftpgate_error::AclError;

use super::{acl::Acl, scope::Scope};

/// Одна строка файла правил: `<scope> <path> <acl-token> [<acl-token> ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    path: String,
    scope: Scope,
    acl: Acl,
}

impl Rule {
    pub fn new(
        scope: Scope,
        path: impl Into<String>,
        acl: Acl,
    ) -> Self {
        Self {
            path: path.into(),
            scope,
            acl,
        }
    }

    /// Разбирает строку правила. Эквивалентно `line.parse::<Rule>()`.
    pub fn parse(line: &str) -> Result<Self, AclError> {
        line.parse()
    }

    /// Префикс пути, к которому применяется правило (как записан в файле).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn acl(&self) -> &Acl {
        &self.acl
    }

    pub(crate) fn into_parts(self) -> (Scope, String, Acl) {
        (self.scope, self.path, self.acl)
    }
}

impl FromStr for Rule {
    type Err = AclError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(AclError::MissingFields);
        }

        let scope: Scope = fields[0].parse()?;
        let acl: Acl = fields[2..].join(" ").parse()?;

        Ok(Self {
            path: fields[1].to_string(),
            scope,
            acl,
        })
    }
}
