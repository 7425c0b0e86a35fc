use std::{
    fs, io,
    path::{Path, PathBuf},
};

use ftpgate_error::AclError;
use thiserror::Error;
use tracing::debug;

use crate::acl::{Permissions, Rule};

/// Ошибки загрузки файла правил.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {source}")]
    Rule {
        line: usize,
        #[source]
        source: AclError,
    },
    #[error("rules file '{}': {source}", .path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: AclError,
    },
}

/// Разбирает текст правил: по одному правилу на строку.
///
/// Пустые строки и строки, начинающиеся с `#`, пропускаются. Первая же
/// некорректная строка прерывает разбор с её номером (с единицы).
pub fn parse_rules(content: &str) -> Result<Vec<Rule>, RulesError> {
    let mut rules = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let rule = Rule::parse(line).map_err(|source| RulesError::Rule {
            line: idx + 1,
            source,
        })?;
        rules.push(rule);
    }

    Ok(rules)
}

pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>, RulesError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| RulesError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rules = parse_rules(&content)?;
    debug!(path = %path.display(), rules = rules.len(), "Rules file parsed");
    Ok(rules)
}

/// Читает файл правил и строит из него [`Permissions`].
pub fn load_permissions(path: impl AsRef<Path>) -> Result<Permissions, RulesError> {
    let path = path.as_ref();
    Permissions::new(load_rules(path)?).map_err(|source| RulesError::Build {
        path: path.to_path_buf(),
        source,
    })
}
