use std::{fmt, str::FromStr};

use ftpgate_error::AclError;

/// Область действия правила: категория файловой операции.
///
/// Набор закрыт: неизвестное имя в строке правила является ошибкой
/// разбора, а не молча пропускаемым правилом.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Download,
    Upload,
    Rename,
    RenameOwn,
    Delete,
    DeleteOwn,
    Resume,
    ResumeOwn,
    MakeDir,
    List,
    HideUser,
    HideGroup,
}

/// Таблица имён областей в том виде, в каком они пишутся в файле правил.
static SCOPE_INDEX: phf::Map<&'static str, Scope> = phf::phf_map! {
    "download" => Scope::Download,
    "upload" => Scope::Upload,
    "rename" => Scope::Rename,
    "renameown" => Scope::RenameOwn,
    "delete" => Scope::Delete,
    "deleteown" => Scope::DeleteOwn,
    "resume" => Scope::Resume,
    "resumeown" => Scope::ResumeOwn,
    "makedir" => Scope::MakeDir,
    "list" => Scope::List,
    "hideuser" => Scope::HideUser,
    "hidegroup" => Scope::HideGroup,
};

impl Scope {
    /// Все области в порядке объявления.
    pub const ALL: [Scope; 12] = [
        Scope::Download,
        Scope::Upload,
        Scope::Rename,
        Scope::RenameOwn,
        Scope::Delete,
        Scope::DeleteOwn,
        Scope::Resume,
        Scope::ResumeOwn,
        Scope::MakeDir,
        Scope::List,
        Scope::HideUser,
        Scope::HideGroup,
    ];

    /// Имя области в файле правил.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scope::Download => "download",
            Scope::Upload => "upload",
            Scope::Rename => "rename",
            Scope::RenameOwn => "renameown",
            Scope::Delete => "delete",
            Scope::DeleteOwn => "deleteown",
            Scope::Resume => "resume",
            Scope::ResumeOwn => "resumeown",
            Scope::MakeDir => "makedir",
            Scope::List => "list",
            Scope::HideUser => "hideuser",
            Scope::HideGroup => "hidegroup",
        }
    }
}

impl FromStr for Scope {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SCOPE_INDEX
            .get(s)
            .copied()
            .ok_or_else(|| AclError::UnknownScope { scope: s.to_string() })
    }
}

impl fmt::Display for Scope {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
