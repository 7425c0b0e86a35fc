use std::{collections::HashMap, path::Path, sync::Arc};

use arc_swap::ArcSwap;
use ftpgate_error::AclError;
use tracing::{debug, info, info_span, trace, warn};

use super::{acl::Acl, identity::Identity, rule::Rule, scope::Scope};
use crate::{
    config::rules::{load_rules, RulesError},
    logging::log_error,
};

/// Политика, привязанная к конкретному пути внутри области.
#[derive(Debug, Clone)]
struct PathAcl {
    /// Путь в том виде, в каком он записан в правиле.
    path: String,
    acl: Acl,
}

/// Полный набор правил, сгруппированный по области и пути.
///
/// Строится один раз и дальше только читается, поэтому проверки не
/// требуют блокировок.
#[derive(Debug, Clone, Default)]
pub struct Permissions {
    /// scope -> нормализованный путь -> ACL
    scopes: HashMap<Scope, HashMap<String, PathAcl>>,
    len: usize,
}

impl Permissions {
    /// Набор без правил: любая проверка завершается отказом.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Строит набор из последовательности правил.
    ///
    /// Два правила с одинаковыми (scope, path) являются ошибкой. Пути
    /// сравниваются по сегментам, поэтому `/dir` и `/dir/` считаются
    /// одним путём.
    pub fn new<I>(rules: I) -> Result<Self, AclError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let mut permissions = Self::default();

        for rule in rules {
            let (scope, path, acl) = rule.into_parts();
            let by_path = permissions.scopes.entry(scope).or_default();
            let key = normalize(&path);

            if by_path.contains_key(&key) {
                return Err(AclError::DuplicatePath {
                    path,
                    scope: scope.to_string(),
                });
            }

            by_path.insert(key, PathAcl { path, acl });
            permissions.len += 1;
        }

        debug!(
            rules = permissions.len,
            scopes = permissions.scopes.len(),
            "Permissions built"
        );

        Ok(permissions)
    }

    /// Общее количество правил.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Количество правил в области.
    pub fn rules_in(
        &self,
        scope: Scope,
    ) -> usize {
        self.scopes.get(&scope).map_or(0, HashMap::len)
    }

    /// Путь правила, которое будет применено к `path`, если такое есть.
    pub fn matching_rule_path(
        &self,
        scope: Scope,
        path: &str,
    ) -> Option<&str> {
        self.lookup(scope, path).map(|p| p.path.as_str())
    }

    /// Проверяет, разрешено ли субъекту действие `scope` над `path`.
    ///
    /// Выбирается правило с самым длинным путём, который является предком
    /// `path` или совпадает с ним. Нет такого правила: отказ.
    pub fn allowed<I: Identity + ?Sized>(
        &self,
        scope: Scope,
        path: &str,
        identity: &I,
    ) -> bool {
        let Some(rule) = self.lookup(scope, path) else {
            trace!(%scope, path, user = identity.name(), "No matching rule, denied");
            return false;
        };

        let allowed = rule.acl.allowed(identity);
        trace!(
            %scope,
            path,
            rule_path = %rule.path,
            user = identity.name(),
            allowed,
            "Permission checked"
        );
        allowed
    }

    fn lookup(
        &self,
        scope: Scope,
        path: &str,
    ) -> Option<&PathAcl> {
        let by_path = self.scopes.get(&scope)?;
        let normalized = normalize(path);

        // Идём от самого пути к корню, первое совпадение самое точное.
        let mut candidate = normalized.as_str();
        loop {
            if let Some(found) = by_path.get(candidate) {
                return Some(found);
            }
            candidate = parent(candidate)?;
        }
    }
}

/// Приводит путь к виду `/a/b`: пустые сегменты и `.` отбрасываются,
/// `..` снимает предыдущий сегмент (выше корня подняться нельзя).
fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

/// Родитель нормализованного пути; у корня родителя нет.
fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        _ if path == "/" => None,
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Разделяемая ссылка на текущее поколение [`Permissions`].
///
/// Перезагрузка конфигурации строит новый набор целиком и атомарно
/// подменяет указатель; проверки не берут блокировок, а уже начатые
/// дорабатывают на старом поколении.
#[derive(Debug, Clone, Default)]
pub struct SharedPermissions {
    current: Arc<ArcSwap<Permissions>>,
}

impl SharedPermissions {
    pub fn new(permissions: Permissions) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(permissions)),
        }
    }

    /// Текущее поколение правил.
    pub fn load(&self) -> Arc<Permissions> {
        self.current.load_full()
    }

    /// Подменяет поколение правил, возвращая предыдущее.
    pub fn store(
        &self,
        permissions: Permissions,
    ) -> Arc<Permissions> {
        self.current.swap(Arc::new(permissions))
    }

    pub fn allowed<I: Identity + ?Sized>(
        &self,
        scope: Scope,
        path: &str,
        identity: &I,
    ) -> bool {
        self.current.load().allowed(scope, path, identity)
    }

    /// Перечитывает файл правил и подменяет поколение только при успехе.
    ///
    /// При ошибке текущие правила остаются в силе.
    pub fn reload_from(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<usize, RulesError> {
        let path = path.as_ref();
        let permissions = load_rules(path)
            .and_then(|rules| {
                Permissions::new(rules).map_err(|source| RulesError::Build {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .inspect_err(|err| report_rejected(path, err))?;

        let count = permissions.len();
        self.store(permissions);
        info!(path = %path.display(), rules = count, "Rules reloaded");
        Ok(count)
    }
}

fn report_rejected(
    path: &Path,
    err: &RulesError,
) {
    let _span = info_span!("reload_rules", path = %path.display()).entered();
    match err {
        RulesError::Rule { line, source } => {
            debug!(line, "Rules reload rejected");
            log_error(source, "reload_rules");
        }
        RulesError::Build { source, .. } => log_error(source, "reload_rules"),
        RulesError::Io { .. } => warn!(error = %err, "Rules reload rejected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::identity::Subject;

    fn build(lines: &[&str]) -> Result<Permissions, AclError> {
        let rules = lines
            .iter()
            .map(|l| Rule::parse(l).expect("rule must parse"))
            .collect::<Vec<_>>();
        Permissions::new(rules)
    }

    fn member(group: &str) -> Subject {
        Subject::new("user").with_groups([group])
    }

    /// Тест проверяет нормализацию путей и поиск родителя.
    #[test]
    fn test_normalize_and_parent() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/dir/a/"), "/dir/a");
        assert_eq!(normalize("//dir///a"), "/dir/a");
        assert_eq!(normalize("dir/a"), "/dir/a");
        assert_eq!(normalize("/dir/./a/."), "/dir/a");
        assert_eq!(normalize("/dir/a/../b"), "/dir/b");
        assert_eq!(normalize("/dir/.."), "/");
        assert_eq!(normalize("/../../etc"), "/etc");

        assert_eq!(parent("/dir/a"), Some("/dir"));
        assert_eq!(parent("/dir"), Some("/"));
        assert_eq!(parent("/"), None);
    }

    /// Тест проверяет построение набора и обнаружение дубликатов.
    #[test]
    fn test_new_permissions() {
        let p = build(&[]).unwrap();
        assert!(p.is_empty());

        let p = build(&["download /dir/a *", "download /dir/b !*"]).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.rules_in(Scope::Download), 2);
        assert_eq!(p.rules_in(Scope::Upload), 0);

        let err = build(&["download /dir/a *", "download /dir/a !*"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "path '/dir/a' for scope 'download' already exists"
        );

        // один и тот же путь в разных областях допустим
        assert!(build(&["download /dir/a *", "upload /dir/a *"]).is_ok());
    }

    /// Тест проверяет, что пути с завершающим слешем считаются дубликатами.
    #[test]
    fn test_duplicate_after_normalization() {
        let err = build(&["list /dir *", "list /dir/ !*"]).unwrap_err();
        assert_eq!(err.to_string(), "path '/dir/' for scope 'list' already exists");
    }

    /// Тест проверяет таблицу решений для одиночных правил.
    #[test]
    fn test_permissions_check() {
        let cases: [(&str, &str, Scope, Subject, bool); 7] = [
            ("download /dir/a *", "/dir/a", Scope::Download, Subject::new("user"), true),
            ("download /dir/a !*", "/dir/a", Scope::Download, Subject::new("user"), false),
            ("download /dir/a -user !*", "/dir/a", Scope::Download, Subject::new("user"), true),
            ("download /dir/a =group !*", "/dir/a", Scope::Download, member("group"), true),
            ("download / =group !*", "/dir/a", Scope::Download, member("group"), true),
            ("download / =group !*", "/dir/a", Scope::Upload, member("group"), false),
            ("download /some/path =group !*", "/dir/a", Scope::Download, member("group"), false),
        ];

        for (line, path, scope, subject, expected) in cases {
            let p = build(&[line]).unwrap();
            assert_eq!(
                p.allowed(scope, path, &subject),
                expected,
                "rule {line:?}, {scope} {path}"
            );
        }
    }

    /// Тест проверяет, что выигрывает самое точное правило.
    #[test]
    fn test_most_specific_rule_wins() {
        let p = build(&[
            "upload / *",
            "upload /incoming !*",
            "upload /incoming/staff =staff !*",
        ])
        .unwrap();

        let guest = Subject::new("guest");
        let staff = member("staff");

        assert!(p.allowed(Scope::Upload, "/pub/file.txt", &guest));
        assert!(!p.allowed(Scope::Upload, "/incoming/file.txt", &guest));
        assert!(!p.allowed(Scope::Upload, "/incoming/staff/x", &guest));
        assert!(p.allowed(Scope::Upload, "/incoming/staff/x", &staff));
        assert!(!p.allowed(Scope::Upload, "/incoming/other", &staff));

        assert_eq!(
            p.matching_rule_path(Scope::Upload, "/incoming/staff/deep/er"),
            Some("/incoming/staff")
        );
        assert_eq!(p.matching_rule_path(Scope::Upload, "/"), Some("/"));
    }

    /// Тест проверяет сравнение по сегментам, а не по подстроке.
    #[test]
    fn test_segment_not_substring_match() {
        let p = build(&["list /dir *"]).unwrap();
        let anyone = Subject::new("anyone");
        assert!(p.allowed(Scope::List, "/dir", &anyone));
        assert!(p.allowed(Scope::List, "/dir/", &anyone));
        assert!(p.allowed(Scope::List, "/dir/sub", &anyone));
        assert!(!p.allowed(Scope::List, "/directory", &anyone));
        assert!(!p.allowed(Scope::List, "/", &anyone));
    }

    /// Тест проверяет, что `..` не выводит запрос из-под чужого правила.
    #[test]
    fn test_dot_segments_resolve_before_lookup() {
        let p = build(&["download / !*", "download /pub *"]).unwrap();
        let anyone = Subject::new("anyone");

        assert!(!p.allowed(Scope::Download, "/private/secret", &anyone));
        assert!(!p.allowed(Scope::Download, "/pub/../private/secret", &anyone));
        assert_eq!(
            p.matching_rule_path(Scope::Download, "/pub/../private/secret"),
            Some("/")
        );

        assert!(p.allowed(Scope::Download, "/pub/./file", &anyone));
        assert!(p.allowed(Scope::Download, "/private/../pub/file", &anyone));
        assert!(!p.allowed(Scope::Download, "/pub/..", &anyone));
        assert!(p.allowed(Scope::Download, "/../../pub", &anyone));
    }

    /// Тест проверяет подмену поколения правил.
    #[test]
    fn test_shared_permissions_swap() {
        let shared = SharedPermissions::new(build(&["list / *"]).unwrap());
        let anyone = Subject::new("anyone");

        let old = shared.load();
        assert!(shared.allowed(Scope::List, "/x", &anyone));

        let previous = shared.store(build(&["list / !*"]).unwrap());
        assert!(Arc::ptr_eq(&previous, &old));
        assert!(!shared.allowed(Scope::List, "/x", &anyone));
        // старое поколение продолжает работать для тех, кто его держит
        assert!(old.allowed(Scope::List, "/x", &anyone));
    }

    /// Тест проверяет, что читатели видят целое поколение во время подмен.
    #[test]
    fn test_shared_permissions_concurrent_reload() {
        let shared = SharedPermissions::new(build(&["list / *", "list /a !*"]).unwrap());
        let anyone = Subject::new("anyone");

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1_000 {
                        let generation = shared.load();
                        // в каждом поколении `/a` и `/b` решаются противоположно
                        assert_ne!(
                            generation.allowed(Scope::List, "/a", &anyone),
                            generation.allowed(Scope::List, "/b", &anyone)
                        );
                    }
                });
            }
            for i in 0..200 {
                let rules = if i % 2 == 0 {
                    ["list / !*", "list /a *"]
                } else {
                    ["list / *", "list /a !*"]
                };
                shared.store(build(&rules).unwrap());
            }
        });
    }
}
