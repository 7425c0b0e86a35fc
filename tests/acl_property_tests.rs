//! Property-based тесты ACL и Permissions
//!
//! Генерируют случайные наборы токенов и субъектов и проверяют инварианты
//! порядка решений и выбора правила.

use ftpgate::{Acl, Permissions, Rule, Scope, Subject};
use proptest::prelude::*;

/// Базовая настройка proptest - количество итераций
const PROPTEST_CASES: u32 = 512;

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}"
}

fn subject() -> impl Strategy<Value = Subject> {
    (
        name(),
        prop::collection::vec(name(), 0..4),
        prop::collection::vec(name(), 0..3),
    )
        .prop_map(|(n, groups, flags)| Subject::new(n).with_groups(groups).with_flags(flags))
}

/// Один токен ACL в текстовом виде.
fn token() -> impl Strategy<Value = String> {
    (any::<bool>(), 0u8..4, name()).prop_map(|(negate, kind, n)| {
        let bang = if negate { "!" } else { "" };
        match kind {
            0 => format!("{bang}-{n}"),
            1 => format!("{bang}={n}"),
            2 => format!("{bang}{n}"),
            _ => format!("{bang}*"),
        }
    })
}

fn segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-c]{1,2}", 0..5)
}

fn join(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    /// Без совпадений и без `*` всегда отказ.
    #[test]
    fn prop_default_deny(subject in subject(), tokens in prop::collection::vec(token(), 1..6)) {
        let tokens: Vec<_> = tokens.into_iter().filter(|t| !t.ends_with('*')).collect();
        prop_assume!(!tokens.is_empty());
        let acl = Acl::parse(&tokens.join(" ")).unwrap();

        let matches = |c: &ftpgate::Collection| {
            c.has_user(&subject.name)
                || c.has_any_group(&subject.groups)
                || c.has_any_flag(&subject.flags)
        };
        prop_assume!(!matches(acl.allowed_collection()) && !matches(acl.blocked_collection()));

        prop_assert!(!acl.allowed(&subject));
    }

    /// Запрет пользователя сильнее любых разрешений, включая `*`.
    #[test]
    fn prop_blocked_user_dominates(subject in subject(), tokens in prop::collection::vec(token(), 0..6)) {
        let text = format!("* -{0} {1} !-{0}", subject.name, tokens.join(" "));
        let acl = Acl::parse(&text).unwrap();
        prop_assert!(!acl.allowed(&subject));
    }

    /// Порядок токенов не влияет на решение.
    #[test]
    fn prop_token_order_irrelevant(subject in subject(), tokens in prop::collection::vec(token(), 1..6)) {
        let forward = Acl::parse(&tokens.join(" ")).unwrap();
        let mut reversed = tokens.clone();
        reversed.reverse();
        let backward = Acl::parse(&reversed.join(" ")).unwrap();

        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward.allowed(&subject), backward.allowed(&subject));
    }

    /// Регистр в правиле и в имени субъекта не важен.
    #[test]
    fn prop_case_insensitive(n in name()) {
        let acl = Acl::parse(&format!("-{} !*", n.to_uppercase())).unwrap();
        prop_assert!(acl.allowed(&Subject::new(n.clone())));
        prop_assert!(acl.allowed(&Subject::new(n.to_uppercase())));
    }

    /// Решение определяется самым длинным правилом-предком запрошенного пути.
    #[test]
    fn prop_longest_ancestor_wins(
        path in segments(),
        cut in 0usize..5,
        allow_deep in any::<bool>(),
    ) {
        let cut = cut.min(path.len());
        let shallow = join(&path[..cut.saturating_sub(1)]);
        let deep = join(&path[..cut]);
        prop_assume!(shallow != deep);

        let (deep_acl, shallow_acl) = if allow_deep { ("*", "!*") } else { ("!*", "*") };
        let permissions = Permissions::new([
            Rule::parse(&format!("download {shallow} {shallow_acl}")).unwrap(),
            Rule::parse(&format!("download {deep} {deep_acl}")).unwrap(),
        ])
        .unwrap();

        let subject = Subject::new("anyone");
        let query = join(&path);
        prop_assert_eq!(permissions.allowed(Scope::Download, &query, &subject), allow_deep);
        prop_assert_eq!(permissions.matching_rule_path(Scope::Download, &query), Some(deep.as_str()));
        prop_assert!(!permissions.allowed(Scope::Upload, &query, &subject));
    }
}
