//! CLI ftpgate
//!
//! Администрирование учётных данных и проверка правил доступа без запуска
//! сервера: проверка файла правил, вычисление решения для субъекта,
//! управление пользователями и группами в store.

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ftpgate::{
    init_logging, load_permissions, AuthError, Authenticator, AuthenticatorOptions, ErrorExt,
    Group, Identity, PasswordHasher, Permissions, Scope, Session, Settings, Store,
    StoreAuthenticator, Subject, User,
};
use serde::Serialize;
use tracing::debug;

/// Основная структура CLI аргументов
#[derive(Parser)]
#[command(name = "ftpgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FTPGATE_GIT_COMMIT"),
    ", built ",
    env!("FTPGATE_BUILD_DATE"),
    ")"
))]
#[command(about = "ftpgate - FTP access rules and credential store administration", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Файл конфигурации
    #[arg(short, long, env = "FTPGATE_CONFIG", help = "Путь к файлу конфигурации")]
    config: Option<PathBuf>,
    /// Файл store, перекрывает `store.path` из конфигурации
    #[arg(long, help = "Путь к файлу хранилища учётных данных")]
    store: Option<PathBuf>,
    /// Файл правил, перекрывает `rules_path` из конфигурации
    #[arg(long, help = "Путь к файлу правил доступа")]
    rules: Option<PathBuf>,
    /// Подробный вывод (debug)
    #[arg(short, long, help = "Включить подробный вывод для отладки")]
    verbose: bool,
    /// Только warn/error
    #[arg(short = 'q', long, help = "Подавить логирование (только warn/error)")]
    quiet: bool,
    /// Формат вывода результатов
    #[arg(long, value_enum, default_value = "pretty", help = "Формат вывода")]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

/// Формат вывода CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Человекочитаемый формат
    Pretty,
    /// JSON формат
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Файл правил доступа
    Rules {
        #[command(subcommand)]
        action: RulesCommand,
    },
    /// Пользователи
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Группы
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Разобрать файл правил и построить набор прав
    Check,
    /// Вычислить решение для субъекта
    Eval {
        /// Область (download, upload, ...)
        scope: String,
        /// Путь
        path: String,
        /// Имя пользователя
        #[arg(long)]
        user: String,
        /// Группы субъекта (можно повторять)
        #[arg(long = "group")]
        groups: Vec<String>,
        /// Флаги субъекта (можно повторять)
        #[arg(long = "flag")]
        flags: Vec<String>,
        /// Взять группы и флаги из записи пользователя в store
        #[arg(long)]
        from_store: bool,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Создать пользователя
    Add {
        name: String,
        #[arg(long, env = "FTPGATE_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Сменить пароль
    Passwd {
        name: String,
        #[arg(long, env = "FTPGATE_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Удалить пользователя
    Del { name: String },
    /// Показать пользователя
    Show { name: String },
    /// Список пользователей
    List,
    /// Добавить пользователя в группу
    Join { name: String, group: String },
    /// Убрать пользователя из группы
    Leave { name: String, group: String },
    /// Установить или снять флаг
    Flag {
        name: String,
        flag: String,
        #[arg(long)]
        remove: bool,
    },
    /// Проверить вход (USER + PASS)
    Login {
        name: String,
        #[arg(long, env = "FTPGATE_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum GroupCommand {
    /// Создать группу
    Add { name: String },
    /// Удалить группу (и убрать её у всех пользователей)
    Del { name: String },
    /// Показать группу и её участников
    Show { name: String },
    /// Список групп
    List,
}

/// Представление пользователя для вывода (без хеша).
#[derive(Serialize)]
struct UserView<'a> {
    name: &'a str,
    groups: &'a [String],
    flags: &'a [String],
}

#[derive(Serialize)]
struct GroupView<'a> {
    name: &'a str,
    members: Vec<String>,
}

#[derive(Serialize)]
struct Decision<'a> {
    scope: &'static str,
    path: &'a str,
    user: &'a str,
    rule: Option<&'a str>,
    allowed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(store) = &cli.store {
        settings.store.path = Some(store.clone());
    }
    if let Some(rules) = &cli.rules {
        settings.rules_path = Some(rules.clone());
    }
    if cli.verbose {
        settings.logging.level = "debug".to_string();
    } else if cli.quiet {
        settings.logging.level = "warn".to_string();
    }

    let logging = init_logging(&settings.logging).context("failed to initialize logging")?;
    let result = run(&cli, &settings).await;
    logging.shutdown();
    result
}

async fn run(
    cli: &Cli,
    settings: &Settings,
) -> Result<()> {
    match &cli.command {
        Commands::Rules { action } => run_rules(cli, settings, action).await,
        Commands::User { action } => run_user(cli, &open_authenticator(settings)?, action).await,
        Commands::Group { action } => run_group(cli, &open_authenticator(settings)?, action).await,
    }
}

fn open_authenticator(settings: &Settings) -> Result<StoreAuthenticator> {
    let store = match &settings.store.path {
        Some(path) => Store::open_file(path)
            .with_context(|| format!("failed to open store '{}'", path.display()))?,
        None => {
            debug!("No store path configured, using in-memory store");
            Store::in_memory()
        }
    };

    let hasher = PasswordHasher::new(&settings.password).context("invalid password settings")?;
    let options =
        AuthenticatorOptions::from_password_config(&settings.password, settings.store.timeout());

    Ok(StoreAuthenticator::new(Arc::new(store), hasher, options))
}

fn open_permissions(settings: &Settings) -> Result<Permissions> {
    let Some(path) = &settings.rules_path else {
        bail!("no rules file configured (use --rules or rules_path)");
    };
    Ok(load_permissions(path)?)
}

async fn run_rules(
    cli: &Cli,
    settings: &Settings,
    action: &RulesCommand,
) -> Result<()> {
    let permissions = open_permissions(settings)?;

    match action {
        RulesCommand::Check => {
            println!("ok: {} rules", permissions.len());
            for scope in Scope::ALL {
                let count = permissions.rules_in(scope);
                if count > 0 {
                    println!("  {:<10} {count}", scope.as_str());
                }
            }
        }
        RulesCommand::Eval {
            scope,
            path,
            user,
            groups,
            flags,
            from_store,
        } => {
            let scope: Scope = scope.parse()?;
            let subject = if *from_store {
                let stored = open_authenticator(settings)?.get_user(user).await?;
                Subject::new(stored.name())
                    .with_groups(stored.groups().iter().cloned())
                    .with_flags(stored.flags().iter().cloned())
            } else {
                Subject::new(user.as_str())
                    .with_groups(groups.iter().cloned())
                    .with_flags(flags.iter().cloned())
            };

            let decision = Decision {
                scope: scope.as_str(),
                path,
                user: subject.name(),
                rule: permissions.matching_rule_path(scope, path),
                allowed: permissions.allowed(scope, path, &subject),
            };
            match cli.output {
                OutputFormat::Json => println!("{}", serde_json::to_string(&decision)?),
                OutputFormat::Pretty => println!(
                    "{} {} {} for '{}' (rule: {})",
                    if decision.allowed { "ALLOW" } else { "DENY" },
                    decision.scope,
                    decision.path,
                    decision.user,
                    decision.rule.unwrap_or("none")
                ),
            }
        }
    }

    Ok(())
}

async fn run_user(
    cli: &Cli,
    auth: &StoreAuthenticator,
    action: &UserCommand,
) -> Result<()> {
    match action {
        UserCommand::Add { name, password } => {
            let user = auth.add_user(name, require_password(password)?).await?;
            println!("user '{}' created", user.name());
        }
        UserCommand::Passwd { name, password } => {
            auth.change_password(name, require_password(password)?).await?;
            println!("password for '{name}' changed");
        }
        UserCommand::Del { name } => {
            auth.delete_user(name).await?;
            println!("user '{name}' deleted");
        }
        UserCommand::Show { name } => {
            let user = auth.get_user(name).await?;
            print_user(cli.output, &user)?;
        }
        UserCommand::List => {
            print_names(cli.output, &auth.list_users().await?)?;
        }
        UserCommand::Join { name, group } => {
            let mut user = auth.get_user(name).await?;
            if user.join_group(group.as_str()) {
                auth.save_user(&user).await?;
            }
            print_user(cli.output, &user)?;
        }
        UserCommand::Leave { name, group } => {
            let mut user = auth.get_user(name).await?;
            if user.leave_group(group) {
                auth.save_user(&user).await?;
            }
            print_user(cli.output, &user)?;
        }
        UserCommand::Flag { name, flag, remove } => {
            let mut user = auth.get_user(name).await?;
            let changed = if *remove {
                user.remove_flag(flag)
            } else {
                user.add_flag(flag.as_str())
            };
            if changed {
                auth.save_user(&user).await?;
            }
            print_user(cli.output, &user)?;
        }
        UserCommand::Login { name, password } => {
            let mut session = Session::new();
            session.user_command(name)?;
            match session.pass_command(auth, require_password(password)?).await {
                Ok(user) => println!("230 User {} logged in", user.name()),
                Err(err) => bail!("{} {}", err.status_code().ftp_reply(), err.client_message()),
            }
        }
    }

    Ok(())
}

async fn run_group(
    cli: &Cli,
    auth: &StoreAuthenticator,
    action: &GroupCommand,
) -> Result<()> {
    match action {
        GroupCommand::Add { name } => {
            let group = auth.add_group(name).await?;
            println!("group '{}' created", group.name());
        }
        GroupCommand::Del { name } => {
            auth.delete_group(name).await?;
            println!("group '{name}' deleted");
        }
        GroupCommand::Show { name } => {
            let group: Group = auth.get_group(name).await?;
            let mut members = Vec::new();
            for user in auth.list_users().await? {
                match auth.get_user(&user).await {
                    Ok(user) if user.in_group(group.name()) => members.push(user.name().to_string()),
                    Ok(_) | Err(AuthError::UserDoesntExist { .. }) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            let view = GroupView {
                name: group.name(),
                members,
            };
            match cli.output {
                OutputFormat::Json => println!("{}", serde_json::to_string(&view)?),
                OutputFormat::Pretty => {
                    println!("group:   {}", view.name);
                    println!("members: {}", view.members.join(", "));
                }
            }
        }
        GroupCommand::List => {
            print_names(cli.output, &auth.list_groups().await?)?;
        }
    }

    Ok(())
}

fn require_password(password: &Option<String>) -> Result<&str> {
    match password.as_deref() {
        Some(p) => Ok(p),
        None => bail!("password required (use --password or FTPGATE_USER_PASSWORD)"),
    }
}

fn print_user(
    output: OutputFormat,
    user: &User,
) -> Result<()> {
    let view = UserView {
        name: user.name(),
        groups: user.groups(),
        flags: user.flags(),
    };
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(&view)?),
        OutputFormat::Pretty => {
            println!("user:   {}", view.name);
            println!("groups: {}", view.groups.join(", "));
            println!("flags:  {}", view.flags.join(", "));
        }
    }
    Ok(())
}

fn print_names(
    output: OutputFormat,
    names: &[String],
) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(names)?),
        OutputFormat::Pretty => names.iter().for_each(|n| println!("{n}")),
    }
    Ok(())
}
