use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::Language;
use crate::domain::models::Session;
use crate::domain::services::actions::help_text;
use crate::domain::services::HoneyLedger;
use crate::domain::services::Sessions;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

pub fn data_dir() -> path::PathBuf {
    return path::PathBuf::from(Config::get(ConfigKey::DataDir));
}

pub fn sessions() -> Sessions {
    return Sessions::new(&data_dir());
}

pub fn ledger() -> HoneyLedger {
    let reward_every = Config::get_u64(ConfigKey::RewardEvery) as u32;
    return HoneyLedger::new(&data_dir(), reward_every);
}

pub fn format_session(session: &Session) -> String {
    let mut res = format!(
        "- (ID: {}) {}, Language: {}",
        session.id, session.timestamp, session.language
    );

    if let Some(level) = &session.level {
        res = format!("{res}, Level: {level}");
    }

    if let Some(text) = session.turns.first().and_then(|turn| return turn.text()) {
        let mut line = text.lines().next().unwrap_or_default().to_string();
        if line.chars().count() >= 70 {
            line = format!("{}...", line.chars().take(67).collect::<String>());
        }
        res = format!("{res}, {line}");
    }

    return res;
}

async fn print_sessions_list() -> Result<()> {
    let mut sessions = sessions()
        .list()
        .await?
        .iter()
        .map(|session| {
            return format_session(session);
        })
        .collect::<Vec<String>>();

    sessions.reverse();

    if sessions.is_empty() {
        println!("There are no sessions available. You should start your first one!");
    } else {
        println!("{}", sessions.join("\n"));
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn load_config_from_session(session_id: Option<&String>) -> Result<()> {
    let session = match session_id {
        Some(id) => sessions().load(id).await?,
        None => match sessions().latest().await? {
            Some(session) => session,
            None => bail!("There are no sessions available. You should start your first one!"),
        },
    };

    Config::set(ConfigKey::Language, &session.language.to_string());
    Config::set(ConfigKey::SessionID, &session.id);

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_honey() -> Command {
    return Command::new("honey")
        .about("Check and spend the honey earned by completing exercises.")
        .arg_required_else_help(true)
        .subcommand(Command::new("balance").about("Print your honey balance."))
        .subcommand(
            Command::new("spend").about("Spend honey from your balance.").arg(
                clap::Arg::new("amount")
                    .short('a')
                    .long("amount")
                    .help("How much honey to spend.")
                    .value_parser(value_parser!(u32))
                    .default_value("1"),
            ),
        );
}

fn subcommand_sessions_delete() -> Command {
    return Command::new("delete")
        .about("Delete one or all sessions.")
        .arg(
            clap::Arg::new("session-id")
                .short('i')
                .long("id")
                .help("Session ID")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("all")
                .long("all")
                .help("Delete all sessions.")
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("delete-args")
                .args(["session-id", "all"])
                .required(true),
        );
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Manage past tutoring sessions.")
        .arg_required_else_help(true)
        .subcommand(Command::new("dir").about("Print the sessions directory path."))
        .subcommand(Command::new("list").about("List all previous sessions with their ids, languages and levels."))
        .subcommand(
            Command::new("open")
                .about("Continue a previous session by ID. Omit passing any session ID to continue the most recent one.")
                .arg(
                    clap::Arg::new(ConfigKey::SessionID.to_string())
                        .short('i')
                        .long("id")
                        .help("Session ID")
                        .required(false),
                ),
        )
        .subcommand(subcommand_sessions_delete());
}

fn config_arg(key: ConfigKey, help: &str) -> Arg {
    let env_name = format!(
        "HIVETUTOR_{}",
        key.to_string().to_uppercase().replace('-', "_")
    );

    let default = Config::default(key);
    let help = if default.is_empty() {
        help.to_string()
    } else {
        format!("{help} [default: {default}]")
    };

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env_name)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return format!("CHAT {line}").underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nBuilt: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_DATE")
    );

    return Command::new("hivetutor")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start a new tutoring session."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_honey())
        .subcommand(subcommand_sessions())
        .arg(
            config_arg(ConfigKey::Backend, "The backend hosting the model that acts as your tutor.")
                .short('b')
                .value_parser(PossibleValuesParser::new(BackendName::VARIANTS)),
        )
        .arg(config_arg(
            ConfigKey::BackendHealthCheckTimeout,
            "Time to wait in milliseconds before timing out when doing a healthcheck for a backend.",
        ))
        .arg(
            config_arg(ConfigKey::Model, "The model to consume on the backend. Defaults to the backend's recommended model if not set.")
                .short('m'),
        )
        .arg(config_arg(ConfigKey::ClaudeURL, "Anthropic's Claude API URL when using the Claude backend."))
        .arg(config_arg(ConfigKey::ClaudeToken, "Anthropic's Claude API token when using the Claude backend."))
        .arg(config_arg(ConfigKey::OpenAiURL, "OpenAI API URL when using the OpenAI backend. Can be swapped to a compatible proxy."))
        .arg(config_arg(ConfigKey::OpenAiToken, "OpenAI API token when using the OpenAI backend."))
        .arg(
            config_arg(ConfigKey::Language, "The language you are learning.")
                .short('l')
                .value_parser(PossibleValuesParser::new(Language::VARIANTS)),
        )
        .arg(
            config_arg(ConfigKey::StudentName, "Your name, used to introduce yourself to the tutor.")
                .short('n'),
        )
        .arg(config_arg(ConfigKey::StudentAge, "Your age, used by the tutor to pick suitable topics."))
        .arg(config_arg(ConfigKey::NativeLanguage, "Your native language, used by the tutor in explanations."))
        .arg(config_arg(
            ConfigKey::StreamTimeout,
            "Time in milliseconds the tutor has to finish a response before it is marked as failed.",
        ))
        .arg(config_arg(
            ConfigKey::CelebrationDuration,
            "Time in milliseconds a level up celebration is shown for.",
        ))
        .arg(config_arg(
            ConfigKey::RewardEvery,
            "Number of completed exercises that earn one honey.",
        ))
        .arg(config_arg(ConfigKey::DataDir, "Directory where sessions and honey are stored."))
        .arg(config_arg(ConfigKey::ConfigFile, "Path to configuration file").short('c'));
}

async fn honey(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("balance", _)) => {
            let balance = ledger().load().await?;
            println!("You have {} honey.", balance.honey);
        }
        Some(("spend", spend_matches)) => {
            let amount = spend_matches.get_one::<u32>("amount").copied().unwrap_or(1);
            let balance = ledger().spend(amount).await?;
            println!("Spent {amount} honey. You have {} left.", balance.honey);
        }
        _ => {
            subcommand_honey().print_long_help()?;
        }
    }

    return Ok(());
}

/// Parses the command line and runs any one-shot subcommand. Returns true when
/// a tutoring session should be started.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("honey", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            honey(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("sessions", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("dir", _)) => {
                    let dir = sessions().sessions_dir.to_string_lossy().to_string();
                    println!("{dir}");
                    return Ok(false);
                }
                Some(("list", _)) => {
                    print_sessions_list().await?;
                    return Ok(false);
                }
                Some(("open", open_matches)) => {
                    load_config_from_session(open_matches.get_one::<String>("session-id"))
                        .await?;
                }
                Some(("delete", delete_matches)) => {
                    if let Some(session_id) = delete_matches.get_one::<String>("session-id") {
                        sessions().delete(session_id).await?;
                        println!("Deleted session {session_id}");
                    } else if delete_matches.get_flag("all") {
                        sessions().delete_all().await?;
                        println!("Deleted all sessions");
                    } else {
                        subcommand_sessions_delete().print_long_help()?;
                    }
                    return Ok(false);
                }
                _ => {
                    subcommand_sessions().print_long_help()?;
                    return Ok(false);
                }
            }
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
