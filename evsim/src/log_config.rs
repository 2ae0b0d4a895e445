/*!
`NS_LOG` logging configuration

The `NS_LOG` environment variable selects which components log and at
which level:

```text
NS_LOG='Simulator=level_debug|prefix_func;Timer;*=warn'
NS_LOG=print-list
```

Entries are separated with `;`. An entry is a component name (or `*` for
every component) optionally followed by `=` and `|`-separated levels. A
component without levels logs everything. `prefix_*` flags are accepted
and ignored. `print-list` prints the known components.

Levels map onto [`log::LevelFilter`]s: `error`, `warn`, `info` and `debug`
map to their namesake; `function`, `param`, `logic` and `all` map to
`trace`. The `level_` prefix is accepted on every level.
*/

use logos::{Lexer, Logos};
use std::{env, fmt};
use thiserror::Error;

pub use log::LevelFilter;

/// name of the environment variable read by [`LogConfig::from_env`]
pub const NS_LOG: &str = "NS_LOG";

/// the known components and the log targets they enable
const COMPONENTS: &[(&str, &[&str])] = &[
    ("Simulator", &["evsim::simulator", "evsim_core::simulator"]),
    ("Scheduler", &["evsim_core::scheduler"]),
    ("TypeRegistry", &["evsim_core::registry"]),
    ("Object", &["evsim_core::object"]),
    ("Attribute", &["evsim_core::attribute"]),
    ("TraceResolver", &["evsim_core::trace", "evsim_core::object::trace"]),
    ("CompositeTraceResolver", &["evsim_core::trace::composite"]),
    ("Timer", &["evsim::timer"]),
    ("EventCollector", &["evsim::event_collector"]),
    ("Realtime", &["evsim::realtime"]),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogConfigError {
    #[error("Unexpected input `{found}' in `{entry}'")]
    InvalidToken { entry: String, found: String },
    #[error("Expecting a component name or `*' in `{entry}'")]
    ExpectedComponent { entry: String },
    #[error("Expecting a log level in `{entry}'")]
    ExpectedLevel { entry: String },
    #[error("Unknown log level `{level}' in `{entry}'")]
    UnknownLevel { entry: String, level: String },
    #[error("The {NS_LOG} environment variable is not valid unicode")]
    NotUnicode,
    #[error("A logger was already installed")]
    AlreadyInitialized,
}

/// One entry of the `NS_LOG` configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// `None` for the `*` wildcard
    pub component: Option<String>,
    pub level: LevelFilter,
}

/// Parsed `NS_LOG` configuration
///
/// ```
/// use evsim::{LevelFilter, LogConfig};
///
/// let config = LogConfig::parse("Simulator=debug|info;Timer").unwrap();
/// assert_eq!(config.level_of("Simulator"), Some(LevelFilter::Debug));
/// assert_eq!(config.level_of("Timer"), Some(LevelFilter::Trace));
/// assert_eq!(config.level_of("Scheduler"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    directives: Vec<Directive>,
    print_list: bool,
}

impl LogConfig {
    /// parse a configuration string with the `NS_LOG` syntax
    pub fn parse(text: &str) -> Result<Self, LogConfigError> {
        let mut config = Self::default();

        for entry in text.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            if entry == "print-list" {
                config.print_list = true;
                continue;
            }
            let directive = parse_entry(entry)?;
            config.directives.push(directive);
        }

        Ok(config)
    }

    /// parse the `NS_LOG` environment variable
    ///
    /// an unset variable gives an empty configuration
    pub fn from_env() -> Result<Self, LogConfigError> {
        match env::var(NS_LOG) {
            Ok(value) => Self::parse(&value),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(env::VarError::NotUnicode(_)) => Err(LogConfigError::NotUnicode),
        }
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// `print-list` was part of the configuration
    pub fn print_list(&self) -> bool {
        self.print_list
    }

    /// level enabled for a component, the last matching entry wins
    pub fn level_of(&self, component: &str) -> Option<LevelFilter> {
        self.directives
            .iter()
            .rev()
            .find(|directive| {
                directive
                    .component
                    .as_deref()
                    .is_none_or(|name| name == component)
            })
            .map(|directive| directive.level)
    }

    /// an [`env_logger::Builder`] filtering the log records as configured
    ///
    /// everything not enabled by the configuration is turned off
    pub fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(LevelFilter::Off);

        for directive in &self.directives {
            match directive.component.as_deref() {
                None => {
                    builder.filter_level(directive.level);
                }
                Some(component) => {
                    for target in targets(component) {
                        builder.filter_module(target, directive.level);
                    }
                }
            }
        }

        builder
    }

    /// install the configured logger, printing the components first if
    /// `print-list` was requested
    pub fn try_init(&self) -> Result<(), LogConfigError> {
        if self.print_list {
            print!("{}", ComponentList);
        }

        self.builder()
            .try_init()
            .map_err(|_| LogConfigError::AlreadyInitialized)
    }
}

/// names of the known log components
pub fn components() -> impl Iterator<Item = &'static str> {
    COMPONENTS.iter().map(|(name, _)| *name)
}

/// log targets enabled by a component
///
/// unknown names are used as raw log targets
pub fn targets(component: &str) -> Vec<&str> {
    COMPONENTS
        .iter()
        .find(|(name, _)| *name == component)
        .map(|(_, targets)| targets.to_vec())
        .unwrap_or_else(|| vec![component])
}

struct ComponentList;

impl fmt::Display for ComponentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, targets) in COMPONENTS {
            writeln!(f, "{name}: {}", targets.join(", "))?;
        }
        Ok(())
    }
}

fn parse_entry(entry: &str) -> Result<Directive, LogConfigError> {
    let mut lex: Lexer<'_, Token> = Token::lexer(entry);
    let invalid = |lex: &Lexer<'_, Token>| LogConfigError::InvalidToken {
        entry: entry.to_owned(),
        found: lex.slice().to_owned(),
    };

    let component = match lex.next() {
        Some(Ok(Token::Wildcard)) => None,
        Some(Ok(Token::Name)) => Some(lex.slice().to_owned()),
        Some(Err(())) => return Err(invalid(&lex)),
        _ => {
            return Err(LogConfigError::ExpectedComponent {
                entry: entry.to_owned(),
            });
        }
    };

    match lex.next() {
        None => {
            return Ok(Directive {
                component,
                level: LevelFilter::Trace,
            });
        }
        Some(Ok(Token::Equal)) => (),
        Some(_) => return Err(invalid(&lex)),
    }

    let mut level = LevelFilter::Off;
    loop {
        match lex.next() {
            Some(Ok(Token::Name)) => {
                level = level.max(parse_level(entry, lex.slice())?);
            }
            Some(Err(())) => return Err(invalid(&lex)),
            _ => {
                return Err(LogConfigError::ExpectedLevel {
                    entry: entry.to_owned(),
                });
            }
        }

        match lex.next() {
            None => break,
            Some(Ok(Token::Pipe)) => (),
            Some(_) => return Err(invalid(&lex)),
        }
    }

    Ok(Directive { component, level })
}

fn parse_level(entry: &str, level: &str) -> Result<LevelFilter, LogConfigError> {
    if level.starts_with("prefix_") {
        return Ok(LevelFilter::Off);
    }

    match level.strip_prefix("level_").unwrap_or(level) {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "function" | "param" | "logic" | "all" => Ok(LevelFilter::Trace),
        _ => Err(LogConfigError::UnknownLevel {
            entry: entry.to_owned(),
            level: level.to_owned(),
        }),
    }
}

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t\n\f]+")]
enum Token {
    #[token("=")]
    Equal,
    #[token("|")]
    Pipe,
    #[token("*")]
    Wildcard,

    #[regex("[A-Za-z_][A-Za-z0-9_:\\-]*")]
    Name,
}
