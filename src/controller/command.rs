use crate::data_store::{ConnectionDescriptor, InitDescriptor};
use std::str::FromStr;
use thiserror::Error;

/// Every input the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect {
        connection: ConnectionDescriptor,
        init: InitDescriptor,
    },
    CubeSelected(String),
    /// Opens axis configuration, fresh or on a committed axis.
    OpenAxis {
        axis: Option<AxisName>,
    },
    DimensionSelected(String),
    HierarchySelected(String),
    LevelSelected(String),
    ValuesSelected(Vec<String>),
    MeasureToggled {
        key: String,
        enabled: bool,
    },
    Commit,
    SaveViewState,
    RestoreViewState,
    Disconnect,
}

/// Hierarchy names repeat across dimensions, so an axis needs both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisName {
    pub dimension: String,
    pub hierarchy: String,
}

impl AxisName {
    pub fn new(dimension: impl Into<String>, hierarchy: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            hierarchy: hierarchy.into(),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("Invalid argument for '{command}': {argument}")]
    InvalidArgument {
        command: &'static str,
        argument: String,
    },
}

fn required<'a>(
    argument: Option<&'a str>,
    command: &'static str,
) -> Result<&'a str, CommandParseError> {
    argument
        .filter(|a| !a.is_empty())
        .ok_or(CommandParseError::MissingArgument(command))
}

impl FromStr for Command {
    type Err = CommandParseError;

    /// Parses one line of the interactive driver, e.g. `dim TIMES` or
    /// `values 2010-05-12,2010-05-13`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = match s.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, Some(rest.trim())),
            None => (s, None),
        };

        match verb {
            "" => Err(CommandParseError::Empty),
            "connect" => {
                let rest = required(rest, "connect")?;
                let (name, metadata) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandParseError::MissingArgument("connect"))?;
                Ok(Command::Connect {
                    connection: ConnectionDescriptor::local(name),
                    init: InitDescriptor {
                        metadata: metadata.trim().to_string(),
                    },
                })
            }
            "cube" => Ok(Command::CubeSelected(required(rest, "cube")?.to_string())),
            "open" => match rest.filter(|r| !r.is_empty()) {
                None => Ok(Command::OpenAxis { axis: None }),
                Some(rest) => {
                    let (dimension, hierarchy) = rest
                        .split_once(char::is_whitespace)
                        .ok_or(CommandParseError::MissingArgument("open"))?;
                    Ok(Command::OpenAxis {
                        axis: Some(AxisName::new(dimension, hierarchy.trim())),
                    })
                }
            },
            "dim" => Ok(Command::DimensionSelected(
                required(rest, "dim")?.to_string(),
            )),
            "hier" => Ok(Command::HierarchySelected(
                required(rest, "hier")?.to_string(),
            )),
            "level" => Ok(Command::LevelSelected(required(rest, "level")?.to_string())),
            "values" => Ok(Command::ValuesSelected(
                rest.unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            "measure" => {
                let rest = required(rest, "measure")?;
                let (key, switch) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandParseError::MissingArgument("measure"))?;
                let enabled = match switch.trim() {
                    "on" => true,
                    "off" => false,
                    other => {
                        return Err(CommandParseError::InvalidArgument {
                            command: "measure",
                            argument: other.to_string(),
                        })
                    }
                };
                Ok(Command::MeasureToggled {
                    key: key.to_string(),
                    enabled,
                })
            }
            "commit" => Ok(Command::Commit),
            "save" => Ok(Command::SaveViewState),
            "restore" => Ok(Command::RestoreViewState),
            "disconnect" => Ok(Command::Disconnect),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case::cube("cube cube", Command::CubeSelected("cube".to_string()))]
    #[case::open_fresh("open", Command::OpenAxis { axis: None })]
    #[case::open_existing(
        "open LOCATION HUB",
        Command::OpenAxis { axis: Some(AxisName::new("LOCATION", "HUB")) }
    )]
    #[case::dimension("dim  TIMES ", Command::DimensionSelected("TIMES".to_string()))]
    #[case::hierarchy("hier TIMES_WEEK", Command::HierarchySelected("TIMES_WEEK".to_string()))]
    #[case::level("level DAY", Command::LevelSelected("DAY".to_string()))]
    #[case::values(
        "values 2010-05-12, 2010-05-13",
        Command::ValuesSelected(vec!["2010-05-12".to_string(), "2010-05-13".to_string()])
    )]
    #[case::no_values("values", Command::ValuesSelected(vec![]))]
    #[case::measure_on(
        "measure traffic on",
        Command::MeasureToggled { key: "traffic".to_string(), enabled: true }
    )]
    #[case::commit("commit", Command::Commit)]
    #[case::disconnect("disconnect", Command::Disconnect)]
    fn test_parse(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>().unwrap(), expected);
    }

    #[test]
    fn test_parse_connect() {
        let command: Command = "connect local /tmp/cube.json".parse().unwrap();
        assert_eq!(
            command,
            Command::Connect {
                connection: ConnectionDescriptor::local("local"),
                init: InitDescriptor {
                    metadata: "/tmp/cube.json".to_string()
                },
            }
        );
    }

    #[rstest]
    #[case::empty("", CommandParseError::Empty)]
    #[case::unknown("drill", CommandParseError::Unknown("drill".to_string()))]
    #[case::missing("dim", CommandParseError::MissingArgument("dim"))]
    #[case::open_without_dimension("open HUB", CommandParseError::MissingArgument("open"))]
    #[case::connect_without_metadata("connect local", CommandParseError::MissingArgument("connect"))]
    #[case::bad_switch(
        "measure traffic maybe",
        CommandParseError::InvalidArgument { command: "measure", argument: "maybe".to_string() }
    )]
    fn test_parse_errors(#[case] line: &str, #[case] expected: CommandParseError) {
        assert_eq!(line.parse::<Command>().unwrap_err(), expected);
    }
}
