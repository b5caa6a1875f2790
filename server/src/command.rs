//! Verb grammar: tokenizes and type-checks a single text frame.
//!
//! See SPEC_FULL.md §4.3 for the verb table.

use crate::errors::ProtocolError;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NewUser { login: String, password: String },
    SignIn { login: String, password: String },
    SignOut,
    NewFarm { farm_id: String, farm_password: String },
    ConnectFarm { farm_id: String, farm_password: String },
    DisconnectFarm,
    SetTemperature { temp: f64 },
    SetHumidity { value: i64 },
    SetLightInterval { start: i64, end: i64 },
    SetPumpInterval { start: i64, end: i64 },
}

impl Command {
    /// The verb text as it appears in `<verb> success`/`<verb> error` replies.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::NewUser { .. } => "new_user",
            Command::SignIn { .. } => "sign_in",
            Command::SignOut => "sign_out",
            Command::NewFarm { .. } => "new_farm",
            Command::ConnectFarm { .. } => "connect_farm",
            Command::DisconnectFarm => "disconnect_farm",
            Command::SetTemperature { .. } => "set_temperature",
            Command::SetHumidity { .. } => "set_humidity",
            Command::SetLightInterval { .. } => "set_light_interval",
            Command::SetPumpInterval { .. } => "set_pump_interval",
        }
    }
}

/// Parse one frame. On any failure, the error carries the first
/// whitespace-delimited token verbatim (empty string for an empty frame).
pub fn parse(line: &str) -> Result<Command, ProtocolError> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().unwrap_or("");

    let fail = || ProtocolError::Unparseable(verb.to_string());

    let command = match verb {
        "new_user" => Command::NewUser {
            login: tokens.next().ok_or_else(fail)?.to_string(),
            password: tokens.next().ok_or_else(fail)?.to_string(),
        },
        "sign_in" => Command::SignIn {
            login: tokens.next().ok_or_else(fail)?.to_string(),
            password: tokens.next().ok_or_else(fail)?.to_string(),
        },
        "sign_out" => Command::SignOut,
        "new_farm" => Command::NewFarm {
            farm_id: tokens.next().ok_or_else(fail)?.to_string(),
            farm_password: tokens.next().ok_or_else(fail)?.to_string(),
        },
        "connect_farm" => Command::ConnectFarm {
            farm_id: tokens.next().ok_or_else(fail)?.to_string(),
            farm_password: tokens.next().ok_or_else(fail)?.to_string(),
        },
        "disconnect_farm" => Command::DisconnectFarm,
        "set_temperature" => Command::SetTemperature {
            temp: tokens.next().ok_or_else(fail)?.parse().map_err(|_| fail())?,
        },
        "set_humidity" => Command::SetHumidity {
            value: tokens.next().ok_or_else(fail)?.parse().map_err(|_| fail())?,
        },
        "set_light_interval" => Command::SetLightInterval {
            start: tokens.next().ok_or_else(fail)?.parse().map_err(|_| fail())?,
            end: tokens.next().ok_or_else(fail)?.parse().map_err(|_| fail())?,
        },
        "set_pump_interval" => Command::SetPumpInterval {
            start: tokens.next().ok_or_else(fail)?.parse().map_err(|_| fail())?,
            end: tokens.next().ok_or_else(fail)?.parse().map_err(|_| fail())?,
        },
        _ => return Err(fail()),
    };

    if tokens.next().is_some() {
        return Err(fail());
    }

    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sign_in() {
        let cmd = parse("sign_in alice hunter2").unwrap();
        assert_eq!(
            cmd,
            Command::SignIn {
                login: "alice".into(),
                password: "hunter2".into(),
            }
        );
    }

    #[test]
    fn parses_zero_arg_verb() {
        assert_eq!(parse("sign_out").unwrap(), Command::SignOut);
    }

    #[test]
    fn parses_numeric_args() {
        assert_eq!(
            parse("set_temperature 22.5").unwrap(),
            Command::SetTemperature { temp: 22.5 }
        );
        assert_eq!(
            parse("set_light_interval 6 20").unwrap(),
            Command::SetLightInterval { start: 6, end: 20 }
        );
    }

    #[test]
    fn unknown_verb_carries_verb_token() {
        let err = parse("frobnicate a b").unwrap_err();
        assert_eq!(err.to_string(), "Cannot parse command - frobnicate");
    }

    #[test]
    fn missing_args_carries_verb_token() {
        let err = parse("sign_in alice").unwrap_err();
        assert_eq!(err.to_string(), "Cannot parse command - sign_in");
    }

    #[test]
    fn bad_numeric_arg_carries_verb_token() {
        let err = parse("set_humidity not-a-number").unwrap_err();
        assert_eq!(err.to_string(), "Cannot parse command - set_humidity");
    }

    #[test]
    fn empty_frame_carries_empty_verb() {
        let err = parse("").unwrap_err();
        assert_eq!(err.to_string(), "Cannot parse command - ");
    }

    #[test]
    fn trailing_garbage_rejected() {
        let err = parse("sign_out extra").unwrap_err();
        assert_eq!(err.to_string(), "Cannot parse command - sign_out");
    }
}
