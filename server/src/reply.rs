//! Wire-level reply rendering.
//!
//! Three shapes, matching SPEC_FULL.md §4.4/§7:
//! `<verb> success[ <payload>]`, `<verb> error <reason>`, and the
//! generic parse-failure frame.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Success {
        verb: &'static str,
        payload: Option<String>,
    },
    Failure {
        verb: &'static str,
        reason: String,
    },
    ParseError {
        verb: String,
    },
}

impl Reply {
    pub fn success(verb: &'static str) -> Self {
        Reply::Success { verb, payload: None }
    }

    pub fn success_with(verb: &'static str, payload: impl ToString) -> Self {
        Reply::Success {
            verb,
            payload: Some(payload.to_string()),
        }
    }

    pub fn failure(verb: &'static str, reason: impl ToString) -> Self {
        Reply::Failure {
            verb,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Success { verb, payload: None } => write!(f, "{verb} success"),
            Reply::Success {
                verb,
                payload: Some(payload),
            } => write!(f, "{verb} success {payload}"),
            Reply::Failure { verb, reason } => write!(f, "{verb} error {reason}"),
            Reply::ParseError { verb } => write!(f, "error: Cannot parse command - {verb}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_bare_success() {
        assert_eq!(Reply::success("sign_out").to_string(), "sign_out success");
    }

    #[test]
    fn renders_success_with_payload() {
        assert_eq!(
            Reply::success_with("sign_in", 7).to_string(),
            "sign_in success 7"
        );
    }

    #[test]
    fn renders_failure() {
        assert_eq!(
            Reply::failure("connect_farm", "It is not farm!").to_string(),
            "connect_farm error It is not farm!"
        );
    }

    #[test]
    fn renders_parse_error() {
        let r = Reply::ParseError {
            verb: "frobnicate".into(),
        };
        assert_eq!(r.to_string(), "error: Cannot parse command - frobnicate");
    }

    #[test]
    fn set_light_interval_uses_its_own_verb_not_set_temperature() {
        // The reference implementation has a copy-paste bug where
        // set_light_interval's success reply says "set_temperature
        // success". Not reproduced here.
        assert_eq!(
            Reply::success("set_light_interval").to_string(),
            "set_light_interval success"
        );
    }
}
