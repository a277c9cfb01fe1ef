use strum_macros::{Display, EnumString};

use super::error::ServerError;
use crate::tracker::CLIENT_NAME_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Command {
    #[strum(serialize = "GET_SAT")]
    GetSat,
    #[strum(serialize = "GET_SAT_POS")]
    GetSatPos,
    #[strum(serialize = "GET_TLE")]
    GetTle,
    #[strum(serialize = "GET_DOPPLER")]
    GetDoppler,
    #[strum(serialize = "GET_LIST")]
    GetList,
    #[strum(serialize = "RELOAD_TLE")]
    ReloadTle,
    #[strum(serialize = "GET_SUN")]
    GetSun,
    #[strum(serialize = "GET_MOON")]
    GetMoon,
    #[strum(serialize = "GET_MODE")]
    GetMode,
    #[strum(serialize = "GET_VERSION")]
    GetVersion,
    #[strum(serialize = "GET_QTH")]
    GetQth,
    #[strum(serialize = "GET_TIME")]
    GetTime,
    #[strum(serialize = "GET_TIME$")]
    GetTimeString,
    #[strum(serialize = "PREDICT")]
    Predict,
}

/// One datagram: `COMMAND[ argument]`, read up to the first newline.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub command: Command,
    pub argument: String,
}

impl Request {
    pub fn parse(datagram: &[u8]) -> Result<Self, ServerError> {
        let text = String::from_utf8_lossy(datagram);
        let line = text.split('\n').next().unwrap_or_default();
        let line = line.trim_end_matches(['\r', '\0']);
        let (token, argument) = line.split_once(' ').unwrap_or((line, ""));

        let command = token
            .parse()
            .map_err(|_| ServerError::UnknownCommand(token.to_string()))?;
        Ok(Self {
            command,
            argument: argument.to_string(),
        })
    }

    /// Satellite name or catalog number, truncated as clients expect.
    pub fn satellite(&self) -> String {
        self.argument.chars().take(CLIENT_NAME_LEN).collect()
    }

    /// Whitespace separated arguments of the listing commands. Double
    /// quotes group words into one argument.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut pending = false;

        for c in self.argument.chars() {
            match c {
                '"' => {
                    quoted = !quoted;
                    pending = true;
                }
                c if c.is_whitespace() && !quoted => {
                    if pending {
                        args.push(std::mem::take(&mut current));
                        pending = false;
                    }
                }
                c => {
                    current.push(c);
                    pending = true;
                }
            }
        }
        if pending {
            args.push(current);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tokens_are_exact() {
        let request = Request::parse(b"GET_SAT ISS\n").unwrap();
        assert_eq!(request.command, Command::GetSat);
        assert_eq!(request.argument, "ISS");

        assert_eq!(
            Request::parse(b"GET_SAT_POS ISS 0 +10").unwrap().command,
            Command::GetSatPos
        );
        assert_eq!(
            Request::parse(b"GET_TIME$").unwrap().command,
            Command::GetTimeString
        );
        assert_eq!(Request::parse(b"GET_TIME\n").unwrap().command, Command::GetTime);
        assert!(matches!(
            Request::parse(b"GET_SATS ISS"),
            Err(ServerError::UnknownCommand(_))
        ));
        assert!(Request::parse(b"get_list").is_err());
        assert!(Request::parse(b"").is_err());
    }

    #[test]
    fn satellite_argument_runs_to_newline() {
        let request = Request::parse(b"GET_SAT ISS (ZARYA)\nignored").unwrap();
        assert_eq!(request.satellite(), "ISS (ZARYA)");

        let request = Request::parse(b"GET_TLE A VERY LONG SATELLITE NAME INDEED\n").unwrap();
        assert_eq!(request.satellite(), "A VERY LONG SATELLITE NAM");
    }

    #[test]
    fn listing_arguments() {
        let request = Request::parse(b"GET_SAT_POS \"ISS (ZARYA)\" 1221913540 +10m\n").unwrap();
        assert_eq!(
            request.arguments(),
            ["ISS (ZARYA)", "1221913540", "+10m"]
        );

        let request = Request::parse(b"PREDICT  25544   0").unwrap();
        assert_eq!(request.arguments(), ["25544", "0"]);
    }

    #[test]
    fn display_matches_wire_token() {
        assert_eq!(Command::GetTimeString.to_string(), "GET_TIME$");
        assert_eq!(Command::ReloadTle.to_string(), "RELOAD_TLE");
    }
}
