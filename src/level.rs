use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};

use crate::error::Error;

/// Severity of a log event.
///
/// The named levels follow the syslog severities of RFC 5424, plus a
/// [`Level::TRACE`] tier that is more verbose than [`Level::DEBUG`]. Smaller
/// values are more severe. Every negative value is treated as disabled, and
/// values above [`Level::TRACE`] are custom, finer-grained levels.
///
/// Recommended mapping onto narrower backends:
///
/// | Level         | Backend tier |
/// |---------------|--------------|
/// | EMERGENCY     | panic        |
/// | ALERT         | fatal        |
/// | CRITICAL      | error        |
/// | ERROR         | error        |
/// | WARNING       | warn         |
/// | NOTICE        | warn         |
/// | INFORMATIONAL | info         |
/// | DEBUG         | debug        |
/// | TRACE         | trace (or debug) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub i8);

impl Level {
    /// Sentinel for "do not log". Returned by events that are not live.
    pub const DISABLED: Level = Level(-1);
    /// System is unusable. Usually mapped to a panic.
    pub const EMERGENCY: Level = Level(0);
    /// Action must be taken immediately. Usually mapped to a fatal exit.
    pub const ALERT: Level = Level(1);
    pub const CRITICAL: Level = Level(2);
    pub const ERROR: Level = Level(3);
    pub const WARNING: Level = Level(4);
    pub const NOTICE: Level = Level(5);
    pub const INFORMATIONAL: Level = Level(6);
    pub const DEBUG: Level = Level(7);
    /// Not a syslog level; intended for abnormal output mechanisms.
    pub const TRACE: Level = Level(8);

    /// All named, enabled levels from most to least severe.
    pub const ALL: [Level; 9] = [
        Level::EMERGENCY,
        Level::ALERT,
        Level::CRITICAL,
        Level::ERROR,
        Level::WARNING,
        Level::NOTICE,
        Level::INFORMATIONAL,
        Level::DEBUG,
        Level::TRACE,
    ];

    pub const fn enabled(self) -> bool {
        self.0 > Level::DISABLED.0
    }

    pub const fn is_custom(self) -> bool {
        self.0 > Level::TRACE.0
    }

    pub const fn is_syslog(self) -> bool {
        self.0 >= Level::EMERGENCY.0 && self.0 <= Level::DEBUG.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::DISABLED
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Level::DISABLED => "disabled",
            Level::EMERGENCY => "emerg",
            Level::ALERT => "alert",
            Level::CRITICAL => "crit",
            Level::ERROR => "err",
            Level::WARNING => "warning",
            Level::NOTICE => "notice",
            Level::INFORMATIONAL => "info",
            Level::DEBUG => "debug",
            Level::TRACE => "trace",
            Level(n) => return write!(f, "{}", n),
        };
        f.write_str(s)
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let level = match lower.as_str() {
            "disabled" | "off" => Level::DISABLED,
            "emerg" | "emergency" | "panic" => Level::EMERGENCY,
            "alert" => Level::ALERT,
            "crit" | "critical" => Level::CRITICAL,
            "err" | "error" => Level::ERROR,
            "warning" | "warn" => Level::WARNING,
            "notice" => Level::NOTICE,
            "info" | "informational" => Level::INFORMATIONAL,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            other => other
                .parse::<i8>()
                .map(Level)
                .map_err(|_| Error::InvalidLevel(s.to_string()))?,
        };
        Ok(level)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i8),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Level(n)),
            Repr::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(!Level::DISABLED.enabled());
        assert!(!Level(-40).enabled());
        assert!(Level::EMERGENCY.enabled());
        assert!(Level::EMERGENCY.is_syslog());
        assert!(Level::DEBUG.is_syslog());
        assert!(!Level::TRACE.is_syslog());
        assert!(!Level::TRACE.is_custom());
        assert!(Level(9).is_custom());
        assert!(Level(9).enabled());
    }

    #[test]
    fn display_uses_short_keywords() {
        let names: Vec<String> = Level::ALL.iter().map(|l| l.to_string()).collect();
        assert_eq!(
            names,
            ["emerg", "alert", "crit", "err", "warning", "notice", "info", "debug", "trace"]
        );
        assert_eq!(Level::DISABLED.to_string(), "disabled");
        assert_eq!(Level(12).to_string(), "12");
    }

    #[test]
    fn parse_names_and_numbers() {
        assert_eq!("warn".parse::<Level>().ok(), Some(Level::WARNING));
        assert_eq!("Informational".parse::<Level>().ok(), Some(Level::INFORMATIONAL));
        assert_eq!("11".parse::<Level>().ok(), Some(Level(11)));
        assert!(matches!("loud".parse::<Level>(), Err(Error::InvalidLevel(_))));
    }

    #[test]
    fn deserialize_from_name_or_number() -> Result<(), serde_json::Error> {
        let by_name: Level = serde_json::from_str("\"crit\"")?;
        let by_number: Level = serde_json::from_str("7")?;
        assert_eq!(by_name, Level::CRITICAL);
        assert_eq!(by_number, Level::DEBUG);
        assert!(serde_json::from_str::<Level>("\"nope\"").is_err());
        Ok(())
    }

    #[test]
    fn ordering_is_by_severity() {
        assert!(Level::EMERGENCY < Level::ERROR);
        assert!(Level::INFORMATIONAL < Level::DEBUG);
        assert!(Level::TRACE < Level(9));
    }
}
