//! Time and size unit conversions used throughout the schedule model.
//!
//! Everything internal to this crate is kept in nanoseconds (time) and bytes
//! (size); these enums only exist at the boundary where a human- or
//! XML-authored value carries an explicit unit.

/// A unit of time as it appears in a network or schedule document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Nanoseconds.
    Ns,
    /// Microseconds.
    Us,
    /// Milliseconds.
    Ms,
    /// Seconds.
    S,
}

impl TimeUnit {
    /// Convert a value expressed in this unit into nanoseconds.
    pub fn convert_ns(self, value: i64) -> i64 {
        match self {
            TimeUnit::Ns => value,
            TimeUnit::Us => value * 1_000,
            TimeUnit::Ms => value * 1_000_000,
            TimeUnit::S => value * 1_000_000_000,
        }
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            "ms" => Ok(TimeUnit::Ms),
            "s" => Ok(TimeUnit::S),
            other => Err(UnitParseError(other.to_string())),
        }
    }
}

/// A unit of frame size as it appears in a network document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeUnit {
    /// Bytes.
    Byte,
    /// Kilobytes (1000 bytes, not 1024).
    KByte,
}

impl SizeUnit {
    /// Convert a value expressed in this unit into bytes.
    pub fn convert_bytes(self, value: i64) -> i64 {
        match self {
            SizeUnit::Byte => value,
            SizeUnit::KByte => value * 1_000,
        }
    }
}

impl std::str::FromStr for SizeUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(SizeUnit::Byte),
            "KB" => Ok(SizeUnit::KByte),
            other => Err(UnitParseError(other.to_string())),
        }
    }
}

/// A unit of link speed as it appears in a network document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedUnit {
    /// Kilobytes per second.
    KBs,
    /// Megabytes per second.
    MBs,
    /// Gigabytes per second.
    GBs,
}

impl SpeedUnit {
    /// Convert a value expressed in this unit into bytes per second.
    pub fn convert_bytes_per_sec(self, value: i64) -> i64 {
        match self {
            SpeedUnit::KBs => value * 1_000,
            SpeedUnit::MBs => value * 1_000_000,
            SpeedUnit::GBs => value * 1_000_000_000,
        }
    }
}

impl std::str::FromStr for SpeedUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KBs" => Ok(SpeedUnit::KBs),
            "MBs" => Ok(SpeedUnit::MBs),
            "GBs" => Ok(SpeedUnit::GBs),
            other => Err(UnitParseError(other.to_string())),
        }
    }
}

/// An unrecognized unit string was encountered while parsing a document.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized unit: {0}")]
pub struct UnitParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ns_conversions() {
        assert_eq!(TimeUnit::Ns.convert_ns(7), 7);
        assert_eq!(TimeUnit::Us.convert_ns(7), 7_000);
        assert_eq!(TimeUnit::Ms.convert_ns(7), 7_000_000);
        assert_eq!(TimeUnit::S.convert_ns(7), 7_000_000_000);
    }

    #[test]
    fn byte_conversions() {
        assert_eq!(SizeUnit::Byte.convert_bytes(500), 500);
        assert_eq!(SizeUnit::KByte.convert_bytes(500), 500_000);
    }
}
