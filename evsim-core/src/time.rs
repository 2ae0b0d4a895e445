use core::fmt;
use logos::{Lexer, Logos};
use std::{
    ops::{Add, AddAssign, Sub},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;

/// Virtual simulation time
///
/// An absolute point on the simulated clock or a delay relative to it,
/// counted in nanoseconds. The clock starts at [`Time::ZERO`] and never
/// moves backward.
///
/// ```
/// # use evsim_core::Time;
/// let time: Time = "1s 200ms".parse().unwrap();
/// assert_eq!(time, Time::from_millis(1_200));
/// assert_eq!(time.to_string(), "1200ms");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time(u64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Unexpected input `{found}' in `{input}'")]
    InvalidToken { input: String, found: String },
    #[error("Expecting time to start with a number. Cannot parse `{input}'")]
    ExpectedNumber { input: String },
    #[error("Expecting a unit after `{number}' in `{input}'")]
    ExpectedUnit { input: String, number: u64 },
    #[error("Number too large in `{input}'")]
    Overflow { input: String },
}

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MINUTE: u64 = 60 * NANOS_PER_SEC;

impl Time {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros.checked_mul(NANOS_PER_MICRO).expect("virtual time overflowed u64 nanoseconds"))
    }

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.checked_mul(NANOS_PER_MILLI).expect("virtual time overflowed u64 nanoseconds"))
    }

    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.checked_mul(NANOS_PER_SEC).expect("virtual time overflowed u64 nanoseconds"))
    }

    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use = "function does not modify the current value"]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(nanos) => Some(Self(nanos)),
            None => None,
        }
    }

    #[must_use = "function does not modify the current value"]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(nanos) => Some(Self(nanos)),
            None => None,
        }
    }

    #[must_use = "function does not modify the current value"]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    #[must_use = "function does not modify the current value"]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    #[inline]
    pub fn into_duration(self) -> Duration {
        Duration::from_nanos(self.0)
    }
}

impl Add for Time {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs)
            .expect("virtual time overflowed u64 nanoseconds")
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Time {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs)
            .expect("cannot subtract a later time from an earlier one")
    }
}

impl From<Duration> for Time {
    fn from(duration: Duration) -> Self {
        Self(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl From<Time> for Duration {
    fn from(time: Time) -> Self {
        time.into_duration()
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0;
        if nanos == 0 {
            return f.write_str("0ns");
        }

        // largest unit that keeps the value exact, so that `FromStr`
        // reads back the same number of nanoseconds
        let (value, unit) = if nanos % NANOS_PER_MINUTE == 0 {
            (nanos / NANOS_PER_MINUTE, "m")
        } else if nanos % NANOS_PER_SEC == 0 {
            (nanos / NANOS_PER_SEC, "s")
        } else if nanos % NANOS_PER_MILLI == 0 {
            (nanos / NANOS_PER_MILLI, "ms")
        } else if nanos % NANOS_PER_MICRO == 0 {
            (nanos / NANOS_PER_MICRO, "us")
        } else {
            (nanos, "ns")
        };

        write!(f, "{value}{unit}")
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Time {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex: Lexer<'_, Token> = Lexer::new(s);

        let mut total = 0u64;
        let overflow = || TimeParseError::Overflow {
            input: s.to_owned(),
        };

        while let Some(next) = lex.next() {
            let number = next.map_err(|()| TimeParseError::InvalidToken {
                input: s.to_owned(),
                found: lex.slice().to_owned(),
            })?;

            if number != Token::Value {
                return Err(TimeParseError::ExpectedNumber {
                    input: s.to_owned(),
                });
            }
            let number: u64 = lex.slice().parse().map_err(|_| overflow())?;

            let Some(Ok(measure)) = lex.next() else {
                return Err(TimeParseError::ExpectedUnit {
                    input: s.to_owned(),
                    number,
                });
            };
            let factor = match measure {
                Token::NanoSeconds => 1,
                Token::MicroSeconds => NANOS_PER_MICRO,
                Token::MilliSeconds => NANOS_PER_MILLI,
                Token::Seconds => NANOS_PER_SEC,
                Token::Minutes => NANOS_PER_MINUTE,
                Token::Value => {
                    return Err(TimeParseError::ExpectedUnit {
                        input: s.to_owned(),
                        number,
                    });
                }
            };

            total = number
                .checked_mul(factor)
                .and_then(|nanos| total.checked_add(nanos))
                .ok_or_else(overflow)?;
        }

        Ok(Self(total))
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")]
enum Token {
    #[token("ns")]
    NanoSeconds,
    #[regex("us|μs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,
    #[token("m")]
    Minutes,

    #[regex("[0-9]+")]
    Value,
}
