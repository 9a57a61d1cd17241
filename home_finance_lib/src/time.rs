use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

#[derive(
    Debug,
    Copy,
    Clone,
    EnumString,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub fn num(&self) -> u8 {
        match self {
            Self::January => 0,
            Self::February => 1,
            Self::March => 2,
            Self::April => 3,
            Self::May => 4,
            Self::June => 5,
            Self::July => 6,
            Self::August => 7,
            Self::September => 8,
            Self::October => 9,
            Self::November => 10,
            Self::December => 11,
        }
    }

    pub fn from_num(num: u8) -> Option<Self> {
        Some(match num {
            0 => Self::January,
            1 => Self::February,
            2 => Self::March,
            3 => Self::April,
            4 => Self::May,
            5 => Self::June,
            6 => Self::July,
            7 => Self::August,
            8 => Self::September,
            9 => Self::October,
            10 => Self::November,
            11 => Self::December,
            _ => return None,
        })
    }

    pub fn next(&self) -> (Self, bool) {
        match self {
            Self::January => (Self::February, false),
            Self::February => (Self::March, false),
            Self::March => (Self::April, false),
            Self::April => (Self::May, false),
            Self::May => (Self::June, false),
            Self::June => (Self::July, false),
            Self::July => (Self::August, false),
            Self::August => (Self::September, false),
            Self::September => (Self::October, false),
            Self::October => (Self::November, false),
            Self::November => (Self::December, false),
            Self::December => (Self::January, true),
        }
    }

    pub fn days_in(&self, year: Year) -> u8 {
        match self {
            Self::January => 31,
            Self::February => {
                if year.is_leap() {
                    29
                } else {
                    28
                }
            }
            Self::March => 31,
            Self::April => 30,
            Self::May => 31,
            Self::June => 30,
            Self::July => 31,
            Self::August => 31,
            Self::September => 30,
            Self::October => 31,
            Self::November => 30,
            Self::December => 31,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct Year(pub u32);

impl Year {
    pub fn is_leap(&self) -> bool {
        (self.0 % 4 == 0 && self.0 % 100 != 0) || self.0 % 400 == 0
    }
}

/// A calendar date used to stamp schedule rows.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct Date {
    pub year: Year,
    pub month: Month,
    pub day: u8,
}

impl Date {
    pub fn new(year: Year, month: Month, day: u8) -> Self {
        Self { year, month, day }
    }

    /// The date `months` months later, with the day of month clamped to
    /// the length of the target month (Jan 31 plus one month is Feb 28/29).
    pub fn plus_months(&self, months: u32) -> Date {
        let total = self.year.0 * 12 + self.month.num() as u32 + months;
        let year = Year(total / 12);
        let month = match Month::from_num((total % 12) as u8) {
            Some(m) => m,
            // total % 12 is always in 0..=11
            None => unreachable!(),
        };
        Date {
            year,
            month,
            day: self.day.min(month.days_in(year)),
        }
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.year.0,
            self.month.num() + 1,
            self.day
        )
    }
}
