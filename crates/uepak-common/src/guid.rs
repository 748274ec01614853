//! Engine GUID type.
//!
//! The engine stores a GUID as four little-endian 32-bit words and prints it
//! as 32 uppercase hex digits, one 8-digit group per word.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A 128-bit identifier made of four 32-bit words.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Guid {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl Guid {
    /// Empty GUID (all zeros).
    pub const EMPTY: Self = Self { a: 0, b: 0, c: 0, d: 0 };

    /// Create a GUID from its four words.
    #[inline]
    pub const fn new(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    /// The four words in storage order.
    #[inline]
    pub const fn words(&self) -> [u32; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Check if the GUID is empty (all zeros).
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}{:08X}{:08X}{:08X}", self.a, self.b, self.c, self.d)
    }
}

impl FromStr for Guid {
    type Err = Error;

    /// Parse the 32-digit form, tolerating the hyphenated 8-4-4-4-12 layout.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|&c| c != '-').collect();
        if digits.len() != 32 {
            return Err(Error::InvalidGuid(format!(
                "expected 32 hex digits, got {}",
                digits.len()
            )));
        }

        let word = |index: usize| -> Result<u32, Error> {
            let start = index * 8;
            u32::from_str_radix(&digits[start..start + 8], 16)
                .map_err(|_| Error::InvalidGuid(format!("invalid hex in group {}", index)))
        };

        Ok(Self::new(word(0)?, word(1)?, word(2)?, word(3)?))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Guid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Guid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
