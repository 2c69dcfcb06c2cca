use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// USCIS receipt numbers: a three-letter service-center prefix followed by
/// ten digits (two-digit fiscal year, three-digit work day, five-digit
/// serial).
static RECEIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{3})([0-9]{10})$").expect("receipt pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceCenter {
    Wac,
    Eac,
    Lin,
    Src,
    Msc,
    Nbc,
    Ioe,
    Ysc,
}

impl ServiceCenter {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "WAC" => Some(Self::Wac),
            "EAC" => Some(Self::Eac),
            "LIN" => Some(Self::Lin),
            "SRC" => Some(Self::Src),
            "MSC" => Some(Self::Msc),
            "NBC" => Some(Self::Nbc),
            "IOE" => Some(Self::Ioe),
            "YSC" => Some(Self::Ysc),
            _ => None,
        }
    }

    /// Display name matching the labels in the processing-time feed.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wac => "California Service Center",
            Self::Eac => "Vermont Service Center",
            Self::Lin => "Nebraska Service Center",
            Self::Src => "Texas Service Center",
            Self::Msc => "National Benefits Center",
            Self::Nbc => "National Benefits Center",
            Self::Ioe => "ELIS (electronic filing)",
            Self::Ysc => "Potomac Service Center",
        }
    }
}

impl fmt::Display for ServiceCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated receipt number. Malformed input parses to `None` and is
/// treated as no receipt recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptNumber {
    pub center: ServiceCenter,
    pub serial: String,
}

impl ReceiptNumber {
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_uppercase().replace([' ', '-'], "");
        let captures = RECEIPT_RE.captures(&normalized)?;
        let center = ServiceCenter::from_code(&captures[1])?;
        Some(Self {
            center,
            serial: captures[2].to_string(),
        })
    }
}

impl fmt::Display for ReceiptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self.center {
            ServiceCenter::Wac => "WAC",
            ServiceCenter::Eac => "EAC",
            ServiceCenter::Lin => "LIN",
            ServiceCenter::Src => "SRC",
            ServiceCenter::Msc => "MSC",
            ServiceCenter::Nbc => "NBC",
            ServiceCenter::Ioe => "IOE",
            ServiceCenter::Ysc => "YSC",
        };
        write!(f, "{}{}", code, self.serial)
    }
}
