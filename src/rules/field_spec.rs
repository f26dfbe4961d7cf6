//! Field specifications of date patterns.
//!
//! The second column of a date rule names, group by group, what each capture
//! means:
//!
//! | code | capture                                                        |
//! |------|----------------------------------------------------------------|
//! | `Y`  | year, numeric                                                  |
//! | `M`  | month, numeric (1-based); `M<n>` fixes the month to `n` when the |
//! |      | capture is a word; a bare `M` on a word re-parses the word      |
//! | `D`  | day of month, numeric                                          |
//! | `H`  | am/pm marker, numeric or fixed with `H<n>`                      |
//!
//! `YMD` therefore reads `(\d{4})-(\d\d)-(\d\d)`, and `M4` reads `(april|apr)`.

use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Year,
    Month { fixed: Option<u32> },
    Day,
    AmPm { fixed: Option<u32> },
}

/// Parsed field specification: one [`Role`] per capture group, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    roles: Vec<Role>,
    source: String,
}

impl FieldSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let chars: Vec<char> = spec.trim().chars().collect();
        let mut roles = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let code = chars[i];
            i += 1;
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let digits: String = chars[start..i].iter().collect();
            let fixed = if digits.is_empty() {
                None
            } else {
                Some(digits.parse::<u32>().map_err(|e| Error::config(format!("field spec '{spec}': {e}")))?)
            };
            let role = match (code, fixed) {
                ('Y', None) => Role::Year,
                ('D', None) => Role::Day,
                ('M', Some(0)) => return Err(Error::config(format!("field spec '{spec}': month 0 does not exist"))),
                ('M', fixed) => Role::Month { fixed },
                ('H', fixed) => Role::AmPm { fixed },
                ('Y' | 'D', Some(_)) => {
                    return Err(Error::config(format!("field spec '{spec}': '{code}' takes no fixed value")));
                }
                (other, _) => return Err(Error::config(format!("field spec '{spec}': unknown role '{other}'"))),
            };
            roles.push(role);
        }
        if roles.is_empty() {
            return Err(Error::config("empty field spec"));
        }
        Ok(Self { roles, source: spec.trim().to_string() })
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_with_fixed_values() {
        let spec = FieldSpec::parse("DM12YH2").unwrap();
        assert_eq!(
            spec.roles(),
            &[Role::Day, Role::Month { fixed: Some(12) }, Role::Year, Role::AmPm { fixed: Some(2) }]
        );
        assert_eq!(FieldSpec::parse("YMD").unwrap().roles().len(), 3);
    }

    #[test]
    fn rejects_bad_specs() {
        assert!(FieldSpec::parse("").is_err());
        assert!(FieldSpec::parse("YXD").is_err());
        assert!(FieldSpec::parse("Y4").is_err());
        assert!(FieldSpec::parse("M0").is_err());
    }
}
