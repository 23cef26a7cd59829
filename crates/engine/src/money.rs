use std::{fmt, ops::Sub, str::FromStr};

use crate::EngineError;

/// Paise per rupee.
const PAISE: i64 = 100;

/// An amount in paise, the unit every balance, fee and ledger row uses.
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!(Money::new(12_34).to_string(), "₹12.34");
/// assert_eq!("₹ 74,5".parse::<Money>().unwrap().minor(), 7450);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// `bps` basis points of this amount, truncated toward zero.
    ///
    /// Widened to `i128` so any `i64` amount can be split; with `bps` at most
    /// 10 000 the result always fits back into `i64`.
    #[must_use]
    pub const fn share_bps(self, bps: u16) -> Money {
        Money((self.0 as i128 * bps as i128 / 10_000) as i64)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let abs = self.0.unsigned_abs();
        write!(f, "₹{}.{:02}", abs / PAISE as u64, abs % PAISE as u64)
    }
}

/// Operator input such as `500`, `499.99`, `74,5` or `₹ 10`.
impl FromStr for Money {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |why: &str| EngineError::InvalidAmount(format!("'{}': {why}", s.trim()));

        let (negative, body) = match s.trim() {
            "" => return Err(bad("empty amount")),
            t => match t.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, t.strip_prefix('+').unwrap_or(t)),
            },
        };
        let body = body.trim_start();
        let body = body.strip_prefix('₹').unwrap_or(body).trim_start();

        let (rupees, paise) = match body.split_once(['.', ',']) {
            Some((rupees, paise)) => (rupees, paise),
            None => (body, ""),
        };
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if rupees.is_empty() || !digits(rupees) || !digits(paise) {
            return Err(bad("not a number"));
        }
        let paise = match paise.len() {
            0 => 0,
            1 | 2 => format!("{paise:0<2}").parse::<i64>().map_err(|_| bad("not a number"))?,
            _ => return Err(bad("at most two decimals")),
        };

        let minor = rupees
            .parse::<i64>()
            .ok()
            .and_then(|r| r.checked_mul(PAISE))
            .and_then(|r| r.checked_add(paise))
            .ok_or_else(|| bad("amount too large"))?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> i64 {
        s.parse::<Money>().unwrap().minor()
    }

    #[test]
    fn formats_rupees_and_paise() {
        assert_eq!(Money::ZERO.to_string(), "₹0.00");
        assert_eq!(Money::new(5).to_string(), "₹0.05");
        assert_eq!(Money::new(-1050).to_string(), "-₹10.50");
        assert_eq!(Money::new(i64::MIN).to_string(), "-₹92233720368547758.08");
    }

    #[test]
    fn parses_operator_input() {
        assert_eq!(parse("500"), 50_000);
        assert_eq!(parse("499.99"), 49_999);
        assert_eq!(parse("74,5"), 7_450);
        assert_eq!(parse(" ₹ 2.30 "), 230);
        assert_eq!(parse("+1."), 100);
        assert_eq!(parse("-0.01"), -1);
    }

    #[test]
    fn rejects_malformed_input() {
        for raw in ["", "-", "₹", "12.345", "1.2.3", "ten", ".50", "1 000", "99999999999999999999"] {
            assert!(raw.parse::<Money>().is_err(), "{raw:?} parsed");
        }
    }

    #[test]
    fn shares_truncate() {
        assert_eq!(Money::new(1001).share_bps(4_500), Money::new(450));
        assert_eq!(Money::new(7).share_bps(9_000), Money::new(6));
    }

    #[test]
    fn shares_of_huge_amounts_do_not_overflow() {
        let max = Money::new(i64::MAX);
        assert_eq!(max.share_bps(10_000), max);
        assert_eq!(max.share_bps(9_000).minor(), 8_301_034_833_169_298_226);
        assert_eq!(Money::new(2_000_000_000_000_000).share_bps(4_500).minor(), 900_000_000_000_000);
    }
}
