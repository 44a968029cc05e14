use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::series::{BarField, FieldView, Lookback};

/// Contract multiplier applied to option fills and valuations.
pub const OPTION_MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Put,
    Call,
}

/// Static terms of an option contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTerms {
    pub right: OptionRight,
    pub strike: f64,
    pub expiry: NaiveDate,
    /// Symbol of the underlying instrument. A reference, not ownership.
    pub underlying: String,
}

impl OptionTerms {
    /// Settlement value per unit against the underlying's close.
    pub fn intrinsic(&self, underlying_close: f64) -> f64 {
        match self.right {
            OptionRight::Put => (self.strike - underlying_close).max(0.0),
            OptionRight::Call => (underlying_close - self.strike).max(0.0),
        }
    }

    /// Expired once the simulated date is strictly after the expiry date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry < today
    }
}

/// A named bar history plus its static metadata.
#[derive(Debug, Clone)]
pub struct Instrument {
    symbol: String,
    nickname: Option<String>,
    option: Option<OptionTerms>,
    bars: Lookback<Bar>,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, nickname: Option<String>, option: Option<OptionTerms>) -> Self {
        let symbol = symbol.into();
        let bars = Lookback::named(&format!("bars/{symbol}"));
        Self {
            symbol,
            nickname,
            option,
            bars,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    pub fn option(&self) -> Option<&OptionTerms> {
        self.option.as_ref()
    }

    pub fn is_option(&self) -> bool {
        self.option.is_some()
    }

    /// 100 for options, 1 otherwise.
    pub fn multiplier(&self) -> f64 {
        if self.is_option() {
            OPTION_MULTIPLIER
        } else {
            1.0
        }
    }

    pub fn bars(&self) -> &Lookback<Bar> {
        &self.bars
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.latest()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.latest().map(|b| b.close)
    }

    /// Whether this instrument received a bar at `timestamp`.
    pub fn updated_at(&self, timestamp: NaiveDateTime) -> bool {
        self.latest().is_some_and(|b| b.timestamp == timestamp)
    }

    pub fn field(&self, field: BarField) -> FieldView<'_> {
        FieldView::new(&self.bars, field)
    }

    pub fn open(&self) -> FieldView<'_> {
        self.field(BarField::Open)
    }

    pub fn high(&self) -> FieldView<'_> {
        self.field(BarField::High)
    }

    pub fn low(&self) -> FieldView<'_> {
        self.field(BarField::Low)
    }

    pub fn close(&self) -> FieldView<'_> {
        self.field(BarField::Close)
    }

    pub(crate) fn push(&mut self, bar: Bar) {
        self.bars.write(bar);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Observable;

    fn put(strike: f64) -> OptionTerms {
        OptionTerms {
            right: OptionRight::Put,
            strike,
            expiry: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            underlying: "SPY".into(),
        }
    }

    #[test]
    fn put_intrinsic_value() {
        assert_eq!(put(100.0).intrinsic(95.0), 5.0);
        assert_eq!(put(100.0).intrinsic(105.0), 0.0);
    }

    #[test]
    fn call_intrinsic_value() {
        let call = OptionTerms {
            right: OptionRight::Call,
            ..put(100.0)
        };
        assert_eq!(call.intrinsic(112.5), 12.5);
        assert_eq!(call.intrinsic(90.0), 0.0);
    }

    #[test]
    fn expiry_is_strictly_after() {
        let terms = put(100.0);
        assert!(!terms.is_expired(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
        assert!(terms.is_expired(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()));
    }

    #[test]
    fn multiplier_depends_on_option_flag() {
        assert_eq!(Instrument::new("SPY", None, None).multiplier(), 1.0);
        assert_eq!(
            Instrument::new("SPY240315P100", None, Some(put(100.0))).multiplier(),
            OPTION_MULTIPLIER
        );
    }

    #[test]
    fn close_view_reads_bar_history() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap();
        let mut inst = Instrument::new("SPY", Some("spy".into()), None);
        inst.push(Bar::new(ts, 1.0, 2.0, 0.5, 1.5));
        assert_eq!(inst.close().observe(0), Some(1.5));
        assert!(inst.updated_at(ts));
        assert_eq!(inst.nickname(), Some("spy"));
    }
}
