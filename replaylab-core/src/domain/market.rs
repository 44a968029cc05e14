//! Market: every instrument seen so far in the run, keyed by symbol.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::data::BarRecord;
use crate::domain::Instrument;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown instrument '{0}'")]
    UnknownSymbol(String),

    #[error("no instrument has nickname '{0}'")]
    NoNicknameMatch(String),

    #[error("nickname '{nickname}' matches {matches} instruments")]
    AmbiguousNickname { nickname: String, matches: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Market {
    instruments: BTreeMap<String, Instrument>,
}

impl Market {
    pub fn get(&self, symbol: &str) -> Result<&Instrument, LookupError> {
        self.instruments
            .get(symbol)
            .ok_or_else(|| LookupError::UnknownSymbol(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.instruments.contains_key(symbol)
    }

    /// The single instrument carrying `nickname`. Zero or several matches is an error.
    pub fn by_nickname(&self, nickname: &str) -> Result<&Instrument, LookupError> {
        let mut matches = self
            .instruments
            .values()
            .filter(|inst| inst.nickname() == Some(nickname));
        let first = matches
            .next()
            .ok_or_else(|| LookupError::NoNicknameMatch(nickname.to_string()))?;
        let extra = matches.count();
        if extra > 0 {
            return Err(LookupError::AmbiguousNickname {
                nickname: nickname.to_string(),
                matches: extra + 1,
            });
        }
        Ok(first)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> + '_ {
        self.instruments.values()
    }

    /// Option instruments written against `underlying`.
    pub fn chain<'a>(&'a self, underlying: &'a str) -> impl Iterator<Item = &'a Instrument> + 'a {
        self.instruments
            .values()
            .filter(move |inst| inst.option().is_some_and(|t| t.underlying == underlying))
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Append a record's bar to its instrument, creating the instrument on first sight.
    ///
    /// Returns false when the instrument already holds a bar at this timestamp;
    /// the duplicate is dropped.
    pub(crate) fn absorb(&mut self, record: BarRecord) -> bool {
        let BarRecord {
            symbol,
            nickname,
            option,
            bar,
        } = record;
        let inst = self
            .instruments
            .entry(symbol.clone())
            .or_insert_with(|| Instrument::new(symbol, nickname, option));
        if inst.updated_at(bar.timestamp) {
            tracing::warn!(
                symbol = inst.symbol(),
                timestamp = %bar.timestamp,
                "duplicate bar dropped"
            );
            return false;
        }
        inst.push(bar);
        true
    }
}
