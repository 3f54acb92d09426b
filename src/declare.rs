use rust_decimal::Decimal;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use strum::{Display, EnumIter};

/// 報價品項分類
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum InstrumentKind {
    /// 外幣
    Currency,
    /// 金幣
    Coin,
    /// 黃金
    Gold,
    /// 數位貨幣
    DigitalCurrency,
}

/// One row of the instrument mapping: which raw response fields are exposed
/// and under what display name.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub name: &'static str,
    pub kind: InstrumentKind,
    pub sell_key: &'static str,
    /// Metals and bitcoin only quote a sell price.
    pub buy_key: Option<&'static str>,
}

impl Instrument {
    const fn currency(name: &'static str, sell_key: &'static str, buy_key: &'static str) -> Self {
        Self::pair(name, InstrumentKind::Currency, sell_key, buy_key)
    }

    const fn coin(name: &'static str, sell_key: &'static str, buy_key: &'static str) -> Self {
        Self::pair(name, InstrumentKind::Coin, sell_key, buy_key)
    }

    const fn pair(
        name: &'static str,
        kind: InstrumentKind,
        sell_key: &'static str,
        buy_key: &'static str,
    ) -> Self {
        Instrument {
            name,
            kind,
            sell_key,
            buy_key: Some(buy_key),
        }
    }

    const fn sell_only(name: &'static str, kind: InstrumentKind, sell_key: &'static str) -> Self {
        Instrument {
            name,
            kind,
            sell_key,
            buy_key: None,
        }
    }
}

/// The field keys are a contract with the remote `/json` endpoint.
pub static INSTRUMENTS: [Instrument; 37] = [
    Instrument::currency("US Dollar", "usd1", "usd2"),
    Instrument::currency("Euro", "eur1", "eur2"),
    Instrument::currency("British Pound", "gbp1", "gbp2"),
    Instrument::currency("Swiss Franc", "chf1", "chf2"),
    Instrument::currency("Canadian Dollar", "cad1", "cad2"),
    Instrument::currency("Australian Dollar", "aud1", "aud2"),
    Instrument::currency("Swedish Krona", "sek1", "sek2"),
    Instrument::currency("Norwegian Krone", "nok1", "nok2"),
    Instrument::currency("Russian Ruble", "rub1", "rub2"),
    Instrument::currency("Thai Baht", "thb1", "thb2"),
    Instrument::currency("Singapore Dollar", "sgd1", "sgd2"),
    Instrument::currency("Hong Kong Dollar", "hkd1", "hkd2"),
    Instrument::currency("Azerbaijani Manat", "azn1", "azn2"),
    Instrument::currency("Armenian Dram", "amd1", "amd2"),
    Instrument::currency("Danish Krone", "dkk1", "dkk2"),
    Instrument::currency("UAE Dirham", "aed1", "aed2"),
    Instrument::currency("Japanese Yen", "jpy1", "jpy2"),
    Instrument::currency("Turkish Lira", "try1", "try2"),
    Instrument::currency("Chinese Yuan", "cny1", "cny2"),
    Instrument::currency("KSA Riyal", "sar1", "sar2"),
    Instrument::currency("Indian Rupee", "inr1", "inr2"),
    Instrument::currency("Ringgit", "myr1", "myr2"),
    Instrument::currency("Afghan Afghani", "afn1", "afn2"),
    Instrument::currency("Kuwaiti Dinar", "kwd1", "kwd2"),
    Instrument::currency("Iraqi Dinar", "iqd1", "iqd2"),
    Instrument::currency("Bahraini Dinar", "bhd1", "bhd2"),
    Instrument::currency("Omani Rial", "omr1", "omr2"),
    Instrument::currency("Qatari Riyal", "qar1", "qar2"),
    Instrument::coin("Azadi", "azadi1", "azadi12"),
    Instrument::coin("Emami", "emami1", "emami12"),
    Instrument::coin("½ Azadi", "azadi1_2", "azadi1_22"),
    Instrument::coin("¼ Azadi", "azadi1_4", "azadi1_42"),
    Instrument::coin("Gerami", "azadi1g", "azadi1g2"),
    Instrument::sell_only("Gold Gram", InstrumentKind::Gold, "gol18"),
    Instrument::sell_only("Gold Mithqal", InstrumentKind::Gold, "mithqal"),
    Instrument::sell_only("Gold Ounce", InstrumentKind::Gold, "ounce"),
    Instrument::sell_only("Bitcoin", InstrumentKind::DigitalCurrency, "bitcoin"),
];

/// 單一品項的買賣價
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quote {
    #[serde(with = "rust_decimal::serde::float")]
    pub sell: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub buy: Option<Decimal>,
}

/// Normalized prices keyed by instrument display name.
///
/// Holds exactly one quote per mapping row it was built from and keeps the
/// mapping order, so iteration and serialization are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceSet {
    quotes: Vec<(&'static Instrument, Quote)>,
}

impl PriceSet {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        PriceSet {
            quotes: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, instrument: &'static Instrument, quote: Quote) {
        self.quotes.push((instrument, quote));
    }

    pub fn get(&self, name: &str) -> Option<&Quote> {
        self.quotes
            .iter()
            .find(|(instrument, _)| instrument.name == name)
            .map(|(_, quote)| quote)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static Instrument, &Quote)> + '_ {
        self.quotes.iter().map(|(instrument, quote)| (*instrument, quote))
    }

    pub fn by_kind(
        &self,
        kind: InstrumentKind,
    ) -> impl Iterator<Item = (&'static str, &Quote)> + '_ {
        self.iter()
            .filter(move |(instrument, _)| instrument.kind == kind)
            .map(|(instrument, quote)| (instrument.name, quote))
    }
}

impl Serialize for PriceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.quotes.len()))?;
        for (instrument, quote) in &self.quotes {
            map.serialize_entry(instrument.name, quote)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rust_decimal_macros::dec;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_instruments_are_unique() {
        let names: HashSet<_> = INSTRUMENTS.iter().map(|i| i.name).collect();
        assert_eq!(names.len(), INSTRUMENTS.len());

        let keys: Vec<_> = INSTRUMENTS
            .iter()
            .flat_map(|i| std::iter::once(i.sell_key).chain(i.buy_key))
            .collect();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_instrument_order_and_buy_keys() {
        // 外幣、金幣、黃金、數位貨幣的順序不可打亂
        let mut last = 0;
        for instrument in INSTRUMENTS.iter() {
            let rank = InstrumentKind::iter()
                .position(|k| k == instrument.kind)
                .unwrap();
            assert!(rank >= last, "{} is out of order", instrument.name);
            last = rank;

            let has_buy = matches!(
                instrument.kind,
                InstrumentKind::Currency | InstrumentKind::Coin
            );
            assert_eq!(instrument.buy_key.is_some(), has_buy, "{}", instrument.name);
        }

        assert_eq!(INSTRUMENTS[0].name, "US Dollar");
        assert_eq!(INSTRUMENTS[30].name, "½ Azadi");
        assert_eq!(INSTRUMENTS[30].sell_key, "azadi1_2");
        assert_eq!(INSTRUMENTS[30].buy_key, Some("azadi1_22"));
        assert_eq!(INSTRUMENTS[33].sell_key, "gol18");
        assert_eq!(INSTRUMENTS[36].name, "Bitcoin");
    }

    #[test]
    fn test_price_set_serializes_in_mapping_order() {
        let mut prices = PriceSet::with_capacity(2);
        prices.push(
            &INSTRUMENTS[0],
            Quote {
                sell: dec!(50000),
                buy: Some(dec!(49500)),
            },
        );
        prices.push(
            &INSTRUMENTS[36],
            Quote {
                sell: dec!(1200000000),
                buy: None,
            },
        );

        let json = serde_json::to_string(&prices).unwrap();
        assert_eq!(
            json,
            r#"{"US Dollar":{"sell":50000.0,"buy":49500.0},"Bitcoin":{"sell":1200000000.0}}"#
        );

        assert_eq!(prices.by_kind(InstrumentKind::DigitalCurrency).count(), 1);
        assert_eq!(InstrumentKind::DigitalCurrency.to_string(), "DigitalCurrency");
    }
}
