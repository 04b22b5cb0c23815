use serde::{Deserialize, Serialize};

/// Rendered in channel names when a statistic could not be fetched this cycle.
pub const UNAVAILABLE: &str = "N/A";

/// One fetched statistic. Lives for a single refresh cycle; nothing here is
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatValue {
    /// A raw measurement, formatted later according to the stat's rule.
    Number(f64),
    /// A display string assembled at fetch time (price with its 24h arrow).
    Display(String),
    /// Sentinel for a failed fetch; renders as `N/A` under every rule.
    Unavailable,
}

impl StatValue {
    pub fn is_available(&self) -> bool {
        !matches!(self, StatValue::Unavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKey {
    Members,
    DifficultyMeowpow,
    DifficultyScrypt,
    HashrateMeowpow,
    HashrateScrypt,
    BlockHeight,
    Supply,
    Price,
    Volume24h,
    MarketCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRule {
    /// Thousands-separated integer, standard rounding.
    Integer,
    /// Two decimals, thousands-separated, suffixed "B MEWC".
    Supply,
    /// Three decimals, thousands-separated.
    Hashrate,
    /// Six decimals, no grouping. Only reached when the price arrives as a
    /// bare number; the fetcher normally assembles the full display string.
    Price,
}

/// Static description of one dashboard statistic.
#[derive(Debug, Clone, Copy)]
pub struct StatSpec {
    pub key: StatKey,
    /// Channel name prefix. Matching against live channels is case- and
    /// space-insensitive on this label.
    pub label: &'static str,
    pub rule: FormatRule,
}

/// The dashboard, in reconcile order. The order is part of the contract:
/// channels are created top to bottom on first run, so it decides how the
/// category reads in the Discord sidebar.
pub static SPECS: [StatSpec; 10] = [
    StatSpec { key: StatKey::Members, label: "Members:", rule: FormatRule::Integer },
    StatSpec { key: StatKey::DifficultyMeowpow, label: "Difficulty (MeowPow):", rule: FormatRule::Integer },
    StatSpec { key: StatKey::DifficultyScrypt, label: "Difficulty (Scrypt):", rule: FormatRule::Integer },
    StatSpec { key: StatKey::HashrateMeowpow, label: "Hashrate (MeowPow): GH/s", rule: FormatRule::Hashrate },
    StatSpec { key: StatKey::HashrateScrypt, label: "Hashrate (Scrypt): GH/s", rule: FormatRule::Hashrate },
    StatSpec { key: StatKey::BlockHeight, label: "Block:", rule: FormatRule::Integer },
    StatSpec { key: StatKey::Supply, label: "Supply:", rule: FormatRule::Supply },
    StatSpec { key: StatKey::Price, label: "Price:", rule: FormatRule::Price },
    StatSpec { key: StatKey::Volume24h, label: "24h Volume: $", rule: FormatRule::Integer },
    StatSpec { key: StatKey::MarketCap, label: "Market Cap: $", rule: FormatRule::Integer },
];

pub fn spec(key: StatKey) -> &'static StatSpec {
    SPECS
        .iter()
        .find(|s| s.key == key)
        .expect("every StatKey has a spec entry")
}

/// Formats a fetched value for display in a channel name. Pure and total:
/// display strings and the unavailable sentinel pass through every rule
/// unchanged.
pub fn format_value(spec: &StatSpec, value: &StatValue) -> String {
    match value {
        StatValue::Unavailable => UNAVAILABLE.to_string(),
        StatValue::Display(s) => s.clone(),
        StatValue::Number(n) => match spec.rule {
            FormatRule::Integer => format_grouped(*n, 0),
            FormatRule::Supply => format!("{}B MEWC", format_grouped(*n, 2)),
            FormatRule::Hashrate => format_grouped(*n, 3),
            FormatRule::Price => format!("{:.6}", n),
        },
    }
}

/// Fixed-decimal formatting with a thousands-separated integer part.
/// Rounding comes from the standard formatter (round-half-to-even), never
/// truncation.
fn format_grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_passes_through_every_rule() {
        for spec in &SPECS {
            assert_eq!(format_value(spec, &StatValue::Unavailable), "N/A");
        }
    }

    #[test]
    fn members_are_thousands_separated() {
        let spec = spec(StatKey::Members);
        assert_eq!(format_value(spec, &StatValue::Number(12345.0)), "12,345");
        assert_eq!(format_value(spec, &StatValue::Number(999.0)), "999");
        assert_eq!(format_value(spec, &StatValue::Number(1_000_000.0)), "1,000,000");
    }

    #[test]
    fn supply_has_two_decimals_and_suffix() {
        let spec = spec(StatKey::Supply);
        assert_eq!(format_value(spec, &StatValue::Number(12.345)), "12.35B MEWC");
        assert_eq!(format_value(spec, &StatValue::Number(1234.5)), "1,234.50B MEWC");
    }

    #[test]
    fn price_component_has_six_decimals() {
        let spec = spec(StatKey::Price);
        assert_eq!(format_value(spec, &StatValue::Number(0.000123)), "0.000123");
    }

    #[test]
    fn price_display_string_is_untouched() {
        let spec = spec(StatKey::Price);
        let display = StatValue::Display("$0.001234 (▲ +5.67% 24h)".to_string());
        assert_eq!(format_value(spec, &display), "$0.001234 (▲ +5.67% 24h)");
    }

    #[test]
    fn market_cap_rounds_instead_of_truncating() {
        let spec = spec(StatKey::MarketCap);
        assert_eq!(format_value(spec, &StatValue::Number(1234567.6)), "1,234,568");
        assert_eq!(format_value(spec, &StatValue::Number(1234567.4)), "1,234,567");
    }

    #[test]
    fn hashrate_has_three_decimals() {
        let spec = spec(StatKey::HashrateMeowpow);
        assert_eq!(format_value(spec, &StatValue::Number(12.3456)), "12.346");
        assert_eq!(format_value(spec, &StatValue::Number(1500.0)), "1,500.000");
    }

    #[test]
    fn difficulty_and_block_are_integers() {
        assert_eq!(
            format_value(spec(StatKey::DifficultyMeowpow), &StatValue::Number(98765.4)),
            "98,765"
        );
        assert_eq!(
            format_value(spec(StatKey::BlockHeight), &StatValue::Number(1234567.0)),
            "1,234,567"
        );
    }

    #[test]
    fn volume_is_a_thousands_separated_integer() {
        let spec = spec(StatKey::Volume24h);
        assert_eq!(format_value(spec, &StatValue::Number(98765.43)), "98,765");
    }

    #[test]
    fn reconcile_order_is_fixed() {
        let order: Vec<StatKey> = SPECS.iter().map(|s| s.key).collect();
        assert_eq!(
            order,
            vec![
                StatKey::Members,
                StatKey::DifficultyMeowpow,
                StatKey::DifficultyScrypt,
                StatKey::HashrateMeowpow,
                StatKey::HashrateScrypt,
                StatKey::BlockHeight,
                StatKey::Supply,
                StatKey::Price,
                StatKey::Volume24h,
                StatKey::MarketCap,
            ]
        );
    }

    #[test]
    fn every_key_resolves_to_its_own_spec() {
        for s in &SPECS {
            assert_eq!(spec(s.key).label, s.label);
        }
    }

    #[test]
    fn negative_values_keep_their_sign() {
        let spec = spec(StatKey::Volume24h);
        assert_eq!(format_value(spec, &StatValue::Number(-12345.0)), "-12,345");
    }
}
