use mewc_stats_bot::api::{price_display, NetworkStats};
use mewc_stats_bot::stats::StatValue;

// Helper to build one tick's worth of fetched stats with plausible values.
pub fn sample_stats() -> NetworkStats {
    NetworkStats {
        members: StatValue::Number(12345.0),
        difficulty_meowpow: StatValue::Number(98765.4),
        difficulty_scrypt: StatValue::Number(4321.0),
        hashrate_meowpow: StatValue::Number(12.3456),
        hashrate_scrypt: StatValue::Number(0.789),
        block_height: StatValue::Number(1234567.0),
        supply: StatValue::Number(12.345),
        price: StatValue::Display(price_display(0.001234, Some(5.67))),
        volume_24h: StatValue::Number(98765.43),
        market_cap: StatValue::Number(1234567.6),
    }
}

// Same tick, but with one statistic degraded by a failed fetch.
pub fn sample_stats_with_block_outage() -> NetworkStats {
    NetworkStats { block_height: StatValue::Unavailable, ..sample_stats() }
}
