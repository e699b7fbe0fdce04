use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::analysis::bias::{HtfBias, check_htf_alignment, determine_htf_bias};
use crate::analysis::levels::calculate_levels_with;
use crate::analysis::pivots::{recent_pivot_highs, recent_pivot_lows};
use crate::analysis::scoring::calculate_score;
use crate::analysis::selector::detect_setup;
use crate::analysis::structure::{analyze_market_structure, detect_recent_structure_events};
use crate::config::{EngineConfig, MarketConfigs, SignalConfig};
use crate::data::candle_cache::CandleCache;
use crate::domain::{Candle, PairInterval};
use crate::indicators::{detect_atr_spike, detect_rsi_divergence, volume_ratio};
use crate::models::signal::Signal;
use crate::utils::app_time::{Clock, SystemClock};

use super::cooldown::{CooldownBook, evaluate_cooldown_bypass};
use super::messages::{Evaluation, Rejection};
use super::sinks::{SignalNotifier, SignalStore};

/// Pivots fed to the divergence check.
const DIVERGENCE_PIVOT_COUNT: usize = 10;

pub struct SignalEngine {
    /// Orchestration settings and the global tunables.
    pub config: EngineConfig,

    /// Per-instrument overrides
    pub markets: MarketConfigs,

    cache: CandleCache,
    cooldowns: CooldownBook,
    clock: Box<dyn Clock>,
    notifier: Arc<dyn SignalNotifier>,
    store: Arc<dyn SignalStore>,
}

impl SignalEngine {
    pub fn new(
        config: EngineConfig,
        markets: MarketConfigs,
        notifier: Arc<dyn SignalNotifier>,
        store: Arc<dyn SignalStore>,
    ) -> Self {
        Self::with_clock(config, markets, notifier, store, Box::new(SystemClock))
    }

    pub fn with_clock(
        config: EngineConfig,
        markets: MarketConfigs,
        notifier: Arc<dyn SignalNotifier>,
        store: Arc<dyn SignalStore>,
        clock: Box<dyn Clock>,
    ) -> Self {
        log::info!(
            "Signal engine ready: entry {:?}, HTF {:?}, notifier {}",
            config.entry_timeframes,
            config.htf_timeframes,
            notifier.signature()
        );
        Self {
            config,
            markets,
            cache: CandleCache::new(),
            cooldowns: CooldownBook::new(),
            clock,
            notifier,
            store,
        }
    }

    pub fn cache(&self) -> &CandleCache {
        &self.cache
    }

    pub fn cooldowns(&self) -> &CooldownBook {
        &self.cooldowns
    }

    /// Replace the cached history of one series, e.g. from a startup download.
    pub fn seed_history(
        &mut self,
        instrument: &str,
        timeframe: &str,
        candles: Vec<Candle>,
    ) -> Result<()> {
        let key = series_key(instrument, timeframe)?;
        self.cache.init(key, candles);
        Ok(())
    }

    /// Fully resolved tunables for one instrument.
    pub fn market_config(&self, instrument: &str) -> SignalConfig {
        self.markets.resolve(&self.config.signal, instrument)
    }

    /// Cache the closed candle, then evaluate it when the timeframe is an
    /// entry timeframe. Fails only on an unrecognised timeframe.
    pub async fn on_candle_closed(
        &mut self,
        instrument: &str,
        timeframe: &str,
        candle: Candle,
    ) -> Result<Evaluation> {
        let key = series_key(instrument, timeframe)?;
        self.cache.update(&key, candle);

        if !self.config.is_entry_timeframe(timeframe) {
            return Ok(Evaluation::Rejected(Rejection::NotEntryTimeframe));
        }

        let evaluation = self.analyze_for_entry(instrument, timeframe).await;
        match &evaluation {
            Evaluation::Signal(signal) => log::info!("🎯 ENTRY {}", signal.summary()),
            Evaluation::Rejected(reason) => {
                if self.config.diagnostic_mode {
                    log::info!("[{instrument} {timeframe}] no signal: {reason}");
                } else {
                    log::debug!("[{instrument} {timeframe}] no signal: {reason}");
                }
            }
        }
        Ok(evaluation)
    }

    /// Setup, HTF bias, confluence, score, levels, cooldown, then delivery.
    pub async fn analyze_for_entry(&mut self, instrument: &str, timeframe: &str) -> Evaluation {
        let cfg = self.market_config(instrument);
        let Some(key) = PairInterval::from_timeframe(instrument, timeframe) else {
            return Evaluation::Rejected(Rejection::InsufficientData {
                have: 0,
                need: self.config.min_entry_candles,
            });
        };
        let candles = self.cache.get(&key);

        if candles.len() < self.config.min_entry_candles {
            return Evaluation::Rejected(Rejection::InsufficientData {
                have: candles.len(),
                need: self.config.min_entry_candles,
            });
        }

        let Some(setup) = detect_setup(candles, &cfg) else {
            return Evaluation::Rejected(Rejection::NoSetup);
        };
        log::debug!(
            "[{instrument} {timeframe}] setup detected: {} ({})",
            setup.name,
            setup.setup_type()
        );

        let htf_bias = self.htf_bias(instrument, &cfg);
        let htf_alignment = check_htf_alignment(setup.side, &htf_bias);
        if cfg.require_htf_alignment && !htf_alignment.aligned {
            return Evaluation::Rejected(Rejection::HtfMisaligned {
                bias: htf_bias.bias,
            });
        }

        let pivot_highs = recent_pivot_highs(candles, cfg.pivot_window, DIVERGENCE_PIVOT_COUNT);
        let pivot_lows = recent_pivot_lows(candles, cfg.pivot_window, DIVERGENCE_PIVOT_COUNT);
        let divergence = detect_rsi_divergence(candles, &pivot_highs, &pivot_lows, cfg.rsi_period);
        let structure =
            detect_recent_structure_events(candles, cfg.pivot_window, cfg.structure_lookback);
        let atr_spike = detect_atr_spike(candles, cfg.atr_period, cfg.atr_spike_ratio);
        let vol_ratio = volume_ratio(candles, cfg.volume_period);

        let score = calculate_score(
            &setup,
            Some(&htf_alignment),
            candles,
            &divergence,
            &structure,
            &cfg,
        );
        if score.score < cfg.entry_score_threshold {
            return Evaluation::Rejected(Rejection::ScoreBelowThreshold {
                score: score.score,
                threshold: cfg.entry_score_threshold,
            });
        }

        let levels = calculate_levels_with(&setup, cfg.zone_sl_buffer_pct, cfg.fallback_stop_pct);
        if levels.risk_reward1 < cfg.min_rr {
            return Evaluation::Rejected(Rejection::RiskRewardTooLow {
                rr: levels.risk_reward1,
                min: cfg.min_rr,
            });
        }

        let timestamp = candles.last().map(|c| c.close_time).unwrap_or_default();
        let now = self.clock.now_ms();
        let mut signal = Signal {
            instrument: instrument.to_string(),
            timeframe: timeframe.to_string(),
            side: setup.side,
            zone_key: setup.zone_key(),
            setup,
            score,
            levels,
            htf_bias: Some(htf_bias),
            htf_alignment: Some(htf_alignment),
            divergence,
            structure,
            atr_spike,
            volume_ratio: vol_ratio,
            cooldown_bypassed: false,
            bypass_reason: None,
            timestamp,
            created_at: now,
        };

        let cooldown_key = signal.cooldown_key();
        if self.cooldowns.is_on_cooldown(&cooldown_key, now) {
            let decision = evaluate_cooldown_bypass(&signal, &cfg);
            match decision.reason {
                Some(reason) if decision.bypass => {
                    log::info!("[{instrument} {timeframe}] cooldown bypassed: {reason}");
                    signal = signal.with_bypass(reason.to_string());
                }
                _ => {
                    return Evaluation::Rejected(Rejection::CooldownActive {
                        remaining_minutes: self.cooldowns.remaining_minutes(&cooldown_key, now),
                        key: cooldown_key.to_string(),
                    });
                }
            }
        }

        if !self.notifier.send_signal(&signal).await {
            log::warn!(
                "[{instrument} {timeframe}] {} delivery failed, signal dropped",
                self.notifier.signature()
            );
            return Evaluation::Rejected(Rejection::DeliveryFailed);
        }

        if let Err(e) = self.store.save_signal(&signal).await {
            log::error!("[{instrument} {timeframe}] failed to save signal: {e:#}");
        }
        self.cooldowns
            .add_cooldown(cooldown_key, cfg.cooldown_minutes, self.clock.now_ms());

        Evaluation::Signal(Box::new(signal))
    }

    /// Trend of every configured higher timeframe with enough history.
    fn htf_bias(&self, instrument: &str, cfg: &SignalConfig) -> HtfBias {
        let trends: BTreeMap<String, _> = self
            .config
            .htf_timeframes
            .iter()
            .filter_map(|tf| {
                let key = PairInterval::from_timeframe(instrument, tf)?;
                let candles = self.cache.get(&key);
                (candles.len() >= self.config.min_htf_candles)
                    .then(|| (tf.clone(), analyze_market_structure(candles, cfg.pivot_window)))
            })
            .collect();
        determine_htf_bias(&trends)
    }
}

fn series_key(instrument: &str, timeframe: &str) -> Result<PairInterval> {
    PairInterval::from_timeframe(instrument, timeframe)
        .ok_or_else(|| anyhow!("Unknown timeframe '{timeframe}' for {instrument}"))
}
