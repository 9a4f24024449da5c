//! Page-level view modes shared by every reader on the screen.
//!
//! The audience lens and the simulated network tier are held in a
//! [`ViewContext`] store. Readers call [`ViewContext::subscribe`] and react
//! to changes instead of reading a global.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Who the visitor is presumed to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceLens {
    #[default]
    Recruiter,
    Engineer,
    #[serde(alias = "resilient")]
    Resilience,
}

impl AudienceLens {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudienceLens::Recruiter => "recruiter",
            AudienceLens::Engineer => "engineer",
            AudienceLens::Resilience => "resilience",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "recruiter" => Some(AudienceLens::Recruiter),
            "engineer" => Some(AudienceLens::Engineer),
            "resilience" | "resilient" => Some(AudienceLens::Resilience),
            _ => None,
        }
    }

    pub fn all() -> Vec<AudienceLens> {
        vec![AudienceLens::Recruiter, AudienceLens::Engineer, AudienceLens::Resilience]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AudienceLens::Recruiter => "Recruiter",
            AudienceLens::Engineer => "Engineer",
            AudienceLens::Resilience => "Resilience",
        }
    }

    /// Next lens in switcher order, wrapping around
    pub fn next(&self) -> Self {
        match self {
            AudienceLens::Recruiter => AudienceLens::Engineer,
            AudienceLens::Engineer => AudienceLens::Resilience,
            AudienceLens::Resilience => AudienceLens::Recruiter,
        }
    }
}

/// Simulated connectivity quality. Not a real network measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTier {
    #[default]
    Fast,
    Slow,
    Offline,
}

impl NetworkTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkTier::Fast => "fast",
            NetworkTier::Slow => "slow",
            NetworkTier::Offline => "offline",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Some(NetworkTier::Fast),
            "slow" => Some(NetworkTier::Slow),
            "offline" => Some(NetworkTier::Offline),
            _ => None,
        }
    }

    pub fn all() -> Vec<NetworkTier> {
        vec![NetworkTier::Offline, NetworkTier::Slow, NetworkTier::Fast]
    }

    pub fn label(&self) -> &'static str {
        match self {
            NetworkTier::Fast => "Fiber",
            NetworkTier::Slow => "2G/Edge",
            NetworkTier::Offline => "Satellite",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NetworkTier::Fast => "Fiber (High Band)",
            NetworkTier::Slow => "2G/Edge (Resilient)",
            NetworkTier::Offline => "Satellite (Offline)",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            NetworkTier::Fast => NetworkTier::Slow,
            NetworkTier::Slow => NetworkTier::Offline,
            NetworkTier::Offline => NetworkTier::Fast,
        }
    }

    /// Delay injected once before every provider call on this tier.
    pub fn artificial_delay(&self) -> Duration {
        match self {
            NetworkTier::Fast => Duration::ZERO,
            NetworkTier::Slow => Duration::from_millis(3_000),
            NetworkTier::Offline => Duration::from_millis(500),
        }
    }
}

/// Immutable snapshot of both view modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewMode {
    pub lens: AudienceLens,
    pub tier: NetworkTier,
}

impl ViewMode {
    pub fn new(lens: AudienceLens, tier: NetworkTier) -> Self {
        Self { lens, tier }
    }
}

/// Observable store for the page-wide [`ViewMode`].
///
/// Cloning the store hands out another writer onto the same state.
/// Setters that leave the value unchanged do not wake subscribers.
#[derive(Clone)]
pub struct ViewContext {
    tx: watch::Sender<ViewMode>,
}

impl ViewContext {
    pub fn new(initial: ViewMode) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn snapshot(&self) -> ViewMode {
        *self.tx.borrow()
    }

    /// Subscribe to mode changes. The current value counts as already seen.
    pub fn subscribe(&self) -> watch::Receiver<ViewMode> {
        self.tx.subscribe()
    }

    pub fn set_lens(&self, lens: AudienceLens) -> bool {
        self.update(|mode| mode.lens = lens)
    }

    pub fn set_tier(&self, tier: NetworkTier) -> bool {
        self.update(|mode| mode.tier = tier)
    }

    /// Apply `f` to the current mode. Returns whether anything changed.
    pub fn update(&self, f: impl FnOnce(&mut ViewMode)) -> bool {
        self.tx.send_if_modified(|mode| {
            let before = *mode;
            f(mode);
            *mode != before
        })
    }
}

impl Default for ViewContext {
    fn default() -> Self {
        Self::new(ViewMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let mode = ViewMode::default();
        assert_eq!(mode.lens, AudienceLens::Recruiter);
        assert_eq!(mode.tier, NetworkTier::Fast);
    }

    #[test]
    fn test_lens_from_str_accepts_legacy_id() {
        assert_eq!(AudienceLens::from_str("resilient"), Some(AudienceLens::Resilience));
        assert_eq!(AudienceLens::from_str(" Engineer "), Some(AudienceLens::Engineer));
        assert_eq!(AudienceLens::from_str("designer"), None);
    }

    #[test]
    fn test_as_str_round_trips() {
        for lens in AudienceLens::all() {
            assert_eq!(AudienceLens::from_str(lens.as_str()), Some(lens));
        }
        for tier in NetworkTier::all() {
            assert_eq!(NetworkTier::from_str(tier.as_str()), Some(tier));
        }
    }

    #[test]
    fn test_tier_delays() {
        assert_eq!(NetworkTier::Fast.artificial_delay(), Duration::ZERO);
        assert_eq!(NetworkTier::Slow.artificial_delay(), Duration::from_secs(3));
        assert_eq!(NetworkTier::Offline.artificial_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_next_cycles_through_all() {
        let mut lens = AudienceLens::Recruiter;
        for _ in 0..3 {
            lens = lens.next();
        }
        assert_eq!(lens, AudienceLens::Recruiter);

        let mut tier = NetworkTier::Fast;
        for _ in 0..3 {
            tier = tier.next();
        }
        assert_eq!(tier, NetworkTier::Fast);
    }

    #[test]
    fn test_subscriber_sees_change() {
        let ctx = ViewContext::default();
        let mut rx = ctx.subscribe();
        assert!(!rx.has_changed().unwrap_or(true));

        assert!(ctx.set_tier(NetworkTier::Slow));
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().tier, NetworkTier::Slow);
        assert_eq!(ctx.snapshot().lens, AudienceLens::Recruiter);
    }

    #[test]
    fn test_unchanged_set_does_not_notify() {
        let ctx = ViewContext::default();
        let rx = ctx.subscribe();

        assert!(!ctx.set_lens(AudienceLens::Recruiter));
        assert!(!rx.has_changed().unwrap_or(true));
    }

    #[test]
    fn test_serde_lowercase() {
        let mode = ViewMode::new(AudienceLens::Engineer, NetworkTier::Offline);
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, r#"{"lens":"engineer","tier":"offline"}"#);

        let legacy: AudienceLens = serde_json::from_str(r#""resilient""#).unwrap();
        assert_eq!(legacy, AudienceLens::Resilience);
    }
}
