//! Fonte de tempo injetável.
//!
//! A validação recebe `now` explicitamente; o pipeline e o simulador leem
//! esse valor de um [`Clock`] para que testes usem tempo fixo.

use std::time::{SystemTime, UNIX_EPOCH};

/// Visão do tempo atual em segundos desde a epoch Unix.
pub trait Clock {
    fn now(&self) -> i64;

    /// Nome do relógio para debug.
    fn name(&self) -> &str {
        "Clock"
    }
}

/// Relógio de parede do sistema.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "system"
    }
}

/// Relógio parado, ajustável manualmente.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock {
    now: i64,
}

impl FixedClock {
    pub fn new(now: i64) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: i64) {
        self.now = now;
    }

    /// Avança o relógio em `secs` segundos.
    pub fn advance(&mut self, secs: i64) {
        self.now += secs;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> i64 {
        (**self).now()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_settable() {
        let mut clock = FixedClock::new(100);
        assert_eq!(clock.now(), 100);
        clock.advance(5);
        assert_eq!(clock.now(), 105);
        clock.set(7);
        assert_eq!(clock.now(), 7);
    }

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800);
        assert_eq!(SystemClock.name(), "system");
    }
}
