//! # Clock（時刻プロバイダ）
//!
//! 取消申請日時・取消日時・通知作成日時などの「現在時刻」を注入するための抽象化。
//! テストでは [`FixedClock`] で時刻を固定する。

use chrono::{DateTime, Utc};

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 実際のシステム時刻を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_system_clock_は呼び出し前後の間の時刻を返す() {
        let before = Utc::now();
        let result = SystemClock.now();
        let after = Utc::now();

        assert!(before <= result && result <= after);
    }

    #[test]
    fn test_fixed_clock_は何度呼んでも注入した時刻を返す() {
        let fixed = Utc.with_ymd_and_hms(2025, 1, 5, 9, 30, 0).unwrap();
        let clock = FixedClock::new(fixed);

        assert_eq!(clock.now(), fixed);
        assert_eq!(clock.now(), fixed);
    }
}
