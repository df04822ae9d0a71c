use std::fmt;
use std::time::Duration;

use crate::core::AclState;

/// 单次 audit / repair 运行的统计（不属于对外报告契约）
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// 非空页数
    pub pages: usize,
    pub examined: usize,
    pub valid: usize,
    pub empty: usize,
    pub broken: usize,
    /// 仅 repair
    pub fixed: usize,
    pub not_fixed: usize,
    pub elapsed: Duration,
}

impl ScanStats {
    pub fn record(&mut self, state: AclState) {
        self.examined += 1;
        match state {
            AclState::Valid => self.valid += 1,
            AclState::Empty => self.empty += 1,
            AclState::Broken => self.broken += 1,
        }
    }

    pub fn records_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.examined as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "╔══════════════════════════════════════════════════╗")?;
        writeln!(f, "║           acl-mend Scan Report                   ║")?;
        writeln!(f, "╠══════════════════════════════════════════════════╣")?;
        writeln!(f, "║   pages:        {:>10}                       ║", self.pages)?;
        writeln!(f, "║   examined:     {:>10}                       ║", self.examined)?;
        writeln!(f, "║   valid:        {:>10}                       ║", self.valid)?;
        writeln!(f, "║   empty:        {:>10}                       ║", self.empty)?;
        writeln!(f, "║   broken:       {:>10}                       ║", self.broken)?;
        writeln!(f, "╠──────────────────────────────────────────────────╣")?;
        writeln!(f, "║   fixed:        {:>10}                       ║", self.fixed)?;
        writeln!(f, "║   not fixed:    {:>10}                       ║", self.not_fixed)?;
        writeln!(f, "╠──────────────────────────────────────────────────╣")?;
        writeln!(
            f,
            "║   elapsed:      {:>10}  ({:>8.1} rec/s)     ║",
            format!("{:.2?}", self.elapsed),
            self.records_per_sec()
        )?;
        writeln!(f, "╚══════════════════════════════════════════════════╝")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_by_state() {
        let mut s = ScanStats::default();
        s.record(AclState::Valid);
        s.record(AclState::Empty);
        s.record(AclState::Broken);
        s.record(AclState::Empty);
        assert_eq!(s.examined, 4);
        assert_eq!((s.valid, s.empty, s.broken), (1, 2, 1));
        assert_eq!(s.valid + s.empty + s.broken, s.examined);
    }

    #[test]
    fn display_renders_counts() {
        let s = ScanStats {
            pages: 2,
            examined: 150,
            ..Default::default()
        };
        let text = s.to_string();
        assert!(text.contains("150"));
        assert!(text.contains("pages"));
    }
}
