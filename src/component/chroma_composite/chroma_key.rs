//! 綠幕去背參數
//!
//! 參考曲線是以 RGB 歐氏距離 `d` 計算的柔邊函數 `d^s / (thr^s + d^s)`：
//! 距離越接近參考色越透明。ffmpeg 的 `colorkey` 則是線性斜坡，
//! 這裡取參考曲線 10% 與 90% 的位置作為斜坡的起點與終點。

use crate::config::CompositeSpec;

/// `sqrt(255² × 3)`，ffmpeg colorkey 用來正規化距離的上限
pub const MAX_RGB_DISTANCE: f64 = 441.672_955_930_063_7;

const MIN_SIMILARITY: f64 = 0.000_01;
const RAMP_RATIO: f64 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaKey {
    pub color: [u8; 3],
    pub threshold: f64,
    pub softness: f64,
}

impl ChromaKey {
    #[must_use]
    pub const fn from_composite(composite: &CompositeSpec) -> Self {
        Self {
            color: composite.key_color,
            threshold: composite.key_threshold,
            softness: composite.key_softness,
        }
    }

    /// 參考曲線：0 為完全透明，1 為完全保留
    #[must_use]
    pub fn alpha_at(&self, distance: f64) -> f64 {
        if self.threshold <= 0.0 {
            return if distance > 0.0 { 1.0 } else { 0.0 };
        }
        if self.softness <= 0.0 {
            return if distance > self.threshold { 1.0 } else { 0.0 };
        }
        let d = distance.powf(self.softness);
        d / (self.threshold.powf(self.softness) + d)
    }

    fn ramp_bounds(&self) -> (f64, f64) {
        if self.softness <= 0.0 {
            return (self.threshold, self.threshold);
        }
        let spread = RAMP_RATIO.powf(1.0 / self.softness);
        (self.threshold / spread, self.threshold * spread)
    }

    #[must_use]
    pub fn similarity(&self) -> f64 {
        let (start, _) = self.ramp_bounds();
        (start / MAX_RGB_DISTANCE).clamp(MIN_SIMILARITY, 1.0)
    }

    #[must_use]
    pub fn blend(&self) -> f64 {
        let (start, end) = self.ramp_bounds();
        ((end - start) / MAX_RGB_DISTANCE).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn hex_color(&self) -> String {
        let [r, g, b] = self.color;
        format!("0x{r:02X}{g:02X}{b:02X}")
    }

    #[must_use]
    pub fn filter(&self) -> String {
        format!(
            "colorkey=color={}:similarity={:.5}:blend={:.5}",
            self.hex_color(),
            self.similarity(),
            self.blend()
        )
    }
}
