use crate::chart::ChartResponse;

const SECONDS_PER_DAY: i64 = 86_400;
const REGULAR_OPEN: i64 = 9 * 3_600 + 30 * 60;
const REGULAR_CLOSE: i64 = 16 * 3_600;

/// Volume totals for a chart, split by session relative to exchange-local time.
///
/// Pre-market is anything before 09:30, regular runs until 16:00 and post-market after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeBreakdown {
    pub total: i64,
    pub bars: usize,
    pub non_zero_bars: usize,
    pub pre: SessionVolume,
    pub regular: SessionVolume,
    pub post: SessionVolume,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionVolume {
    pub volume: i64,
    pub non_zero_bars: usize,
}

impl SessionVolume {
    fn add(&mut self, volume: i64) {
        self.volume = self.volume.saturating_add(volume);
        if volume != 0 {
            self.non_zero_bars += 1;
        }
    }
}

impl VolumeBreakdown {
    /// Summarize the first result of `chart`. Missing volume entries count as zero and totals saturate.
    pub fn from_chart(chart: &ChartResponse) -> Self {
        let mut breakdown = Self::default();

        let Some(result) = chart.chart.result.first() else {
            return breakdown;
        };
        let offset = i64::from(result.meta.gmt_offset.unwrap_or_default());
        let volumes = result
            .first_quote()
            .map(|quote| quote.volume.as_slice())
            .unwrap_or_default();

        for (idx, &timestamp) in result.timestamp.iter().enumerate() {
            let volume = volumes.get(idx).copied().unwrap_or(0);
            breakdown.bars += 1;
            breakdown.total = breakdown.total.saturating_add(volume);
            if volume != 0 {
                breakdown.non_zero_bars += 1;
            }

            let second_of_day = timestamp.saturating_add(offset).rem_euclid(SECONDS_PER_DAY);
            let bucket = if second_of_day < REGULAR_OPEN {
                &mut breakdown.pre
            } else if second_of_day < REGULAR_CLOSE {
                &mut breakdown.regular
            } else {
                &mut breakdown.post
            };
            bucket.add(volume);
        }

        breakdown
    }

    /// True when every bar outside regular hours reported zero volume.
    pub fn extended_hours_empty(&self) -> bool {
        self.pre.non_zero_bars == 0 && self.post.non_zero_bars == 0
    }
}
