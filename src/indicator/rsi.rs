//relative strength index with wilder smoothing
//first average is the simple mean of `period` changes, then
//avg = (prev_avg * (period - 1) + current) / period
//no losses gives 100, a series that never moved gives 50
//the first `period` bars have no value

//streaming rsi fed one close at a time
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    changes_seen: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
}

impl Rsi {
    //period must be at least 1 (checked by RsiParams::validate)
    pub fn new(period: usize) -> Self {
        Rsi {
            period: period.max(1),
            prev_close: None,
            changes_seen: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    //feeds the next close and returns the rsi for that bar, if warmed up
    pub fn update(&mut self, close: f64) -> Option<f64> {
        let prev = match self.prev_close.replace(close) {
            Some(prev) => prev,
            None => return None,
        };

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        self.changes_seen += 1;

        let n = self.period as f64;
        if self.changes_seen < self.period {
            self.gain_sum += gain;
            self.loss_sum += loss;
            return None;
        }

        if self.changes_seen == self.period {
            self.avg_gain = (self.gain_sum + gain) / n;
            self.avg_loss = (self.loss_sum + loss) / n;
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        Some(self.value())
    }

    //true once update has started returning values
    pub fn is_ready(&self) -> bool {
        self.changes_seen >= self.period
    }

    fn value(&self) -> f64 {
        if self.avg_loss == 0.0 {
            if self.avg_gain == 0.0 {
                return 50.0;
            }
            return 100.0;
        }
        let rs = self.avg_gain / self.avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

//rsi for every close in a series
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut rsi = Rsi::new(period);
    closes.iter().map(|&close| rsi.update(close)).collect()
}
