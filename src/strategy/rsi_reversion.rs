use crate::config::{ConfigError, RsiParams};
use crate::strategy::{decide, BarContext, OrderIntent, Strategy};
use tracing::debug;

//rsi mean reversion strategy
//buys when rsi drops to the oversold threshold
//sells when rsi rises to the overbought threshold
//open positions close at their own exit levels
#[derive(Debug, Clone)]
pub struct RsiReversionStrategy {
    params: RsiParams,
}

impl RsiReversionStrategy {
    //fails fast on degenerate thresholds, before any bar is seen
    pub fn new(params: RsiParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(RsiReversionStrategy { params })
    }

    pub fn params(&self) -> &RsiParams {
        &self.params
    }
}

impl Strategy for RsiReversionStrategy {
    fn on_bar(&mut self, context: &BarContext) -> Option<OrderIntent> {
        let signal = decide(context.rsi, context.position, &self.params);
        let intent = OrderIntent::from_signal(signal, context.position, self.params.units);

        if let Some(intent) = intent {
            debug!(
                time = %context.bar.timestamp,
                rsi = context.rsi,
                position = context.position,
                ?signal,
                units = intent.units,
                "signal"
            );
        }
        intent
    }

    fn name(&self) -> &str {
        "RSI Reversion"
    }
}
