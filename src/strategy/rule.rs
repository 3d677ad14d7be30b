//the mean-reversion decision rule, a pure function of rsi, position and params

use crate::config::RsiParams;

//what the rule wants done on this bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    //enter long, or cover a short
    Buy,
    //exit a long, or enter short
    Sell,
    Hold,
}

//decides on one bar
//
//- undefined rsi (warm-up) holds
//- long: rsi at or above the long exit sells, otherwise oversold may add up to `max_units`
//- short: rsi at or below the short exit buys, otherwise overbought may add up to `max_units`
//- flat: oversold buys, overbought sells
//- anything else holds
//
//exit levels default to the opposite entry threshold; params are assumed validated
pub fn decide(rsi: Option<f64>, position: i64, params: &RsiParams) -> Signal {
    let rsi = match rsi {
        Some(value) => value,
        None => return Signal::Hold,
    };

    let units = params.units as i64;
    let limit = params.max_units as i64;

    if position > 0 && rsi >= params.exit_long_level() {
        return Signal::Sell;
    }
    if position < 0 && rsi <= params.exit_short_level() {
        return Signal::Buy;
    }

    if rsi <= params.oversold && position >= 0 && position + units <= limit {
        Signal::Buy
    } else if rsi >= params.overbought && position <= 0 && position - units >= -limit {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RsiParams {
        RsiParams::default()
    }

    #[test]
    fn oversold_buys_when_not_long() {
        for rsi in [0.0, 10.0, 29.9, 30.0] {
            assert_eq!(decide(Some(rsi), 0, &params()), Signal::Buy);
            assert_eq!(decide(Some(rsi), -1, &params()), Signal::Buy);
        }
    }

    #[test]
    fn oversold_holds_when_already_long() {
        assert_eq!(decide(Some(20.0), 1, &params()), Signal::Hold);
    }

    #[test]
    fn overbought_sells_when_not_short() {
        for rsi in [70.0, 70.1, 85.0, 100.0] {
            assert_eq!(decide(Some(rsi), 0, &params()), Signal::Sell);
            assert_eq!(decide(Some(rsi), 1, &params()), Signal::Sell);
        }
    }

    #[test]
    fn overbought_holds_when_already_short() {
        assert_eq!(decide(Some(80.0), -1, &params()), Signal::Hold);
    }

    #[test]
    fn neutral_zone_always_holds() {
        for rsi in [30.1, 45.0, 50.0, 69.9] {
            for position in [-2, -1, 0, 1, 2] {
                assert_eq!(decide(Some(rsi), position, &params()), Signal::Hold);
            }
        }
    }

    #[test]
    fn warmup_always_holds() {
        for position in [-1, 0, 1] {
            assert_eq!(decide(None, position, &params()), Signal::Hold);
        }
    }

    #[test]
    fn same_inputs_same_signal() {
        let p = params();
        for rsi in [None, Some(12.0), Some(50.0), Some(91.0)] {
            for position in [-1, 0, 1] {
                assert_eq!(decide(rsi, position, &p), decide(rsi, position, &p));
            }
        }
    }

    #[test]
    fn reentry_allowed_while_under_limit() {
        let p = RsiParams {
            units: 1,
            max_units: 3,
            ..params()
        };
        assert_eq!(decide(Some(25.0), 1, &p), Signal::Buy);
        assert_eq!(decide(Some(25.0), 2, &p), Signal::Buy);
        assert_eq!(decide(Some(25.0), 3, &p), Signal::Hold);
        assert_eq!(decide(Some(75.0), -2, &p), Signal::Sell);
        assert_eq!(decide(Some(75.0), -3, &p), Signal::Hold);
    }

    #[test]
    fn exits_use_their_own_levels() {
        let p = RsiParams {
            exit_long: Some(55.0),
            exit_short: Some(45.0),
            ..params()
        };

        //long closes once rsi recovers to 55, well before overbought
        assert_eq!(decide(Some(54.9), 1, &p), Signal::Hold);
        assert_eq!(decide(Some(55.0), 1, &p), Signal::Sell);
        //short covers at 45
        assert_eq!(decide(Some(45.1), -1, &p), Signal::Hold);
        assert_eq!(decide(Some(45.0), -1, &p), Signal::Buy);

        //entries from flat still need the entry thresholds
        assert_eq!(decide(Some(55.0), 0, &p), Signal::Hold);
        assert_eq!(decide(Some(45.0), 0, &p), Signal::Hold);
        assert_eq!(decide(Some(30.0), 0, &p), Signal::Buy);
        assert_eq!(decide(Some(70.0), 0, &p), Signal::Sell);
    }

    #[test]
    fn tighter_exit_ends_trade_earlier() {
        let p = RsiParams {
            exit_long: Some(50.0),
            ..params()
        };
        let series = [Some(25.0), Some(40.0), Some(52.0), Some(72.0)];

        let mut position = 0i64;
        let mut signals = Vec::new();
        for rsi in series {
            let signal = decide(rsi, position, &p);
            match signal {
                Signal::Buy => position += 1,
                Signal::Sell => position = if position > 0 { 0 } else { position - 1 },
                Signal::Hold => {}
            }
            signals.push(signal);
        }

        //the default exit would have waited for 72
        assert_eq!(
            signals,
            vec![Signal::Buy, Signal::Hold, Signal::Sell, Signal::Sell]
        );
        assert_eq!(position, -1);
    }

    #[test]
    fn scenario_from_flat() {
        let p = params();
        let mut series = vec![None; 13];
        series.extend([Some(25.0), Some(28.0), Some(45.0), Some(72.0), Some(50.0)]);

        //position as the engine would hold it after each signal is filled
        let mut position = 0i64;
        let mut signals = Vec::new();
        for rsi in series {
            let signal = decide(rsi, position, &p);
            match signal {
                Signal::Buy => position += 1,
                Signal::Sell => position = if position > 0 { 0 } else { position - 1 },
                Signal::Hold => {}
            }
            signals.push(signal);
        }

        let mut expected = vec![Signal::Hold; 13];
        expected.extend([
            Signal::Buy,
            Signal::Hold,
            Signal::Hold,
            Signal::Sell,
            Signal::Hold,
        ]);
        assert_eq!(signals, expected);
        assert_eq!(position, 0);
    }
}
