//! End-to-end runs through configuration files and on-disk data.

use std::path::Path;

use replaylab_core::domain::Order;
use replaylab_core::engine::{Algorithm, BarContext, SimError};
use replaylab_runner::{
    load_config, run_from_config, BuyAndHold, FilterParams, FitnessMetric, ParamSweep,
    VolatilityFilter,
};

const SPY_AND_PUT: &str = "\
timestamp,symbol,open,high,low,close,nickname,right,strike,expiry,underlying
2024-01-02,SPY,474,476,473,475,,,,,
2024-01-02,SPY240105P470,2.1,2.2,1.9,2.0,put-470,put,470,2024-01-05,SPY
2024-01-03,SPY,475,476,470,471,,,,,
2024-01-03,SPY240105P470,2.5,3.2,2.4,3.0,put-470,put,470,2024-01-05,SPY
2024-01-04,SPY,471,472,467,468,,,,,
2024-01-04,SPY240105P470,3.1,4.2,3.0,4.0,put-470,put,470,2024-01-05,SPY
2024-01-05,SPY,468,469,464,465,,,,,
2024-01-08,SPY,465,467,464,466,,,,,
";

fn write_fixture(dir: &Path, config_body: &str) -> std::path::PathBuf {
    std::fs::write(dir.join("chain.csv"), SPY_AND_PUT).unwrap();
    let path = dir.join("run.toml");
    std::fs::write(&path, config_body).unwrap();
    path
}

const CONFIG: &str = r#"
start = "2024-01-02"
end = "2024-01-31"
initial_cash = 100000.0

[[sources]]
type = "csv"
path = "chain.csv"
"#;

/// Buys one contract of the nicknamed option at the prior close, once.
struct BuyPut {
    nickname: &'static str,
    done: bool,
}

impl Algorithm for BuyPut {
    fn on_bar(&mut self, ctx: &mut BarContext<'_>) -> Result<(), SimError> {
        if self.done {
            return Ok(());
        }
        if let Ok(put) = ctx.by_nickname(self.nickname) {
            ctx.submit(Order::at_prior_close(put.symbol(), 1))?;
            self.done = true;
        }
        Ok(())
    }
}

#[test]
fn option_bought_and_settled_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&write_fixture(dir.path(), CONFIG)).unwrap();

    let mut algo = BuyPut {
        nickname: "put-470",
        done: false,
    };
    let result = run_from_config(&config, &mut algo).unwrap();

    // Bought at 2.00 on Jan 3, settled at 470 - 466 = 4 on Jan 8.
    assert_eq!(result.fills.len(), 2);
    assert_eq!(result.fills[0].price, 2.0);
    assert_eq!(result.fills[1].price, 4.0);
    assert_eq!(result.summary.expiries, 1);
    assert!(result.positions.is_empty());
    assert!((result.cash - 100_200.0).abs() < 1e-9);
    assert!((result.final_nav() - 100_200.0).abs() < 1e-9);
    assert_eq!(result.nav_curve.len(), 5);
}

#[test]
fn commission_from_config_reduces_cash() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("{CONFIG}\n[costs]\nper_contract = 0.65\n");
    let config = load_config(&write_fixture(dir.path(), &body)).unwrap();

    let mut algo = BuyPut {
        nickname: "put-470",
        done: false,
    };
    let result = run_from_config(&config, &mut algo).unwrap();
    let total_commission: f64 = result.fills.iter().map(|f| f.commission).sum();
    assert!((total_commission - 1.30).abs() < 1e-9);
    assert!((result.cash - (100_200.0 - 1.30)).abs() < 1e-9);
}

#[test]
fn malformed_csv_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), CONFIG);
    std::fs::write(
        dir.path().join("chain.csv"),
        "timestamp,symbol,open,high,low,close\n2024-01-02,SPY,abc,1,1,1\n",
    )
    .unwrap();
    let config = load_config(&path).unwrap();
    assert!(run_from_config(&config, &mut BuyAndHold::new("SPY", 1)).is_err());
}

#[test]
fn synthetic_sweep_ranks_by_metric() {
    let config = replaylab_runner::parse_config(
        r#"
start = "2024-01-01"
warmup_start = "2023-10-02"
end = "2024-12-31"
initial_cash = 1000000.0

[[sources]]
type = "synthetic"
symbol = "SYN"
seed = 7
daily_volatility = 0.015
"#,
    )
    .unwrap();
    let streams = replaylab_runner::build_streams(&config.sources);

    let grid: Vec<FilterParams> = [10, 20, 40]
        .iter()
        .flat_map(|&lookback| {
            [0.15, 0.25, 1.0].iter().map(move |&threshold| FilterParams {
                lookback,
                threshold,
            })
        })
        .collect();

    let results = ParamSweep::new()
        .with_metric(FitnessMetric::Sharpe)
        .run(&config, &streams, &grid, |p| VolatilityFilter::new("SYN", 100, *p))
        .unwrap();

    assert_eq!(results.len(), 9);
    for (entry, params) in results.entries().iter().zip(&grid) {
        assert_eq!(&entry.params, params);
        assert_eq!(entry.score, entry.result.metrics.sharpe);
    }
    let best = results.best().unwrap();
    assert!(results.entries().iter().all(|e| e.score <= best.score));
    assert_eq!(results.ranked()[0].score, best.score);
}
