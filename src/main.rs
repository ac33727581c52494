use std::panic;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use perp_radar::utils::format_duration;
use perp_radar::{Cli, CoinglassRest, EngineConfig, MexcRest, RadarEngine};

#[tokio::main]
async fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Warn)
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, global_level)
        .filter(Some("perp_radar"), my_code_level)
        .init();

    let args = Cli::parse();

    let config = EngineConfig::default();
    let cooldown_secs = config.gate.cooldown_secs;
    let engine = Arc::new(RadarEngine::new(
        Arc::new(MexcRest::new()),
        Arc::new(CoinglassRest::from_env()),
        config,
    )?);
    engine.load_persisted().await?;

    let refresher = engine.start_refresher();

    if args.pairs {
        for pair in engine.supported_pairs().await {
            println!("{}", pair);
        }
        refresher.stop().await;
        return Ok(());
    }

    loop {
        for symbol in &args.symbols {
            run_symbol(&engine, symbol, &args).await;
        }
        if !args.watch {
            break;
        }
        println!(
            "--- watching; next pass in {} ---",
            format_duration(cooldown_secs as i64 * 1000)
        );
        tokio::time::sleep(Duration::from_secs(cooldown_secs)).await;
    }

    refresher.stop().await;
    Ok(())
}

async fn run_symbol(engine: &RadarEngine, symbol: &str, args: &Cli) {
    if let Some(timeframe) = &args.timeframe {
        match engine.analyze_timeframe(symbol, timeframe).await {
            Some(analysis) => println!(
                "{} -> {} (score {})\n{}",
                symbol, analysis.recommendation, analysis.score, analysis.explanation
            ),
            None => println!("{}: insufficient history on {}", symbol, timeframe),
        }
        return;
    }

    match engine.generate_signal(symbol, args.force).await {
        Some(signal) => println!("{}", signal.digest()),
        None => println!("{}: rate limited or unusable symbol (try --force)", symbol),
    }

    if args.scalp {
        match engine.scalp_snapshot(symbol).await {
            Some(call) => {
                println!("scalp: {} {}", call.bias, call.symbol);
                println!("  {}", call.reasoning);
                if let (Some(entry), Some(stop)) = (call.entry, call.stop_loss) {
                    println!("  entry {:.4} | stop {:.4}", entry, stop);
                }
                if let (Some(tp1), Some(tp2)) = (call.take_profit_1, call.take_profit_2) {
                    println!("  tp1 {:.4} | tp2 {:.4}", tp1, tp2);
                }
            }
            None => println!("scalp: no price data for {}", symbol),
        }
    }
}
