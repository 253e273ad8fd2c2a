use coinwatch::{ChartPeriod, CoinTracker, Config, Resource};
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let tracker = CoinTracker::open(&config).await?;
    let prefs = tracker.preferences();

    println!("CoinWatch market overview ({})", tracker.provider_name());
    println!("==================================");
    println!(
        "Currency: {}  Sort: {:?}",
        prefs.user.currency.code(),
        prefs.market.coin_sort
    );

    match tracker.get_market_overview().await {
        Resource::Success(overview) => {
            println!("Market cap:     {}", overview.total_market_cap);
            println!("24h volume:     {}", overview.total_volume_24h);
            println!("BTC dominance:  {}", overview.btc_dominance);
        }
        Resource::Error(message) => println!("Market stats unavailable: {}", message),
    }

    let start = Instant::now();
    let coins = match tracker.update_cached_coins().await {
        Resource::Success(coins) => coins,
        Resource::Error(message) => {
            println!("{}, showing cached list", message);
            tracker.cached_coins().await.into_data().unwrap_or_default()
        }
    };
    println!("\nFetched {} coins in {:?}", coins.len(), start.elapsed());

    println!("\n{:-<50}", "");
    for coin in coins.iter().take(10) {
        println!(
            "{:<8} {:>18} {:>10}",
            coin.symbol, coin.current_price, coin.price_change_percentage_24h
        );
    }

    if let Some(first) = coins.first() {
        if let Resource::Success(chart) = tracker.get_coin_chart(&first.id, ChartPeriod::Week).await {
            println!(
                "\n{} 7d: low {} high {} change {}",
                first.symbol, chart.min_price, chart.max_price, chart.period_price_change_percentage
            );
        }
    }

    Ok(())
}
