//! CoinGecko market data provider implementation

use super::{build_client, parse_json, read_body};
use crate::{
    constants::{COINGECKO_API_KEY_HEADER, COINGECKO_API_URL, COIN_LIST_LIMIT},
    error::ApiError,
    money::{Currency, Percentage, Price},
    provider::MarketDataProvider,
    types::{
        ChartPeriod, ChartPoint, Coin, CoinChart, CoinDetail, CoinSort, FavouriteCoinId,
        GlobalMarketOverview, SearchCoin,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

/// Per-currency amounts keyed by `vs_currency`, e.g. `{"usd": 1.0}`
type CurrencyAmounts = HashMap<String, Option<f64>>;

#[derive(Debug, Deserialize)]
struct MarketCoinDto {
    id: String,
    symbol: String,
    name: String,
    image: Option<String>,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    sparkline_in_7d: Option<SparklineDto>,
}

#[derive(Debug, Deserialize)]
struct SparklineDto {
    #[serde(default)]
    price: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct CoinDetailDto {
    id: String,
    symbol: String,
    name: String,
    image: Option<ImageDto>,
    market_cap_rank: Option<u32>,
    market_data: Option<MarketDataDto>,
    genesis_date: Option<String>,
    description: Option<HashMap<String, Option<String>>>,
    links: Option<LinksDto>,
}

#[derive(Debug, Deserialize)]
struct ImageDto {
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MarketDataDto {
    current_price: CurrencyAmounts,
    price_change_percentage_24h: Option<f64>,
    market_cap: CurrencyAmounts,
    total_volume: CurrencyAmounts,
    circulating_supply: Option<f64>,
    ath: CurrencyAmounts,
    ath_date: HashMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
struct LinksDto {
    #[serde(default)]
    homepage: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct MarketChartDto {
    prices: Vec<(f64, Option<f64>)>,
}

#[derive(Debug, Deserialize)]
struct GlobalDto {
    data: GlobalDataDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GlobalDataDto {
    active_cryptocurrencies: u64,
    markets: u64,
    total_market_cap: CurrencyAmounts,
    total_volume: CurrencyAmounts,
    market_cap_percentage: CurrencyAmounts,
}

#[derive(Debug, Deserialize)]
struct SearchDto {
    coins: Vec<SearchCoinDto>,
}

#[derive(Debug, Deserialize)]
struct SearchCoinDto {
    id: String,
    name: String,
    symbol: String,
    large: Option<String>,
    thumb: Option<String>,
}

fn amount_in(amounts: &CurrencyAmounts, currency: Currency) -> Option<f64> {
    amounts.get(currency.coingecko_id()).copied().flatten()
}

fn map_market_coin(dto: MarketCoinDto, currency: Currency) -> Coin {
    Coin {
        id: dto.id,
        name: dto.name,
        symbol: dto.symbol.to_uppercase(),
        image_url: dto.image.unwrap_or_default(),
        current_price: Price::from_f64(dto.current_price, currency),
        price_change_percentage_24h: Percentage::from_f64(dto.price_change_percentage_24h),
        sparkline: dto
            .sparkline_in_7d
            .map(|s| {
                s.price
                    .into_iter()
                    .flatten()
                    .map(|p| Price::from_f64(Some(p), currency))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn map_coin_detail(dto: CoinDetailDto, currency: Currency) -> CoinDetail {
    let market = dto.market_data.unwrap_or_default();

    CoinDetail {
        id: dto.id,
        name: dto.name,
        symbol: dto.symbol.to_uppercase(),
        image_url: dto.image.and_then(|i| i.large).unwrap_or_default(),
        current_price: Price::from_f64(amount_in(&market.current_price, currency), currency),
        price_change_percentage_24h: Percentage::from_f64(market.price_change_percentage_24h),
        market_cap_rank: dto.market_cap_rank,
        market_cap: Price::from_f64(amount_in(&market.market_cap, currency), currency),
        volume_24h: Price::from_f64(amount_in(&market.total_volume, currency), currency),
        circulating_supply: market
            .circulating_supply
            .and_then(Decimal::from_f64)
            .unwrap_or(Decimal::ZERO),
        all_time_high: Price::from_f64(amount_in(&market.ath, currency), currency),
        all_time_high_date: market
            .ath_date
            .get(currency.coingecko_id())
            .cloned()
            .flatten()
            .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
            .map(|d| d.with_timezone(&Utc)),
        listed_date: dto
            .genesis_date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        description: dto
            .description
            .and_then(|mut d| d.remove("en"))
            .flatten()
            .filter(|d| !d.trim().is_empty()),
        website_url: dto
            .links
            .and_then(|l| l.homepage.into_iter().flatten().find(|u| !u.trim().is_empty())),
    }
}

/// Market chart samples are `[timestamp_ms, price]`, oldest first
fn map_market_chart(dto: MarketChartDto, currency: Currency) -> CoinChart {
    let points = dto
        .prices
        .into_iter()
        .filter_map(|(timestamp_ms, price)| {
            Some(ChartPoint {
                timestamp: Utc.timestamp_millis_opt(timestamp_ms as i64).single()?,
                price: Price::from_f64(Some(price?), currency),
            })
        })
        .collect();

    CoinChart::from_points(points, currency)
}

fn map_global(dto: GlobalDataDto, currency: Currency) -> GlobalMarketOverview {
    GlobalMarketOverview {
        total_market_cap: Price::from_f64(amount_in(&dto.total_market_cap, currency), currency),
        total_volume_24h: Price::from_f64(amount_in(&dto.total_volume, currency), currency),
        btc_dominance: Percentage::from_f64(
            dto.market_cap_percentage.get("btc").copied().flatten(),
        ),
        number_of_coins: dto.active_cryptocurrencies,
        number_of_markets: dto.markets,
        number_of_exchanges: None,
    }
}

fn map_search_coin(dto: SearchCoinDto) -> SearchCoin {
    SearchCoin {
        id: dto.id,
        name: dto.name,
        symbol: dto.symbol.to_uppercase(),
        image_url: dto.large.or(dto.thumb).unwrap_or_default(),
    }
}

/// CoinGecko `order` parameter; sorts it cannot express fall back to market cap
fn market_order(sort: CoinSort) -> &'static str {
    match sort {
        CoinSort::Popular => "volume_desc",
        CoinSort::MarketCap | CoinSort::Gainers | CoinSort::Losers | CoinSort::Newest => {
            "market_cap_desc"
        }
    }
}

/// Applies the sorts `/coins/markets` cannot do server-side
fn sort_locally(coins: &mut [Coin], sort: CoinSort) {
    match sort {
        CoinSort::Gainers => coins.sort_by(|a, b| {
            b.price_change_percentage_24h
                .amount()
                .cmp(&a.price_change_percentage_24h.amount())
        }),
        CoinSort::Losers => coins.sort_by(|a, b| {
            a.price_change_percentage_24h
                .amount()
                .cmp(&b.price_change_percentage_24h.amount())
        }),
        CoinSort::MarketCap | CoinSort::Popular | CoinSort::Newest => {}
    }
}

/// CoinGecko market data provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    /// Creates a new CoinGecko provider
    pub fn new(api_key: Option<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client()?,
            base_url: COINGECKO_API_URL.to_string(),
            api_key,
        })
    }

    /// Points the provider at another host, e.g. the pro API
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Requesting CoinGecko");

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(COINGECKO_API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(ApiError::NetworkError)?;
        let body = read_body(response, path).await?;
        parse_json(&body, self.provider_name())
    }

    async fn fetch_markets(
        &self,
        currency: Currency,
        order: &str,
        ids: Option<String>,
    ) -> Result<Vec<Coin>, ApiError> {
        let mut query = vec![
            ("vs_currency", currency.coingecko_id().to_string()),
            ("order", order.to_string()),
            ("per_page", COIN_LIST_LIMIT.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "true".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];
        if let Some(ids) = ids {
            query.push(("ids", ids));
        }

        let coins: Vec<MarketCoinDto> = self.get("/coins/markets", &query).await?;

        Ok(coins
            .into_iter()
            .map(|dto| map_market_coin(dto, currency))
            .collect())
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn fetch_coins(
        &self,
        currency: Currency,
        sort: CoinSort,
    ) -> Result<Vec<Coin>, ApiError> {
        if sort == CoinSort::Newest {
            tracing::debug!("CoinGecko cannot order by listing date, using market cap");
        }

        let mut coins = self.fetch_markets(currency, market_order(sort), None).await?;
        sort_locally(&mut coins, sort);

        tracing::debug!(
            count = coins.len(),
            sort = ?sort,
            "Fetched coins from CoinGecko"
        );

        Ok(coins)
    }

    async fn fetch_coins_by_ids(
        &self,
        ids: &[FavouriteCoinId],
        currency: Currency,
    ) -> Result<Vec<Coin>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // One markets page holds at most COIN_LIST_LIMIT coins
        let mut coins = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(COIN_LIST_LIMIT as usize) {
            let ids = chunk
                .iter()
                .map(FavouriteCoinId::as_str)
                .collect::<Vec<_>>()
                .join(",");
            coins.extend(
                self.fetch_markets(currency, market_order(CoinSort::MarketCap), Some(ids))
                    .await?,
            );
        }

        Ok(coins)
    }

    async fn fetch_coin_detail(
        &self,
        id: &str,
        currency: Currency,
    ) -> Result<CoinDetail, ApiError> {
        let query = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
            ("sparkline", "false".to_string()),
        ];
        let dto: CoinDetailDto = self.get(&format!("/coins/{}", id), &query).await?;

        Ok(map_coin_detail(dto, currency))
    }

    async fn fetch_coin_chart(
        &self,
        id: &str,
        period: ChartPeriod,
        currency: Currency,
    ) -> Result<CoinChart, ApiError> {
        let query = [
            ("vs_currency", currency.coingecko_id().to_string()),
            ("days", period.days().to_string()),
        ];
        let dto: MarketChartDto = self
            .get(&format!("/coins/{}/market_chart", id), &query)
            .await?;

        Ok(map_market_chart(dto, currency))
    }

    async fn fetch_market_overview(
        &self,
        currency: Currency,
    ) -> Result<GlobalMarketOverview, ApiError> {
        let dto: GlobalDto = self.get("/global", &[]).await?;
        Ok(map_global(dto.data, currency))
    }

    async fn search_coins(&self, query: &str) -> Result<Vec<SearchCoin>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let dto: SearchDto = self.get("/search", &[("query", query.to_string())]).await?;
        Ok(dto.coins.into_iter().map(map_search_coin).collect())
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_markets_response() {
        let body = r#"[
            {
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
                "current_price": 27000.44,
                "price_change_percentage_24h": 1.5,
                "sparkline_in_7d": {"price": [26000.0, null, 27000.44]}
            },
            {
                "id": "dogecoin",
                "symbol": "doge",
                "name": "Dogecoin",
                "image": null,
                "current_price": 0.0612,
                "price_change_percentage_24h": null
            }
        ]"#;

        let dtos: Vec<MarketCoinDto> = parse_json(body, "coingecko").unwrap();
        let coins: Vec<Coin> = dtos
            .into_iter()
            .map(|dto| map_market_coin(dto, Currency::USD))
            .collect();

        assert_eq!(coins[0].symbol, "BTC");
        assert_eq!(coins[0].current_price.formatted(), "$27,000.44");
        assert_eq!(coins[0].sparkline.len(), 2);
        assert_eq!(coins[1].current_price.formatted(), "$0.061200");
        assert!(coins[1].price_change_percentage_24h.is_zero());
        assert!(coins[1].sparkline.is_empty());
    }

    #[test]
    fn test_local_sort_for_gainers_and_losers() {
        let coin = |id: &str, change: f64| Coin {
            id: id.to_string(),
            name: id.to_string(),
            symbol: id.to_uppercase(),
            image_url: String::new(),
            current_price: Price::zero(Currency::USD),
            price_change_percentage_24h: Percentage::from_f64(Some(change)),
            sparkline: Vec::new(),
        };
        let mut coins = vec![coin("a", 1.0), coin("b", -4.0), coin("c", 7.5)];

        sort_locally(&mut coins, CoinSort::Gainers);
        assert_eq!(coins[0].id, "c");

        sort_locally(&mut coins, CoinSort::Losers);
        assert_eq!(coins[0].id, "b");
        assert_eq!(market_order(CoinSort::Popular), "volume_desc");
    }

    #[test]
    fn test_map_coin_detail_picks_currency() {
        let body = r#"{
            "id": "ethereum",
            "symbol": "eth",
            "name": "Ethereum",
            "image": {"large": "https://assets.coingecko.com/eth.png"},
            "market_cap_rank": 2,
            "genesis_date": "2015-07-30",
            "description": {"en": "Ethereum is a global, open-source platform."},
            "links": {"homepage": ["", "https://www.ethereum.org/"]},
            "market_data": {
                "current_price": {"usd": 1800.5, "eur": 1650.25},
                "price_change_percentage_24h": -2.346,
                "market_cap": {"usd": 216000000000.0, "eur": 198000000000.0},
                "total_volume": {"usd": 9000000000.0, "eur": null},
                "circulating_supply": 120000000.0,
                "ath": {"usd": 4878.26, "eur": 4228.93},
                "ath_date": {"usd": "2021-11-10T14:24:11.849Z", "eur": "2021-11-10T14:24:11.849Z"}
            }
        }"#;

        let dto: CoinDetailDto = parse_json(body, "coingecko").unwrap();
        let detail = map_coin_detail(dto, Currency::EUR);

        assert_eq!(detail.current_price.formatted(), "€1,650.25");
        assert!(detail.volume_24h.amount().is_zero());
        assert_eq!(detail.price_change_percentage_24h.formatted(), "-2.35%");
        assert_eq!(
            detail.listed_date,
            NaiveDate::from_ymd_opt(2015, 7, 30)
        );
        assert!(detail.all_time_high_date.is_some());
        assert_eq!(detail.website_url.as_deref(), Some("https://www.ethereum.org/"));
        assert!(detail.description.is_some());
    }

    #[test]
    fn test_map_market_chart() {
        let body = r#"{"prices": [
            [1700000000000, 27000.44],
            [1700003600000, 25000.89],
            [1700007200000, null],
            [1700010800000, 30000.47],
            [1700014400000, 20000.2]
        ]}"#;

        let dto: MarketChartDto = parse_json(body, "coingecko").unwrap();
        let chart = map_market_chart(dto, Currency::USD);

        assert_eq!(chart.prices.len(), 4);
        assert_eq!(chart.min_price.formatted(), "$20,000.20");
        assert_eq!(chart.max_price.formatted(), "$30,000.47");
        assert_eq!(chart.period_price_change_percentage.formatted(), "-25.93%");
    }

    #[test]
    fn test_map_global() {
        let body = r#"{"data": {
            "active_cryptocurrencies": 10000,
            "markets": 900,
            "total_market_cap": {"usd": 1100000000000.0},
            "total_volume": {"usd": 42000000000.0},
            "market_cap_percentage": {"btc": 48.514, "eth": 17.2}
        }}"#;

        let dto: GlobalDto = parse_json(body, "coingecko").unwrap();
        let overview = map_global(dto.data, Currency::USD);

        assert_eq!(overview.number_of_coins, 10000);
        assert_eq!(overview.number_of_exchanges, None);
        assert_eq!(overview.btc_dominance.formatted(), "+48.51%");
    }
}
