use std::time::Duration;

use anyhow::{anyhow, Result};
use bonbast_crawler::{crawler::bonbast, logging, util, InstrumentKind};
use strum::IntoEnumIterator;

#[cfg(all(target_os = "linux", target_env = "musl"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// 結束前等待日誌寫入的上限
const LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let result = bonbast::fetch_all_prices().await;

    if let Ok(prices) = &result {
        for kind in InstrumentKind::iter() {
            logging::info_file_async(format!(
                "{}: {} quotes",
                kind,
                prices.by_kind(kind).count()
            ));
        }
    }

    util::http::flush_log(LOG_FLUSH_TIMEOUT);
    logging::flush(LOG_FLUSH_TIMEOUT);

    let prices = result.map_err(|why| anyhow!("Failed to fetch prices because {}", why))?;
    println!("{}", serde_json::to_string_pretty(&prices)?);

    Ok(())
}
