/// Default listings search base
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.realtor.com/realestateandhomes-search";

/// Price window in dollars on either side of the estimate
pub const DEFAULT_PRICE_WINDOW: f64 = 50_000.0;

/// Build the listings search URL for homes priced near the estimate.
///
/// The window is clamped at zero on the low side and both bounds are
/// rounded to whole dollars:
/// `{base}/{zipcode}/price-{min}-{max}`
pub fn listings_search_url(base_url: &str, zipcode: &str, price: f64, window: f64) -> String {
    let min_price = (price - window).max(0.0).round() as u64;
    let max_price = (price + window).max(0.0).round() as u64;

    format!(
        "{}/{}/price-{}-{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(zipcode.trim()),
        min_price,
        max_price
    )
}
