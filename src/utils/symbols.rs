/// Symbol normalization for user-supplied pair names.
/// "btc" -> "BTCUSDT", "eth/usdt" -> "ETHUSDT". Returns None for garbage input.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let mut symbol: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if symbol.is_empty() {
        return None;
    }

    const QUOTES: [&str; 4] = ["USDT", "USDC", "BTC", "ETH"];
    let has_quote = QUOTES.iter().any(|q| symbol.ends_with(q) && symbol.len() > q.len());
    if !has_quote {
        symbol.push_str("USDT");
    }

    if symbol.len() < 5 || symbol.len() > 20 {
        return None;
    }

    Some(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_quote_when_missing() {
        assert_eq!(normalize_symbol("btc").as_deref(), Some("BTCUSDT"));
        assert_eq!(normalize_symbol(" sol ").as_deref(), Some("SOLUSDT"));
    }

    #[test]
    fn keeps_existing_quote_and_strips_separators() {
        assert_eq!(normalize_symbol("eth/usdt").as_deref(), Some("ETHUSDT"));
        assert_eq!(normalize_symbol("$DOGEUSDT").as_deref(), Some("DOGEUSDT"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize_symbol(""), None);
        assert_eq!(normalize_symbol("!!"), None);
        assert_eq!(normalize_symbol("AVERYVERYLONGSYMBOLNAMEUSDT"), None);
    }
}
