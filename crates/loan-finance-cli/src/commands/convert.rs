use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::currency::{self, CURRENCIES};

/// Arguments for currency conversion at static reference rates
#[derive(Args)]
pub struct ConvertArgs {
    /// Amount to convert
    #[arg(long, required_unless_present = "list")]
    pub amount: Option<Decimal>,

    /// Source currency code
    #[arg(long, default_value = "USD")]
    pub from: String,

    /// Target currency code
    #[arg(long, required_unless_present = "list")]
    pub to: Option<String>,

    /// List the supported currencies instead of converting
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub amount: Decimal,
    pub from: &'static str,
    pub to: &'static str,
    pub rate: Decimal,
    pub converted: Decimal,
    pub note: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct CurrencyRow {
    code: &'static str,
    symbol: &'static str,
    name: &'static str,
    usd_rate: Decimal,
}

pub fn run_convert(args: ConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.list {
        let rows: Vec<CurrencyRow> = CURRENCIES
            .iter()
            .map(|c| CurrencyRow {
                code: c.code,
                symbol: c.symbol,
                name: c.name,
                usd_rate: c.usd_rate,
            })
            .collect();
        return Ok(serde_json::to_value(rows)?);
    }

    let amount = args.amount.ok_or("--amount is required")?;
    let to = args.to.as_deref().ok_or("--to is required")?;
    Ok(serde_json::to_value(conversion(amount, &args.from, to)?)?)
}

pub fn conversion(amount: Decimal, from: &str, to: &str) -> Result<Conversion, String> {
    let from = currency::lookup(from)?;
    let to = currency::lookup(to)?;
    Ok(Conversion {
        amount,
        from: from.code,
        to: to.code,
        rate: currency::cross_rate(from, to),
        converted: currency::convert(amount, from, to),
        note: "Static reference rates; not for settlement",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_conversion() {
        let c = conversion(dec!(100), "eur", "usd").unwrap();
        assert_eq!(c.from, "EUR");
        assert_eq!(c.to, "USD");
        assert_eq!(c.converted, dec!(108));
    }

    #[test]
    fn test_unknown_code() {
        assert!(conversion(dec!(1), "USD", "ABC").is_err());
    }
}
