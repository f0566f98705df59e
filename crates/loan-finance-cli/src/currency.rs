use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A display currency with a static reference rate.
///
/// Rates are fixed reference values for labelling and rough conversion only;
/// nothing here is fetched live.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Currency {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    /// US dollars per one unit of this currency
    pub usd_rate: Decimal,
    /// Minor-unit digits shown when formatting
    pub decimals: u32,
}

pub const CURRENCIES: &[Currency] = &[
    Currency { code: "USD", symbol: "$", name: "US Dollar", usd_rate: dec!(1), decimals: 2 },
    Currency { code: "EUR", symbol: "€", name: "Euro", usd_rate: dec!(1.08), decimals: 2 },
    Currency { code: "GBP", symbol: "£", name: "British Pound", usd_rate: dec!(1.27), decimals: 2 },
    Currency { code: "JPY", symbol: "¥", name: "Japanese Yen", usd_rate: dec!(0.0067), decimals: 0 },
    Currency { code: "CHF", symbol: "CHF ", name: "Swiss Franc", usd_rate: dec!(1.13), decimals: 2 },
    Currency { code: "CAD", symbol: "C$", name: "Canadian Dollar", usd_rate: dec!(0.74), decimals: 2 },
    Currency { code: "AUD", symbol: "A$", name: "Australian Dollar", usd_rate: dec!(0.66), decimals: 2 },
    Currency { code: "NZD", symbol: "NZ$", name: "New Zealand Dollar", usd_rate: dec!(0.61), decimals: 2 },
    Currency { code: "CNY", symbol: "¥", name: "Chinese Yuan", usd_rate: dec!(0.14), decimals: 2 },
    Currency { code: "INR", symbol: "₹", name: "Indian Rupee", usd_rate: dec!(0.012), decimals: 2 },
    Currency { code: "SGD", symbol: "S$", name: "Singapore Dollar", usd_rate: dec!(0.74), decimals: 2 },
    Currency { code: "SEK", symbol: "kr ", name: "Swedish Krona", usd_rate: dec!(0.095), decimals: 2 },
    Currency { code: "MXN", symbol: "MX$", name: "Mexican Peso", usd_rate: dec!(0.058), decimals: 2 },
    Currency { code: "BRL", symbol: "R$", name: "Brazilian Real", usd_rate: dec!(0.20), decimals: 2 },
    Currency { code: "ZAR", symbol: "R ", name: "South African Rand", usd_rate: dec!(0.054), decimals: 2 },
];

/// Result fields that hold money amounts.
const MONEY_FIELDS: &[&str] = &[
    "amount",
    "converted",
    "cumulative_interest",
    "cumulative_principal",
    "ending_balance",
    "extra_paid",
    "extra_payment",
    "fees",
    "gross_payment",
    "interest_paid",
    "interest_portion",
    "interest_saved",
    "loan_amount",
    "monthly_payment",
    "net_loan_amount",
    "payment",
    "periodic_payment",
    "principal",
    "principal_paid",
    "principal_portion",
    "remaining_balance",
    "total_cost",
    "total_extra",
    "total_fees",
    "total_interest",
    "total_paid",
    "total_principal",
];

/// Case-insensitive lookup by ISO code.
pub fn lookup(code: &str) -> Result<&'static Currency, String> {
    let upper = code.trim().to_ascii_uppercase();
    CURRENCIES.iter().find(|c| c.code == upper).ok_or_else(|| {
        let known: Vec<&str> = CURRENCIES.iter().map(|c| c.code).collect();
        format!("Unknown currency '{}'; known codes: {}", code, known.join(", "))
    })
}

/// Convert through USD at the static reference rates.
pub fn convert(amount: Decimal, from: &Currency, to: &Currency) -> Decimal {
    amount * from.usd_rate / to.usd_rate
}

/// Units of `to` per unit of `from`.
pub fn cross_rate(from: &Currency, to: &Currency) -> Decimal {
    from.usd_rate / to.usd_rate
}

pub fn is_money_field(key: &str) -> bool {
    MONEY_FIELDS.contains(&key)
}

/// Render a raw amount with the currency symbol, rounded to its minor units.
/// Anything that is not a decimal number is returned unchanged.
pub fn format_amount(raw: &str, currency: &Currency) -> String {
    match raw.parse::<Decimal>() {
        Ok(amount) => {
            let rounded = amount.round_dp(currency.decimals);
            if rounded.is_sign_negative() && !rounded.is_zero() {
                format!("-{}{}", currency.symbol, rounded.abs())
            } else {
                format!("{}{}", currency.symbol, rounded)
            }
        }
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("eur").unwrap().symbol, "€");
        assert_eq!(lookup(" GBP ").unwrap().code, "GBP");
    }

    #[test]
    fn test_unknown_currency_lists_codes() {
        let err = lookup("XYZ").unwrap_err();
        assert!(err.contains("XYZ"));
        assert!(err.contains("USD"));
    }

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in CURRENCIES.iter().enumerate() {
            for b in &CURRENCIES[i + 1..] {
                assert_ne!(a.code, b.code);
            }
        }
    }

    #[test]
    fn test_convert_through_usd() {
        let usd = lookup("USD").unwrap();
        let eur = lookup("EUR").unwrap();
        assert_eq!(convert(dec!(100), eur, usd), dec!(108));
        assert_eq!(convert(dec!(108), usd, eur), dec!(100));
        assert_eq!(convert(dec!(42), eur, eur), dec!(42));
    }

    #[test]
    fn test_format_amount() {
        let usd = lookup("USD").unwrap();
        let jpy = lookup("JPY").unwrap();
        assert_eq!(format_amount("599.5505251", usd), "$599.55");
        assert_eq!(format_amount("-12.346", usd), "-$12.35");
        assert_eq!(format_amount("1500.4", jpy), "¥1500");
        assert_eq!(format_amount("n/a", usd), "n/a");
    }

    #[test]
    fn test_money_fields() {
        assert!(is_money_field("monthly_payment"));
        assert!(!is_money_field("apr_percent"));
        assert!(!is_money_field("payment_number"));
    }
}
