use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::schedule::ScheduledPayment;
use crate::types::Money;

/// One loan year of a schedule, summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyTotals {
    /// Loan year, 1-based and counted from the start date
    pub year: u32,
    pub payments: u32,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub extra_paid: Money,
    pub total_paid: Money,
    pub ending_balance: Money,
}

/// Roll schedule rows up into loan years of `periods_per_year` payments.
pub fn yearly_totals(schedule: &[ScheduledPayment], periods_per_year: u32) -> Vec<YearlyTotals> {
    let mut years: Vec<YearlyTotals> = Vec::new();
    if periods_per_year == 0 {
        return years;
    }

    for row in schedule {
        let year = (row.payment_number - 1) / periods_per_year + 1;

        match years.last_mut() {
            Some(current) if current.year == year => {
                current.payments += 1;
                current.principal_paid += row.principal_portion;
                current.interest_paid += row.interest_portion;
                current.extra_paid += row.extra_payment;
                current.total_paid += row.gross_payment;
                current.ending_balance = row.remaining_balance;
            }
            _ => years.push(YearlyTotals {
                year,
                payments: 1,
                principal_paid: row.principal_portion,
                interest_paid: row.interest_portion,
                extra_paid: row.extra_payment,
                total_paid: row.gross_payment,
                ending_balance: row.remaining_balance,
            }),
        }
    }

    years
}
