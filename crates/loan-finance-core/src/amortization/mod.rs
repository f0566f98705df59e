//! Period-by-period loan amortization.
//!
//! [`schedule::generate_schedule`] steps a balance forward one payment at a
//! time and aggregates the result; [`yearly`] rolls the rows up by loan year.

pub mod schedule;
pub mod yearly;

pub use schedule::{
    generate_schedule, AmortizationInput, AmortizationOutput, ScheduleSummary, ScheduledPayment,
};
pub use yearly::{yearly_totals, YearlyTotals};
