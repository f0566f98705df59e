pub mod apr;
pub mod convert;
pub mod loan;
pub mod schedule;
pub mod tvm;

use clap::ValueEnum;
use loan_finance_core::{PaymentFrequency, PaymentTiming};

/// Payment frequency as accepted on the command line
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FrequencyArg {
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl From<FrequencyArg> for PaymentFrequency {
    fn from(value: FrequencyArg) -> Self {
        match value {
            FrequencyArg::Monthly => PaymentFrequency::Monthly,
            FrequencyArg::Quarterly => PaymentFrequency::Quarterly,
            FrequencyArg::SemiAnnual => PaymentFrequency::SemiAnnual,
            FrequencyArg::Annual => PaymentFrequency::Annual,
        }
    }
}

/// Payment timing as accepted on the command line
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum TimingArg {
    #[default]
    End,
    Beginning,
}

impl From<TimingArg> for PaymentTiming {
    fn from(value: TimingArg) -> Self {
        match value {
            TimingArg::End => PaymentTiming::End,
            TimingArg::Beginning => PaymentTiming::Beginning,
        }
    }
}
