use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};

/// Court fee for the mortgage entry in the land register.
pub const MORTGAGE_ENTRY_FEE: i64 = 200;
/// Court fee for opening the land register entry for the property.
pub const LAND_REGISTER_FEE: i64 = 150;
/// VAT applied on top of the regulated notary tariff.
const NOTARY_VAT: f64 = 1.23;
/// Ceiling on the regulated notary fee before VAT.
const NOTARY_FEE_CAP: f64 = 10000.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotaryFee {
    /// Maximum tariff from the regulated bracket table.
    Regulated,
    /// A fee negotiated with the notary, VAT included.
    Custom(Money),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCostInputs {
    pub property_value: Money,
    pub loan_amount: Money,
    /// Transfer tax on secondary-market purchases, normally 2%.
    pub transfer_tax_rate: Rate,
    /// First-time buyers of their only home are exempt from transfer tax.
    pub first_property_exemption: bool,
    pub notary_fee: NotaryFee,
    pub bank_commission: Rate,
    pub agency_commission: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCosts {
    pub transfer_tax: Option<Money>,
    pub notary_fee: Money,
    pub court_fees: Money,
    pub bank_commission: Money,
    pub agency_commission: Money,
}

impl PurchaseCosts {
    pub fn total(&self) -> Money {
        self.transfer_tax.unwrap_or_else(Money::zero)
            + self.notary_fee
            + self.court_fees
            + self.bank_commission
            + self.agency_commission
    }
}

/// Maximum notary tariff for a given transaction value, VAT included.
///
/// The tariff is a piecewise schedule: a flat base per bracket plus a
/// percentage of the value above the bracket floor, capped at 10,000
/// before VAT.
pub fn regulated_notary_fee(property_value: Money) -> Money {
    let value = property_value.to_float().max(0.0);
    let net = if value <= 3_000.0 {
        100.0
    } else if value <= 10_000.0 {
        100.0 + (value - 3_000.0) * 0.03
    } else if value <= 30_000.0 {
        310.0 + (value - 10_000.0) * 0.02
    } else if value <= 60_000.0 {
        710.0 + (value - 30_000.0) * 0.01
    } else if value <= 1_000_000.0 {
        1_010.0 + (value - 60_000.0) * 0.004
    } else if value <= 2_000_000.0 {
        4_770.0 + (value - 1_000_000.0) * 0.002
    } else {
        (6_770.0 + (value - 2_000_000.0) * 0.0025).min(NOTARY_FEE_CAP)
    };
    Money::from_float(net * NOTARY_VAT)
}

/// Transfer tax on the purchase, or `None` when the first-property
/// exemption applies.
pub fn transfer_tax(property_value: Money, rate: Rate, exempt: bool) -> Option<Money> {
    if exempt {
        None
    } else {
        Some(property_value.at_rate(rate))
    }
}

pub fn court_fees() -> Money {
    Money::from_major(MORTGAGE_ENTRY_FEE + LAND_REGISTER_FEE)
}

/// All one-off costs of closing the purchase, itemized.
pub fn calculate_purchase_costs(inputs: &PurchaseCostInputs) -> PurchaseCosts {
    PurchaseCosts {
        transfer_tax: transfer_tax(
            inputs.property_value,
            inputs.transfer_tax_rate,
            inputs.first_property_exemption,
        ),
        notary_fee: match inputs.notary_fee {
            NotaryFee::Regulated => regulated_notary_fee(inputs.property_value),
            NotaryFee::Custom(fee) => fee,
        },
        court_fees: court_fees(),
        bank_commission: inputs.loan_amount.at_rate(inputs.bank_commission),
        agency_commission: inputs.property_value.at_rate(inputs.agency_commission),
    }
}
