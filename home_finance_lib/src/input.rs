//! Deserializable request types shared by the CLI scenario files and the
//! web API. Raw structs carry defaults and looser shapes; `build` methods
//! turn them into the calculation inputs.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::capacity::{CapacityInputs, EmploymentType, IncomeSource};
use crate::costs::{NotaryFee, PurchaseCostInputs};
use crate::loan::{
    BridgeInsurance, InstallmentType, LoanTerms, OverpaymentFrequency, OverpaymentPolicy,
    OverpaymentTarget,
};
use crate::money::{Money, Rate};
use crate::projection::{AnalysisOptions, DownPayment, PropertyInputs, RentInputs};
use crate::rates::fallback_inflation;
use crate::time::{Date, Month, Year};

fn default_installment_type() -> InstallmentType {
    InstallmentType::Equal
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDate {
    pub year: u32,
    pub month: String,
    pub day: u8,
}

impl RawDate {
    fn build(&self) -> Result<Date> {
        let month: Month = self
            .month
            .parse()
            .map_err(|_| anyhow!("Unknown month '{}'", self.month))?;
        let year = Year(self.year);
        if self.day == 0 || self.day > month.days_in(year) {
            return Err(anyhow!(
                "Day {} is out of range for {} {}",
                self.day,
                self.month,
                self.year
            ));
        }
        Ok(Date::new(year, month, self.day))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawOverpayment {
    pub amount: Money,
    pub frequency: OverpaymentFrequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default = "default_start_month")]
    pub start_month: u32,
    pub target: OverpaymentTarget,
}

fn default_interval() -> u32 {
    1
}

fn default_start_month() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBridgeInsurance {
    pub months: u32,
    pub margin_increase: Rate,
}

/// Request for an amortization schedule, optionally with bridge insurance,
/// an overpayment plan and a what-if rate shift.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleRequest {
    pub loan_amount: Money,
    pub loan_term_years: u32,
    pub base_rate: Rate,
    pub bank_margin: Rate,
    #[serde(default = "default_installment_type")]
    pub installment_type: InstallmentType,
    pub start: RawDate,
    pub bridge_insurance: Option<RawBridgeInsurance>,
    pub overpayment: Option<RawOverpayment>,
    pub rate_change: Option<Rate>,
}

/// A schedule request resolved into calculation inputs.
#[derive(Debug, Clone)]
pub struct ScheduleJob {
    pub terms: LoanTerms,
    pub start_date: Date,
    pub bridge: Option<BridgeInsurance>,
    pub overpayment: Option<OverpaymentPolicy>,
    pub rate_change: Option<Rate>,
}

impl ScheduleRequest {
    pub fn build(&self) -> Result<ScheduleJob> {
        let start_date = self.start.build().context("Invalid schedule start date")?;
        Ok(ScheduleJob {
            terms: LoanTerms {
                principal: self.loan_amount,
                annual_rate: self.base_rate + self.bank_margin,
                term_months: self.loan_term_years * 12,
                installment_type: self.installment_type,
            },
            start_date,
            bridge: self.bridge_insurance.as_ref().map(|b| BridgeInsurance {
                months: b.months,
                margin_increase: b.margin_increase,
            }),
            overpayment: self.overpayment.as_ref().map(|o| OverpaymentPolicy {
                amount: o.amount,
                frequency: o.frequency,
                interval: o.interval,
                start_month: o.start_month,
                target: o.target,
            }),
            rate_change: self.rate_change,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PurchaseCostsRequest {
    pub property_value: Money,
    pub loan_amount: Money,
    #[serde(default = "default_transfer_tax_rate")]
    pub transfer_tax_rate: Rate,
    #[serde(default)]
    pub first_property_exemption: bool,
    /// A negotiated notary fee; the regulated tariff applies when unset.
    pub custom_notary_fee: Option<Money>,
    #[serde(default = "Rate::zero")]
    pub bank_commission: Rate,
    #[serde(default = "Rate::zero")]
    pub agency_commission: Rate,
}

fn default_transfer_tax_rate() -> Rate {
    Rate::from_percent(2)
}

impl PurchaseCostsRequest {
    pub fn build(&self) -> Result<PurchaseCostInputs> {
        Ok(PurchaseCostInputs {
            property_value: self.property_value,
            loan_amount: self.loan_amount,
            transfer_tax_rate: self.transfer_tax_rate,
            first_property_exemption: self.first_property_exemption,
            notary_fee: match self.custom_notary_fee {
                Some(fee) => NotaryFee::Custom(fee),
                None => NotaryFee::Regulated,
            },
            bank_commission: self.bank_commission,
            agency_commission: self.agency_commission,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawIncome {
    pub amount: Money,
    pub employment: EmploymentType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapacityRequest {
    pub incomes: Vec<RawIncome>,
    pub monthly_expenses: Money,
    #[serde(default = "Money::zero")]
    pub existing_loan_payments: Money,
    #[serde(default = "Money::zero")]
    pub credit_card_limits: Money,
    #[serde(default = "Money::zero")]
    pub overdraft_limits: Money,
    pub household_size: u32,
    pub loan_term_years: u32,
    pub nominal_rate: Rate,
    #[serde(default = "default_installment_type")]
    pub installment_type: InstallmentType,
    #[serde(default = "default_dsti")]
    pub requested_dsti: Rate,
}

fn default_dsti() -> Rate {
    Rate::from_percent(50)
}

impl CapacityRequest {
    pub fn build(&self) -> Result<CapacityInputs> {
        Ok(CapacityInputs {
            incomes: self
                .incomes
                .iter()
                .map(|i| IncomeSource {
                    amount: i.amount,
                    employment: i.employment,
                })
                .collect(),
            monthly_expenses: self.monthly_expenses,
            existing_loan_payments: self.existing_loan_payments,
            credit_card_limits: self.credit_card_limits,
            overdraft_limits: self.overdraft_limits,
            household_size: self.household_size,
            term_months: self.loan_term_years * 12,
            nominal_rate: self.nominal_rate,
            installment_type: self.installment_type,
            requested_dsti: self.requested_dsti,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawDownPaymentType {
    Amount,
    Percent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProperty {
    pub property_price: Money,
    pub down_payment_type: RawDownPaymentType,
    pub down_payment_value: f64,
    pub base_rate: Rate,
    pub bank_margin: Rate,
    pub loan_term_years: u32,
    #[serde(default = "Money::zero")]
    pub transaction_costs: Money,
    #[serde(default = "Money::zero")]
    pub property_tax: Money,
    #[serde(default = "Money::zero")]
    pub insurance: Money,
    #[serde(default = "Money::zero")]
    pub maintenance: Money,
    #[serde(default = "Money::zero")]
    pub community_fee: Money,
    #[serde(default = "Rate::zero")]
    pub appreciation: Rate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRent {
    pub monthly_rent: Money,
    #[serde(default = "Rate::zero")]
    pub rent_increase: Rate,
    #[serde(default = "Money::zero")]
    pub security_deposit: Money,
    #[serde(default = "Money::zero")]
    pub renter_insurance: Money,
    #[serde(default = "Money::zero")]
    pub rent_maintenance: Money,
    #[serde(default = "Rate::zero")]
    pub investment_return: Rate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawOptions {
    pub analysis_years: u32,
    /// Assumed general inflation; the standing fallback applies when
    /// unset.
    pub inflation: Option<Rate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisRequest {
    pub property: RawProperty,
    pub rent: RawRent,
    pub options: RawOptions,
}

impl AnalysisRequest {
    pub fn build(&self) -> Result<(PropertyInputs, RentInputs, AnalysisOptions)> {
        let down_payment = match self.property.down_payment_type {
            RawDownPaymentType::Amount => {
                DownPayment::Amount(Money::from_float(self.property.down_payment_value))
            }
            RawDownPaymentType::Percent => {
                DownPayment::Percent(Rate::from_float(self.property.down_payment_value))
            }
        };
        let property = PropertyInputs {
            property_price: self.property.property_price,
            down_payment,
            base_rate: self.property.base_rate,
            bank_margin: self.property.bank_margin,
            loan_term_years: self.property.loan_term_years,
            transaction_costs: self.property.transaction_costs,
            property_tax: self.property.property_tax,
            insurance: self.property.insurance,
            maintenance: self.property.maintenance,
            community_fee: self.property.community_fee,
            appreciation: self.property.appreciation,
        };
        let rent = RentInputs {
            monthly_rent: self.rent.monthly_rent,
            rent_increase: self.rent.rent_increase,
            security_deposit: self.rent.security_deposit,
            renter_insurance: self.rent.renter_insurance,
            rent_maintenance: self.rent.rent_maintenance,
            investment_return: self.rent.investment_return,
        };
        let options = AnalysisOptions {
            analysis_years: self.options.analysis_years,
            inflation: self.options.inflation.unwrap_or_else(fallback_inflation),
        };
        Ok((property, rent, options))
    }
}

/// A scenario file: any combination of the four calculations.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub schedule: Option<ScheduleRequest>,
    pub purchase_costs: Option<PurchaseCostsRequest>,
    pub capacity: Option<CapacityRequest>,
    pub analysis: Option<AnalysisRequest>,
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scenario file")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_schedule_request_from_toml() -> Result<()> {
        let scenario = Scenario::from_toml(
            r#"
            [schedule]
            loan_amount = 400000.0
            loan_term_years = 25
            base_rate = 5.6
            bank_margin = 2.0
            installment_type = "equal"
            rate_change = 1.0

            [schedule.start]
            year = 2025
            month = "january"
            day = 10

            [schedule.bridge_insurance]
            months = 6
            margin_increase = 1.5

            [schedule.overpayment]
            amount = 1000.0
            frequency = "monthly"
            target = "shorten-period"
            "#,
        )?;
        let job = scenario.schedule.unwrap().build()?;
        assert_eq!(job.terms.principal, Money::from_major(400000));
        assert_eq!(job.terms.annual_rate, Rate::from_float(7.6));
        assert_eq!(job.terms.term_months, 300);
        assert_eq!(job.start_date, Date::new(Year(2025), Month::January, 10));
        assert_eq!(job.bridge.unwrap().months, 6);
        let overpayment = job.overpayment.unwrap();
        assert_eq!(overpayment.interval, 1);
        assert_eq!(overpayment.start_month, 1);
        assert_eq!(overpayment.target, OverpaymentTarget::ShortenPeriod);
        assert_eq!(job.rate_change, Some(Rate::from_float(1.0)));
        Ok(())
    }

    #[test]
    fn test_invalid_dates_rejected() -> Result<()> {
        let raw = RawDate {
            year: 2025,
            month: "february".to_string(),
            day: 30,
        };
        assert!(raw.build().is_err());
        let raw = RawDate {
            year: 2025,
            month: "febtember".to_string(),
            day: 1,
        };
        assert!(raw.build().is_err());
        Ok(())
    }

    #[test]
    fn test_purchase_costs_defaults() -> Result<()> {
        let scenario = Scenario::from_toml(
            r#"
            [purchase_costs]
            property_value = 500000.0
            loan_amount = 400000.0
            "#,
        )?;
        let inputs = scenario.purchase_costs.unwrap().build()?;
        assert_eq!(inputs.transfer_tax_rate, Rate::from_percent(2));
        assert!(!inputs.first_property_exemption);
        assert_eq!(inputs.notary_fee, NotaryFee::Regulated);
        assert_eq!(inputs.bank_commission, Rate::zero());
        Ok(())
    }

    #[test]
    fn test_capacity_request() -> Result<()> {
        let scenario = Scenario::from_toml(
            r#"
            [capacity]
            monthly_expenses = 1000.0
            household_size = 2
            loan_term_years = 25
            nominal_rate = 7.6

            [[capacity.incomes]]
            amount = 10000.0
            employment = "employment"

            [[capacity.incomes]]
            amount = 2000.0
            employment = "b2b"
            "#,
        )?;
        let inputs = scenario.capacity.unwrap().build()?;
        assert_eq!(inputs.incomes.len(), 2);
        assert_eq!(inputs.incomes[1].employment, EmploymentType::B2b);
        assert_eq!(inputs.term_months, 300);
        assert_eq!(inputs.requested_dsti, Rate::from_percent(50));
        Ok(())
    }

    #[test]
    fn test_analysis_request_down_payment_modes() -> Result<()> {
        let base = r#"
            [analysis.property]
            property_price = 500000.0
            down_payment_type = "{mode}"
            down_payment_value = {value}
            base_rate = 5.6
            bank_margin = 2.0
            loan_term_years = 25

            [analysis.rent]
            monthly_rent = 2500.0

            [analysis.options]
            analysis_years = 30
        "#;
        let by_amount = Scenario::from_toml(
            &base.replace("{mode}", "amount").replace("{value}", "100000.0"),
        )?;
        let by_percent = Scenario::from_toml(
            &base.replace("{mode}", "percent").replace("{value}", "20.0"),
        )?;
        let (property_a, _, options_a) = by_amount.analysis.unwrap().build()?;
        let (property_p, _, _) = by_percent.analysis.unwrap().build()?;
        assert_eq!(
            property_a.down_payment.resolve(property_a.property_price),
            property_p.down_payment.resolve(property_p.property_price),
        );
        // Unset inflation falls back to the standing assumption.
        assert_eq!(options_a.inflation, fallback_inflation());
        Ok(())
    }

    #[test]
    fn test_unknown_fields_rejected() -> Result<()> {
        let result = Scenario::from_toml(
            r#"
            [schedule]
            loan_amount = 400000.0
            loan_term_years = 25
            base_rate = 5.6
            bank_margin = 2.0
            no_such_field = true

            [schedule.start]
            year = 2025
            month = "january"
            day = 10
            "#,
        );
        assert!(result.is_err());
        Ok(())
    }
}
