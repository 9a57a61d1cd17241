use anyhow::Result;
use itertools::Itertools;
use structopt::StructOpt;

use home_finance_lib::loan::Schedule;
use home_finance_lib::money::Money;

use crate::report::ScenarioReport;

#[derive(Debug, StructOpt)]
pub enum OutputType {
    /// Debug print every detail you have
    Debug,
    /// Print a human readable summary of each calculation
    Summary,
    /// Print the amortization schedule
    Schedule {
        /// Print every month instead of yearly totals
        #[structopt(long)]
        monthly: bool,
    },
}

impl OutputType {
    pub fn output(&self, report: &ScenarioReport) -> Result<()> {
        for warning in &report.warnings {
            eprintln!("warning: {}", warning);
        }
        match self {
            Self::Debug => {
                println!("{:#?}", report);
            }
            Self::Summary => {
                Self::print_summary(report);
            }
            Self::Schedule { monthly } => match &report.schedule {
                Some(s) => Self::print_schedule(&s.schedule, *monthly),
                None => println!("No schedule was requested in this scenario"),
            },
        }
        Ok(())
    }

    fn print_summary(report: &ScenarioReport) {
        if let Some(s) = &report.schedule {
            println!("# Loan");
            println!("term: {} months", s.schedule.term_months());
            println!("first installment: {}", s.schedule.first_installment());
            println!("last installment: {}", s.schedule.last_installment());
            println!("total interest: {}", s.schedule.total_interest());
            println!("total paid: {}", s.schedule.total_paid());
            if let Some(impact) = &s.overpayment_impact {
                println!(
                    "overpayments save {} in interest and {} months",
                    impact.interest_saved, impact.months_saved
                );
            }
            if let Some(change) = &s.rate_change {
                println!(
                    "at {} the first installment becomes {}",
                    change.rate, change.first_installment
                );
            }
            println!();
        }

        if let Some(costs) = &report.purchase_costs {
            println!("# Purchase costs");
            match costs.transfer_tax {
                Some(tax) => println!("transfer tax: {}", tax),
                None => println!("transfer tax: exempt"),
            }
            println!("notary fee: {}", costs.notary_fee);
            println!("court fees: {}", costs.court_fees);
            println!("bank commission: {}", costs.bank_commission);
            println!("agency commission: {}", costs.agency_commission);
            println!("total: {}", costs.total());
            println!();
        }

        if let Some(capacity) = &report.capacity {
            println!("# Credit capacity");
            println!("weighted income: {}", capacity.weighted_income);
            println!("cost of living: {}", capacity.cost_of_living);
            println!("total commitments: {}", capacity.total_commitments);
            println!(
                "max installment: {} (DSTI limit {}, used {})",
                capacity.max_installment, capacity.effective_dsti, capacity.dsti_used
            );
            println!(
                "max principal: {} at stressed rate {}",
                capacity.max_principal, capacity.stressed_rate
            );
            println!();
        }

        if let Some(analysis) = &report.analysis {
            let buying = &analysis.projection.buying;
            let renting = &analysis.projection.renting;
            let comparison = &analysis.comparison;
            println!("# Buy vs rent");
            println!(
                "loan: {} after {} down, payment {}",
                buying.loan_amount, buying.down_payment, buying.monthly_payment
            );
            println!(
                "buying total: {} (property worth {})",
                buying.buying_total, buying.property_value
            );
            println!(
                "renting total: {} (investments worth {})",
                renting.renting_total, renting.investment_value
            );
            println!(
                "{} is ahead by {} at the horizon",
                if comparison.buying_is_better {
                    "buying"
                } else {
                    "renting"
                },
                if comparison.final_difference.is_positive() {
                    comparison.final_difference
                } else {
                    comparison.final_difference.negate()
                },
            );
            match comparison.break_even {
                Some(be) => println!("break even in year {} month {}", be.year, be.month),
                None => println!("break even: not reached"),
            }
            println!("ROE: {} DTI: {}", comparison.roe, comparison.dti);
        }
    }

    fn print_schedule(schedule: &Schedule, monthly: bool) {
        if monthly {
            for p in schedule.periods() {
                println!(
                    "{:>3} {} payment {} (principal {} interest {} extra {}) remaining {}",
                    p.index,
                    p.date,
                    p.total_payment,
                    p.principal_part,
                    p.interest_part,
                    p.overpayment,
                    p.remaining_balance,
                );
            }
        } else {
            for (year, rows) in &schedule.periods().iter().group_by(|p| p.date.year) {
                let rows: Vec<_> = rows.collect();
                let paid: Money = rows.iter().map(|p| p.total_payment).sum();
                if let Some(last) = rows.last() {
                    println!(
                        "{} paid {} over {} months, remaining {}",
                        year.0,
                        paid,
                        rows.len(),
                        last.remaining_balance,
                    );
                }
            }
        }
    }
}
