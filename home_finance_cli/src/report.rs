use anyhow::{Context, Result};

use home_finance_lib::capacity::{estimate_capacity, CapacityResult};
use home_finance_lib::compare::{compare, Comparison};
use home_finance_lib::costs::{calculate_purchase_costs, PurchaseCosts};
use home_finance_lib::input::Scenario;
use home_finance_lib::loan::{
    generate_schedule, overpayment_impact, simulate_rate_change, OverpaymentImpact,
    RateChangeImpact, Schedule,
};
use home_finance_lib::projection::{run_projection, Projection};
use home_finance_lib::validate::{
    validate_analysis, validate_capacity, validate_loan, validate_purchase, Issue,
};

#[derive(Debug)]
pub struct ScheduleReport {
    pub schedule: Schedule,
    pub overpayment_impact: Option<OverpaymentImpact>,
    pub rate_change: Option<RateChangeImpact>,
}

#[derive(Debug)]
pub struct AnalysisReport {
    pub projection: Projection,
    pub comparison: Comparison,
}

/// Everything a scenario file asked to be calculated.
#[derive(Debug)]
pub struct ScenarioReport {
    pub warnings: Vec<Issue>,
    pub schedule: Option<ScheduleReport>,
    pub purchase_costs: Option<PurchaseCosts>,
    pub capacity: Option<CapacityResult>,
    pub analysis: Option<AnalysisReport>,
}

pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport> {
    let mut warnings = Vec::new();

    let schedule = match &scenario.schedule {
        Some(request) => {
            let job = request.build().context("Invalid schedule request")?;
            warnings.extend(validate_loan(&job.terms)?);
            let schedule = generate_schedule(
                &job.terms,
                job.start_date,
                job.bridge.as_ref(),
                job.overpayment.as_ref(),
            )
            .context("Failed to generate amortization schedule")?;
            let impact = match &job.overpayment {
                Some(policy) => Some(
                    overpayment_impact(&job.terms, job.start_date, job.bridge.as_ref(), policy)
                        .context("Failed to compare against the un-overpaid schedule")?,
                ),
                None => None,
            };
            let rate_change = match job.rate_change {
                Some(delta) => Some(
                    simulate_rate_change(&job.terms, job.start_date, job.bridge.as_ref(), delta)
                        .context("Failed to simulate the rate change")?,
                ),
                None => None,
            };
            Some(ScheduleReport {
                schedule,
                overpayment_impact: impact,
                rate_change,
            })
        }
        None => None,
    };

    let purchase_costs = match &scenario.purchase_costs {
        Some(request) => {
            let inputs = request.build().context("Invalid purchase costs request")?;
            warnings.extend(validate_purchase(&inputs)?);
            Some(calculate_purchase_costs(&inputs))
        }
        None => None,
    };

    let capacity = match &scenario.capacity {
        Some(request) => {
            let inputs = request.build().context("Invalid capacity request")?;
            warnings.extend(validate_capacity(&inputs)?);
            Some(estimate_capacity(&inputs).context("Failed to estimate credit capacity")?)
        }
        None => None,
    };

    let analysis = match &scenario.analysis {
        Some(request) => {
            let (property, rent, options) =
                request.build().context("Invalid analysis request")?;
            warnings.extend(validate_analysis(&property, &rent, &options)?);
            let projection = run_projection(&property, &rent, &options)
                .context("Failed to run the buy-vs-rent projection")?;
            let comparison = compare(&projection).context("Failed to compare the strategies")?;
            Some(AnalysisReport {
                projection,
                comparison,
            })
        }
        None => None,
    };

    Ok(ScenarioReport {
        warnings,
        schedule,
        purchase_costs,
        capacity,
        analysis,
    })
}
